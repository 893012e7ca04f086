// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The Quorus oracle core: frame tracking, hash consensus and the poll
//! loop.
//!
//! A Quorus instance observes finalized consensus-layer state, builds one
//! deterministic report per frame through a [`ReportModule`]
//! implementation, and drives the on-chain hash-consensus protocol until a
//! quorum of operators lands the canonical report. Synchronization between
//! operators happens entirely through observed contract state; operators
//! never talk to each other.
//!
//! [`ReportModule`]: quorus_types::traits::report::ReportModule

/// Bunker-mode detection.
pub mod bunker;
/// File-backed report-fragment cache.
pub mod cache;
/// Command line and configuration-file handling.
pub mod cli;
/// The hash-consensus tracker.
pub mod consensus;
/// The cycle orchestrator.
pub mod cycle;
/// Finality clamping and reference-slot resolution.
pub mod frame;
/// Metric handles for the cycle loop.
pub mod metrics;
/// Report modules.
pub mod modules;
/// Production collaborator clients.
pub mod providers;
/// The readiness probe.
pub mod readiness;
/// Bounded retry for provider reads.
pub mod retry;

pub use cycle::{Collaborators, CycleOrchestrator};
