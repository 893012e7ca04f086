// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Types and traits for the Quorus oracle daemon.
//!
//! This crate holds everything the oracle core and its collaborators agree
//! on: chain-position primitives, frame arithmetic, the hash-consensus data
//! model, the error taxonomy, configuration, and the trait seams production
//! providers and test doubles both implement. It performs no I/O.

/// Runtime configuration.
pub mod config;
/// Data model of the on-chain hash-consensus protocol.
pub mod consensus;
/// Primitive chain-position types.
pub mod data;
/// Error type for the oracle.
pub mod error;
/// Pure frame arithmetic.
pub mod frame;
/// Helper functions for logging.
pub mod logging;
/// Trait seams for external collaborators.
pub mod traits;
