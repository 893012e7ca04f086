// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Trait seams between the oracle core and its external collaborators.
//!
//! The core never talks to a node, a contract or a disk directly: every
//! boundary is one of these traits, injected at startup. Production wiring
//! lives in the oracle crate's providers; the testing crate scripts them.

pub mod chain_reader;
pub mod consensus_contract;
pub mod keys_api;
pub mod metrics;
pub mod report;
pub mod storage;
pub mod tx_sender;
