// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Testing infrastructure for the Quorus oracle.
//!
//! Scripted in-memory collaborators and configuration helpers; the
//! integration suites in `tests/` drive whole cycles against them.

/// Configuration and fixture helpers.
pub mod helpers;
/// Scripted collaborator doubles.
pub mod mocks;
/// A deterministic report module for cycle tests.
pub mod module;
