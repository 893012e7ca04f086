// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! General (not oracle-specific) utilities

/// Canonical bincode options shared by every hashed or persisted encoding.
pub mod bincode;
