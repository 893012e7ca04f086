// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Persisted report-fragment cache.

use crate::{data::FrameIndex, error::Result};

/// Store for partially computed report fragments that survive restarts.
///
/// Entries are keyed by `(state_version, frame_id)`; a lookup with either
/// component changed must come back empty rather than returning a stale
/// fragment. Implementations carry an explicit schema version inside the
/// stored bytes and discard entries they cannot interpret.
pub trait ReportCache: Send + Sync {
    /// Load the fragment for the exact key, if present and readable.
    fn load(&self, state_version: u64, frame_id: FrameIndex) -> Result<Option<Vec<u8>>>;

    /// Store (or overwrite) the fragment for the key.
    fn store(&self, state_version: u64, frame_id: FrameIndex, payload: &[u8]) -> Result<()>;
}

/// A cache that remembers nothing; used when no cache directory is
/// configured and in tests that want recomputation every time.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoCache;

impl ReportCache for NoCache {
    fn load(&self, _state_version: u64, _frame_id: FrameIndex) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn store(&self, _state_version: u64, _frame_id: FrameIndex, _payload: &[u8]) -> Result<()> {
        Ok(())
    }
}
