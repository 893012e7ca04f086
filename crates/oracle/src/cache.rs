// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! File-backed report-fragment cache.
//!
//! One file per `(state_version, frame_id)` key. Each file is a bincode
//! envelope carrying an explicit schema version and its own key, so an
//! entry from an older daemon or a renamed file is discarded rather than
//! misinterpreted. Writes go through a temp file and an atomic rename; a
//! crash mid-store leaves either the old entry or none.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use bincode::Options;
use quorus_types::{
    data::FrameIndex,
    error::{OracleError, Result},
    traits::storage::ReportCache,
};
use quorus_utils::bincode::bincode_opts;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bumped whenever the envelope layout changes shape.
const CACHE_SCHEMA_VERSION: u32 = 1;

/// On-disk wrapper around a fragment.
#[derive(Serialize, Deserialize)]
struct CacheEnvelope {
    /// Envelope layout version.
    schema_version: u32,
    /// Module state version the fragment was computed under.
    state_version: u64,
    /// Frame the fragment belongs to.
    frame_id: u64,
    /// The fragment itself, opaque to the cache.
    payload: Vec<u8>,
}

/// A [`ReportCache`] persisting fragments under one directory.
pub struct FileReportCache {
    /// Directory the entries live in.
    dir: PathBuf,
    /// Serializes disk access; the metrics exporter may read concurrently
    /// with the cycle loop writing.
    lock: Mutex<()>,
}

impl FileReportCache {
    /// Open (and create if needed) a cache at `dir`.
    ///
    /// # Errors
    ///
    /// [`OracleError::Cache`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|err| OracleError::Cache(format!("creating {}: {err}", dir.display())))?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// Path of the entry for a key.
    fn entry_path(&self, state_version: u64, frame_id: FrameIndex) -> PathBuf {
        self.dir
            .join(format!("fragment-{state_version}-{}.bin", *frame_id))
    }

    /// Remove an unreadable or stale entry, keeping going on failure.
    fn discard(path: &Path, reason: &str) {
        warn!(path = %path.display(), reason, "discarding cache entry");
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), %err, "failed to remove cache entry");
        }
    }
}

impl ReportCache for FileReportCache {
    fn load(&self, state_version: u64, frame_id: FrameIndex) -> Result<Option<Vec<u8>>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| OracleError::Cache("cache lock poisoned".into()))?;
        let path = self.entry_path(state_version, frame_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(OracleError::Cache(format!(
                    "reading {}: {err}",
                    path.display()
                )))
            }
        };

        let envelope: CacheEnvelope = match bincode_opts().deserialize(&bytes) {
            Ok(envelope) => envelope,
            Err(_) => {
                Self::discard(&path, "undecodable envelope");
                return Ok(None);
            }
        };
        if envelope.schema_version != CACHE_SCHEMA_VERSION {
            Self::discard(&path, "schema version mismatch");
            return Ok(None);
        }
        if envelope.state_version != state_version || envelope.frame_id != *frame_id {
            Self::discard(&path, "key mismatch");
            return Ok(None);
        }
        Ok(Some(envelope.payload))
    }

    fn store(&self, state_version: u64, frame_id: FrameIndex, payload: &[u8]) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| OracleError::Cache("cache lock poisoned".into()))?;
        let envelope = CacheEnvelope {
            schema_version: CACHE_SCHEMA_VERSION,
            state_version,
            frame_id: *frame_id,
            payload: payload.to_vec(),
        };
        let bytes = bincode_opts()
            .serialize(&envelope)
            .map_err(|err| OracleError::Cache(format!("encoding envelope: {err}")))?;

        let path = self.entry_path(state_version, frame_id);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)
            .map_err(|err| OracleError::Cache(format!("writing {}: {err}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|err| OracleError::Cache(format!("renaming into {}: {err}", path.display())))
    }
}
