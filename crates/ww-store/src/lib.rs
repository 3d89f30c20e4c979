//! Storage layer for workwinder.
//!
//! Persists chronometer snapshots as a single pretty-printed JSON document.
//!
//! # Write Semantics
//!
//! Each write serializes the full snapshot to a sibling `*.tmp` file and
//! renames it over the target, so a reader never sees a half-written
//! document. There is no journal: the file always holds the latest dump.
//!
//! # Schema
//!
//! The document mirrors [`ww_core::Snapshot`]: `schema_version`, `next_id`,
//! `stop_timer`, and `timer_list`, each stopwatch with its full history.
//! Durations are integer milliseconds, timestamps RFC 3339 UTC.
//! Version checks happen in [`ww_core::Chronometer::restore`], not here.

use std::path::{Path, PathBuf};

use thiserror::Error;
use ww_core::{SinkError, Snapshot, SnapshotSink};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or renaming the file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file contents are not a valid snapshot.
    #[error("invalid snapshot in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A snapshot file on disk.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `snapshot`, creating the parent directory if needed.
    pub fn write(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Self::io_error(parent, source))?;
        }

        let json = serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.tmp_path();
        std::fs::write(&tmp, json).map_err(|source| Self::io_error(&tmp, source))?;
        std::fs::rename(&tmp, &self.path).map_err(|source| Self::io_error(&self.path, source))?;

        tracing::debug!(path = %self.path.display(), "snapshot written");
        Ok(())
    }

    /// Loads the stored snapshot.
    ///
    /// Returns `None` if the file doesn't exist.
    /// Returns an error if the file exists but is unreadable/unparseable.
    pub fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let snapshot =
                    serde_json::from_str(&content).map_err(|source| StoreError::Json {
                        path: self.path.clone(),
                        source,
                    })?;
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(&self.path, e)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SnapshotSink for JsonStore {
    fn persist(&self, snapshot: &Snapshot) -> Result<(), SinkError> {
        self.write(snapshot)?;
        Ok(())
    }
}
