//! Single JSON file backend.
//!
//! The snapshot is one JSON document:
//!
//! ```json
//! {"records": [{"id": "...", "url": "..."}], "timestamp": "2025-09-11T08:00:00.123456789Z"}
//! ```
//!
//! Replacement writes a sibling temporary file and renames it over the
//! target, so a reader sees either the old document or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use feedcache_core::{CacheSnapshot, StorageError};
use tempfile::NamedTempFile;

use crate::traits::{SnapshotBackend, StoreResult};

/// Persists the snapshot to a JSON file at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Use `path` as the store file. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl SnapshotBackend for JsonFileBackend {
    fn name(&self) -> &'static str {
        "json_file"
    }

    fn read(&self) -> StoreResult<Option<CacheSnapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::read(e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(StorageError::read)
    }

    fn replace(&self, snapshot: &CacheSnapshot) -> StoreResult<()> {
        let encoded = serde_json::to_vec(snapshot).map_err(StorageError::write)?;

        let directory = self.directory();
        fs::create_dir_all(directory).map_err(StorageError::write)?;

        let mut staged = NamedTempFile::new_in(directory).map_err(StorageError::write)?;
        staged.write_all(&encoded).map_err(StorageError::write)?;
        staged.as_file().sync_all().map_err(StorageError::write)?;
        staged
            .persist(&self.path)
            .map_err(|e| StorageError::write(e.error))?;

        tracing::trace!(path = %self.path.display(), bytes = encoded.len(), "Replaced JSON snapshot");
        Ok(())
    }

    fn remove(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::delete(e)),
        }
    }
}
