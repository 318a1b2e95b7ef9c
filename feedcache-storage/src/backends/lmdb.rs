//! LMDB-backed snapshot storage.
//!
//! Uses the heed crate (Rust bindings for LMDB). The snapshot lives under a
//! single key in the unnamed database as one JSON document, so replacing it
//! is one write transaction and readers never see half of a feed.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The backend uses:
//! - Read transactions for `read`
//! - Write transactions for `replace` and `remove`

use std::path::Path;

use feedcache_core::{BackendKind, CacheSnapshot, FeedCacheError, StorageError};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::traits::{SnapshotBackend, StoreResult};

const SNAPSHOT_KEY: &[u8] = b"feed_cache";

/// Error type for opening an LMDB store.
#[derive(Debug, thiserror::Error)]
pub enum LmdbBackendError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbBackendError> for FeedCacheError {
    fn from(e: LmdbBackendError) -> Self {
        FeedCacheError::BackendUnavailable {
            backend: BackendKind::Lmdb,
            reason: e.to_string(),
        }
    }
}

/// Persists the snapshot in an LMDB environment directory.
pub struct LmdbBackend {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbBackend {
    /// Open (or create) the environment at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbBackendError> {
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per path by this process and
        // the memory map is never handed out beyond a transaction's lifetime.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbBackendError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbBackendError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbBackendError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbBackendError::Transaction(e.to_string()))?;

        tracing::debug!(path = %path.as_ref().display(), max_size_mb, "Opened LMDB store");
        Ok(Self { env, db })
    }
}

impl SnapshotBackend for LmdbBackend {
    fn name(&self) -> &'static str {
        "lmdb"
    }

    fn read(&self) -> StoreResult<Option<CacheSnapshot>> {
        let rtxn = self.env.read_txn().map_err(StorageError::read)?;

        match self.db.get(&rtxn, SNAPSHOT_KEY).map_err(StorageError::read)? {
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(StorageError::read),
            None => Ok(None),
        }
    }

    fn replace(&self, snapshot: &CacheSnapshot) -> StoreResult<()> {
        let bytes = serde_json::to_vec(snapshot).map_err(StorageError::write)?;

        let mut wtxn = self.env.write_txn().map_err(StorageError::write)?;
        self.db
            .put(&mut wtxn, SNAPSHOT_KEY, &bytes)
            .map_err(StorageError::write)?;
        wtxn.commit().map_err(StorageError::write)
    }

    fn remove(&self) -> StoreResult<()> {
        let mut wtxn = self.env.write_txn().map_err(StorageError::delete)?;
        self.db
            .delete(&mut wtxn, SNAPSHOT_KEY)
            .map_err(StorageError::delete)?;
        wtxn.commit().map_err(StorageError::delete)
    }
}

impl std::fmt::Debug for LmdbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbBackend")
            .field("path", &self.env.path())
            .finish_non_exhaustive()
    }
}
