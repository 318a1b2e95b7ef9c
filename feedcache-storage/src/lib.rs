//! feedcache Storage - Feed Store Contract and Backends
//!
//! Defines the single-slot [`FeedStore`] contract and the backends it can
//! run on. Every backend is wrapped in a [`QueuedFeedStore`], which gives
//! all of them the same ordering and delivery guarantees.

pub mod backends;
pub mod queue;
pub mod store;
pub mod traits;

pub use backends::{
    InMemoryBackend, JsonFileBackend, LmdbBackend, LmdbBackendError, SqliteBackend,
    SqliteBackendError,
};
pub use queue::{Access, OperationQueue};
pub use store::QueuedFeedStore;
pub use traits::{FeedStore, SnapshotBackend, StoreCompletion, StoreOperation, StoreResult};

use std::sync::Arc;

use feedcache_core::{BackendKind, FeedCacheConfig, FeedCacheError, FeedCacheResult};
use tokio::runtime::Handle;

/// Open the store a configuration describes.
///
/// Must be called from within a Tokio runtime; the store's worker runs on
/// it.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, there is no current
/// runtime, or the backend cannot be opened.
pub fn open_store(config: &FeedCacheConfig) -> FeedCacheResult<Arc<dyn FeedStore>> {
    config.validate()?;

    let runtime = Handle::try_current().map_err(|e| FeedCacheError::BackendUnavailable {
        backend: config.backend,
        reason: e.to_string(),
    })?;

    let store: Arc<dyn FeedStore> = match config.backend {
        BackendKind::InMemory => Arc::new(QueuedFeedStore::with_runtime(
            InMemoryBackend::new(),
            &runtime,
        )),
        BackendKind::JsonFile => Arc::new(QueuedFeedStore::with_runtime(
            JsonFileBackend::new(&config.store_path),
            &runtime,
        )),
        BackendKind::Lmdb => Arc::new(QueuedFeedStore::with_runtime(
            LmdbBackend::open(&config.store_path, config.lmdb_map_size_mb)?,
            &runtime,
        )),
        BackendKind::Sqlite => Arc::new(QueuedFeedStore::with_runtime(
            SqliteBackend::open(&config.store_path)?,
            &runtime,
        )),
    };

    tracing::info!(
        backend = %config.backend,
        path = %config.store_path.display(),
        "Opened feed store"
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedcache_core::{CachedFeed, ConfigError};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_store_for_each_backend() {
        let dir = TempDir::new().unwrap();
        let configs = [
            FeedCacheConfig::default().with_backend(BackendKind::InMemory, ""),
            FeedCacheConfig::default()
                .with_backend(BackendKind::JsonFile, dir.path().join("feed.json")),
            FeedCacheConfig::default().with_backend(BackendKind::Lmdb, dir.path().join("lmdb")),
            FeedCacheConfig::default()
                .with_backend(BackendKind::Sqlite, dir.path().join("feed.sqlite")),
        ];

        for config in configs {
            let store = open_store(&config).unwrap();
            assert_eq!(store.retrieve().await, Ok(CachedFeed::Empty));
        }
    }

    #[tokio::test]
    async fn test_open_store_rejects_invalid_config() {
        let config = FeedCacheConfig::default().with_max_age_days(0);
        assert!(matches!(
            open_store(&config),
            Err(FeedCacheError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_open_store_outside_runtime_fails() {
        let config = FeedCacheConfig::default().with_backend(BackendKind::InMemory, "");
        assert!(matches!(
            open_store(&config),
            Err(FeedCacheError::BackendUnavailable {
                backend: BackendKind::InMemory,
                ..
            })
        ));
    }
}
