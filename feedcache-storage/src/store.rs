//! The [`FeedStore`] implementation shared by every backend.

use std::sync::Arc;

use feedcache_core::{CacheSnapshot, CachedFeed, CachedRecord, StoreOperationKind, Timestamp};
use tokio::runtime::Handle;

use crate::queue::OperationQueue;
use crate::traits::{FeedStore, SnapshotBackend, StoreOperation};

/// A [`FeedStore`] that runs a [`SnapshotBackend`] behind an
/// [`OperationQueue`].
///
/// The backend does blocking I/O on the runtime's blocking pool; callers
/// only ever see the returned operations.
///
/// # Example
///
/// ```ignore
/// use feedcache_storage::{FeedStore, InMemoryBackend, QueuedFeedStore};
///
/// let store = QueuedFeedStore::new(InMemoryBackend::new());
/// store.insert(records, Utc::now()).await?;
/// let cached = store.retrieve().await?;
/// ```
pub struct QueuedFeedStore<B: SnapshotBackend> {
    backend: Arc<B>,
    queue: OperationQueue,
}

impl<B: SnapshotBackend> QueuedFeedStore<B> {
    /// Wrap `backend`, running its worker on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, like `tokio::spawn`.
    pub fn new(backend: B) -> Self {
        Self::with_runtime(backend, &Handle::current())
    }

    /// Wrap `backend`, running its worker on `runtime`.
    pub fn with_runtime(backend: B, runtime: &Handle) -> Self {
        let queue = OperationQueue::spawn(backend.name(), runtime);
        Self {
            backend: Arc::new(backend),
            queue,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: SnapshotBackend> FeedStore for QueuedFeedStore<B> {
    fn retrieve(&self) -> StoreOperation<CachedFeed> {
        let backend = Arc::clone(&self.backend);
        self.queue.submit(StoreOperationKind::Retrieve, move || {
            backend.read().map(CachedFeed::from)
        })
    }

    fn insert(&self, records: Vec<CachedRecord>, timestamp: Timestamp) -> StoreOperation<()> {
        let backend = Arc::clone(&self.backend);
        let snapshot = CacheSnapshot::new(records, timestamp);
        self.queue.submit(StoreOperationKind::Insert, move || {
            backend.replace(&snapshot)
        })
    }

    fn delete(&self) -> StoreOperation<()> {
        let backend = Arc::clone(&self.backend);
        self.queue
            .submit(StoreOperationKind::Delete, move || backend.remove())
    }
}

impl<B: SnapshotBackend> std::fmt::Debug for QueuedFeedStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedFeedStore")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}
