//! A [`FeedStore`] that records every call and completes nothing on its own.
//!
//! Tests decide when, and with what, each pending operation completes:
//!
//! ```ignore
//! let store = Arc::new(FeedStoreSpy::new());
//! let loader = LocalFeedLoader::new(store.clone(), FixedClock(now));
//!
//! let pending = tokio::spawn(async move { loader.load().await });
//! store.wait_for_messages(1).await;
//! store.complete_retrieval_with_empty(0);
//! ```

use std::sync::{Mutex, MutexGuard};

use feedcache_core::{CachedFeed, CachedRecord, StorageError, StoreOperationKind, Timestamp};
use feedcache_storage::{FeedStore, StoreCompletion, StoreOperation, StoreResult};
use tokio::sync::watch;

/// A call the spy received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceivedMessage {
    Retrieve,
    Insert {
        records: Vec<CachedRecord>,
        timestamp: Timestamp,
    },
    Delete,
}

#[derive(Default)]
struct SpyState {
    messages: Vec<ReceivedMessage>,
    retrievals: Vec<Option<StoreCompletion<CachedFeed>>>,
    insertions: Vec<Option<StoreCompletion<()>>>,
    deletions: Vec<Option<StoreCompletion<()>>>,
}

/// Recording store double.
pub struct FeedStoreSpy {
    state: Mutex<SpyState>,
    received: watch::Sender<usize>,
}

impl Default for FeedStoreSpy {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedStoreSpy {
    pub fn new() -> Self {
        let (received, _) = watch::channel(0);
        Self {
            state: Mutex::new(SpyState::default()),
            received,
        }
    }

    fn state(&self) -> MutexGuard<'_, SpyState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, message: ReceivedMessage) {
        self.state().messages.push(message);
        self.received.send_modify(|count| *count += 1);
    }

    /// Every call received so far.
    pub fn received_messages(&self) -> Vec<ReceivedMessage> {
        self.state().messages.clone()
    }

    /// Wait until at least `count` calls have been received.
    pub async fn wait_for_messages(&self, count: usize) -> Vec<ReceivedMessage> {
        let mut receiver = self.received.subscribe();
        let _ = receiver.wait_for(|received| *received >= count).await;
        self.received_messages()
    }

    // === Retrieval ===

    /// Complete the retrieval at `index`. Returns whether anyone was still waiting.
    pub fn complete_retrieval(&self, result: StoreResult<CachedFeed>, index: usize) -> bool {
        let completion = take(&mut self.state().retrievals, index, StoreOperationKind::Retrieve);
        completion.complete(result)
    }

    pub fn complete_retrieval_with_error(&self, error: StorageError, index: usize) -> bool {
        self.complete_retrieval(Err(error), index)
    }

    pub fn complete_retrieval_with_empty(&self, index: usize) -> bool {
        self.complete_retrieval(Ok(CachedFeed::Empty), index)
    }

    pub fn complete_retrieval_with(
        &self,
        records: Vec<CachedRecord>,
        timestamp: Timestamp,
        index: usize,
    ) -> bool {
        self.complete_retrieval(Ok(CachedFeed::found(records, timestamp)), index)
    }

    // === Insertion ===

    pub fn complete_insertion(&self, result: StoreResult<()>, index: usize) -> bool {
        let completion = take(&mut self.state().insertions, index, StoreOperationKind::Insert);
        completion.complete(result)
    }

    pub fn complete_insertion_with_error(&self, error: StorageError, index: usize) -> bool {
        self.complete_insertion(Err(error), index)
    }

    pub fn complete_insertion_successfully(&self, index: usize) -> bool {
        self.complete_insertion(Ok(()), index)
    }

    // === Deletion ===

    pub fn complete_deletion(&self, result: StoreResult<()>, index: usize) -> bool {
        let completion = take(&mut self.state().deletions, index, StoreOperationKind::Delete);
        completion.complete(result)
    }

    pub fn complete_deletion_with_error(&self, error: StorageError, index: usize) -> bool {
        self.complete_deletion(Err(error), index)
    }

    pub fn complete_deletion_successfully(&self, index: usize) -> bool {
        self.complete_deletion(Ok(()), index)
    }
}

#[track_caller]
fn take<T>(
    pending: &mut [Option<StoreCompletion<T>>],
    index: usize,
    operation: StoreOperationKind,
) -> StoreCompletion<T> {
    match pending.get_mut(index).and_then(Option::take) {
        Some(completion) => completion,
        None => panic!(
            "No pending {operation} at index {index} ({} received)",
            pending.len()
        ),
    }
}

impl FeedStore for FeedStoreSpy {
    fn retrieve(&self) -> StoreOperation<CachedFeed> {
        let (completion, pending) = StoreOperation::channel(StoreOperationKind::Retrieve);
        self.state().retrievals.push(Some(completion));
        self.record(ReceivedMessage::Retrieve);
        pending
    }

    fn insert(&self, records: Vec<CachedRecord>, timestamp: Timestamp) -> StoreOperation<()> {
        let (completion, pending) = StoreOperation::channel(StoreOperationKind::Insert);
        self.state().insertions.push(Some(completion));
        self.record(ReceivedMessage::Insert { records, timestamp });
        pending
    }

    fn delete(&self) -> StoreOperation<()> {
        let (completion, pending) = StoreOperation::channel(StoreOperationKind::Delete);
        self.state().deletions.push(Some(completion));
        self.record(ReceivedMessage::Delete);
        pending
    }
}
