//! Feed store contract.
//!
//! This module defines the three-operation contract every store honors and
//! the synchronous medium trait that backends implement underneath it.
//!
//! # Delivery
//!
//! Each operation returns a [`StoreOperation`], a future over a one-shot
//! channel. The operation is submitted when the method is called, not when
//! the future is first polled, so submission order is call order. Dropping
//! the future discards the result but does not cancel the operation.
//!
//! Results may be produced on any thread. Callers must not assume the
//! operation has completed when the method returns.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use feedcache_core::{
    CacheSnapshot, CachedFeed, CachedRecord, StorageError, StoreOperationKind, Timestamp,
};
use tokio::sync::oneshot;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StorageError>;

/// Durable single-slot storage for one feed snapshot.
///
/// # Ordering
///
/// For a single store, operations take effect in submission order. Reads may
/// run concurrently with each other, but a write (insert or delete) is a
/// barrier: no read submitted after it observes an older state, and no two
/// writes interleave.
///
/// # Failures
///
/// Every I/O or encoding failure surfaces once, as the error of the
/// operation that hit it. Stores never retry.
pub trait FeedStore: Send + Sync {
    /// Read the current snapshot. Has no side effects.
    fn retrieve(&self) -> StoreOperation<CachedFeed>;

    /// Replace any existing snapshot with `records` cached at `timestamp`.
    ///
    /// The replace is all-or-nothing: a failed insert never leaves a partial
    /// snapshot visible to a later retrieve.
    fn insert(&self, records: Vec<CachedRecord>, timestamp: Timestamp) -> StoreOperation<()>;

    /// Remove the snapshot. Deleting when nothing is stored succeeds.
    fn delete(&self) -> StoreOperation<()>;
}

/// Synchronous access to the medium a store persists to.
///
/// Implementations only need to be correct for one caller at a time per
/// write; [`crate::QueuedFeedStore`] provides the ordering guarantees of
/// [`FeedStore`] on top of any backend.
pub trait SnapshotBackend: Send + Sync + 'static {
    /// Short backend name used in log events.
    fn name(&self) -> &'static str;

    /// Read the stored snapshot, if any.
    fn read(&self) -> StoreResult<Option<CacheSnapshot>>;

    /// Atomically replace the stored snapshot.
    fn replace(&self, snapshot: &CacheSnapshot) -> StoreResult<()>;

    /// Remove the stored snapshot. Removing nothing succeeds.
    fn remove(&self) -> StoreResult<()>;
}

/// The pending result of a store operation.
///
/// Resolves exactly once. If the side producing the result goes away
/// without completing (a worker panic or runtime shutdown), resolves to
/// [`StorageError::Interrupted`].
#[derive(Debug)]
#[must_use = "the operation runs regardless; drop the result explicitly to ignore it"]
pub struct StoreOperation<T> {
    receiver: oneshot::Receiver<StoreResult<T>>,
    operation: StoreOperationKind,
}

impl<T> StoreOperation<T> {
    /// Create a pending operation and the completion that resolves it.
    pub fn channel(operation: StoreOperationKind) -> (StoreCompletion<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            StoreCompletion { sender, operation },
            Self {
                receiver,
                operation,
            },
        )
    }

    /// Create an operation that is already resolved.
    pub fn ready(operation: StoreOperationKind, result: StoreResult<T>) -> Self {
        let (completion, pending) = Self::channel(operation);
        completion.complete(result);
        pending
    }

    /// Which contract operation this is.
    pub fn kind(&self) -> StoreOperationKind {
        self.operation
    }
}

impl<T> Future for StoreOperation<T> {
    type Output = StoreResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let operation = self.operation;
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(StorageError::Interrupted { operation })))
    }
}

/// The producing side of a [`StoreOperation`].
#[derive(Debug)]
pub struct StoreCompletion<T> {
    sender: oneshot::Sender<StoreResult<T>>,
    operation: StoreOperationKind,
}

impl<T> StoreCompletion<T> {
    /// Deliver the result. Returns `false` if nobody is waiting for it.
    pub fn complete(self, result: StoreResult<T>) -> bool {
        self.sender.send(result).is_ok()
    }

    pub fn kind(&self) -> StoreOperationKind {
        self.operation
    }
}
