//! Contract checks shared by every [`FeedStore`] implementation.
//!
//! Each check takes a store in the state its name describes and panics on
//! any deviation. Backend test suites call them against fresh stores:
//!
//! ```ignore
//! #[tokio::test]
//! async fn test_retrieve_delivers_empty_on_empty_cache() {
//!     let (store, _dir) = make_store();
//!     assert_that_retrieve_delivers_empty_on_empty_cache(&store).await;
//! }
//! ```
//!
//! The failable checks expect the caller to have broken the medium first
//! (corrupted data, a read-only location) so the next operation fails.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use feedcache_core::{CachedRecord, StoreOperationKind, Timestamp};
use feedcache_storage::{FeedStore, StoreResult};

use crate::assertions::{assert_empty, assert_failed, assert_found};
use crate::fixtures::unique_feed;

// === Retrieve ===

pub async fn assert_that_retrieve_delivers_empty_on_empty_cache<S: FeedStore + ?Sized>(
    store: &S,
) {
    assert_empty(&store.retrieve().await);
}

pub async fn assert_that_retrieve_has_no_side_effects_on_empty_cache<S: FeedStore + ?Sized>(
    store: &S,
) {
    assert_empty(&store.retrieve().await);
    assert_empty(&store.retrieve().await);
}

pub async fn assert_that_retrieve_delivers_found_values_on_non_empty_cache<
    S: FeedStore + ?Sized,
>(
    store: &S,
) {
    let (_, cached) = unique_feed();
    let timestamp = Utc::now();

    insert(store, cached.clone(), timestamp).await;

    assert_found(&store.retrieve().await, &cached, timestamp);
}

pub async fn assert_that_retrieve_has_no_side_effects_on_non_empty_cache<
    S: FeedStore + ?Sized,
>(
    store: &S,
) {
    let (_, cached) = unique_feed();
    let timestamp = Utc::now();

    insert(store, cached.clone(), timestamp).await;

    assert_found(&store.retrieve().await, &cached, timestamp);
    assert_found(&store.retrieve().await, &cached, timestamp);
}

pub async fn assert_that_retrieve_delivers_failure_on_retrieval_error<S: FeedStore + ?Sized>(
    store: &S,
) {
    assert_failed(&store.retrieve().await, StoreOperationKind::Retrieve);
}

pub async fn assert_that_retrieve_has_no_side_effects_on_failure<S: FeedStore + ?Sized>(
    store: &S,
) {
    assert_failed(&store.retrieve().await, StoreOperationKind::Retrieve);
    assert_failed(&store.retrieve().await, StoreOperationKind::Retrieve);
}

// === Insert ===

pub async fn assert_that_insert_delivers_no_error_on_empty_cache<S: FeedStore + ?Sized>(
    store: &S,
) {
    let (_, cached) = unique_feed();
    let result = store.insert(cached, Utc::now()).await;
    assert!(result.is_ok(), "Expected to insert successfully, got {:?}", result);
}

pub async fn assert_that_insert_delivers_no_error_on_non_empty_cache<S: FeedStore + ?Sized>(
    store: &S,
) {
    insert(store, unique_feed().1, Utc::now()).await;

    let result = store.insert(unique_feed().1, Utc::now()).await;
    assert!(result.is_ok(), "Expected to override successfully, got {:?}", result);
}

pub async fn assert_that_insert_overrides_previously_inserted_cache_values<
    S: FeedStore + ?Sized,
>(
    store: &S,
) {
    insert(store, unique_feed().1, Utc::now()).await;

    let (_, latest) = unique_feed();
    let latest_timestamp = Utc::now();
    insert(store, latest.clone(), latest_timestamp).await;

    assert_found(&store.retrieve().await, &latest, latest_timestamp);
}

pub async fn assert_that_insert_delivers_error_on_insertion_error<S: FeedStore + ?Sized>(
    store: &S,
) {
    let result = store.insert(unique_feed().1, Utc::now()).await;
    assert_failed(&result, StoreOperationKind::Insert);
}

/// The failed insert must leave whatever a retrieval saw before untouched.
pub async fn assert_that_insert_has_no_side_effects_on_insertion_error<S: FeedStore + ?Sized>(
    store: &S,
) {
    let before = store.retrieve().await;
    let inserted = store.insert(unique_feed().1, Utc::now()).await;
    assert_failed(&inserted, StoreOperationKind::Insert);
    assert_eq!(store.retrieve().await, before);
}

// === Delete ===

pub async fn assert_that_delete_delivers_no_error_on_empty_cache<S: FeedStore + ?Sized>(
    store: &S,
) {
    let result = store.delete().await;
    assert!(result.is_ok(), "Expected empty cache deletion to succeed, got {:?}", result);
}

pub async fn assert_that_delete_has_no_side_effects_on_empty_cache<S: FeedStore + ?Sized>(
    store: &S,
) {
    assert_eq!(store.delete().await, Ok(()));
    assert_empty(&store.retrieve().await);
}

pub async fn assert_that_delete_delivers_no_error_on_non_empty_cache<S: FeedStore + ?Sized>(
    store: &S,
) {
    insert(store, unique_feed().1, Utc::now()).await;

    let result = store.delete().await;
    assert!(result.is_ok(), "Expected non-empty cache deletion to succeed, got {:?}", result);
}

pub async fn assert_that_delete_empties_previously_inserted_cache<S: FeedStore + ?Sized>(
    store: &S,
) {
    insert(store, unique_feed().1, Utc::now()).await;

    assert_eq!(store.delete().await, Ok(()));
    assert_empty(&store.retrieve().await);
}

pub async fn assert_that_delete_delivers_error_on_deletion_error<S: FeedStore + ?Sized>(
    store: &S,
) {
    assert_failed(&store.delete().await, StoreOperationKind::Delete);
}

/// The failed delete must leave whatever a retrieval saw before untouched.
pub async fn assert_that_delete_has_no_side_effects_on_deletion_error<S: FeedStore + ?Sized>(
    store: &S,
) {
    let before = store.retrieve().await;
    let deleted = store.delete().await;
    assert_failed(&deleted, StoreOperationKind::Delete);
    assert_eq!(store.retrieve().await, before);
}

// === Ordering ===

/// Insert, delete, insert without waiting in between; every result must
/// arrive in submission order and the last write must win.
///
/// Run on a current-thread runtime so completion order is observable.
pub async fn assert_that_side_effects_run_serially<S: FeedStore + ?Sized>(store: &S) {
    let completed = Arc::new(Mutex::new(Vec::new()));

    let (_, latest) = unique_feed();
    let latest_timestamp = Utc::now();

    let first = observe(store.insert(unique_feed().1, Utc::now()), "insert 1", &completed);
    let second = observe(store.delete(), "delete", &completed);
    let third = observe(
        store.insert(latest.clone(), latest_timestamp),
        "insert 2",
        &completed,
    );

    for handle in [first, second, third] {
        let result = handle.await.unwrap_or_else(|e| panic!("observer failed: {e}"));
        assert!(result.is_ok(), "Expected side effect to succeed, got {:?}", result);
    }

    let order = completed
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    assert_eq!(order, vec!["insert 1", "delete", "insert 2"]);
    assert_found(&store.retrieve().await, &latest, latest_timestamp);
}

/// A retrieval submitted right after an insert, without awaiting it, must
/// observe that insert.
pub async fn assert_that_retrieve_observes_preceding_insert<S: FeedStore + ?Sized>(store: &S) {
    let (_, cached) = unique_feed();
    let timestamp = Utc::now();

    let insertion = store.insert(cached.clone(), timestamp);
    let retrieval = store.retrieve();

    assert_found(&retrieval.await, &cached, timestamp);
    assert!(insertion.await.is_ok());
}

fn observe<F>(
    operation: F,
    label: &'static str,
    completed: &Arc<Mutex<Vec<&'static str>>>,
) -> tokio::task::JoinHandle<StoreResult<()>>
where
    F: std::future::Future<Output = StoreResult<()>> + Send + 'static,
{
    let completed = Arc::clone(completed);
    tokio::spawn(async move {
        let result = operation.await;
        completed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(label);
        result
    })
}

async fn insert<S: FeedStore + ?Sized>(
    store: &S,
    records: Vec<CachedRecord>,
    timestamp: Timestamp,
) {
    if let Err(e) = store.insert(records, timestamp).await {
        panic!("Expected to insert cache successfully, got {e}");
    }
}
