//! SqliteBackend contract and failure tests.

#[macro_use]
mod common;

use chrono::Utc;
use feedcache_storage::{FeedStore, QueuedFeedStore, SnapshotBackend, SqliteBackend};
use feedcache_test_utils::{assertions, fixtures, generators, store_specs::*, CachedRecord};
use proptest::prelude::*;
use tempfile::TempDir;

fn make_store() -> (QueuedFeedStore<SqliteBackend>, TempDir) {
    feedcache_test_utils::init_test_tracing();
    let dir = TempDir::new().unwrap();
    let backend = SqliteBackend::open(dir.path().join("feed.sqlite")).unwrap();
    (QueuedFeedStore::new(backend), dir)
}

feed_store_contract!(make_store());

fn corrupt(path: &std::path::Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute(
        "INSERT OR REPLACE INTO feed_cache (id, timestamp) VALUES (1, 'not a timestamp')",
        [],
    )
    .unwrap();
}

#[tokio::test]
async fn test_retrieve_delivers_failure_on_retrieval_error() {
    let (store, dir) = make_store();
    corrupt(&dir.path().join("feed.sqlite"));

    assert_that_retrieve_delivers_failure_on_retrieval_error(&store).await;
}

#[tokio::test]
async fn test_retrieve_has_no_side_effects_on_failure() {
    let (store, dir) = make_store();
    corrupt(&dir.path().join("feed.sqlite"));

    assert_that_retrieve_has_no_side_effects_on_failure(&store).await;
}

#[tokio::test]
async fn test_large_feed_round_trips_in_order() {
    let (store, _dir) = make_store();
    let cached: Vec<CachedRecord> = (0..250).map(|_| fixtures::unique_record().into()).collect();
    let timestamp = Utc::now();

    store.insert(cached.clone(), timestamp).await.unwrap();
    assertions::assert_found(&store.retrieve().await, &cached, timestamp);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_rows_rebuild_any_snapshot(snapshot in generators::arb_snapshot()) {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.replace(&snapshot).unwrap();
        prop_assert_eq!(backend.read().unwrap(), Some(snapshot));
    }
}
