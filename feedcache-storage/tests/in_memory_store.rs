//! InMemoryBackend contract tests.

#[macro_use]
mod common;

use feedcache_storage::{InMemoryBackend, QueuedFeedStore};

fn make_store() -> (QueuedFeedStore<InMemoryBackend>, ()) {
    feedcache_test_utils::init_test_tracing();
    (QueuedFeedStore::new(InMemoryBackend::new()), ())
}

feed_store_contract!(make_store());

#[tokio::test]
async fn test_separate_instances_do_not_share_data() {
    use feedcache_storage::FeedStore;
    use feedcache_test_utils::{assertions, fixtures};

    let (first, _) = make_store();
    let (second, _) = make_store();

    first
        .insert(fixtures::unique_feed().1, chrono::Utc::now())
        .await
        .unwrap();
    assertions::assert_empty(&second.retrieve().await);
}
