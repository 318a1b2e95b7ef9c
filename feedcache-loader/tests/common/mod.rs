//! Shared setup for the loader use-case tests.

use std::sync::Arc;

use feedcache_core::{FixedClock, Timestamp};
use feedcache_loader::LocalFeedLoader;
use feedcache_test_utils::FeedStoreSpy;

pub fn make_sut(now: Timestamp) -> (LocalFeedLoader<FeedStoreSpy>, Arc<FeedStoreSpy>) {
    feedcache_test_utils::init_test_tracing();
    let store = Arc::new(FeedStoreSpy::new());
    let loader = LocalFeedLoader::new(Arc::clone(&store), FixedClock(now));
    (loader, store)
}
