//! Consumer-facing feed traits.
//!
//! Display and fetch code depend on these rather than on
//! [`LocalFeedLoader`] directly.

use async_trait::async_trait;
use chrono::TimeZone;
use feedcache_core::{FeedCacheError, FeedCacheResult, FeedRecord, StorageError, StoreOperationKind};
use feedcache_storage::FeedStore;

use crate::loader::LocalFeedLoader;

/// Something that can produce a feed.
#[async_trait]
pub trait FeedLoader: Send + Sync {
    async fn load(&self) -> FeedCacheResult<Vec<FeedRecord>>;
}

/// Something that can keep a feed for later.
#[async_trait]
pub trait FeedCache: Send + Sync {
    async fn save(&self, feed: &[FeedRecord]) -> FeedCacheResult<()>;
}

// A loader borrowed for the call is alive throughout it, so a missing
// delivery means the continuation itself was lost.
fn interrupted(operation: StoreOperationKind) -> FeedCacheError {
    StorageError::Interrupted { operation }.into()
}

#[async_trait]
impl<S, Tz> FeedLoader for LocalFeedLoader<S, Tz>
where
    S: FeedStore + ?Sized + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    async fn load(&self) -> FeedCacheResult<Vec<FeedRecord>> {
        LocalFeedLoader::load(self)
            .await
            .unwrap_or_else(|| Err(interrupted(StoreOperationKind::Retrieve)))
    }
}

#[async_trait]
impl<S, Tz> FeedCache for LocalFeedLoader<S, Tz>
where
    S: FeedStore + ?Sized + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    async fn save(&self, feed: &[FeedRecord]) -> FeedCacheResult<()> {
        LocalFeedLoader::save(self, feed)
            .await
            .unwrap_or_else(|| Err(interrupted(StoreOperationKind::Insert)))
    }
}
