//! The feed cache loader.
//!
//! Composes a [`FeedStore`] with a [`CachePolicy`] into three operations:
//!
//! - [`save`](LocalFeedLoader::save): delete, then insert the new feed
//!   stamped with the current time. A failed delete aborts the insert.
//! - [`load`](LocalFeedLoader::load): retrieve and return the feed while it
//!   is fresh. Stale or unreadable snapshots are deleted in the background.
//! - [`validate_cache`](LocalFeedLoader::validate_cache): delete stale or
//!   unreadable snapshots without building a feed.
//!
//! The first store call of every operation is issued before the method
//! returns. Results come back as [`Delivery`] futures that resolve to `None`
//! once the loader has been dropped.

use std::fmt;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use feedcache_core::{
    to_cached, CachePolicy, CachedFeed, CalendarZone, Clock, FeedCacheConfig, FeedCacheError,
    FeedCacheResult, FeedRecord, SystemClock,
};
use feedcache_storage::{open_store, FeedStore, StoreOperation};
use tokio::runtime::Handle;

use crate::dispatch::{Deliverer, Delivery, Dispatcher, LoaderHandle};

/// Local feed cache over a single store.
///
/// `Tz` is the calendar the policy counts days in. Loaders start out on UTC;
/// [`with_policy`](Self::with_policy) switches to any other zone.
///
/// # Example
///
/// ```ignore
/// let store = open_store(&config)?;
/// let loader = LocalFeedLoader::new(store, SystemClock)
///     .with_policy(CachePolicy::in_zone(7, chrono::Local));
///
/// loader.save(&feed).await;
/// let cached = loader.load().await;
/// ```
pub struct LocalFeedLoader<S: FeedStore + ?Sized + 'static, Tz: TimeZone = Utc> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: CachePolicy<Tz>,
    registration: Registration,
    runtime: Handle,
}

/// A loader's slot in its dispatcher, released on drop.
struct Registration {
    dispatcher: Arc<Dispatcher>,
    handle: LoaderHandle,
}

impl Registration {
    fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let handle = dispatcher.register();
        Self { dispatcher, handle }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.dispatcher.release(self.handle);
    }
}

/// What a spawned continuation needs from its loader.
struct Continuation<S: FeedStore + ?Sized + 'static, Tz: TimeZone> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: CachePolicy<Tz>,
}

impl<S: FeedStore + ?Sized + 'static> LocalFeedLoader<S> {
    /// Create a loader with the default policy, running continuations on the
    /// current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, like `tokio::spawn`.
    pub fn new(store: Arc<S>, clock: impl Clock + 'static) -> Self {
        Self::with_runtime(store, clock, Handle::current())
    }

    /// Create a loader whose continuations run on `runtime`.
    pub fn with_runtime(store: Arc<S>, clock: impl Clock + 'static, runtime: Handle) -> Self {
        Self {
            store,
            clock: Arc::new(clock),
            policy: CachePolicy::default(),
            registration: Registration::new(Arc::new(Dispatcher::new())),
            runtime,
        }
    }
}

impl<S, Tz> LocalFeedLoader<S, Tz>
where
    S: FeedStore + ?Sized + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    /// Replace the freshness policy, possibly counting days in another zone.
    pub fn with_policy<Z>(self, policy: CachePolicy<Z>) -> LocalFeedLoader<S, Z>
    where
        Z: TimeZone + Send + Sync + 'static,
    {
        let Self {
            store,
            clock,
            registration,
            runtime,
            ..
        } = self;
        LocalFeedLoader {
            store,
            clock,
            policy,
            registration,
            runtime,
        }
    }

    /// Register with a shared dispatcher instead of a private one.
    pub fn with_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.registration = Registration::new(dispatcher);
        self
    }

    pub fn policy(&self) -> &CachePolicy<Tz> {
        &self.policy
    }

    pub fn handle(&self) -> LoaderHandle {
        self.registration.handle
    }

    fn deliverer<T>(&self) -> (Deliverer<T>, Delivery<T>) {
        Deliverer::channel(
            Arc::clone(&self.registration.dispatcher),
            self.registration.handle,
        )
    }

    fn continuation(&self) -> Continuation<S, Tz> {
        Continuation {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            policy: self.policy.clone(),
        }
    }

    /// Replace the cached feed with `feed`, stamped with the clock's time at
    /// insert.
    ///
    /// Resolves to the deletion error if the old snapshot could not be
    /// removed (nothing is inserted then), otherwise to the insert's outcome.
    pub fn save(&self, feed: &[FeedRecord]) -> Delivery<FeedCacheResult<()>> {
        let (deliverer, delivery) = self.deliverer();
        let deletion = self.store.delete();
        let records = to_cached(feed);
        let continuation = self.continuation();

        self.runtime.spawn(async move {
            let result = match deletion.await {
                Err(e) => Err(e.into()),
                Ok(()) => {
                    if !deliverer.is_live() {
                        tracing::trace!("Loader released after delete; skipping insert");
                        return;
                    }
                    let timestamp = continuation.clock.now();
                    continuation
                        .store
                        .insert(records, timestamp)
                        .await
                        .map_err(Into::into)
                }
            };
            deliverer.deliver(result);
        });

        delivery
    }

    /// Load the cached feed.
    ///
    /// Resolves to an empty feed when nothing is cached or the snapshot is
    /// stale, and to the retrieval error when the snapshot is unreadable.
    /// Stale and unreadable snapshots are also deleted; that deletion's
    /// outcome is only logged.
    pub fn load(&self) -> Delivery<FeedCacheResult<Vec<FeedRecord>>> {
        let (deliverer, delivery) = self.deliverer();
        let retrieval = self.store.retrieve();
        let continuation = self.continuation();

        self.runtime.spawn(async move {
            let retrieved = retrieval.await;
            if !deliverer.is_live() {
                tracing::trace!("Loader released during load; dropping retrieval");
                return;
            }

            let result = match retrieved {
                Ok(CachedFeed::Empty) => Ok(Vec::new()),
                Ok(CachedFeed::Found(snapshot))
                    if continuation
                        .policy
                        .is_fresh(snapshot.timestamp, continuation.clock.now()) =>
                {
                    Ok(snapshot.into_feed())
                }
                Ok(CachedFeed::Found(snapshot)) => {
                    tracing::debug!(
                        cached_at = %snapshot.timestamp,
                        records = snapshot.records.len(),
                        "Cached feed is stale; deleting"
                    );
                    detach(continuation.store.delete());
                    Ok(Vec::new())
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Cached feed is unreadable; deleting");
                    detach(continuation.store.delete());
                    Err(e.into())
                }
            };
            deliverer.deliver(result);
        });

        delivery
    }

    /// Delete the cached snapshot if it is stale or unreadable.
    ///
    /// Resolves to the deletion's outcome when one was needed and to
    /// `Ok(())` otherwise. Drop the delivery to run it unobserved.
    pub fn validate_cache(&self) -> Delivery<FeedCacheResult<()>> {
        let (deliverer, delivery) = self.deliverer();
        let retrieval = self.store.retrieve();
        let continuation = self.continuation();

        self.runtime.spawn(async move {
            let needs_delete = match retrieval.await {
                Ok(CachedFeed::Empty) => false,
                Ok(CachedFeed::Found(snapshot)) => !continuation
                    .policy
                    .is_fresh(snapshot.timestamp, continuation.clock.now()),
                Err(e) => {
                    tracing::debug!(error = %e, "Cached feed is unreadable");
                    true
                }
            };
            if !deliverer.is_live() {
                tracing::trace!("Loader released during validation; skipping delete");
                return;
            }

            let result = if needs_delete {
                tracing::debug!("Invalidating cached feed");
                continuation.store.delete().await.map_err(Into::into)
            } else {
                Ok(())
            };
            deliverer.deliver(result);
        });

        delivery
    }
}

impl LocalFeedLoader<dyn FeedStore, CalendarZone> {
    /// Open the configured store and build a loader on the system clock,
    /// counting days in the configured calendar zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the store cannot
    /// be opened.
    pub fn from_config(config: &FeedCacheConfig) -> FeedCacheResult<Self> {
        let store = open_store(config)?;
        let runtime = Handle::try_current().map_err(|e| FeedCacheError::BackendUnavailable {
            backend: config.backend,
            reason: e.to_string(),
        })?;
        Ok(LocalFeedLoader::with_runtime(store, SystemClock, runtime)
            .with_policy(config.cache_policy()))
    }
}

impl<S, Tz> fmt::Debug for LocalFeedLoader<S, Tz>
where
    S: FeedStore + ?Sized + 'static,
    Tz: TimeZone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFeedLoader")
            .field("policy", &self.policy)
            .field("handle", &self.registration.handle)
            .finish_non_exhaustive()
    }
}

/// Let a self-healing delete run to completion without waiting for it.
fn detach(deletion: StoreOperation<()>) {
    tokio::spawn(async move {
        if let Err(e) = deletion.await {
            tracing::warn!(error = %e, "Self-healing delete of cached feed failed");
        }
    });
}
