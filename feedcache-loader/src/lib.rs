//! feedcache Loader - Feed Cache Use Cases
//!
//! [`LocalFeedLoader`] turns a [`feedcache_storage::FeedStore`] and a
//! [`feedcache_core::CachePolicy`] into the save / load / validate
//! operations application code calls. Results travel through the
//! [`dispatch`] layer so nothing reaches a loader that has been dropped.

pub mod dispatch;
pub mod loader;
pub mod traits;

pub use dispatch::{Delivery, Dispatcher, LoaderHandle};
pub use loader::LocalFeedLoader;
pub use traits::{FeedCache, FeedLoader};
