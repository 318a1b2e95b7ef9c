//! feedcache Core - Feed Types and Cache Policy
//!
//! Pure data structures and pure decisions. All other crates depend on this.
//! Nothing in this crate performs I/O or reads an ambient clock, with the
//! single exception of [`SystemClock`].

use chrono::{DateTime, Utc};

pub mod clock;
pub mod config;
pub mod entities;
pub mod error;
pub mod policy;
pub mod zone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BackendKind, FeedCacheConfig};
pub use entities::{to_cached, CacheSnapshot, CachedFeed, CachedRecord, FeedRecord};
pub use error::{ConfigError, FeedCacheError, FeedCacheResult, StorageError, StoreOperationKind};
pub use policy::CachePolicy;
pub use zone::{CalendarOffset, CalendarZone};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Default maximum cache age, in calendar days.
pub const DEFAULT_MAX_CACHE_AGE_DAYS: u32 = 7;
