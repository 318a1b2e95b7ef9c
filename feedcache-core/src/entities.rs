//! Feed record structures
//!
//! [`FeedRecord`] is what the fetch client produces and display code consumes.
//! [`CachedRecord`] is the persistence-facing mirror handed to stores, so the
//! domain shape can evolve without touching what backends persist.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::Timestamp;

/// A single feed entry as seen by the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedRecord {
    pub id: Uuid,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Url,
}

impl FeedRecord {
    pub fn new(
        id: Uuid,
        description: Option<String>,
        location: Option<String>,
        url: Url,
    ) -> Self {
        Self {
            id,
            description,
            location,
            url,
        }
    }
}

/// Persistence-facing copy of a [`FeedRecord`].
///
/// Serialized with optional fields omitted when absent, which is the
/// reference on-disk encoding:
/// `{"id": "...", "description": "...", "location": "...", "url": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CachedRecord {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub url: Url,
}

impl From<&FeedRecord> for CachedRecord {
    fn from(record: &FeedRecord) -> Self {
        Self {
            id: record.id,
            description: record.description.clone(),
            location: record.location.clone(),
            url: record.url.clone(),
        }
    }
}

impl From<FeedRecord> for CachedRecord {
    fn from(record: FeedRecord) -> Self {
        Self {
            id: record.id,
            description: record.description,
            location: record.location,
            url: record.url,
        }
    }
}

impl From<CachedRecord> for FeedRecord {
    fn from(record: CachedRecord) -> Self {
        Self {
            id: record.id,
            description: record.description,
            location: record.location,
            url: record.url,
        }
    }
}

/// The single persisted unit: an ordered feed plus the instant it was cached.
///
/// At most one snapshot exists per store. Stores replace it wholesale on
/// insert and drop it entirely on delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub records: Vec<CachedRecord>,
    pub timestamp: Timestamp,
}

impl CacheSnapshot {
    pub fn new(records: Vec<CachedRecord>, timestamp: Timestamp) -> Self {
        Self { records, timestamp }
    }

    /// Map the cached records back into domain records, preserving order.
    pub fn into_feed(self) -> Vec<FeedRecord> {
        self.records.into_iter().map(FeedRecord::from).collect()
    }
}

/// Successful outcome of a store retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedFeed {
    /// No snapshot exists.
    Empty,
    /// The current snapshot.
    Found(CacheSnapshot),
}

impl CachedFeed {
    pub fn found(records: Vec<CachedRecord>, timestamp: Timestamp) -> Self {
        Self::Found(CacheSnapshot::new(records, timestamp))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn snapshot(&self) -> Option<&CacheSnapshot> {
        match self {
            Self::Empty => None,
            Self::Found(snapshot) => Some(snapshot),
        }
    }

    pub fn into_snapshot(self) -> Option<CacheSnapshot> {
        match self {
            Self::Empty => None,
            Self::Found(snapshot) => Some(snapshot),
        }
    }
}

impl From<Option<CacheSnapshot>> for CachedFeed {
    fn from(snapshot: Option<CacheSnapshot>) -> Self {
        snapshot.map_or(Self::Empty, Self::Found)
    }
}

/// Map a domain feed into its persistence-facing form, preserving order.
pub fn to_cached(feed: &[FeedRecord]) -> Vec<CachedRecord> {
    feed.iter().map(CachedRecord::from).collect()
}

// =============================================================================
// TESTS
// =============================================================================
