//! Process-local backend.

use std::sync::RwLock;

use feedcache_core::{CacheSnapshot, StorageError};

use crate::traits::{SnapshotBackend, StoreResult};

/// Holds the snapshot in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    slot: RwLock<Option<CacheSnapshot>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    fn read(&self) -> StoreResult<Option<CacheSnapshot>> {
        let slot = self.slot.read().map_err(StorageError::read)?;
        Ok(slot.clone())
    }

    fn replace(&self, snapshot: &CacheSnapshot) -> StoreResult<()> {
        let mut slot = self.slot.write().map_err(StorageError::write)?;
        *slot = Some(snapshot.clone());
        Ok(())
    }

    fn remove(&self) -> StoreResult<()> {
        let mut slot = self.slot.write().map_err(StorageError::delete)?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot(seconds: i64) -> CacheSnapshot {
        CacheSnapshot::new(Vec::new(), Utc.timestamp_opt(seconds, 0).unwrap())
    }

    #[test]
    fn test_starts_empty() {
        assert_eq!(InMemoryBackend::new().read(), Ok(None));
    }

    #[test]
    fn test_replace_then_remove() {
        let backend = InMemoryBackend::new();
        backend.replace(&snapshot(1)).unwrap();
        backend.replace(&snapshot(2)).unwrap();
        assert_eq!(backend.read(), Ok(Some(snapshot(2))));

        backend.remove().unwrap();
        backend.remove().unwrap();
        assert_eq!(backend.read(), Ok(None));
    }
}
