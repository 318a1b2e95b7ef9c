//! Configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{
    CachePolicy, CalendarZone, ConfigError, FeedCacheError, FeedCacheResult,
    DEFAULT_MAX_CACHE_AGE_DAYS,
};

/// Which storage backend a store is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Process-local memory; nothing survives the process.
    InMemory,
    /// A single JSON file.
    JsonFile,
    /// An LMDB environment directory.
    Lmdb,
    /// A SQLite database file.
    Sqlite,
}

impl BackendKind {
    /// Whether the backend needs a path on disk.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, Self::InMemory)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InMemory => "in_memory",
            Self::JsonFile => "json_file",
            Self::Lmdb => "lmdb",
            Self::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "in_memory" | "memory" => Ok(Self::InMemory),
            "json_file" | "json" => Ok(Self::JsonFile),
            "lmdb" => Ok(Self::Lmdb),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(ConfigError::InvalidValue {
                field: "backend".to_string(),
                value: s.to_string(),
                reason: "expected one of in_memory, json_file, lmdb, sqlite".to_string(),
            }),
        }
    }
}

/// Feed cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCacheConfig {
    /// Maximum snapshot age, in calendar days.
    pub max_cache_age_days: u32,
    pub backend: BackendKind,
    /// File or directory the backend persists to. Ignored for `InMemory`.
    pub store_path: PathBuf,
    /// LMDB map size in megabytes.
    pub lmdb_map_size_mb: usize,
    /// Calendar the maximum age is counted in.
    pub calendar_zone: CalendarZone,
}

impl Default for FeedCacheConfig {
    fn default() -> Self {
        Self {
            max_cache_age_days: DEFAULT_MAX_CACHE_AGE_DAYS,
            backend: BackendKind::JsonFile,
            store_path: PathBuf::from("feed-cache.json"),
            lmdb_map_size_mb: 10,
            calendar_zone: CalendarZone::Local,
        }
    }
}

impl FeedCacheConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `FEEDCACHE_MAX_AGE_DAYS`: Maximum cache age in days (default: 7)
    /// - `FEEDCACHE_BACKEND`: `in_memory`, `json_file`, `lmdb` or `sqlite` (default: json_file)
    /// - `FEEDCACHE_STORE_PATH`: Store file or directory (default: feed-cache.json)
    /// - `FEEDCACHE_LMDB_MAP_SIZE_MB`: LMDB map size (default: 10)
    /// - `FEEDCACHE_CALENDAR_ZONE`: `utc` or `local` (default: local)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_cache_age_days: std::env::var("FEEDCACHE_MAX_AGE_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_cache_age_days),
            backend: std::env::var("FEEDCACHE_BACKEND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.backend),
            store_path: std::env::var("FEEDCACHE_STORE_PATH")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            lmdb_map_size_mb: std::env::var("FEEDCACHE_LMDB_MAP_SIZE_MB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.lmdb_map_size_mb),
            calendar_zone: std::env::var("FEEDCACHE_CALENDAR_ZONE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.calendar_zone),
        }
    }

    /// Set the maximum cache age.
    pub fn with_max_age_days(mut self, days: u32) -> Self {
        self.max_cache_age_days = days;
        self
    }

    /// Set the backend and the path it persists to.
    pub fn with_backend(mut self, backend: BackendKind, store_path: impl Into<PathBuf>) -> Self {
        self.backend = backend;
        self.store_path = store_path.into();
        self
    }

    /// Set the LMDB map size.
    pub fn with_lmdb_map_size_mb(mut self, size: usize) -> Self {
        self.lmdb_map_size_mb = size;
        self
    }

    /// Set the calendar the maximum age is counted in.
    pub fn with_calendar_zone(mut self, zone: CalendarZone) -> Self {
        self.calendar_zone = zone;
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - max_cache_age_days > 0
    /// - lmdb_map_size_mb > 0
    /// - store_path is set for persistent backends
    pub fn validate(&self) -> FeedCacheResult<()> {
        if self.max_cache_age_days == 0 {
            return Err(FeedCacheError::Config(ConfigError::InvalidValue {
                field: "max_cache_age_days".to_string(),
                value: self.max_cache_age_days.to_string(),
                reason: "max_cache_age_days must be greater than 0".to_string(),
            }));
        }

        if self.lmdb_map_size_mb == 0 {
            return Err(FeedCacheError::Config(ConfigError::InvalidValue {
                field: "lmdb_map_size_mb".to_string(),
                value: self.lmdb_map_size_mb.to_string(),
                reason: "lmdb_map_size_mb must be greater than 0".to_string(),
            }));
        }

        if self.backend.is_persistent() && self.store_path.as_os_str().is_empty() {
            return Err(FeedCacheError::Config(ConfigError::MissingRequired {
                field: "store_path".to_string(),
            }));
        }

        Ok(())
    }

    /// Build the freshness policy this configuration describes.
    pub fn cache_policy(&self) -> CachePolicy<CalendarZone> {
        CachePolicy::in_zone(self.max_cache_age_days, self.calendar_zone)
    }
}

// =============================================================================
// TESTS
// =============================================================================
