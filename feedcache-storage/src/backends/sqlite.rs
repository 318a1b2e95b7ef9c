//! SQLite snapshot storage.
//!
//! Two tables: `feed_cache` holds at most one row with the snapshot
//! timestamp, `feed_record` holds the records keyed by their position in the
//! feed. Replace and remove each run in a single transaction.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use feedcache_core::{BackendKind, CacheSnapshot, CachedRecord, FeedCacheError, StorageError};
use rusqlite::{params, Connection, OptionalExtension};
use url::Url;
use uuid::Uuid;

use crate::traits::{SnapshotBackend, StoreResult};

/// Error type for opening a SQLite store.
#[derive(Debug, thiserror::Error)]
pub enum SqliteBackendError {
    #[error("Failed to open SQLite database: {0}")]
    Open(String),

    #[error("Failed to initialize schema: {0}")]
    Schema(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SqliteBackendError> for FeedCacheError {
    fn from(e: SqliteBackendError) -> Self {
        FeedCacheError::BackendUnavailable {
            backend: BackendKind::Sqlite,
            reason: e.to_string(),
        }
    }
}

/// Persists the snapshot in a SQLite database file.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, SqliteBackendError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path).map_err(|e| SqliteBackendError::Open(e.to_string()))?;
        tracing::debug!(path = %db_path.display(), "Opened SQLite store");
        Self::with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, SqliteBackendError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SqliteBackendError::Open(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, SqliteBackendError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS feed_cache (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                timestamp TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS feed_record (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL,
                description TEXT,
                location TEXT,
                url TEXT NOT NULL
            );",
        )
        .map_err(|e| SqliteBackendError::Schema(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl SnapshotBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn read(&self) -> StoreResult<Option<CacheSnapshot>> {
        let conn = self.conn.lock().map_err(StorageError::read)?;

        let stamp: Option<String> = conn
            .query_row("SELECT timestamp FROM feed_cache WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StorageError::read)?;
        let Some(stamp) = stamp else {
            return Ok(None);
        };
        let timestamp = DateTime::parse_from_rfc3339(&stamp)
            .map_err(StorageError::read)?
            .with_timezone(&Utc);

        let mut stmt = conn
            .prepare(
                "SELECT id, description, location, url FROM feed_record ORDER BY position",
            )
            .map_err(StorageError::read)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(StorageError::read)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, description, location, url) = row.map_err(StorageError::read)?;
            records.push(CachedRecord {
                id: Uuid::parse_str(&id).map_err(StorageError::read)?,
                description,
                location,
                url: Url::parse(&url).map_err(StorageError::read)?,
            });
        }

        Ok(Some(CacheSnapshot::new(records, timestamp)))
    }

    fn replace(&self, snapshot: &CacheSnapshot) -> StoreResult<()> {
        let mut conn = self.conn.lock().map_err(StorageError::write)?;
        let tx = conn.transaction().map_err(StorageError::write)?;

        tx.execute("DELETE FROM feed_record", [])
            .map_err(StorageError::write)?;
        tx.execute(
            "INSERT OR REPLACE INTO feed_cache (id, timestamp) VALUES (1, ?1)",
            params![snapshot
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Nanos, true)],
        )
        .map_err(StorageError::write)?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO feed_record (position, id, description, location, url)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(StorageError::write)?;
            for (position, record) in snapshot.records.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    record.id.to_string(),
                    record.description,
                    record.location,
                    record.url.as_str(),
                ])
                .map_err(StorageError::write)?;
            }
        }

        tx.commit().map_err(StorageError::write)
    }

    fn remove(&self) -> StoreResult<()> {
        let mut conn = self.conn.lock().map_err(StorageError::delete)?;
        let tx = conn.transaction().map_err(StorageError::delete)?;
        tx.execute("DELETE FROM feed_record", [])
            .map_err(StorageError::delete)?;
        tx.execute("DELETE FROM feed_cache", [])
            .map_err(StorageError::delete)?;
        tx.commit().map_err(StorageError::delete)
    }
}
