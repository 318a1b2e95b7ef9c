//! Storage media behind [`crate::QueuedFeedStore`].

mod in_memory;
mod json_file;
mod lmdb;
mod sqlite;

pub use in_memory::InMemoryBackend;
pub use json_file::JsonFileBackend;
pub use lmdb::{LmdbBackend, LmdbBackendError};
pub use sqlite::{SqliteBackend, SqliteBackendError};
