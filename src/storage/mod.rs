/*!
 * Durable storage for the translation cache.
 *
 * Two backends implement [`CacheStore`]:
 * - `journal`: append-only JSON lines file, the default
 * - `sqlite`: SQLite database in WAL mode
 *
 * Stores are synchronous; the cache calls them from blocking tasks.
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app_config::{CacheBackend, CacheConfig};
use crate::errors::CacheError;

pub mod journal;
pub mod sqlite;

pub use self::journal::JournalStore;
pub use self::sqlite::SqliteStore;

/// One persisted cache entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Normalized source text
    #[serde(rename = "src_text")]
    pub source_text: String,
    #[serde(rename = "src")]
    pub source_language: String,
    #[serde(rename = "dst")]
    pub target_language: String,
    pub translation: String,
    /// Unix timestamp in seconds
    pub last_used: i64,
}

/// Records read back from a store
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Readable records, oldest first
    pub records: Vec<CacheRecord>,
    /// An unreadable tail was dropped; the store should be compacted
    pub dropped_tail: bool,
}

/// Persistence contract of the translation cache
pub trait CacheStore: Send + Sync {
    /// Read every record; a missing store yields nothing
    fn load(&self) -> Result<LoadOutcome, CacheError>;

    /// Persist new or replaced records
    fn append(&self, records: &[CacheRecord]) -> Result<(), CacheError>;

    /// Replace the whole store content with `records`
    fn compact(&self, records: &[CacheRecord]) -> Result<(), CacheError>;

    /// Remove every record
    fn clear(&self) -> Result<(), CacheError>;

    /// Human readable location for logs
    fn location(&self) -> String;
}

/// Open the configured backend
pub fn open_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, CacheError> {
    let path = config.resolved_path();
    Ok(match config.backend {
        CacheBackend::Journal => Arc::new(JournalStore::new(path)),
        CacheBackend::Sqlite => Arc::new(SqliteStore::open(path)?),
    })
}

/// Volatile store, used by tests and benchmarks
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CacheRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with records
    pub fn with_records(records: Vec<CacheRecord>) -> Self {
        Self { records: Mutex::new(records) }
    }

    /// Copy of the persisted records
    pub fn records(&self) -> Vec<CacheRecord> {
        self.records.lock().clone()
    }
}

impl CacheStore for MemoryStore {
    fn load(&self) -> Result<LoadOutcome, CacheError> {
        Ok(LoadOutcome { records: self.records(), dropped_tail: false })
    }

    fn append(&self, records: &[CacheRecord]) -> Result<(), CacheError> {
        self.records.lock().extend_from_slice(records);
        Ok(())
    }

    fn compact(&self, records: &[CacheRecord]) -> Result<(), CacheError> {
        *self.records.lock() = records.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.records.lock().clear();
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
