/*!
 * SQLite cache backend.
 *
 * One table keyed by a SHA-256 of the language pair and source text. WAL
 * mode keeps readers and the single writer from blocking each other and
 * gives crash safety without a separate journal.
 */

use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, params};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use super::{CacheRecord, CacheStore, LoadOutcome};
use crate::errors::CacheError;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed cache store
pub struct SqliteStore {
    path: PathBuf,
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening cache database at: {:?}", path);
        let conn = Connection::open(&path)?;
        initialize_schema(&conn)?;

        Ok(Self { path, connection: Mutex::new(conn) })
    }

    /// In-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { path: PathBuf::from(":memory:"), connection: Mutex::new(conn) })
    }

    /// Hash of the composite cache key
    pub fn key_hash(record: &CacheRecord) -> String {
        let mut hasher = Sha256::new();
        hasher.update(record.source_language.as_bytes());
        hasher.update([0x1f]);
        hasher.update(record.target_language.as_bytes());
        hasher.update([0x1f]);
        hasher.update(record.source_text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn upsert(conn: &Connection, records: &[CacheRecord]) -> Result<(), CacheError> {
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO translation_cache (
                key_hash, source_text, source_language, target_language, translated_text, last_used
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(key_hash) DO UPDATE SET
                translated_text = excluded.translated_text,
                last_used = excluded.last_used
            "#,
        )?;
        for record in records {
            stmt.execute(params![
                Self::key_hash(record),
                record.source_text,
                record.source_language,
                record.target_language,
                record.translation,
                record.last_used,
            ])?;
        }
        Ok(())
    }
}

/// Create tables on a fresh database
fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS translation_cache (
            key_hash TEXT PRIMARY KEY,
            source_text TEXT NOT NULL,
            source_language TEXT NOT NULL,
            target_language TEXT NOT NULL,
            translated_text TEXT NOT NULL,
            last_used INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_translation_cache_last_used
            ON translation_cache(last_used);
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [SCHEMA_VERSION],
    )?;
    debug!("Cache schema ready (v{})", SCHEMA_VERSION);
    Ok(())
}

impl CacheStore for SqliteStore {
    fn load(&self) -> Result<LoadOutcome, CacheError> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT source_text, source_language, target_language, translated_text, last_used
             FROM translation_cache ORDER BY last_used, rowid",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(CacheRecord {
                    source_text: row.get(0)?,
                    source_language: row.get(1)?,
                    target_language: row.get(2)?,
                    translation: row.get(3)?,
                    last_used: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LoadOutcome { records, dropped_tail: false })
    }

    fn append(&self, records: &[CacheRecord]) -> Result<(), CacheError> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        Self::upsert(&tx, records)?;
        tx.commit()?;
        Ok(())
    }

    fn compact(&self, records: &[CacheRecord]) -> Result<(), CacheError> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM translation_cache", [])?;
        Self::upsert(&tx, records)?;
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.connection.lock().execute("DELETE FROM translation_cache", [])?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
