/*!
 * JSON lines cache journal.
 *
 * Each flush appends one record per line. Later lines win over earlier ones
 * for the same key. A crash mid-write can leave a partial last line; loading
 * keeps everything before the first unreadable line and reports the tail so
 * the cache can rewrite a clean file.
 */

use log::{debug, warn};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{CacheRecord, CacheStore, LoadOutcome};
use crate::errors::CacheError;
use crate::file_utils::FileManager;

/// Append-only journal file
#[derive(Debug, Clone)]
pub struct JournalStore {
    path: PathBuf,
}

impl JournalStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(records: &[CacheRecord]) -> Result<Vec<u8>, CacheError> {
        let mut buffer = Vec::with_capacity(records.len() * 96);
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }
        Ok(buffer)
    }
}

impl CacheStore for JournalStore {
    fn load(&self) -> Result<LoadOutcome, CacheError> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache journal at {:?}, starting empty", self.path);
                return Ok(LoadOutcome::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut outcome = LoadOutcome::default();
        let mut offset = 0;
        for line in content.split(|b| *b == b'\n') {
            let line_len = line.len() + 1;
            if line.iter().all(u8::is_ascii_whitespace) {
                offset += line_len;
                continue;
            }
            match serde_json::from_slice::<CacheRecord>(line) {
                Ok(record) => outcome.records.push(record),
                Err(_) => {
                    let dropped = content.len().saturating_sub(offset);
                    warn!(
                        "Cache journal {:?} has an unreadable tail, dropping {} bytes",
                        self.path, dropped
                    );
                    outcome.dropped_tail = true;
                    break;
                }
            }
            offset += line_len;
        }

        debug!("Loaded {} cache records from {:?}", outcome.records.len(), self.path);
        Ok(outcome)
    }

    fn append(&self, records: &[CacheRecord]) -> Result<(), CacheError> {
        if records.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&Self::encode(records)?)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    fn compact(&self, records: &[CacheRecord]) -> Result<(), CacheError> {
        FileManager::write_atomic(&self.path, &Self::encode(records)?)?;
        debug!("Compacted cache journal {:?} to {} records", self.path, records.len());
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
