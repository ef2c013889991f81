/*!
 * Translation caching functionality.
 *
 * Entries live in memory behind a read/write lock and are persisted through
 * a [`CacheStore`]. New entries collect in an unflushed increment that is
 * appended to the store every `auto_save_interval` writes, by the periodic
 * flush task, and on shutdown. A store failure switches the cache to
 * memory-only mode for the rest of the run.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::app_config::CacheConfig;
use crate::errors::CacheError;
use crate::storage::{self, CacheRecord, CacheStore};

/// Cache key combining normalized source text and language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// Source text, trimmed
    source_text: String,

    /// Source language code, lowercase
    source_language: String,

    /// Target language code, lowercase
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.trim().to_string(),
            source_language: source_language.trim().to_lowercase(),
            target_language: target_language.trim().to_lowercase(),
        }
    }

    fn from_record(record: &CacheRecord) -> Self {
        Self::new(&record.source_text, &record.source_language, &record.target_language)
    }
}

/// Cached translation plus last-used time
#[derive(Debug)]
struct CacheEntry {
    translation: String,
    last_used: AtomicI64,
}

impl CacheEntry {
    fn new(translation: String, last_used: i64) -> Self {
        Self { translation, last_used: AtomicI64::new(last_used) }
    }

    fn touch(&self) {
        self.last_used.store(now(), Ordering::Relaxed);
    }

    fn record(&self, key: &CacheKey) -> CacheRecord {
        CacheRecord {
            source_text: key.source_text.clone(),
            source_language: key.source_language.clone(),
            target_language: key.target_language.clone(),
            translation: self.translation.clone(),
            last_used: self.last_used.load(Ordering::Relaxed),
        }
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
    /// Entries not yet persisted
    pub pending: usize,
    /// The durable store failed and the cache runs in memory only
    pub degraded: bool,
}

struct CacheInner {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    /// Unflushed increment
    pending: Mutex<Vec<CacheRecord>>,
    /// Serializes every write to the durable store
    writer: Mutex<()>,
    store: Option<Arc<dyn CacheStore>>,
    degraded: AtomicBool,
    enabled: bool,
    auto_save_interval: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

/// Translation cache shared by the dispatcher and the orchestrator.
///
/// Cloning is cheap and every clone shares the same entries.
#[derive(Clone)]
pub struct TranslationCache {
    inner: Arc<CacheInner>,
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("enabled", &self.inner.enabled)
            .field("entries", &self.len())
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

impl TranslationCache {
    /// Cache without durable storage
    pub fn new(enabled: bool) -> Self {
        Self::build(None, enabled, usize::MAX)
    }

    fn build(store: Option<Arc<dyn CacheStore>>, enabled: bool, auto_save_interval: usize) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: RwLock::new(HashMap::new()),
                pending: Mutex::new(Vec::new()),
                writer: Mutex::new(()),
                store,
                degraded: AtomicBool::new(false),
                enabled,
                auto_save_interval: auto_save_interval.max(1),
                hits: AtomicUsize::new(0),
                misses: AtomicUsize::new(0),
            }),
        }
    }

    /// Cache backed by `store`, loading what it already holds.
    ///
    /// An unreadable store is not fatal: the cache starts empty in
    /// memory-only mode.
    pub fn with_store(store: Arc<dyn CacheStore>, enabled: bool, auto_save_interval: usize) -> Self {
        let cache = Self::build(Some(store.clone()), enabled, auto_save_interval);
        if !enabled {
            return cache;
        }

        match store.load() {
            Ok(outcome) => {
                {
                    let mut entries = cache.inner.entries.write();
                    for record in &outcome.records {
                        entries.insert(
                            CacheKey::from_record(record),
                            CacheEntry::new(record.translation.clone(), record.last_used),
                        );
                    }
                }
                info!("Translation cache loaded {} entries from {}", cache.len(), store.location());
                if outcome.dropped_tail {
                    if let Err(e) = cache.compact() {
                        warn!("Could not rewrite cache after dropping a corrupt tail: {}", e);
                    }
                }
            }
            Err(e) => cache.degrade(&e),
        }
        cache
    }

    /// Cache configured from application settings
    pub fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            return Self::new(false);
        }
        match storage::open_store(config) {
            Ok(store) => Self::with_store(store, true, config.auto_save_interval),
            Err(e) => {
                let cache = Self::new(true);
                cache.degrade(&e);
                cache
            }
        }
    }

    fn degrade(&self, error: &CacheError) {
        if !self.inner.degraded.swap(true, Ordering::SeqCst) {
            warn!("Translation cache store unavailable, continuing in memory only: {}", error);
        }
        self.inner.pending.lock().clear();
    }

    fn persistent_store(&self) -> Option<&Arc<dyn CacheStore>> {
        if self.is_degraded() {
            None
        } else {
            self.inner.store.as_ref()
        }
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if !self.inner.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let entries = self.inner.entries.read();
        match entries.get(&key) {
            Some(entry) => {
                entry.touch();
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}' ({} -> {})", truncate_text(source_text, 30), source_language, target_language);
                Some(entry.translation.clone())
            }
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Look up many texts at once; only hits are returned, keyed by the text as given
    pub fn get_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
        source_language: &str,
        target_language: &str,
    ) -> HashMap<String, String> {
        texts
            .iter()
            .filter_map(|text| {
                let text = text.as_ref();
                self.get(text, source_language, target_language)
                    .map(|translation| (text.to_string(), translation))
            })
            .collect()
    }

    /// Store a translation.
    ///
    /// Storing the same value again is a no-op; a different value replaces
    /// the entry. Returns whether anything changed.
    pub fn set(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) -> bool {
        if !self.inner.enabled {
            return false;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let record = {
            let mut entries = self.inner.entries.write();
            if let Some(existing) = entries.get(&key) {
                if existing.translation == translation {
                    existing.touch();
                    return false;
                }
            }
            let entry = CacheEntry::new(translation.to_string(), now());
            let record = entry.record(&key);
            entries.insert(key, entry);
            record
        };

        if self.persistent_store().is_some() {
            self.inner.pending.lock().push(record);
        }
        debug!("Cached translation for '{}' ({} -> {})", truncate_text(source_text, 30), source_language, target_language);
        true
    }

    /// Store many translations; returns how many entries changed
    pub fn set_batch(&self, translations: &HashMap<String, String>, source_language: &str, target_language: &str) -> usize {
        translations
            .iter()
            .filter(|(text, translation)| self.set(text, source_language, target_language, translation))
            .count()
    }

    /// Whether the unflushed increment reached the auto-save interval
    pub fn flush_due(&self) -> bool {
        self.inner.pending.lock().len() >= self.inner.auto_save_interval
    }

    /// Append the unflushed increment to the store.
    ///
    /// Returns the number of records written. On failure the cache degrades
    /// to memory-only mode and the error is returned for reporting.
    pub fn flush(&self) -> Result<usize, CacheError> {
        let Some(store) = self.persistent_store() else {
            return Ok(0);
        };
        let _writer = self.inner.writer.lock();
        let batch = std::mem::take(&mut *self.inner.pending.lock());
        if batch.is_empty() {
            return Ok(0);
        }

        match store.append(&batch) {
            Ok(()) => {
                debug!("Flushed {} cache entries to {}", batch.len(), store.location());
                Ok(batch.len())
            }
            Err(e) => {
                self.degrade(&e);
                Err(e)
            }
        }
    }

    /// Flush on a blocking thread
    pub async fn flush_async(&self) -> Result<usize, CacheError> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.flush())
            .await
            .map_err(|e| CacheError::Task(e.to_string()))?
    }

    /// Flush when the auto-save interval was reached; failures are logged
    pub async fn flush_if_due(&self) {
        if self.flush_due() {
            if let Err(e) = self.flush_async().await {
                warn!("Cache flush failed: {}", e);
            }
        }
    }

    /// Rewrite the store with the current entries
    pub fn compact(&self) -> Result<(), CacheError> {
        let Some(store) = self.persistent_store() else {
            return Ok(());
        };
        let _writer = self.inner.writer.lock();
        let records = self.snapshot();
        self.inner.pending.lock().clear();
        store.compact(&records).inspect_err(|e| self.degrade(e))
    }

    /// Flush and compact; call once before exit
    pub fn shutdown(&self) -> Result<(), CacheError> {
        self.flush()?;
        self.compact()
    }

    /// Shutdown on a blocking thread
    pub async fn shutdown_async(&self) -> Result<(), CacheError> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.shutdown())
            .await
            .map_err(|e| CacheError::Task(e.to_string()))?
    }

    /// Spawn a task that flushes every `interval`; aborted when the handle drops
    pub fn start_auto_flush(&self, interval: Duration) -> FlushTask {
        let cache = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = cache.flush_async().await {
                    warn!("Periodic cache flush failed: {}", e);
                }
            }
        });
        FlushTask { handle }
    }

    /// All entries as records, least recently used first
    fn snapshot(&self) -> Vec<CacheRecord> {
        let entries = self.inner.entries.read();
        let mut records: Vec<CacheRecord> = entries.iter().map(|(key, entry)| entry.record(key)).collect();
        records.sort_by(|a, b| a.last_used.cmp(&b.last_used).then_with(|| a.source_text.cmp(&b.source_text)));
        records
    }

    /// Keep only the `max_entries` most recently used entries; returns how many were removed
    pub fn prune(&self, max_entries: usize) -> Result<usize, CacheError> {
        let removed = {
            let mut entries = self.inner.entries.write();
            if entries.len() <= max_entries {
                return Ok(0);
            }
            let mut by_age: Vec<(CacheKey, i64)> = entries
                .iter()
                .map(|(k, e)| (k.clone(), e.last_used.load(Ordering::Relaxed)))
                .collect();
            by_age.sort_by_key(|(_, last_used)| *last_used);
            let excess = entries.len() - max_entries;
            for (key, _) in by_age.into_iter().take(excess) {
                entries.remove(&key);
            }
            excess
        };
        info!("Pruned {} least recently used cache entries", removed);
        self.compact()?;
        Ok(removed)
    }

    /// Clear the cache and its store
    pub fn clear(&self) -> Result<(), CacheError> {
        self.inner.entries.write().clear();
        self.inner.pending.lock().clear();
        self.inner.hits.store(0, Ordering::Relaxed);
        self.inner.misses.store(0, Ordering::Relaxed);
        debug!("Translation cache cleared");

        if let Some(store) = self.persistent_store() {
            let _writer = self.inner.writer.lock();
            store.clear().inspect_err(|e| self.degrade(e))?;
        }
        Ok(())
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.inner.hits.load(Ordering::Relaxed);
        let misses = self.inner.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            entries: self.len(),
            hits,
            misses,
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
            pending: self.inner.pending.lock().len(),
            degraded: self.is_degraded(),
        }
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    /// Whether the store failed and the cache runs in memory only
    pub fn is_degraded(&self) -> bool {
        self.inner.degraded.load(Ordering::SeqCst)
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Handle of the periodic flush task
pub struct FlushTask {
    handle: JoinHandle<()>,
}

impl FlushTask {
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for FlushTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
