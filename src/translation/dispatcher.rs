/*!
 * Bounded-concurrency resolution of unique texts.
 *
 * The dispatcher answers what it can from the cache and sends the misses to
 * the translation service through a pool of workers. A shared semaphore
 * bounds the number of requests in flight; each item walks its own retry
 * state machine so one exhausted item never aborts the batch.
 *
 * Only the trimmed core of a text is sent and cached. The original padding
 * is restored around the result.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

use super::cache::{TranslationCache, truncate_text};
use super::formatting::Padded;
use crate::app_config::CoreSettings;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::Translator;

/// Upper bound for computed backoff delays
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Progress callback receiving `(done, total)` over unique misses
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Limits of one dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOptions {
    /// Requests in flight at most
    pub concurrency: usize,
    /// Deadline per attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay of the exponential backoff
    pub backoff_base: Duration,
    /// Texts per request when the service accepts batches
    pub batch_size: usize,
}

impl DispatchOptions {
    pub fn from_settings(settings: &CoreSettings) -> Self {
        Self {
            concurrency: settings.max_workers.max(1),
            timeout: settings.timeout,
            max_retries: settings.retry_count,
            backoff_base: settings.retry_backoff,
            batch_size: settings.batch_size.max(1),
        }
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from_settings(&CoreSettings::default())
    }
}

/// How one unique text was resolved
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationResult {
    /// Fresh translation from the service
    Translated(String),
    /// Served from the cache
    Cached(String),
    /// Retries exhausted or permanent failure; `fallback` is the original text
    Failed { fallback: String, reason: String },
}

impl TranslationResult {
    /// Text to write back
    pub fn text(&self) -> &str {
        match self {
            Self::Translated(text) | Self::Cached(text) => text,
            Self::Failed { fallback, .. } => fallback,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

/// Per-item retry state
#[derive(Debug, Clone, PartialEq)]
pub enum ItemState<T> {
    Pending,
    Attempting { attempt: u32 },
    Retrying { attempt: u32, delay: Duration },
    Succeeded(T),
    Failed(ProviderError),
}

/// Counters of one dispatch, over unique texts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub requested: usize,
    pub cache_hits: usize,
    pub translated: usize,
    pub failed: usize,
    /// Requests sent, retries included
    pub attempts: usize,
    pub retries: usize,
}

/// Resolution of every requested text
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Keyed by the text as requested
    pub results: HashMap<String, TranslationResult>,
    pub stats: DispatchStats,
}

impl DispatchOutcome {
    /// Text to write back for `source`; the source itself when unknown
    pub fn text_for<'a>(&'a self, source: &'a str) -> &'a str {
        self.results.get(source).map(TranslationResult::text).unwrap_or(source)
    }
}

/// Resolves unique texts through the cache and the translation service
pub struct Dispatcher {
    translator: Arc<dyn Translator>,
    cache: TranslationCache,
    options: DispatchOptions,
    progress: Option<ProgressCallback>,
}

impl Dispatcher {
    pub fn new(translator: Arc<dyn Translator>, cache: TranslationCache, options: DispatchOptions) -> Self {
        Self { translator, cache, options, progress: None }
    }

    /// Report progress over unique misses
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Resolve `texts`, which are expected to be unique.
    ///
    /// Fails only with `DispatchUnavailable` when the service cannot be
    /// reached before any request is sent. Per-item failures are folded
    /// into `TranslationResult::Failed`.
    pub async fn resolve(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<DispatchOutcome, TranslationError> {
        let mut outcome = DispatchOutcome::default();
        outcome.stats.requested = texts.len();

        // core -> original texts sharing it
        let mut misses: Vec<(String, Vec<String>)> = Vec::new();
        let mut miss_index: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let padded = Padded::split(text);
            if padded.core.is_empty() {
                outcome.results.insert(text.clone(), TranslationResult::Cached(text.clone()));
                continue;
            }
            if let Some(hit) = self.cache.get(padded.core, source_language, target_language) {
                outcome.stats.cache_hits += 1;
                outcome.results.insert(text.clone(), TranslationResult::Cached(padded.rewrap(&hit)));
                continue;
            }
            match miss_index.get(padded.core) {
                Some(&i) => misses[i].1.push(text.clone()),
                None => {
                    miss_index.insert(padded.core.to_string(), misses.len());
                    misses.push((padded.core.to_string(), vec![text.clone()]));
                }
            }
        }

        if misses.is_empty() {
            debug!("All {} texts served from cache", texts.len());
            return Ok(outcome);
        }

        self.preflight().await?;

        let total = misses.len();
        info!(
            "Dispatching {} texts to {} ({} cached, {} workers)",
            total,
            self.translator.name(),
            outcome.stats.cache_hits,
            self.options.concurrency
        );

        let cores: Vec<String> = misses.iter().map(|(core, _)| core.clone()).collect();
        let resolved = self.translate_all(&cores, source_language, target_language).await;

        let attempts = resolved.attempts;
        outcome.stats.attempts = attempts;
        outcome.stats.retries = attempts.saturating_sub(total);

        for (core, originals) in misses {
            match resolved.results.get(&core) {
                Some(Ok(translated)) => {
                    for original in originals {
                        outcome.stats.translated += 1;
                        let text = Padded::split(&original).rewrap(translated);
                        outcome.results.insert(original, TranslationResult::Translated(text));
                    }
                }
                failure => {
                    let reason = match failure {
                        Some(Err(e)) => e.to_string(),
                        _ => "no result".to_string(),
                    };
                    for original in originals {
                        outcome.stats.failed += 1;
                        outcome.results.insert(
                            original.clone(),
                            TranslationResult::Failed { fallback: original, reason: reason.clone() },
                        );
                    }
                }
            }
        }

        if outcome.stats.failed > 0 {
            warn!("{} of {} texts could not be translated, keeping originals", outcome.stats.failed, total);
        }
        Ok(outcome)
    }

    /// Check the service is reachable; only connection-class failures are fatal
    async fn preflight(&self) -> Result<(), TranslationError> {
        let check = tokio::time::timeout(self.options.timeout, self.translator.test_connection()).await;
        let error = match check {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e,
            Err(_) => ProviderError::Timeout(self.options.timeout.as_millis() as u64),
        };
        if error.is_unreachable() {
            return Err(TranslationError::DispatchUnavailable(error));
        }
        warn!("Connection check to {} failed, dispatching anyway: {}", self.translator.name(), error);
        Ok(())
    }

    async fn translate_all(&self, cores: &[String], source: &str, target: &str) -> Resolved {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
        let attempts = AtomicUsize::new(0);
        let done = AtomicUsize::new(0);
        let total = cores.len();

        let chunk_size = if self.translator.supports_batch() { self.options.batch_size } else { 1 };
        let worker = Worker {
            translator: self.translator.as_ref(),
            options: &self.options,
            semaphore: &semaphore,
            attempts: &attempts,
            source,
            target,
        };

        let chunks: Vec<Vec<(String, Result<String, ProviderError>)>> = stream::iter(cores.chunks(chunk_size))
            .map(|chunk| {
                let worker = &worker;
                let done = &done;
                async move {
                    let results = if chunk_size == 1 {
                        let result = worker.translate_item(&chunk[0]).await;
                        vec![(chunk[0].clone(), result)]
                    } else {
                        worker.translate_chunk(chunk).await
                    };

                    for (core, result) in &results {
                        if let Ok(translated) = result {
                            self.cache.set(core, source, target, translated);
                        }
                    }
                    self.cache.flush_if_due().await;

                    let finished = done.fetch_add(results.len(), Ordering::SeqCst) + results.len();
                    if let Some(progress) = &self.progress {
                        progress(finished, total);
                    }
                    results
                }
            })
            .buffer_unordered(self.options.concurrency)
            .collect()
            .await;

        Resolved {
            results: chunks.into_iter().flatten().collect(),
            attempts: attempts.load(Ordering::SeqCst),
        }
    }
}

struct Resolved {
    results: HashMap<String, Result<String, ProviderError>>,
    attempts: usize,
}

/// Borrowed context of one dispatch shared by every worker
struct Worker<'a> {
    translator: &'a dyn Translator,
    options: &'a DispatchOptions,
    semaphore: &'a Semaphore,
    attempts: &'a AtomicUsize,
    source: &'a str,
    target: &'a str,
}

impl Worker<'_> {
    async fn translate_item(&self, core: &str) -> Result<String, ProviderError> {
        let result = self
            .with_retry(|| async move {
                let translated = self.translator.translate_one(core, self.source, self.target).await?;
                non_empty(translated)
            })
            .await;
        if let Err(e) = &result {
            debug!("Giving up on '{}': {}", truncate_text(core, 30), e);
        }
        result
    }

    /// One batched request; items the batch could not translate are retried alone
    async fn translate_chunk(&self, chunk: &[String]) -> Vec<(String, Result<String, ProviderError>)> {
        let batch = self
            .with_retry(|| async move {
                let results = self.translator.translate_batch(chunk, self.source, self.target).await?;
                if results.len() != chunk.len() {
                    return Err(ProviderError::ParseError(format!(
                        "Batch returned {} results for {} texts",
                        results.len(),
                        chunk.len()
                    )));
                }
                Ok::<_, ProviderError>(results)
            })
            .await;

        let mut out = Vec::with_capacity(chunk.len());
        match batch {
            Ok(results) => {
                for (core, result) in chunk.iter().zip(results) {
                    match result.and_then(non_empty) {
                        Ok(translated) => out.push((core.clone(), Ok(translated))),
                        Err(e) if e.is_transient() => out.push((core.clone(), self.translate_item(core).await)),
                        Err(e) => out.push((core.clone(), Err(e))),
                    }
                }
            }
            Err(e) => {
                debug!("Batch of {} texts failed: {}", chunk.len(), e);
                for core in chunk {
                    out.push((core.clone(), Err(e.clone())));
                }
            }
        }
        out
    }

    /// Drive the retry state machine around `operation`.
    ///
    /// A permit is held for each attempt only, not while backing off.
    async fn with_retry<T, F, Fut>(&self, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut state = ItemState::Pending;
        loop {
            state = match state {
                ItemState::Pending => ItemState::Attempting { attempt: 0 },
                ItemState::Attempting { attempt } => {
                    let outcome = {
                        let _permit = self
                            .semaphore
                            .acquire()
                            .await
                            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
                        self.attempts.fetch_add(1, Ordering::SeqCst);
                        tokio::time::timeout(self.options.timeout, operation()).await
                    };
                    match outcome {
                        Ok(Ok(value)) => ItemState::Succeeded(value),
                        Ok(Err(e)) => self.after_failure(attempt, e),
                        Err(_) => self.after_failure(attempt, ProviderError::Timeout(self.options.timeout.as_millis() as u64)),
                    }
                }
                ItemState::Retrying { attempt, delay } => {
                    tokio::time::sleep(delay).await;
                    ItemState::Attempting { attempt: attempt + 1 }
                }
                ItemState::Succeeded(value) => return Ok(value),
                ItemState::Failed(e) => return Err(e),
            };
        }
    }

    fn after_failure<T>(&self, attempt: u32, error: ProviderError) -> ItemState<T> {
        if error.is_transient() && attempt < self.options.max_retries {
            let delay = backoff_delay(self.options.backoff_base, attempt, error.retry_after_ms());
            debug!("Attempt {} failed ({}), retrying in {:?}", attempt + 1, error, delay);
            ItemState::Retrying { attempt, delay }
        } else {
            ItemState::Failed(error)
        }
    }
}

fn non_empty(translated: String) -> Result<String, ProviderError> {
    if translated.trim().is_empty() {
        Err(ProviderError::ParseError("Empty translation".to_string()))
    } else {
        Ok(translated)
    }
}

/// Delay before retry number `attempt + 1`.
///
/// A server hint wins, capped like the computed delay. Otherwise
/// `base * 2^attempt`, capped, plus up to a quarter of jitter.
pub fn backoff_delay(base: Duration, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
    if let Some(ms) = retry_after_ms {
        return Duration::from_millis(ms).min(MAX_BACKOFF);
    }
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt)).min(MAX_BACKOFF);
    let jitter_ms = (exponential.as_millis() / 4) as u64;
    let jitter = if jitter_ms > 0 { rand::rng().random_range(0..=jitter_ms) } else { 0 };
    exponential + Duration::from_millis(jitter)
}
