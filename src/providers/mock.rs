/*!
 * Mock translator for testing.
 *
 * This module provides a scripted translator that simulates different behaviors:
 * - `MockTranslator::working()` - Always succeeds, from a dictionary or a tagged echo
 * - `MockTranslator::failing()` - Always fails with a transient server error
 * - `MockTranslator::unreachable()` - Connection refused, including the connection check
 *
 * Clones share their counters, so a test can hand one clone to the pipeline
 * and inspect the other.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Translator;
use crate::errors::ProviderError;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with a 503
    Failing,
    /// Always fails with an authentication error
    Rejecting,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
    /// Every text fails with a connection error `failures` times, then succeeds
    TransientThenSucceed { failures: usize },
    /// Connection refused, including the connection check
    Unreachable,
}

#[derive(Debug, Default)]
struct Counters {
    calls: AtomicUsize,
    batch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    per_text: Mutex<HashMap<String, usize>>,
}

/// Decrements the in-flight counter on drop
struct InFlight<'a>(&'a Counters);

impl<'a> InFlight<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock translator with call instrumentation
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    dictionary: Arc<HashMap<String, String>>,
    batch: bool,
    counters: Arc<Counters>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            dictionary: Arc::new(HashMap::new()),
            batch: false,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn flaky(failures: usize) -> Self {
        Self::new(MockBehavior::TransientThenSucceed { failures })
    }

    pub fn unreachable() -> Self {
        Self::new(MockBehavior::Unreachable)
    }

    /// Fixed translations; unknown texts echo as `[target] text`
    pub fn with_dictionary<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.dictionary = Arc::new(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Advertise batch support
    pub fn with_batch_support(mut self) -> Self {
        self.batch = true;
        self
    }

    /// Number of texts sent for translation
    pub fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    /// Number of `translate_batch` requests
    pub fn batch_calls(&self) -> usize {
        self.counters.batch_calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent requests observed
    pub fn peak_concurrency(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    /// Number of attempts for one text
    pub fn calls_for(&self, text: &str) -> usize {
        self.counters.per_text.lock().get(text).copied().unwrap_or(0)
    }

    fn translation_of(&self, text: &str, target_language: &str) -> String {
        self.dictionary
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", target_language, text))
    }

    /// One attempt for one text; counters are updated by the caller
    async fn respond(&self, text: &str, target_language: &str, count: usize, attempt: usize) -> Result<String, ProviderError> {
        match self.behavior {
            MockBehavior::Working => Ok(self.translation_of(text, target_language)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 503,
                message: "Simulated service failure".to_string(),
            }),

            MockBehavior::Rejecting => Err(ProviderError::AuthenticationError("Simulated invalid key".to_string())),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    Ok(self.translation_of(text, target_language))
                }
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.translation_of(text, target_language))
            }

            MockBehavior::TransientThenSucceed { failures } => {
                if attempt <= failures {
                    Err(ProviderError::ConnectionError(format!("Simulated reset (attempt {})", attempt)))
                } else {
                    Ok(self.translation_of(text, target_language))
                }
            }

            MockBehavior::Unreachable => Err(ProviderError::ConnectionError("Connection refused".to_string())),
        }
    }

    fn record(&self, text: &str) -> (usize, usize) {
        let count = self.counters.calls.fetch_add(1, Ordering::SeqCst);
        let mut per_text = self.counters.per_text.lock();
        let attempt = per_text.entry(text.to_string()).or_insert(0);
        *attempt += 1;
        (count, *attempt)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate_one(&self, text: &str, _source_language: &str, target_language: &str) -> Result<String, ProviderError> {
        let _in_flight = InFlight::enter(&self.counters);
        let (count, attempt) = self.record(text);
        self.respond(text, target_language, count, attempt).await
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<Result<String, ProviderError>>, ProviderError> {
        let _in_flight = InFlight::enter(&self.counters);
        self.counters.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.behavior == MockBehavior::Unreachable {
            return Err(ProviderError::ConnectionError("Connection refused".to_string()));
        }

        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            let (count, attempt) = self.record(text);
            results.push(self.respond(text, target_language, count, attempt).await);
        }
        Ok(results)
    }

    fn supports_batch(&self) -> bool {
        self.batch
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Unreachable => Err(ProviderError::ConnectionError("Connection refused".to_string())),
            _ => Ok(()),
        }
    }
}
