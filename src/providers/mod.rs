/*!
 * Translation service clients.
 *
 * This module contains implementations of the [`Translator`] contract:
 * - Google: Google Translate free endpoint and Cloud Translation v2
 * - Mock: scripted, instrumented translator for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{TranslatorConfig, TranslatorKind};
use crate::errors::ProviderError;

pub mod google;
pub mod mock;

pub use self::google::GoogleTranslator;
pub use self::mock::{MockBehavior, MockTranslator};

/// Common trait for all translation services
///
/// Implementations must be usable from many workers at once.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Short service name for logs
    fn name(&self) -> &str;

    /// Translate a single text
    async fn translate_one(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Translate several texts in one call.
    ///
    /// The outer error fails the whole call; inner results are per text and
    /// in input order. The default sends one request per text.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<Result<String, ProviderError>>, ProviderError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.translate_one(text, source_language, target_language).await);
        }
        Ok(results)
    }

    /// Whether `translate_batch` maps to a real batch request
    fn supports_batch(&self) -> bool {
        false
    }

    /// Check that the service is reachable
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Build the configured translation service
pub fn build_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>, ProviderError> {
    match config.provider {
        TranslatorKind::Google | TranslatorKind::GoogleCloud => {
            Ok(Arc::new(GoogleTranslator::from_config(config)?))
        }
    }
}
