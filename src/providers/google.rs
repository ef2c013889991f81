/*!
 * Google Translate client.
 *
 * Two endpoints are supported:
 * - the public `translate_a/single` endpoint used by the web widget, one text
 *   per request and no credential
 * - Cloud Translation v2, which takes an API key and accepts several `q`
 *   values per request
 *
 * The API key travels in the `X-Goog-Api-Key` header, never in the URL, so
 * it cannot leak through request errors or logs.
 */

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::Translator;
use crate::app_config::{TranslatorConfig, TranslatorKind};
use crate::errors::ProviderError;
use crate::language_utils;

/// Public endpoint
pub const FREE_API_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Cloud Translation v2 endpoint
pub const CLOUD_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

const API_KEY_HEADER: &str = "X-Goog-Api-Key";

#[derive(Debug, Deserialize)]
struct CloudResponse {
    data: CloudData,
}

#[derive(Debug, Deserialize)]
struct CloudData {
    translations: Vec<CloudTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudTranslation {
    translated_text: String,
}

/// Google Translate client
pub struct GoogleTranslator {
    kind: TranslatorKind,
    api_url: String,
    api_key: Option<String>,
    client: Client,
    timeout: Duration,
    /// Minimum spacing between requests when a rate limit is configured
    min_interval: Option<Duration>,
    last_request: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for GoogleTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslator")
            .field("kind", &self.kind)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GoogleTranslator {
    /// Client for the public endpoint
    pub fn free(timeout: Duration, max_idle_per_host: usize) -> Result<Self, ProviderError> {
        Self::build(TranslatorKind::Google, FREE_API_URL.to_string(), None, timeout, max_idle_per_host, None)
    }

    /// Client for Cloud Translation v2
    pub fn cloud(api_key: impl Into<String>, timeout: Duration, max_idle_per_host: usize) -> Result<Self, ProviderError> {
        Self::build(
            TranslatorKind::GoogleCloud,
            CLOUD_API_URL.to_string(),
            Some(api_key.into()),
            timeout,
            max_idle_per_host,
            None,
        )
    }

    /// Client from the translator settings
    pub fn from_config(config: &TranslatorConfig) -> Result<Self, ProviderError> {
        let api_url = config.api_url.clone().unwrap_or_else(|| match config.provider {
            TranslatorKind::Google => FREE_API_URL.to_string(),
            TranslatorKind::GoogleCloud => CLOUD_API_URL.to_string(),
        });
        if config.provider.requires_api_key() && config.api_key.is_none() {
            return Err(ProviderError::AuthenticationError(format!(
                "{} requires an API key",
                config.provider.display_name()
            )));
        }

        Self::build(
            config.provider,
            api_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
            config.max_workers,
            config.rate_limit,
        )
    }

    fn build(
        kind: TranslatorKind,
        api_url: String,
        api_key: Option<String>,
        timeout: Duration,
        max_idle_per_host: usize,
        rate_limit: Option<u32>,
    ) -> Result<Self, ProviderError> {
        // One idle connection per worker keeps the pool bounded by the dispatcher
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(max_idle_per_host.max(1))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!("officetrans/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e.without_url())))?;

        let min_interval = rate_limit
            .filter(|rpm| *rpm > 0)
            .map(|rpm| Duration::from_millis(60_000 / u64::from(rpm)));

        Ok(Self {
            kind,
            api_url,
            api_key,
            client,
            timeout,
            min_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Override the endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn is_cloud(&self) -> bool {
        self.kind == TranslatorKind::GoogleCloud
    }

    /// Wait until the configured request rate allows another call
    async fn throttle(&self) {
        let Some(interval) = self.min_interval else {
            return;
        };
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn map_send_error(&self, error: reqwest::Error) -> ProviderError {
        let error = error.without_url();
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout.as_millis() as u64)
        } else if error.is_connect() {
            ProviderError::ConnectionError(error.to_string())
        } else {
            ProviderError::RequestFailed(error.to_string())
        }
    }

    async fn translate_free(&self, text: &str, source: &str, target: &str) -> Result<String, ProviderError> {
        self.throttle().await;
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t"), ("q", text)])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = check_status(response).await?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.without_url().to_string()))?;
        parse_free_response(&body)
    }

    async fn translate_cloud(&self, texts: &[String], source: &str, target: &str) -> Result<Vec<String>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::AuthenticationError("API key missing".to_string()))?;

        let mut form: Vec<(&str, &str)> = texts.iter().map(|text| ("q", text.as_str())).collect();
        form.push(("target", target));
        form.push(("format", "text"));
        if !language_utils::is_auto(source) {
            form.push(("source", source));
        }

        self.throttle().await;
        let response = self
            .client
            .post(&self.api_url)
            .header(API_KEY_HEADER, api_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = check_status(response).await?;
        let body: CloudResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.without_url().to_string()))?;

        if body.data.translations.len() != texts.len() {
            return Err(ProviderError::ParseError(format!(
                "Expected {} translations, got {}",
                texts.len(),
                body.data.translations.len()
            )));
        }
        Ok(body
            .data
            .translations
            .into_iter()
            .map(|t| html_escape::decode_html_entities(&t.translated_text).into_owned())
            .collect())
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        self.kind.display_name()
    }

    async fn translate_one(&self, text: &str, source_language: &str, target_language: &str) -> Result<String, ProviderError> {
        if self.is_cloud() {
            let mut translations = self
                .translate_cloud(&[text.to_string()], source_language, target_language)
                .await?;
            translations
                .pop()
                .ok_or_else(|| ProviderError::ParseError("Empty translation list".to_string()))
        } else {
            self.translate_free(text, source_language, target_language).await
        }
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<Result<String, ProviderError>>, ProviderError> {
        if self.is_cloud() {
            let translations = self.translate_cloud(texts, source_language, target_language).await?;
            return Ok(translations.into_iter().map(Ok).collect());
        }

        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.translate_free(text, source_language, target_language).await);
        }
        Ok(results)
    }

    fn supports_batch(&self) -> bool {
        self.is_cloud()
    }

    /// HEAD request to the endpoint; any HTTP status counts as reachable
    async fn test_connection(&self) -> Result<(), ProviderError> {
        debug!("Testing connection to {}", self.api_url);
        match self.client.head(&self.api_url).send().await {
            Ok(response) => {
                debug!("{} answered the connection test with {}", self.name(), response.status());
                Ok(())
            }
            Err(e) => {
                let e = self.map_send_error(e);
                warn!("{} connection test failed: {}", self.name(), e);
                Err(e)
            }
        }
    }
}

/// Map a non-success status to a provider error
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_ms = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000));
    let message = response
        .text()
        .await
        .map(|body| body.chars().take(200).collect::<String>())
        .unwrap_or_default();

    Err(status_error(status, message, retry_after_ms))
}

fn status_error(status: StatusCode, message: String, retry_after_ms: Option<u64>) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded { message, retry_after_ms },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(format!("{} {}", status.as_u16(), message)),
        _ => ProviderError::ApiError { status_code: status.as_u16(), message },
    }
}

/// Concatenate the sentence chunks of a public endpoint response.
///
/// The payload looks like `[[["Hello","你好",null,null,10]],null,"zh",...]`.
fn parse_free_response(body: &serde_json::Value) -> Result<String, ProviderError> {
    let chunks = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| ProviderError::ParseError("Empty response from Google Translate".to_string()))?;

    let translated: String = chunks
        .iter()
        .filter_map(|chunk| chunk.get(0).and_then(|v| v.as_str()))
        .collect();

    if translated.is_empty() {
        return Err(ProviderError::ParseError("No translation found in response".to_string()));
    }
    Ok(html_escape::decode_html_entities(&translated).into_owned())
}
