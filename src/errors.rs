/*!
 * Error types for the officetrans application.
 *
 * This module contains custom error types for the different layers of the
 * translation engine, using the thiserror crate for ergonomic error definitions.
 * None of the messages carry translated content or credentials.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Description returned by the service
        message: String,
        /// Server supplied wait hint in milliseconds
        retry_after_ms: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// A single attempt exceeded its deadline
    #[error("Request timed out after {0} ms")]
    Timeout(u64),
}

impl ProviderError {
    /// Whether the failure is worth another attempt.
    ///
    /// Network trouble, timeouts, rate limiting and server side (5xx) errors
    /// are transient. Authentication, client side (4xx) errors and
    /// unparseable responses are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_)
            | Self::Timeout(_)
            | Self::RateLimitExceeded { .. }
            | Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 408,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }

    /// Whether the service could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::Timeout(_))
    }

    /// Server supplied retry hint, if any
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimitExceeded { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }
}

/// Errors raised by the durable cache store
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem failure while reading or writing the cache file
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cache record could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure reported by the SQLite backend
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The blocking flush task did not complete
    #[error("Cache flush task failed: {0}")]
    Task(String),
}

/// Errors raised while loading, rewriting or saving a document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// No rewriter is registered for the file extension
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Filesystem failure
    #[error("Document I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document snapshot could not be parsed
    #[error("Failed to parse document: {0}")]
    Parse(String),

    /// The input file exceeds the configured size limit
    #[error("Document is too large: {size_mb:.1} MB exceeds the {limit_mb} MB limit")]
    TooLarge {
        /// Actual size in megabytes
        size_mb: f64,
        /// Configured limit in megabytes
        limit_mb: u64,
    },

    /// A rewriter was handed a document of another kind
    #[error("Rewriter for {expected} cannot handle a {found} document")]
    KindMismatch {
        /// Kind the rewriter handles
        expected: &'static str,
        /// Kind it was given
        found: &'static str,
    },

    /// Image bytes changed during a rewrite
    #[error("Image {0} was modified during rewrite")]
    ImageModified(String),
}

/// Errors that can occur during translation of a document
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Malformed input text; the segment is skipped
    #[error("Classification error: {0}")]
    Classification(String),

    /// Durable cache store unreadable or unwritable; the run continues in memory
    #[error("Cache I/O error: {0}")]
    CacheIo(#[from] CacheError),

    /// Per-item service failure
    #[error("Translation service error: {0}")]
    TranslationService(#[from] ProviderError),

    /// The service could not be reached when dispatch started
    #[error("Translation service unavailable: {0}")]
    DispatchUnavailable(ProviderError),

    /// A segment locator could not be resolved against the document
    #[error("Structural mutation error: {0}")]
    StructuralMutation(String),

    /// Error while loading or saving the document
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

impl TranslationError {
    /// Whether the error has a safe fallback and should be absorbed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Classification(_) | Self::CacheIo(_) | Self::TranslationService(_)
        )
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
