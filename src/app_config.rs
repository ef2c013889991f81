use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration module
/// This module handles loading, validating and saving configuration settings,
/// and derives the plain settings struct consumed by the translation core.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO, or "auto")
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation service settings
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Translation cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Document rewrite settings
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorKind {
    // @provider: Google Translate public endpoint
    #[default]
    Google,
    // @provider: Google Cloud Translation v2 (API key)
    GoogleCloud,
}

impl TranslatorKind {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Translate",
            Self::GoogleCloud => "Google Cloud Translation",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::GoogleCloud => "googlecloud".to_string(),
        }
    }

    // @returns: Whether the service needs an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::GoogleCloud)
    }
}

impl std::fmt::Display for TranslatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "googlecloud" | "google_cloud" | "google-cloud" => Ok(Self::GoogleCloud),
            _ => Err(anyhow!("Invalid translator type: {}", s)),
        }
    }
}

/// Translation service settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslatorConfig {
    /// Which service to call
    #[serde(default)]
    pub provider: TranslatorKind,

    /// Maximum number of in-flight requests
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Timeout per attempt in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first failed attempt
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base delay for exponential backoff in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Texts per request when the service accepts batches
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Endpoint override
    #[serde(default)]
    pub api_url: Option<String>,

    /// Requests per minute, unlimited when absent
    #[serde(default)]
    pub rate_limit: Option<u32>,

    /// Credential; read from the file or the environment, never written back
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            provider: TranslatorKind::default(),
            max_workers: default_max_workers(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            batch_size: default_batch_size(),
            api_url: None,
            rate_limit: None,
            api_key: None,
        }
    }
}

/// Durable cache backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Append-only JSON lines file
    #[default]
    Journal,
    /// SQLite database
    Sqlite,
}

/// Translation cache settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Whether the cache is consulted at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Storage backend
    #[serde(default)]
    pub backend: CacheBackend,

    /// Cache file location, defaults to the user cache directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Number of new entries that triggers a flush
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: usize,

    /// Seconds between periodic background flushes
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    /// Entries kept by `cache prune`
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            path: None,
            auto_save_interval: default_auto_save_interval(),
            flush_interval_secs: default_flush_interval_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    /// Resolved cache file path
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let file_name = match self.backend {
            CacheBackend::Journal => "translation_cache.jsonl",
            CacheBackend::Sqlite => "translation_cache.db",
        };
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("officetrans")
            .join(file_name)
    }
}

/// Document rewrite settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProcessorConfig {
    /// Font size multiplier for languages that expand text width
    #[serde(default = "default_font_size_adjustment")]
    pub font_size_adjustment: f64,

    /// Keep run structure and styles of rewritten units
    #[serde(default = "default_true")]
    pub preserve_formatting: bool,

    /// Snapshot and restore image anchors around the rewrite
    #[serde(default = "default_true")]
    pub image_protection: bool,

    /// Widen spreadsheet columns when translated text grows
    #[serde(default = "default_true")]
    pub smart_column_width: bool,

    /// Upper bound for widened columns, in characters
    #[serde(default = "default_max_column_width")]
    pub max_column_width: f64,

    /// Save documents even when some segments failed structurally
    #[serde(default)]
    pub allow_partial_save: bool,

    /// Number of files processed concurrently in folder mode
    #[serde(default = "default_parallel_files")]
    pub parallel_files: usize,

    /// Largest accepted input file
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            font_size_adjustment: default_font_size_adjustment(),
            preserve_formatting: true,
            image_protection: true,
            smart_column_width: true,
            max_column_width: default_max_column_width(),
            allow_partial_save: false,
            parallel_files: default_parallel_files(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Plain settings consumed by the translation core
#[derive(Debug, Clone, PartialEq)]
pub struct CoreSettings {
    /// Concurrency bound for external calls
    pub max_workers: usize,
    /// Deadline per attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub retry_count: u32,
    /// Base backoff delay
    pub retry_backoff: Duration,
    /// Texts per batched request
    pub batch_size: usize,
    /// Whether the cache is used
    pub cache_enabled: bool,
    /// Font size multiplier
    pub font_size_adjustment: f64,
    /// Whether image anchors are protected
    pub image_protection: bool,
    /// Whether columns are widened
    pub smart_column_width: bool,
    /// Column width cap
    pub max_column_width: f64,
    /// Whether run structure is kept
    pub preserve_formatting: bool,
    /// Whether failed documents are still saved
    pub allow_partial_save: bool,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Config::default().core_settings()
    }
}

fn default_source_language() -> String {
    "auto".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_max_workers() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_batch_size() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_auto_save_interval() -> usize {
    10
}

fn default_flush_interval_secs() -> u64 {
    30
}

fn default_max_entries() -> usize {
    10_000
}

fn default_font_size_adjustment() -> f64 {
    0.8
}

fn default_max_column_width() -> f64 {
    50.0
}

fn default_parallel_files() -> usize {
    2
}

fn default_max_file_size_mb() -> u64 {
    100
}

impl Config {
    /// Load the configuration file, or write a default one when it is missing.
    /// Environment overrides are applied afterwards in both cases.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            serde_json::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json)
                .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `OFFICETRANS_*` environment variables on top of the loaded values.
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary lookup, used by tests
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(name: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            match value.trim().parse::<T>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    warn!("Ignoring invalid value for {}", name);
                    None
                }
            }
        }

        if let Some(value) = lookup("OFFICETRANS_SOURCE_LANGUAGE") {
            self.source_language = value;
        }
        if let Some(value) = lookup("OFFICETRANS_TARGET_LANGUAGE") {
            self.target_language = value;
        }
        if let Some(value) = parsed("OFFICETRANS_TRANSLATOR", lookup("OFFICETRANS_TRANSLATOR")) {
            self.translator.provider = value;
        }
        if let Some(value) = parsed("OFFICETRANS_MAX_WORKERS", lookup("OFFICETRANS_MAX_WORKERS")) {
            self.translator.max_workers = value;
        }
        if let Some(value) = parsed("OFFICETRANS_TIMEOUT", lookup("OFFICETRANS_TIMEOUT")) {
            self.translator.timeout_secs = value;
        }
        if let Some(value) = parsed("OFFICETRANS_RETRY_COUNT", lookup("OFFICETRANS_RETRY_COUNT")) {
            self.translator.retry_count = value;
        }
        if let Some(value) = parsed("OFFICETRANS_BATCH_SIZE", lookup("OFFICETRANS_BATCH_SIZE")) {
            self.translator.batch_size = value;
        }
        if let Some(value) = parsed("OFFICETRANS_CACHE_ENABLED", lookup("OFFICETRANS_CACHE_ENABLED")) {
            self.cache.enabled = value;
        }
        if let Some(value) = lookup("OFFICETRANS_CACHE_PATH") {
            self.cache.path = Some(PathBuf::from(value));
        }
        if let Some(value) = parsed("OFFICETRANS_FONT_SIZE_ADJUSTMENT", lookup("OFFICETRANS_FONT_SIZE_ADJUSTMENT")) {
            self.processor.font_size_adjustment = value;
        }
        if let Some(value) = parsed("OFFICETRANS_IMAGE_PROTECTION", lookup("OFFICETRANS_IMAGE_PROTECTION")) {
            self.processor.image_protection = value;
        }

        let api_key = lookup("OFFICETRANS_API_KEY").or_else(|| lookup("GOOGLE_TRANSLATE_API_KEY"));
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            debug!("Using translation API key from environment");
            self.translator.api_key = Some(key);
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.source_language.eq_ignore_ascii_case("auto") {
            crate::language_utils::get_language_name(&self.source_language)?;
        }
        crate::language_utils::get_language_name(&self.target_language)?;

        if self.translator.max_workers == 0 {
            return Err(anyhow!("max_workers must be at least 1"));
        }
        if self.translator.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be at least 1"));
        }
        if self.translator.batch_size == 0 {
            return Err(anyhow!("batch_size must be at least 1"));
        }
        if self.cache.auto_save_interval == 0 {
            return Err(anyhow!("auto_save_interval must be at least 1"));
        }
        if self.cache.flush_interval_secs == 0 {
            return Err(anyhow!("flush_interval_secs must be at least 1"));
        }
        let ratio = self.processor.font_size_adjustment;
        if !(ratio > 0.0 && ratio <= 2.0) {
            return Err(anyhow!("font_size_adjustment must be within (0, 2], got {}", ratio));
        }
        if self.processor.max_column_width < 1.0 {
            return Err(anyhow!("max_column_width must be at least 1"));
        }
        if self.processor.parallel_files == 0 {
            return Err(anyhow!("parallel_files must be at least 1"));
        }

        if self.translator.provider.requires_api_key()
            && self.translator.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            return Err(anyhow!(
                "An API key is required for {}",
                self.translator.provider.display_name()
            ));
        }

        Ok(())
    }

    /// Derive the plain settings struct consumed by the translation core
    pub fn core_settings(&self) -> CoreSettings {
        CoreSettings {
            max_workers: self.translator.max_workers,
            timeout: Duration::from_secs(self.translator.timeout_secs),
            retry_count: self.translator.retry_count,
            retry_backoff: Duration::from_millis(self.translator.retry_backoff_ms),
            batch_size: self.translator.batch_size,
            cache_enabled: self.cache.enabled,
            font_size_adjustment: self.processor.font_size_adjustment,
            image_protection: self.processor.image_protection,
            smart_column_width: self.processor.smart_column_width,
            max_column_width: self.processor.max_column_width,
            preserve_formatting: self.processor.preserve_formatting,
            allow_partial_save: self.processor.allow_partial_save,
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translator: TranslatorConfig::default(),
            cache: CacheConfig::default(),
            processor: ProcessorConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
