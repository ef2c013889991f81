/*!
 * Tests for application configuration
 */

use std::collections::HashMap;
use std::time::Duration;

use officetrans::app_config::{CacheBackend, Config, LogLevel, TranslatorKind};

fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("officetrans.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    assert_eq!(config.translator.max_workers, 5);
    assert_eq!(config.cache.backend, CacheBackend::Journal);
    assert!(config.validate().is_ok());
}

#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("officetrans.json");
    std::fs::write(
        &path,
        r#"{"target_language": "fr", "translator": {"provider": "googlecloud", "max_workers": 8}, "log_level": "debug"}"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();

    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translator.provider, TranslatorKind::GoogleCloud);
    assert_eq!(config.translator.max_workers, 8);
    assert_eq!(config.translator.retry_count, 3);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!((config.processor.font_size_adjustment - 0.8).abs() < f64::EPSILON);
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("officetrans.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_serialize_shouldNeverWriteApiKey() {
    let mut config = Config::default();
    config.translator.api_key = Some("super-secret".to_string());
    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("super-secret"));
    assert!(!json.contains("api_key"));
}

#[test]
fn test_applyOverrides_shouldReplaceFileValues() {
    let mut config = Config::default();
    config.apply_overrides(overrides(&[
        ("OFFICETRANS_TARGET_LANGUAGE", "de"),
        ("OFFICETRANS_TRANSLATOR", "google-cloud"),
        ("OFFICETRANS_MAX_WORKERS", "12"),
        ("OFFICETRANS_CACHE_ENABLED", "false"),
        ("GOOGLE_TRANSLATE_API_KEY", "env-key"),
    ]));

    assert_eq!(config.target_language, "de");
    assert_eq!(config.translator.provider, TranslatorKind::GoogleCloud);
    assert_eq!(config.translator.max_workers, 12);
    assert!(!config.cache.enabled);
    assert_eq!(config.translator.api_key.as_deref(), Some("env-key"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_applyOverrides_withGarbage_shouldKeepPreviousValue() {
    let mut config = Config::default();
    config.apply_overrides(overrides(&[("OFFICETRANS_MAX_WORKERS", "many"), ("OFFICETRANS_API_KEY", "  ")]));
    assert_eq!(config.translator.max_workers, 5);
    assert!(config.translator.api_key.is_none());
}

#[test]
fn test_validate_shouldRejectInconsistentValues() {
    let mut config = Config::default();
    config.translator.max_workers = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.target_language = "klingon".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.processor.font_size_adjustment = 0.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translator.provider = TranslatorKind::GoogleCloud;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.source_language = "auto".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_coreSettings_shouldMirrorConfig() {
    let mut config = Config::default();
    config.translator.timeout_secs = 7;
    config.translator.retry_backoff_ms = 250;
    config.processor.allow_partial_save = true;

    let settings = config.core_settings();

    assert_eq!(settings.timeout, Duration::from_secs(7));
    assert_eq!(settings.retry_backoff, Duration::from_millis(250));
    assert!(settings.allow_partial_save);
    assert!(settings.cache_enabled);
}

#[test]
fn test_resolvedPath_shouldFollowBackend() {
    let mut config = Config::default();
    assert!(config.cache.resolved_path().ends_with("officetrans/translation_cache.jsonl"));
    config.cache.backend = CacheBackend::Sqlite;
    assert!(config.cache.resolved_path().ends_with("officetrans/translation_cache.db"));
}
