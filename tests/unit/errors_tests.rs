/*!
 * Tests for error types
 */

use officetrans::errors::{AppError, CacheError, DocumentError, ProviderError, TranslationError};

#[test]
fn test_providerError_isTransient_shouldSeparateRetryableFailures() {
    assert!(ProviderError::ConnectionError("reset".into()).is_transient());
    assert!(ProviderError::Timeout(1000).is_transient());
    assert!(ProviderError::ApiError { status_code: 503, message: String::new() }.is_transient());
    assert!(!ProviderError::ApiError { status_code: 400, message: String::new() }.is_transient());
    assert!(!ProviderError::AuthenticationError("denied".into()).is_transient());
    assert!(!ProviderError::ParseError("garbage".into()).is_transient());
}

#[test]
fn test_providerError_isUnreachable_shouldOnlyCoverConnectivity() {
    assert!(ProviderError::ConnectionError("refused".into()).is_unreachable());
    assert!(ProviderError::Timeout(5).is_unreachable());
    assert!(!ProviderError::RateLimitExceeded { message: String::new(), retry_after_ms: None }.is_unreachable());
}

#[test]
fn test_translationError_isRecoverable_shouldAbsorbPerItemFailures() {
    assert!(TranslationError::Classification("control character".into()).is_recoverable());
    assert!(TranslationError::TranslationService(ProviderError::Timeout(1)).is_recoverable());
    assert!(TranslationError::CacheIo(CacheError::Task("cancelled".into())).is_recoverable());
    assert!(!TranslationError::DispatchUnavailable(ProviderError::Timeout(1)).is_recoverable());
    assert!(!TranslationError::StructuralMutation("sheet 0 cell R1C1".into()).is_recoverable());
}

#[test]
fn test_errorConversions_shouldWrapSources() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let document: DocumentError = io.into();
    let translation: TranslationError = document.into();
    assert!(translation.to_string().contains("missing"));

    let app: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(app, AppError::Unknown(_)));
    let app: AppError = ProviderError::Timeout(10).into();
    assert!(app.to_string().contains("10 ms"));
}

#[test]
fn test_documentError_tooLarge_shouldFormatSizes() {
    let error = DocumentError::TooLarge { size_mb: 120.34, limit_mb: 100 };
    assert_eq!(error.to_string(), "Document is too large: 120.3 MB exceeds the 100 MB limit");
}
