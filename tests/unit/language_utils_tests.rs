/*!
 * Tests for language code utilities
 */

use officetrans::language_utils::{
    expands_text, get_language_name, is_auto, language_codes_match, normalize_code, normalize_to_part2t,
};

#[test]
fn test_normalizeToPart2t_shouldAcceptEveryCodeFamily() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("fra").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("pt_BR").unwrap(), "por");
    assert!(normalize_to_part2t("zz").is_err());
}

#[test]
fn test_languageCodesMatch_shouldCompareAcrossFormats() {
    assert!(language_codes_match("zh", "zho"));
    assert!(language_codes_match("zh-TW", "chi"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("auto", "auto"));
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("fr").unwrap(), "French");
    assert!(get_language_name("nope").is_err());
}

#[test]
fn test_expandsText_shouldExcludeCompactScripts() {
    assert!(expands_text("en"));
    assert!(expands_text("de"));
    assert!(!expands_text("zh-CN"));
    assert!(!expands_text("ja"));
    assert!(!expands_text("invalid"));
}

#[test]
fn test_isAuto_shouldIgnoreCaseAndPadding() {
    assert!(is_auto(" Auto "));
    assert!(!is_auto("en"));
    assert_eq!(normalize_code("eng").unwrap(), "en");
}
