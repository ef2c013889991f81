use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// This module validates and normalizes ISO 639-1 / 639-2 codes and holds the
/// per-language layout heuristics used when rewriting documents.
/// Pseudo code meaning "let the service detect the source language"
pub const AUTO_DETECT: &str = "auto";

/// ISO 639-2/B codes that differ from their 639-2/T form
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Languages whose text is usually denser than the languages they are
/// translated from; rewriting into them does not shrink fonts.
const COMPACT_SCRIPTS: &[&str] = &["zh", "ja", "ko"];

/// Strip region subtags such as `zh-CN` or `pt_BR`
fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Whether the code asks for source language detection
pub fn is_auto(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(AUTO_DETECT)
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = primary_subtag(code);

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some((_, part2t)) = PART2B_TO_PART2T.iter().find(|(b, _)| *b == normalized_code) {
            return Ok((*part2t).to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible.
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists; "auto" is kept.
pub fn normalize_code(code: &str) -> Result<String> {
    if is_auto(code) {
        return Ok(AUTO_DETECT.to_string());
    }
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;
    Ok(lang.to_639_1().map(str::to_string).unwrap_or(part2t))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Whether translated text in `target` is expected to need more room than
/// the source, which triggers the font size ratio on rewrite.
pub fn expands_text(target: &str) -> bool {
    let code = match normalize_code(target) {
        Ok(code) => code,
        Err(_) => return false,
    };
    !COMPACT_SCRIPTS.contains(&code.as_str())
}

/// Font that can render the target script, when the document font likely cannot
pub fn font_override_for(target: &str, current_font: Option<&str>) -> Option<&'static str> {
    const THAI_FONTS: [&str; 3] = ["th sarabunpsk", "tahoma", "arial unicode ms"];

    if normalize_code(target).ok()?.as_str() != "th" {
        return None;
    }
    let current = current_font?.to_lowercase();
    if THAI_FONTS.iter().any(|f| current.contains(f)) {
        None
    } else {
        Some("TH SarabunPSK")
    }
}
