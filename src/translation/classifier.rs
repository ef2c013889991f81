/*!
 * Decides whether a raw string is worth sending to a translation service.
 *
 * Rules run in a fixed order and stop at the first match:
 *
 * 1. empty or whitespace-only
 * 2. numbers, optionally with separators, sign, currency or percent
 * 3. email addresses
 * 4. URLs
 * 5. spreadsheet formulas (leading `=`)
 * 6. short strings without any word
 * 7. extended filters: pure symbols, dates, clock times, versions,
 *    measurements, file paths and single letter/digit codes
 *
 * Anything left is translated. Classification is pure; it never looks at
 * anything but the text itself.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::TranslationError;

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+(]?\s*[$€£¥₩₹฿]?\s*[-+]?\d[\d\s,.']*\s*%?\s*[$€£¥₩₹฿]?\)?$").unwrap()
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z][a-z0-9+.\-]*://|www\.)\S+$").unwrap()
});

static SYMBOLS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\W_]+$").unwrap());

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}[-/.]\d{1,2}[-/.]\d{1,2}|\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})$").unwrap()
});

static TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\d{1,2}:\d{2}(:\d{2})?(\s*[ap]\.?m\.?)?$").unwrap()
});

static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(v|ver\.?\s*|version\s*)\d+(\.\d+)*$|^\d+\.\d+\.\d+(\.\d+)?$").unwrap()
});

static MEASUREMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[-+]?\d+([.,]\d+)?\s*(mm|cm|m|km|kg|g|mg|ml|l|°c|°f|%|px|pt|em|rem|in|ft|kb|mb|gb|tb)$").unwrap()
});

static PATH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z]:\\|\\\\|/|\./|\.\./)\S*$|^\S+\.(exe|dll|pdf|docx?|xlsx?|xlsm|pptx?|csv|txt|png|jpe?g|gif|zip)$").unwrap()
});

static CODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-_#/.]*$").unwrap()
});

/// Classifier settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Strings shorter than this need a word to be translated
    pub min_length: usize,
    /// Apply the date/time/version/measurement/path/code filters
    pub extended_filters: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { min_length: 4, extended_filters: true }
    }
}

/// Stateless text classifier
#[derive(Debug, Clone, Default)]
pub struct TextClassifier {
    config: ClassifierConfig,
}

/// Ideographic and syllabic scripts where a single character is a word
fn is_word_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF       // CJK unified ideographs
        | 0x3400..=0x4DBF     // CJK extension A
        | 0x20000..=0x2A6DF   // CJK extension B
        | 0xF900..=0xFAFF     // CJK compatibility
        | 0x3040..=0x30FF     // Hiragana, Katakana
        | 0xAC00..=0xD7AF     // Hangul syllables
        | 0x0E00..=0x0E7F     // Thai
        | 0x0E80..=0x0EFF)    // Lao
}

/// A word is a run of two or more letters, or any single ideographic character
fn has_word(text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if is_word_char(c) {
            return true;
        }
        if c.is_alphabetic() {
            run += 1;
            if run >= 2 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

impl TextClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Whether `text` should be translated.
    ///
    /// Malformed input is never translated.
    pub fn should_translate(&self, text: &str) -> bool {
        self.classify(text).unwrap_or(false)
    }

    /// Classify `text`, reporting malformed input as an error
    pub fn classify(&self, text: &str) -> Result<bool, TranslationError> {
        if let Some(c) = text.chars().find(|&c| c.is_control() && !matches!(c, '\t' | '\n' | '\r')) {
            return Err(TranslationError::Classification(format!(
                "control character U+{:04X} in {} character segment",
                c as u32,
                text.chars().count()
            )));
        }

        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        if NUMERIC_REGEX.is_match(text) {
            return Ok(false);
        }
        if EMAIL_REGEX.is_match(text) {
            return Ok(false);
        }
        if URL_REGEX.is_match(text) {
            return Ok(false);
        }
        if text.starts_with('=') {
            return Ok(false);
        }
        if text.chars().count() < self.config.min_length && !has_word(text) {
            return Ok(false);
        }
        if self.config.extended_filters && Self::is_structured_token(text) {
            return Ok(false);
        }
        Ok(true)
    }

    /// Dates, times, versions, measurements, paths, symbols and codes
    fn is_structured_token(text: &str) -> bool {
        SYMBOLS_REGEX.is_match(text)
            || DATE_REGEX.is_match(text)
            || TIME_REGEX.is_match(text)
            || VERSION_REGEX.is_match(text)
            || MEASUREMENT_REGEX.is_match(text)
            || PATH_REGEX.is_match(text)
            || (CODE_REGEX.is_match(text)
                && text.chars().any(|c| c.is_ascii_digit())
                && text.chars().any(|c| c.is_ascii_alphabetic()))
    }

    /// Keep only the texts worth translating, preserving order
    pub fn filter<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        texts.into_iter().filter(|t| self.should_translate(t)).collect()
    }
}
