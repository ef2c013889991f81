/*!
 * Tests for text classification
 */

use officetrans::translation::{ClassifierConfig, TextClassifier};

#[test]
fn test_shouldTranslate_withSpreadsheetValues_shouldSkipNonProse() {
    let classifier = TextClassifier::default();
    let skipped = ["123", "world@test.com", "http://example.com/a?b=1", "=VLOOKUP(A2,B:C,2,0)", "€ 1.200,00", "  42  "];
    for text in skipped {
        assert!(!classifier.should_translate(text), "expected {:?} to be skipped", text);
    }
}

#[test]
fn test_shouldTranslate_withCjkSingleCharacter_shouldAccept() {
    let classifier = TextClassifier::default();
    assert!(classifier.should_translate("是"));
    assert!(classifier.should_translate("你好"));
    assert!(classifier.should_translate("第 3 页"));
    assert!(classifier.should_translate("안녕"));
}

#[test]
fn test_shouldTranslate_withShortLatinText_shouldRequireWord() {
    let classifier = TextClassifier::default();
    assert!(classifier.should_translate("OK"));
    assert!(!classifier.should_translate("x"));
    assert!(!classifier.should_translate("A1"));
}

#[test]
fn test_shouldTranslate_shouldBeDeterministic() {
    let classifier = TextClassifier::default();
    for text in ["Hello world", "2024-01-01", "SKU-1", "收入"] {
        let first = classifier.should_translate(text);
        for _ in 0..5 {
            assert_eq!(classifier.should_translate(text), first);
        }
    }
}

#[test]
fn test_minLength_withLargerThreshold_shouldStillAcceptWords() {
    let classifier = TextClassifier::new(ClassifierConfig { min_length: 10, extended_filters: true });
    assert!(classifier.should_translate("Total"));
    assert!(!classifier.should_translate("++--"));
}

#[test]
fn test_filter_shouldPreserveOrder() {
    let classifier = TextClassifier::default();
    let kept = classifier.filter(["Title", "12", "Summary", "a@b.io", "Notes"]);
    assert_eq!(kept, vec!["Title", "Summary", "Notes"]);
}
