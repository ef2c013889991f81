/*!
 * Tests for deduplication of repeated texts
 */

use officetrans::translation::dedup::{collapse, expand};

#[test]
fn test_collapse_withRepeatedTexts_shouldProduceOneItemPerDistinctText() {
    let texts: Vec<String> = (0..100).map(|i| format!("label {}", i % 7)).collect();
    let collapsed = collapse(&texts);
    assert_eq!(collapsed.len(), 7);
    assert_eq!(collapsed.index_of.len(), 100);
    let members: usize = collapsed.items.iter().map(|item| item.members.len()).sum();
    assert_eq!(members, 100);
}

#[test]
fn test_collapse_shouldTreatWhitespaceAndCaseAsDistinct() {
    let collapsed = collapse(&["Total", "total", " Total", "Total"]);
    assert_eq!(collapsed.unique_texts(), vec!["Total", "total", " Total"]);
}

#[test]
fn test_expand_shouldRestoreEveryPosition() {
    let texts = ["你好", "世界", "你好"];
    let collapsed = collapse(&texts);
    let translated = vec!["Hello".to_string(), "World".to_string()];
    assert_eq!(expand(&translated, &collapsed.index_of), vec!["Hello", "World", "Hello"]);
}

#[test]
fn test_collapse_withEmptyInput_shouldBeEmpty() {
    let collapsed = collapse::<&str>(&[]);
    assert!(collapsed.is_empty());
    assert!(expand(&[], &collapsed.index_of).is_empty());
}
