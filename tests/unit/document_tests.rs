/*!
 * Tests for document rewriters and the JSON document store
 */

use std::collections::HashMap;

use officetrans::app_config::CoreSettings;
use officetrans::document::spreadsheet::CellValue;
use officetrans::document::{
    Document, DocumentFormat, DocumentRewriter, DocumentStore, JsonDocumentStore, RewriteContext, RewriterRegistry,
    Segment, SegmentId,
};
use officetrans::errors::{DocumentError, TranslationError};

use crate::common;

fn extract(document: &Document) -> Vec<Segment> {
    RewriterRegistry::with_defaults()
        .get(document.format())
        .unwrap()
        .extract(document)
        .unwrap()
}

fn translate_all(segments: &[Segment], f: impl Fn(&str) -> String) -> HashMap<SegmentId, String> {
    segments.iter().map(|s| (s.id, f(&s.text))).collect()
}

#[test]
fn test_extract_shouldListEveryTextUnitInOrder() {
    assert_eq!(extract(&common::sample_workbook()).len(), 6);
    assert_eq!(extract(&common::sample_word()).len(), 6);
    assert_eq!(extract(&common::sample_slides()).len(), 4);

    let pdf = extract(&common::sample_pdf());
    let texts: Vec<&str> = pdf.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["摘要", "第 3 页", "3.14"]);
}

#[test]
fn test_extract_withRichText_shouldRecordRunBoundaries() {
    let segments = extract(&common::sample_word());
    let rich = segments.iter().find(|s| s.text == "目标：提高效率").unwrap();
    assert!(rich.is_rich());
    assert_eq!(rich.style.font_size, Some(12.0));
}

#[test]
fn test_apply_withoutTranslations_shouldFallBackToOriginals() {
    let registry = RewriterRegistry::with_defaults();
    for original in [common::sample_workbook(), common::sample_word(), common::sample_slides(), common::sample_pdf()] {
        let rewriter = registry.get(original.format()).unwrap();
        let segments = rewriter.extract(&original).unwrap();
        let mut document = original.clone();

        let report = rewriter
            .apply(&mut document, &segments, &HashMap::new(), &RewriteContext::identity("en"))
            .unwrap();

        assert_eq!(report.fallbacks, segments.len());
        assert_eq!(report.units_rewritten, 0);
        assert_eq!(document, original, "{} changed without translations", original.format());
    }
}

#[test]
fn test_apply_withEmptyTranslation_shouldNeverWriteEmptyText() {
    let original = common::sample_pdf();
    let segments = extract(&original);
    let mut document = original.clone();
    let translations = translate_all(&segments, |_| "   ".to_string());

    let rewriter = RewriterRegistry::with_defaults();
    let report = rewriter
        .get(DocumentFormat::Pdf)
        .unwrap()
        .apply(&mut document, &segments, &translations, &RewriteContext::identity("en"))
        .unwrap();

    assert_eq!(report.fallbacks, 3);
    for segment in extract(&document) {
        assert!(!segment.text.trim().is_empty());
    }
}

#[test]
fn test_apply_withExpandingTarget_shouldShrinkFontsAndWidenColumns() {
    let original = common::sample_workbook();
    let segments = extract(&original);
    let mut document = original.clone();
    let translations = translate_all(&segments, |text| format!("{} translated into a much longer English phrase", text));
    let ctx = RewriteContext::new(&CoreSettings::default(), "en");

    let registry = RewriterRegistry::with_defaults();
    let report = registry
        .get(DocumentFormat::Spreadsheet)
        .unwrap()
        .apply(&mut document, &segments, &translations, &ctx)
        .unwrap();

    let Document::Spreadsheet(book) = &document else { panic!("kind changed") };
    let sheet = &book.sheets[0];
    // merged title keeps its width, the label column grows up to the cap
    assert_eq!(sheet.cell(1, 1).unwrap().font.size, Some(11.0));
    assert!(report.columns_widened >= 1);
    assert!(sheet.column_width(1) > sheet.default_column_width);
    assert!(sheet.column_width(1) <= 50.0);
    // picture column is capped lower
    assert!(sheet.column_width(2) <= 30.0);
    assert_eq!(sheet.cell(2, 2).unwrap().value, CellValue::Number(1200.0));
}

#[test]
fn test_apply_withCompactTarget_shouldKeepFontSizes() {
    let original = common::sample_pdf();
    let segments = extract(&original);
    let mut document = original.clone();
    let translations = translate_all(&segments, |_| "要約".to_string());
    let ctx = RewriteContext::new(&CoreSettings::default(), "ja");

    RewriterRegistry::with_defaults()
        .get(DocumentFormat::Pdf)
        .unwrap()
        .apply(&mut document, &segments, &translations, &ctx)
        .unwrap();

    let Document::Pdf(pdf) = &document else { panic!("kind changed") };
    assert_eq!(pdf.pages[0].blocks[0].runs[0].font.size, Some(16.0));
    assert_eq!(pdf.pages[0].blocks[0].runs[0].text, "要約");
}

#[test]
fn test_apply_withStaleLocator_shouldFailStructurally() {
    let original = common::sample_slides();
    let segments = extract(&original);
    let Document::Slides(mut deck) = original else { panic!("kind changed") };
    deck.slides[0].shapes.truncate(1);
    let mut document = Document::Slides(deck);

    let result = RewriterRegistry::with_defaults()
        .get(DocumentFormat::Slides)
        .unwrap()
        .apply(&mut document, &segments, &HashMap::new(), &RewriteContext::identity("en"));

    assert!(matches!(result, Err(TranslationError::StructuralMutation(_))));
}

#[test]
fn test_apply_withWrongDocumentKind_shouldFail() {
    let mut document = common::sample_pdf();
    let result = RewriterRegistry::with_defaults()
        .get(DocumentFormat::Word)
        .unwrap()
        .apply(&mut document, &[], &HashMap::new(), &RewriteContext::identity("en"));
    assert!(matches!(result, Err(TranslationError::Document(DocumentError::KindMismatch { .. }))));
}

#[test]
fn test_registry_forPath_shouldRejectUnknownExtensions() {
    let registry = RewriterRegistry::with_defaults();
    assert_eq!(registry.for_path("deck.PPTX").unwrap().format(), DocumentFormat::Slides);
    assert_eq!(registry.for_path("book.xlsx.json").unwrap().format(), DocumentFormat::Spreadsheet);
    assert!(matches!(registry.for_path("notes.md"), Err(DocumentError::UnsupportedFormat(_))));
    assert!(!RewriterRegistry::empty().supports(DocumentFormat::Pdf));
}

#[test]
fn test_jsonStore_shouldRoundTripAndCheckKind() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::write_document(dir.path(), "plan.docx.json", &common::sample_word()).unwrap();
    assert_eq!(common::read_document(&path).unwrap(), common::sample_word());

    let wrong = dir.path().join("plan.pdf.json");
    std::fs::copy(&path, &wrong).unwrap();
    assert!(matches!(JsonDocumentStore::new().open(&wrong), Err(DocumentError::KindMismatch { .. })));

    let garbage = common::create_test_file(dir.path(), "broken.xlsx.json", "{").unwrap();
    assert!(matches!(JsonDocumentStore::new().open(&garbage), Err(DocumentError::Parse(_))));
}
