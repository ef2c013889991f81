/*!
 * End-to-end tests of the per-file translation pipeline
 */

use std::sync::Arc;

use officetrans::document::spreadsheet::{CellValue, MergedRange};
use officetrans::document::ImageData;
use officetrans::document::{Document, DocumentRewriter, RewriterRegistry};
use officetrans::providers::MockTranslator;
use officetrans::storage::MemoryStore;
use officetrans::translation::{FileJob, FileState, Orchestrator, TranslationCache};

use crate::common;

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn extracted_texts(document: &Document) -> Vec<String> {
    RewriterRegistry::with_defaults()
        .get(document.format())
        .unwrap()
        .extract(document)
        .unwrap()
        .into_iter()
        .map(|s| s.text)
        .collect()
}

fn book_images(document: &Document) -> Vec<ImageData> {
    document.images().into_iter().cloned().collect()
}

#[tokio::test]
async fn test_translateTexts_shouldSkipNonProseAndCallOncePerDistinctText() {
    common::init_logging();
    let translator = MockTranslator::working().with_dictionary([("你好", "Hello")]);
    let orchestrator = common::mock_orchestrator(&translator, common::fast_settings());

    let result = orchestrator
        .translate_texts(&texts(&["你好", "123", "你好", "world@test.com"]), "zh", "en")
        .await
        .unwrap();

    assert_eq!(result, vec!["Hello", "123", "Hello", "world@test.com"]);
    assert_eq!(translator.calls(), 1);
}

#[tokio::test]
async fn test_processFile_withWorkbook_shouldTranslateAndKeepLayout() {
    common::init_logging();
    let dir = common::create_temp_dir().unwrap();
    let input = common::write_document(dir.path(), "report.xlsx.json", &common::sample_workbook()).unwrap();
    let output = dir.path().join("out").join("report.en.xlsx.json");
    let translator = MockTranslator::working().with_dictionary([
        ("季度报告", "Quarterly report"),
        ("收入", "Revenue"),
        ("重要说明", "Important note"),
    ]);
    let orchestrator = common::mock_orchestrator(&translator, common::fast_settings());

    let report = orchestrator.process_file(&input, &output, "en").await;

    assert!(report.success, "error: {:?}", report.error);
    assert_eq!(report.state, FileState::Saved);
    assert!(report.saved);
    assert_eq!(report.stats.segments_total, 6);
    assert_eq!(report.stats.translatable, 4);
    assert_eq!(report.stats.unique, 3);
    assert_eq!(report.stats.translated, 3);
    assert_eq!(translator.calls(), 3);

    let translated = common::read_document(&output).unwrap();
    let Document::Spreadsheet(book) = &translated else { panic!("kind changed") };
    let sheet = &book.sheets[0];
    assert_eq!(sheet.cell(1, 1).unwrap().text().as_deref(), Some("Quarterly report"));
    assert_eq!(sheet.cell(3, 1).unwrap().text().as_deref(), Some("Revenue"));
    assert_eq!(sheet.cell(4, 1).unwrap().text().as_deref(), Some("contact@example.com"));
    assert_eq!(sheet.cell(3, 2).unwrap().value, CellValue::Formula("=SUM(B2:B2)".into()));
    assert_eq!(sheet.merged, vec![MergedRange::new(1, 1, 1, 4)]);
    assert_eq!(sheet.images, book_images(&common::sample_workbook()));
}

#[tokio::test]
async fn test_processFile_withIdentityTranslations_shouldPreserveStructure() {
    let dir = common::create_temp_dir().unwrap();
    let samples = [
        ("book.xlsx.json", common::sample_workbook()),
        ("plan.docx.json", common::sample_word()),
        ("deck.pptx.json", common::sample_slides()),
        ("paper.pdf.json", common::sample_pdf()),
    ];

    for (name, original) in samples {
        let input = common::write_document(dir.path(), name, &original).unwrap();
        let output = dir.path().join(format!("identity.{}", name));
        // dictionary maps every text onto itself
        let identity: Vec<(String, String)> = extracted_texts(&original)
            .into_iter()
            .map(|t| (t.trim().to_string(), t.trim().to_string()))
            .collect();
        let translator = MockTranslator::working().with_dictionary(identity);
        let mut settings = common::fast_settings();
        settings.font_size_adjustment = 1.0;
        settings.smart_column_width = false;
        let orchestrator = common::mock_orchestrator(&translator, settings);

        let report = orchestrator.process_file(&input, &output, "en").await;
        assert!(report.success, "{}: {:?}", name, report.error);

        let rewritten = common::read_document(&output).unwrap();
        assert_eq!(extracted_texts(&rewritten).len(), extracted_texts(&original).len(), "{}", name);
        assert_eq!(rewritten, original, "{} changed under identity translation", name);

        let before: Vec<[u8; 32]> = original.images().iter().map(|i| i.digest()).collect();
        let after: Vec<[u8; 32]> = rewritten.images().iter().map(|i| i.digest()).collect();
        assert_eq!(before, after);
    }
}

#[tokio::test]
async fn test_processFile_shouldHonourWorkerBound() {
    let dir = common::create_temp_dir().unwrap();
    let paragraphs: Vec<_> = (0..24)
        .map(|i| officetrans::document::Paragraph::from_text(format!("第{}段内容", i)))
        .collect();
    let document = Document::Word(officetrans::document::WordDocument { paragraphs, ..Default::default() });
    let input = common::write_document(dir.path(), "long.docx.json", &document).unwrap();

    let translator = MockTranslator::slow(15);
    let mut settings = common::fast_settings();
    settings.max_workers = 4;
    let orchestrator = common::mock_orchestrator(&translator, settings);

    let report = orchestrator.process_file(&input, dir.path().join("long.en.docx.json"), "en").await;

    assert!(report.success);
    assert_eq!(report.stats.translated, 24);
    assert!(translator.peak_concurrency() <= 4, "peak was {}", translator.peak_concurrency());
}

#[tokio::test]
async fn test_processFile_twice_shouldServeSecondRunFromCache() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::write_document(dir.path(), "deck.pptx.json", &common::sample_slides()).unwrap();
    let translator = MockTranslator::working();
    let store = Arc::new(MemoryStore::new());
    let cache = TranslationCache::with_store(store.clone(), true, 10);
    let orchestrator = Orchestrator::new(Arc::new(translator.clone()), cache, common::fast_settings());

    let first = orchestrator.process_file(&input, dir.path().join("a.pptx.json"), "fr").await;
    let calls_after_first = translator.calls();
    let second = orchestrator.process_file(&input, dir.path().join("b.pptx.json"), "fr").await;

    assert!(first.success && second.success);
    assert_eq!(calls_after_first, 2);
    assert_eq!(translator.calls(), calls_after_first);
    assert_eq!(second.stats.cache_hits, 2);
    assert_eq!(second.stats.translated, 0);
    assert_eq!(store.records().len(), 2);
}

#[tokio::test]
async fn test_processFile_withFailingService_shouldWriteOriginalTexts() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::write_document(dir.path(), "paper.pdf.json", &common::sample_pdf()).unwrap();
    let output = dir.path().join("paper.en.pdf.json");
    let translator = MockTranslator::failing();
    let mut settings = common::fast_settings();
    settings.retry_count = 2;
    let orchestrator = common::mock_orchestrator(&translator, settings);

    let report = orchestrator.process_file(&input, &output, "en").await;

    assert!(report.success);
    assert_eq!(report.stats.failed, 2);
    // two distinct texts, each tried once plus two retries
    assert_eq!(translator.calls(), 6);
    assert_eq!(extracted_texts(&common::read_document(&output).unwrap()), vec!["摘要", "第 3 页", "3.14"]);
}

#[tokio::test]
async fn test_processFile_withRejectedKey_shouldNotRetry() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::write_document(dir.path(), "paper.pdf.json", &common::sample_pdf()).unwrap();
    let translator = MockTranslator::rejecting();
    let orchestrator = common::mock_orchestrator(&translator, common::fast_settings());

    let report = orchestrator.process_file(&input, dir.path().join("out.pdf.json"), "en").await;

    assert!(report.success);
    assert_eq!(translator.calls(), 2);
    assert_eq!(report.stats.failed, 2);
}

#[tokio::test]
async fn test_processFile_withUnreachableService_shouldFailWithoutSaving() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::write_document(dir.path(), "plan.docx.json", &common::sample_word()).unwrap();
    let output = dir.path().join("plan.en.docx.json");
    let orchestrator = common::mock_orchestrator(&MockTranslator::unreachable(), common::fast_settings());

    let report = orchestrator.process_file(&input, &output, "en").await;

    assert!(!report.success);
    assert_eq!(report.state, FileState::Failed);
    assert_eq!(report.reached, FileState::Deduplicated);
    assert!(!report.saved);
    assert!(!output.exists());
    assert!(report.error.unwrap().contains("unavailable"));
}

#[tokio::test]
async fn test_processFile_withPartialSaveEnabled_shouldKeepWorkingCopy() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::write_document(dir.path(), "plan.docx.json", &common::sample_word()).unwrap();
    let output = dir.path().join("plan.en.docx.json");
    let mut settings = common::fast_settings();
    settings.allow_partial_save = true;
    let orchestrator = common::mock_orchestrator(&MockTranslator::unreachable(), settings);

    let report = orchestrator.process_file(&input, &output, "en").await;

    assert!(!report.success);
    assert!(report.saved);
    assert_eq!(common::read_document(&output).unwrap(), common::sample_word());
}

#[tokio::test]
async fn test_processFiles_withOneBrokenFile_shouldFinishTheOthers() {
    let dir = common::create_temp_dir().unwrap();
    let good = common::write_document(dir.path(), "good.docx.json", &common::sample_word()).unwrap();
    let broken = common::create_test_file(dir.path(), "broken.xlsx.json", "{ truncated").unwrap();
    let other = common::write_document(dir.path(), "other.pdf.json", &common::sample_pdf()).unwrap();
    let jobs = vec![
        FileJob::new(&good, dir.path().join("good.en.docx.json")),
        FileJob::new(&broken, dir.path().join("broken.en.xlsx.json")),
        FileJob::new(&other, dir.path().join("other.en.pdf.json")),
    ];
    let orchestrator = common::mock_orchestrator(&MockTranslator::working(), common::fast_settings()).with_parallel_files(2);

    let reports = orchestrator.process_files(&jobs, "en").await;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].input, good);
    assert!(reports[0].success);
    assert!(!reports[1].success);
    assert_eq!(reports[1].reached, FileState::Pending);
    assert!(reports[2].success);
}
