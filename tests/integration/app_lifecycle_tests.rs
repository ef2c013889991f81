/*!
 * Controller tests: single files, folders, and overwrite handling
 */

use std::fs;
use std::sync::Arc;

use officetrans::app_config::Config;
use officetrans::app_controller::Controller;
use officetrans::providers::MockTranslator;
use officetrans::translation::TranslationCache;

use crate::common;

fn test_config() -> Config {
    let mut config = Config::default();
    config.source_language = "zh".to_string();
    config.target_language = "en".to_string();
    config.translator.retry_backoff_ms = 1;
    config.cache.enabled = false;
    config
}

fn controller(translator: &MockTranslator) -> Controller {
    Controller::with_components(test_config(), Arc::new(translator.clone()), TranslationCache::new(false))
}

#[test]
fn test_controller_withComponents_shouldBeInitialized() {
    let controller = controller(&MockTranslator::working());
    assert!(controller.is_initialized());
    assert_eq!(controller.config().target_language, "en");
    assert!(!controller.cache().is_enabled());
}

#[tokio::test]
async fn test_translate_withSingleFile_shouldWriteNextToInput() {
    common::init_logging();
    let dir = common::create_temp_dir().unwrap();
    let input = common::write_document(dir.path(), "plan.docx.json", &common::sample_word()).unwrap();
    let translator = MockTranslator::working();

    let summary = controller(&translator).translate(input, None, false).await.unwrap();

    assert!(summary.success());
    assert_eq!(summary.succeeded, 1);
    let output = dir.path().join("plan.en.docx.json");
    assert!(output.exists());
    assert_eq!(summary.reports[0].output, output);
    assert!(common::read_document(&output).is_ok());
}

#[tokio::test]
async fn test_translate_withExistingOutput_shouldSkipUnlessForced() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::write_document(dir.path(), "deck.pptx.json", &common::sample_slides()).unwrap();
    let output = dir.path().join("deck.en.pptx.json");
    fs::write(&output, "placeholder").unwrap();
    let translator = MockTranslator::working();
    let controller = controller(&translator);

    let skipped = controller.translate(input.clone(), None, false).await.unwrap();
    assert_eq!(skipped.skipped, 1);
    assert!(skipped.reports.is_empty());
    assert_eq!(fs::read_to_string(&output).unwrap(), "placeholder");
    assert_eq!(translator.calls(), 0);

    let forced = controller.translate(input, None, true).await.unwrap();
    assert_eq!(forced.succeeded, 1);
    assert!(common::read_document(&output).is_ok());
}

#[tokio::test]
async fn test_translate_withFolder_shouldMirrorTreeIntoOutputDir() {
    let dir = common::create_temp_dir().unwrap();
    let input_dir = dir.path().join("in");
    let nested = input_dir.join("q1");
    fs::create_dir_all(&nested).unwrap();
    common::write_document(&input_dir, "book.xlsx.json", &common::sample_workbook()).unwrap();
    common::write_document(&nested, "paper.pdf.json", &common::sample_pdf()).unwrap();
    // previous output and unrelated files are ignored
    common::write_document(&input_dir, "book.en.xlsx.json", &common::sample_workbook()).unwrap();
    common::create_test_file(&input_dir, "notes.txt", "not a document").unwrap();
    let output_dir = dir.path().join("out");

    let summary = controller(&MockTranslator::working())
        .translate(input_dir, Some(output_dir.clone()), false)
        .await
        .unwrap();

    assert!(summary.success());
    assert_eq!(summary.succeeded, 2);
    assert!(output_dir.join("book.en.xlsx.json").exists());
    assert!(output_dir.join("q1").join("paper.en.pdf.json").exists());
    assert_eq!(summary.stats.segments_total, 6 + 3);
}

#[tokio::test]
async fn test_translate_withBrokenFile_shouldReportFailure() {
    let dir = common::create_temp_dir().unwrap();
    common::write_document(dir.path(), "good.docx.json", &common::sample_word()).unwrap();
    common::create_test_file(dir.path(), "bad.docx.json", "not json").unwrap();

    let summary = controller(&MockTranslator::working())
        .translate(dir.path().to_path_buf(), None, false)
        .await
        .unwrap();

    assert!(!summary.success());
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn test_translate_withMissingInput_shouldError() {
    let dir = common::create_temp_dir().unwrap();
    let result = controller(&MockTranslator::working())
        .translate(dir.path().join("missing.xlsx.json"), None, false)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_translate_withEmptyFolder_shouldError() {
    let dir = common::create_temp_dir().unwrap();
    common::create_test_file(dir.path(), "readme.md", "nothing here").unwrap();
    let result = controller(&MockTranslator::working())
        .translate(dir.path().to_path_buf(), None, false)
        .await;
    assert!(result.is_err());
}
