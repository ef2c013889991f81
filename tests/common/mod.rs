/*!
 * Common test utilities for the officetrans test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use officetrans::app_config::CoreSettings;
use officetrans::document::model::{ImageAnchor, ImageData, MergeState, Paragraph, Table, TableCell};
use officetrans::document::pdf::{Page, TextBlock};
use officetrans::document::slides::{Shape, Slide, TextFrame};
use officetrans::document::spreadsheet::{CellValue, MergedRange, Worksheet};
use officetrans::document::{
    Document, DocumentStore, FontStyle, JsonDocumentStore, PdfDocument, Presentation, TextRun, WordDocument,
    Workbook,
};
use officetrans::providers::MockTranslator;
use officetrans::translation::{Orchestrator, TranslationCache};

/// Install a test logger once; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Persist a document snapshot under `dir`
pub fn write_document(dir: &Path, filename: &str, document: &Document) -> Result<PathBuf> {
    let path = dir.join(filename);
    JsonDocumentStore::new().save(document, &path)?;
    Ok(path)
}

/// Load a document snapshot
pub fn read_document(path: &Path) -> Result<Document> {
    Ok(JsonDocumentStore::new().open(path)?)
}

/// Core settings with a short backoff so retry tests stay fast
pub fn fast_settings() -> CoreSettings {
    CoreSettings {
        retry_backoff: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
        ..CoreSettings::default()
    }
}

/// Orchestrator over a mock translator and an in-memory cache
pub fn mock_orchestrator(translator: &MockTranslator, settings: CoreSettings) -> Orchestrator {
    Orchestrator::new(Arc::new(translator.clone()), TranslationCache::new(true), settings)
        .with_source_language("zh")
}

/// Small opaque payload standing in for a PNG
pub fn image(id: &str, anchor: ImageAnchor) -> ImageData {
    ImageData { id: id.to_string(), bytes: vec![0x89, b'P', b'N', b'G', 1, 2, 3, id.len() as u8], anchor }
}

fn sized(size: f64) -> FontStyle {
    FontStyle { size: Some(size), ..FontStyle::default() }
}

/// Workbook with a merged title, repeated labels, non-prose cells, a rich
/// cell and a picture anchored in column 2
pub fn sample_workbook() -> Document {
    let mut sheet = Worksheet::new("Report");
    sheet.set(1, 1, CellValue::Text("季度报告".into())).font = sized(14.0);
    sheet.merged.push(MergedRange::new(1, 1, 1, 4));

    sheet.set(2, 1, CellValue::Text("收入".into()));
    sheet.set(2, 2, CellValue::Number(1200.0));
    sheet.set(3, 1, CellValue::Text("收入".into()));
    sheet.set(3, 2, CellValue::Formula("=SUM(B2:B2)".into()));
    sheet.set(4, 1, CellValue::Text("contact@example.com".into()));
    sheet.set(4, 2, CellValue::Text("2024-01-01".into()));
    sheet.set(
        5,
        1,
        CellValue::Rich(vec![TextRun::styled("重要", sized(11.0)), TextRun::new("说明")]),
    );
    sheet.images.push(image(
        "chart1",
        ImageAnchor::TwoCell { from_row: 6, from_col: 2, to_row: 12, to_col: 4 },
    ));

    Document::Spreadsheet(Workbook { sheets: vec![sheet] })
}

/// Word document with body paragraphs, a table with a horizontal merge and
/// an inline picture
pub fn sample_word() -> Document {
    let cell = |text: &str, merge: MergeState| TableCell { paragraphs: vec![Paragraph::from_text(text)], merge };
    Document::Word(WordDocument {
        paragraphs: vec![
            Paragraph::from_text("项目概述"),
            Paragraph { runs: vec![TextRun::styled("目标", sized(12.0)), TextRun::new("：提高效率")], style: None },
            Paragraph::from_text("42"),
        ],
        tables: vec![Table {
            rows: vec![
                vec![cell("合并单元格", MergeState::Start), cell("", MergeState::Continue)],
                vec![cell("项目", MergeState::None), cell("100%", MergeState::None)],
            ],
        }],
        images: vec![image("logo", ImageAnchor::Inline { paragraph: 0 })],
    })
}

/// Slide deck with a title shape, a table shape and an absolute picture
pub fn sample_slides() -> Document {
    let frame = |texts: &[&str]| TextFrame {
        paragraphs: texts.iter().map(|t| Paragraph::from_text(*t)).collect(),
        ..TextFrame::default()
    };
    let table = Table {
        rows: vec![vec![
            TableCell { paragraphs: vec![Paragraph::from_text("销售")], merge: MergeState::None },
            TableCell { paragraphs: vec![Paragraph::from_text("https://example.com")], merge: MergeState::None },
        ]],
    };
    Document::Slides(Presentation {
        slides: vec![Slide {
            shapes: vec![
                Shape { name: "Title".into(), text_frame: Some(frame(&["年度总结", "销售"])), table: None },
                Shape { name: "Table".into(), text_frame: None, table: Some(table) },
            ],
            images: vec![image("photo", ImageAnchor::Absolute { x: 10.0, y: 20.0, width: 300.0, height: 200.0 })],
        }],
    })
}

/// Single page PDF text layer
pub fn sample_pdf() -> Document {
    Document::Pdf(PdfDocument {
        pages: vec![Page {
            width: 595.0,
            height: 842.0,
            blocks: vec![
                TextBlock { bbox: [50.0, 50.0, 300.0, 70.0], runs: vec![TextRun::styled("摘要", sized(16.0))] },
                TextBlock { bbox: [50.0, 80.0, 300.0, 100.0], runs: vec![TextRun::new("第 3 页")] },
                TextBlock { bbox: [50.0, 110.0, 300.0, 130.0], runs: vec![TextRun::new("3.14")] },
            ],
            images: vec![image("figure", ImageAnchor::Absolute { x: 50.0, y: 200.0, width: 100.0, height: 80.0 })],
        }],
    })
}
