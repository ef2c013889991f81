/*!
 * Document model and format-preserving rewriters.
 *
 * A document is held fully in memory. Each format has a rewriter that
 * lists its text-bearing units as [`Segment`]s and writes translated text
 * back through the same structural locators:
 *
 * - `spreadsheet`: cells, rich cells, merged ranges, column widths
 * - `word`: body paragraphs and table cells
 * - `slides`: shape text frames and slide tables
 * - `pdf`: positioned text blocks
 *
 * Images are protected generically: anchors are snapshotted before the
 * substitution, restored afterwards and their bytes verified.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use log::{debug, warn};

use crate::app_config::CoreSettings;
use crate::errors::{DocumentError, TranslationError};
use crate::language_utils;

pub mod layout;
pub mod model;
pub mod pdf;
pub mod slides;
pub mod spreadsheet;
pub mod store;
pub mod word;

pub use self::model::{FontStyle, ImageAnchor, ImageData, Paragraph, TextRun};
pub use self::pdf::{PdfDocument, PdfRewriter};
pub use self::slides::{Presentation, SlidesRewriter};
pub use self::spreadsheet::{SpreadsheetRewriter, Workbook};
pub use self::store::{DocumentStore, JsonDocumentStore};
pub use self::word::{WordDocument, WordRewriter};

/// Supported document families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Spreadsheet,
    Word,
    Slides,
    Pdf,
}

impl DocumentFormat {
    /// Map a file extension to its format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xlsx" | "xls" | "xlsm" => Some(Self::Spreadsheet),
            "docx" | "doc" => Some(Self::Word),
            "pptx" | "ppt" => Some(Self::Slides),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect the format from a path; a trailing `.json` snapshot suffix is ignored
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_string_lossy().to_lowercase();
        let name = name.strip_suffix(".json").unwrap_or(&name);
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "spreadsheet",
            Self::Word => "word",
            Self::Slides => "slides",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An in-memory document of any supported kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Document {
    Spreadsheet(Workbook),
    Word(WordDocument),
    Slides(Presentation),
    Pdf(PdfDocument),
}

impl Document {
    pub fn format(&self) -> DocumentFormat {
        match self {
            Self::Spreadsheet(_) => DocumentFormat::Spreadsheet,
            Self::Word(_) => DocumentFormat::Word,
            Self::Slides(_) => DocumentFormat::Slides,
            Self::Pdf(_) => DocumentFormat::Pdf,
        }
    }

    /// Every embedded picture, in document order
    pub fn images(&self) -> Vec<&ImageData> {
        match self {
            Self::Spreadsheet(book) => book.sheets.iter().flat_map(|s| s.images.iter()).collect(),
            Self::Word(doc) => doc.images.iter().collect(),
            Self::Slides(deck) => deck.slides.iter().flat_map(|s| s.images.iter()).collect(),
            Self::Pdf(pdf) => pdf.pages.iter().flat_map(|p| p.images.iter()).collect(),
        }
    }

    fn images_mut(&mut self) -> Vec<&mut ImageData> {
        match self {
            Self::Spreadsheet(book) => book.sheets.iter_mut().flat_map(|s| s.images.iter_mut()).collect(),
            Self::Word(doc) => doc.images.iter_mut().collect(),
            Self::Slides(deck) => deck.slides.iter_mut().flat_map(|s| s.images.iter_mut()).collect(),
            Self::Pdf(pdf) => pdf.pages.iter_mut().flat_map(|p| p.images.iter_mut()).collect(),
        }
    }
}

/// Stable identifier of a segment within one extraction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub usize);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a segment lives inside its document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Locator {
    /// Spreadsheet cell
    Cell { sheet: usize, row: u32, col: u32 },
    /// Body paragraph of a word document
    Paragraph { index: usize },
    /// Paragraph in a word table cell
    TableCell { table: usize, row: usize, col: usize, paragraph: usize },
    /// Paragraph in a slide shape's text frame
    Shape { slide: usize, shape: usize, paragraph: usize },
    /// Paragraph in a slide table cell
    ShapeTableCell { slide: usize, shape: usize, row: usize, col: usize, paragraph: usize },
    /// Positioned PDF text block
    PdfBlock { page: usize, block: usize },
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell { sheet, row, col } => write!(f, "sheet {} cell R{}C{}", sheet, row, col),
            Self::Paragraph { index } => write!(f, "paragraph {}", index),
            Self::TableCell { table, row, col, paragraph } => {
                write!(f, "table {} cell ({}, {}) paragraph {}", table, row, col, paragraph)
            }
            Self::Shape { slide, shape, paragraph } => {
                write!(f, "slide {} shape {} paragraph {}", slide, shape, paragraph)
            }
            Self::ShapeTableCell { slide, shape, row, col, paragraph } => write!(
                f,
                "slide {} shape {} cell ({}, {}) paragraph {}",
                slide, shape, row, col, paragraph
            ),
            Self::PdfBlock { page, block } => write!(f, "page {} block {}", page, block),
        }
    }
}

/// Formatting captured at extraction time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSnapshot {
    /// Font size of the first run
    pub font_size: Option<f64>,
    /// Font family of the first run
    pub font_name: Option<String>,
    /// Character offsets where later runs start; empty for single-run units
    pub run_boundaries: Vec<usize>,
}

/// One text-bearing structural unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub text: String,
    pub locator: Locator,
    pub style: StyleSnapshot,
    pub in_merged_region: bool,
}

impl Segment {
    pub fn is_rich(&self) -> bool {
        !self.style.run_boundaries.is_empty()
    }
}

/// Numbers extracted units in order
#[derive(Debug, Default)]
pub(crate) struct SegmentSink {
    segments: Vec<Segment>,
}

impl SegmentSink {
    pub(crate) fn push(&mut self, text: String, locator: Locator, style: StyleSnapshot, in_merged_region: bool) {
        let id = SegmentId(self.segments.len());
        self.segments.push(Segment { id, text, locator, style, in_merged_region });
    }

    pub(crate) fn push_runs(&mut self, runs: &[TextRun], locator: Locator, in_merged_region: bool) {
        let style = StyleSnapshot {
            font_size: runs.first().and_then(|r| r.font.size),
            font_name: runs.first().and_then(|r| r.font.name.clone()),
            run_boundaries: model::run_boundaries(runs),
        };
        self.push(model::runs_text(runs), locator, style, in_merged_region);
    }

    pub(crate) fn finish(self) -> Vec<Segment> {
        self.segments
    }
}

/// Settings for one rewrite pass
#[derive(Debug, Clone)]
pub struct RewriteContext {
    /// Target language code
    pub target_language: String,
    /// Font size multiplier, present only when the target expands text
    pub font_ratio: Option<f64>,
    /// Snapshot and restore image anchors
    pub image_protection: bool,
    /// Widen spreadsheet columns
    pub smart_column_width: bool,
    /// Column width cap
    pub max_column_width: f64,
    /// Keep emptied runs instead of dropping them
    pub preserve_formatting: bool,
}

impl RewriteContext {
    pub fn new(settings: &CoreSettings, target_language: &str) -> Self {
        let ratio = settings.font_size_adjustment;
        let font_ratio = (language_utils::expands_text(target_language) && (ratio - 1.0).abs() > f64::EPSILON)
            .then_some(ratio);
        Self {
            target_language: target_language.to_string(),
            font_ratio,
            image_protection: settings.image_protection,
            smart_column_width: settings.smart_column_width,
            max_column_width: settings.max_column_width,
            preserve_formatting: settings.preserve_formatting,
        }
    }

    /// Rewrite settings that leave every style untouched
    pub fn identity(target_language: &str) -> Self {
        Self {
            target_language: target_language.to_string(),
            font_ratio: None,
            image_protection: true,
            smart_column_width: false,
            max_column_width: 50.0,
            preserve_formatting: true,
        }
    }

    /// Restyle a run for the target language
    pub fn restyle(&self, font: &mut FontStyle) {
        if let Some(ratio) = self.font_ratio {
            font.scale(ratio);
        }
        if let Some(name) = language_utils::font_override_for(&self.target_language, font.name.as_deref()) {
            font.name = Some(name.to_string());
        }
    }

    /// Write `text` into a run list and restyle what remains
    pub fn rewrite_runs(&self, runs: &mut Vec<TextRun>, text: &str) {
        // unchanged text keeps its run split
        if model::runs_text(runs) != text {
            model::replace_runs(runs, text, self.preserve_formatting);
        }
        for run in runs.iter_mut() {
            self.restyle(&mut run.font);
        }
    }
}

/// Outcome counters of one rewrite pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Units whose text was replaced
    pub units_rewritten: usize,
    /// Units that kept their original text
    pub fallbacks: usize,
    /// Columns that were widened
    pub columns_widened: usize,
    /// Image anchors put back after drifting
    pub anchors_restored: usize,
}

/// Format-specific extraction and substitution.
///
/// Implementations only need `extract`, `replace` and optionally `finish`;
/// `apply` drives them and adds image protection.
pub trait DocumentRewriter: Send + Sync {
    /// Format handled by this rewriter
    fn format(&self) -> DocumentFormat;

    /// List every text-bearing unit in document order
    fn extract(&self, document: &Document) -> Result<Vec<Segment>, DocumentError>;

    /// Replace the text of one unit at its locator
    fn replace(
        &self,
        document: &mut Document,
        segment: &Segment,
        text: &str,
        ctx: &RewriteContext,
    ) -> Result<(), TranslationError>;

    /// Post-substitution layout adjustments
    fn finish(
        &self,
        _document: &mut Document,
        _rewritten: &[(&Segment, &str)],
        _ctx: &RewriteContext,
        _report: &mut RewriteReport,
    ) -> Result<(), TranslationError> {
        Ok(())
    }

    /// Write translations back into the document.
    ///
    /// Every segment is rewritten; a missing or empty translation falls back
    /// to the segment's original text. Fails on the first unresolved locator.
    fn apply(
        &self,
        document: &mut Document,
        segments: &[Segment],
        translations: &HashMap<SegmentId, String>,
        ctx: &RewriteContext,
    ) -> Result<RewriteReport, TranslationError> {
        if document.format() != self.format() {
            return Err(DocumentError::KindMismatch {
                expected: self.format().name(),
                found: document.format().name(),
            }
            .into());
        }

        let protected = ctx.image_protection.then(|| ImageGuard::snapshot(document));
        let mut report = RewriteReport::default();
        let mut rewritten = Vec::with_capacity(segments.len());

        for segment in segments {
            let text = match translations.get(&segment.id).filter(|t| !t.trim().is_empty()) {
                Some(t) => {
                    report.units_rewritten += 1;
                    t.as_str()
                }
                None => {
                    report.fallbacks += 1;
                    segment.text.as_str()
                }
            };
            self.replace(document, segment, text, ctx)?;
            rewritten.push((segment, text));
        }

        self.finish(document, &rewritten, ctx, &mut report)?;

        if let Some(guard) = protected {
            report.anchors_restored = guard.restore(document)?;
        }

        debug!(
            "Rewrote {} {} units ({} fallbacks, {} columns widened)",
            report.units_rewritten,
            self.format(),
            report.fallbacks,
            report.columns_widened
        );
        Ok(report)
    }
}

/// Anchors and digests of every picture taken before a rewrite
struct ImageGuard {
    images: Vec<(String, ImageAnchor, [u8; 32])>,
}

impl ImageGuard {
    fn snapshot(document: &Document) -> Self {
        let images = document
            .images()
            .into_iter()
            .map(|img| (img.id.clone(), img.anchor.clone(), img.digest()))
            .collect();
        Self { images }
    }

    /// Put drifted anchors back and check that no picture bytes changed
    fn restore(self, document: &mut Document) -> Result<usize, DocumentError> {
        let mut restored = 0;
        let mut current = document.images_mut();
        if current.len() != self.images.len() {
            return Err(DocumentError::ImageModified(format!(
                "image count changed from {} to {}",
                self.images.len(),
                current.len()
            )));
        }
        for (image, (id, anchor, digest)) in current.iter_mut().zip(self.images) {
            if image.id != id || image.digest() != digest {
                return Err(DocumentError::ImageModified(id));
            }
            if image.anchor != anchor {
                warn!("Restoring drifted anchor of image {}", id);
                image.anchor = anchor;
                restored += 1;
            }
        }
        Ok(restored)
    }
}

/// Rewriters keyed by document format
pub struct RewriterRegistry {
    rewriters: HashMap<DocumentFormat, Box<dyn DocumentRewriter>>,
}

impl RewriterRegistry {
    /// Registry with no rewriters
    pub fn empty() -> Self {
        Self { rewriters: HashMap::new() }
    }

    /// Registry with the built-in rewriter for every format
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(SpreadsheetRewriter));
        registry.register(Box::new(WordRewriter));
        registry.register(Box::new(SlidesRewriter));
        registry.register(Box::new(PdfRewriter));
        registry
    }

    /// Add or replace the rewriter for its format
    pub fn register(&mut self, rewriter: Box<dyn DocumentRewriter>) {
        self.rewriters.insert(rewriter.format(), rewriter);
    }

    pub fn get(&self, format: DocumentFormat) -> Result<&dyn DocumentRewriter, DocumentError> {
        self.rewriters
            .get(&format)
            .map(|r| r.as_ref())
            .ok_or_else(|| DocumentError::UnsupportedFormat(format.to_string()))
    }

    /// Rewriter for a file path, chosen by extension
    pub fn for_path<P: AsRef<Path>>(&self, path: P) -> Result<&dyn DocumentRewriter, DocumentError> {
        let format = DocumentFormat::from_path(path.as_ref())
            .ok_or_else(|| DocumentError::UnsupportedFormat(path.as_ref().display().to_string()))?;
        self.get(format)
    }

    pub fn supports(&self, format: DocumentFormat) -> bool {
        self.rewriters.contains_key(&format)
    }
}

impl Default for RewriterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Error for a locator that no longer points at a text unit
pub(crate) fn unresolved(segment: &Segment, reason: &str) -> TranslationError {
    TranslationError::StructuralMutation(format!("{} {}: {}", segment.id, segment.locator, reason))
}

/// Error for a rewriter handed the wrong document kind
pub(crate) fn kind_mismatch(expected: DocumentFormat, document: &Document) -> DocumentError {
    DocumentError::KindMismatch { expected: expected.name(), found: document.format().name() }
}
