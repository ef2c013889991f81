//! PDF documents as positioned text blocks. Block geometry is kept as is.

use serde::{Deserialize, Serialize};

use super::model::{ImageData, TextRun};
use super::{
    Document, DocumentFormat, DocumentRewriter, Locator, RewriteContext, Segment, SegmentSink,
    kind_mismatch, unresolved,
};
use crate::errors::{DocumentError, TranslationError};

/// A PDF document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfDocument {
    #[serde(default)]
    pub pages: Vec<Page>,
}

/// One page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,

    #[serde(default)]
    pub blocks: Vec<TextBlock>,

    #[serde(default)]
    pub images: Vec<ImageData>,
}

/// Text laid out in a rectangle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// `[x0, y0, x1, y1]` in points
    pub bbox: [f64; 4],

    #[serde(default)]
    pub runs: Vec<TextRun>,
}

/// Rewriter for PDF documents
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRewriter;

impl DocumentRewriter for PdfRewriter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, document: &Document) -> Result<Vec<Segment>, DocumentError> {
        let Document::Pdf(pdf) = document else {
            return Err(kind_mismatch(self.format(), document));
        };

        let mut sink = SegmentSink::default();
        for (page_index, page) in pdf.pages.iter().enumerate() {
            for (block_index, block) in page.blocks.iter().enumerate() {
                if block.runs.iter().any(|r| !r.text.trim().is_empty()) {
                    sink.push_runs(&block.runs, Locator::PdfBlock { page: page_index, block: block_index }, false);
                }
            }
        }
        Ok(sink.finish())
    }

    fn replace(
        &self,
        document: &mut Document,
        segment: &Segment,
        text: &str,
        ctx: &RewriteContext,
    ) -> Result<(), TranslationError> {
        let Document::Pdf(pdf) = document else {
            return Err(kind_mismatch(self.format(), document).into());
        };
        let Locator::PdfBlock { page, block } = segment.locator else {
            return Err(unresolved(segment, "not a pdf locator"));
        };

        let block = pdf
            .pages
            .get_mut(page)
            .and_then(|p| p.blocks.get_mut(block))
            .ok_or_else(|| unresolved(segment, "text block not found"))?;
        ctx.rewrite_runs(&mut block.runs, text);
        Ok(())
    }
}
