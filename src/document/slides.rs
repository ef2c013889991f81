//! Slide decks: text frames and tables inside shapes, pictures at fixed positions.

use serde::{Deserialize, Serialize};

use super::model::{ImageData, MergeState, Paragraph, Table};
use super::{
    Document, DocumentFormat, DocumentRewriter, Locator, RewriteContext, RewriteReport, Segment,
    SegmentSink, kind_mismatch, unresolved,
};
use crate::errors::{DocumentError, TranslationError};

/// A slide deck
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    #[serde(default)]
    pub slides: Vec<Slide>,
}

/// One slide
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    pub shapes: Vec<Shape>,

    #[serde(default)]
    pub images: Vec<ImageData>,
}

/// A shape that may carry text or a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_frame: Option<TextFrame>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
}

/// Text body of a shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFrame {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,

    #[serde(default)]
    pub auto_fit: AutoFit,
}

/// Overflow behaviour of a text frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoFit {
    #[default]
    None,
    /// Grow the shape around the text
    ShapeToFitText,
    /// Shrink the text into the shape
    TextToFitShape,
}

/// Rewriter for slide decks
#[derive(Debug, Clone, Copy, Default)]
pub struct SlidesRewriter;

fn shape_at<'a>(deck: &'a mut Presentation, slide: usize, shape: usize) -> Option<&'a mut Shape> {
    deck.slides.get_mut(slide).and_then(|s| s.shapes.get_mut(shape))
}

impl DocumentRewriter for SlidesRewriter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Slides
    }

    fn extract(&self, document: &Document) -> Result<Vec<Segment>, DocumentError> {
        let Document::Slides(deck) = document else {
            return Err(kind_mismatch(self.format(), document));
        };

        let mut sink = SegmentSink::default();
        for (slide_index, slide) in deck.slides.iter().enumerate() {
            for (shape_index, shape) in slide.shapes.iter().enumerate() {
                if let Some(frame) = &shape.text_frame {
                    for (p_index, paragraph) in frame.paragraphs.iter().enumerate() {
                        if paragraph.has_text() {
                            let locator = Locator::Shape { slide: slide_index, shape: shape_index, paragraph: p_index };
                            sink.push_runs(&paragraph.runs, locator, false);
                        }
                    }
                }

                let Some(table) = &shape.table else { continue };
                for (row_index, row) in table.rows.iter().enumerate() {
                    for (col_index, cell) in row.iter().enumerate() {
                        if cell.merge == MergeState::Continue {
                            continue;
                        }
                        for (p_index, paragraph) in cell.paragraphs.iter().enumerate() {
                            if paragraph.has_text() {
                                let locator = Locator::ShapeTableCell {
                                    slide: slide_index,
                                    shape: shape_index,
                                    row: row_index,
                                    col: col_index,
                                    paragraph: p_index,
                                };
                                sink.push_runs(&paragraph.runs, locator, cell.merge == MergeState::Start);
                            }
                        }
                    }
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
        let Document::Slides(deck) = document else {
            return Err(kind_mismatch(self.format(), document).into());
        };

        let paragraph = match segment.locator {
            Locator::Shape { slide, shape, paragraph } => shape_at(deck, slide, shape)
                .and_then(|s| s.text_frame.as_mut())
                .and_then(|f| f.paragraphs.get_mut(paragraph)),
            Locator::ShapeTableCell { slide, shape, row, col, paragraph } => shape_at(deck, slide, shape)
                .and_then(|s| s.table.as_mut())
                .and_then(|t| t.rows.get_mut(row))
                .and_then(|r| r.get_mut(col))
                .filter(|c| c.merge != MergeState::Continue)
                .and_then(|c| c.paragraphs.get_mut(paragraph)),
            _ => return Err(unresolved(segment, "not a slide locator")),
        }
        .ok_or_else(|| unresolved(segment, "paragraph not found"))?;

        ctx.rewrite_runs(&mut paragraph.runs, text);
        Ok(())
    }

    /// Frames that received longer text shrink to fit instead of overflowing
    fn finish(
        &self,
        document: &mut Document,
        rewritten: &[(&Segment, &str)],
        _ctx: &RewriteContext,
        _report: &mut RewriteReport,
    ) -> Result<(), TranslationError> {
        let Document::Slides(deck) = document else {
            return Err(kind_mismatch(self.format(), document).into());
        };

        for (segment, text) in rewritten {
            let Locator::Shape { slide, shape, .. } = segment.locator else { continue };
            if text.chars().count() <= segment.text.chars().count() {
                continue;
            }
            if let Some(frame) = shape_at(deck, slide, shape).and_then(|s| s.text_frame.as_mut()) {
                if frame.auto_fit == AutoFit::None {
                    frame.auto_fit = AutoFit::TextToFitShape;
                }
            }
        }
        Ok(())
    }
}
