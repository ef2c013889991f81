//! Word-processor documents: body paragraphs, tables and inline pictures.

use serde::{Deserialize, Serialize};

use super::model::{ImageData, MergeState, Paragraph, Table};
use super::{
    Document, DocumentFormat, DocumentRewriter, Locator, RewriteContext, Segment, SegmentSink,
    kind_mismatch, unresolved,
};
use crate::errors::{DocumentError, TranslationError};

/// A word-processor document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordDocument {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,

    #[serde(default)]
    pub tables: Vec<Table>,

    #[serde(default)]
    pub images: Vec<ImageData>,
}

/// Rewriter for word-processor documents
#[derive(Debug, Clone, Copy, Default)]
pub struct WordRewriter;

impl DocumentRewriter for WordRewriter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Word
    }

    fn extract(&self, document: &Document) -> Result<Vec<Segment>, DocumentError> {
        let Document::Word(doc) = document else {
            return Err(kind_mismatch(self.format(), document));
        };

        let mut sink = SegmentSink::default();
        for (index, paragraph) in doc.paragraphs.iter().enumerate() {
            if paragraph.has_text() {
                sink.push_runs(&paragraph.runs, Locator::Paragraph { index }, false);
            }
        }

        for (table_index, table) in doc.tables.iter().enumerate() {
            for (row_index, row) in table.rows.iter().enumerate() {
                for (col_index, cell) in row.iter().enumerate() {
                    // continuation cells share the starting cell's content
                    if cell.merge == MergeState::Continue {
                        continue;
                    }
                    for (p_index, paragraph) in cell.paragraphs.iter().enumerate() {
                        if paragraph.has_text() {
                            let locator = Locator::TableCell {
                                table: table_index,
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
        Ok(sink.finish())
    }

    fn replace(
        &self,
        document: &mut Document,
        segment: &Segment,
        text: &str,
        ctx: &RewriteContext,
    ) -> Result<(), TranslationError> {
        let Document::Word(doc) = document else {
            return Err(kind_mismatch(self.format(), document).into());
        };

        let paragraph = match segment.locator {
            Locator::Paragraph { index } => doc.paragraphs.get_mut(index),
            Locator::TableCell { table, row, col, paragraph } => doc
                .tables
                .get_mut(table)
                .and_then(|t| t.rows.get_mut(row))
                .and_then(|r| r.get_mut(col))
                .filter(|c| c.merge != MergeState::Continue)
                .and_then(|c| c.paragraphs.get_mut(paragraph)),
            _ => return Err(unresolved(segment, "not a word locator")),
        }
        .ok_or_else(|| unresolved(segment, "paragraph not found"))?;

        ctx.rewrite_runs(&mut paragraph.runs, text);
        Ok(())
    }
}
