/*!
 * Spreadsheet documents.
 *
 * Cells are addressed by sheet index plus 1-based row and column. Formula,
 * number and boolean cells never become segments. A merged range is
 * represented once, by its anchor cell.
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::layout::{self, DEFAULT_COLUMN_WIDTH, IMAGE_COLUMN_MAX_WIDTH};
use super::model::{FontStyle, ImageData, TextRun, runs_text};
use super::{
    Document, DocumentFormat, DocumentRewriter, Locator, RewriteContext, RewriteReport, Segment,
    SegmentSink, StyleSnapshot, kind_mismatch, unresolved,
};
use crate::errors::{DocumentError, TranslationError};

/// A workbook of sheets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Worksheet>,
}

/// One worksheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    pub name: String,

    #[serde(default)]
    pub cells: Vec<Cell>,

    /// Merged ranges
    #[serde(default)]
    pub merged: Vec<MergedRange>,

    /// Explicit column widths in characters, keyed by column
    #[serde(default)]
    pub column_widths: BTreeMap<u32, f64>,

    /// Width of columns without an explicit entry
    #[serde(default = "default_column_width")]
    pub default_column_width: f64,

    #[serde(default)]
    pub images: Vec<ImageData>,
}

fn default_column_width() -> f64 {
    DEFAULT_COLUMN_WIDTH
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
            merged: Vec::new(),
            column_widths: BTreeMap::new(),
            default_column_width: DEFAULT_COLUMN_WIDTH,
            images: Vec::new(),
        }
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    pub fn cell_mut(&mut self, row: u32, col: u32) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.row == row && c.col == col)
    }

    /// Set a cell value, creating the cell when needed
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) -> &mut Cell {
        let index = match self.cells.iter().position(|c| c.row == row && c.col == col) {
            Some(i) => {
                self.cells[i].value = value;
                i
            }
            None => {
                self.cells.push(Cell { row, col, value, font: FontStyle::default() });
                self.cells.len() - 1
            }
        };
        &mut self.cells[index]
    }

    pub fn column_width(&self, col: u32) -> f64 {
        self.column_widths.get(&col).copied().unwrap_or(self.default_column_width)
    }

    /// Anchor cell of every merged range.
    ///
    /// The top-left cell is the anchor when it bears text; otherwise the first
    /// text-bearing cell of the range in row-major order takes its place, so
    /// content stored away from the corner is still translated exactly once.
    fn merged_anchors(&self) -> Vec<(u32, u32)> {
        self.merged
            .iter()
            .map(|range| {
                let top_left = (range.first_row, range.first_col);
                if self.cell(top_left.0, top_left.1).is_some_and(Cell::bears_text) {
                    return top_left;
                }
                let mut inside: Vec<&Cell> = self
                    .cells
                    .iter()
                    .filter(|c| range.contains(c.row, c.col) && c.bears_text())
                    .collect();
                inside.sort_by_key(|c| (c.row, c.col));
                inside.first().map(|c| (c.row, c.col)).unwrap_or(top_left)
            })
            .collect()
    }

    /// Columns that host a picture
    fn image_columns(&self) -> HashSet<u32> {
        self.images.iter().flat_map(|img| img.anchor.columns()).collect()
    }
}

/// A rectangular merged range, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRange {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl MergedRange {
    pub fn new(first_row: u32, first_col: u32, last_row: u32, last_col: u32) -> Self {
        Self { first_row, first_col, last_row, last_col }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.first_row..=self.last_row).contains(&row) && (self.first_col..=self.last_col).contains(&col)
    }
}

/// Cell content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    /// Formula source including the leading `=`
    Formula(String),
    Text(String),
    /// Text split into differently formatted runs
    Rich(Vec<TextRun>),
}

/// A populated cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,

    #[serde(default)]
    pub value: CellValue,

    /// Cell level font
    #[serde(default)]
    pub font: FontStyle,
}

impl Cell {
    /// Text content, for text and rich cells only
    pub fn text(&self) -> Option<String> {
        match &self.value {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Rich(runs) => Some(runs_text(runs)),
            _ => None,
        }
    }

    fn bears_text(&self) -> bool {
        self.text().is_some_and(|t| !t.is_empty())
    }
}

/// Rewriter for workbooks
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetRewriter;

impl DocumentRewriter for SpreadsheetRewriter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Spreadsheet
    }

    fn extract(&self, document: &Document) -> Result<Vec<Segment>, DocumentError> {
        let Document::Spreadsheet(book) = document else {
            return Err(kind_mismatch(self.format(), document));
        };

        let mut sink = SegmentSink::default();
        for (sheet_index, sheet) in book.sheets.iter().enumerate() {
            let anchors = sheet.merged_anchors();
            let mut cells: Vec<&Cell> = sheet.cells.iter().filter(|c| c.bears_text()).collect();
            cells.sort_by_key(|c| (c.row, c.col));

            for cell in cells {
                let region = sheet.merged.iter().position(|r| r.contains(cell.row, cell.col));
                if let Some(region) = region {
                    if anchors[region] != (cell.row, cell.col) {
                        continue;
                    }
                }

                let locator = Locator::Cell { sheet: sheet_index, row: cell.row, col: cell.col };
                match &cell.value {
                    CellValue::Rich(runs) => sink.push_runs(runs, locator, region.is_some()),
                    _ => {
                        let style = StyleSnapshot {
                            font_size: cell.font.size,
                            font_name: cell.font.name.clone(),
                            run_boundaries: Vec::new(),
                        };
                        sink.push(cell.text().unwrap_or_default(), locator, style, region.is_some());
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
        let Document::Spreadsheet(book) = document else {
            return Err(kind_mismatch(self.format(), document).into());
        };
        let Locator::Cell { sheet, row, col } = segment.locator else {
            return Err(unresolved(segment, "not a cell locator"));
        };
        let cell = book
            .sheets
            .get_mut(sheet)
            .and_then(|s| s.cell_mut(row, col))
            .ok_or_else(|| unresolved(segment, "cell not found"))?;

        match &mut cell.value {
            CellValue::Text(current) => *current = text.to_string(),
            CellValue::Rich(runs) => ctx.rewrite_runs(runs, text),
            _ => return Err(unresolved(segment, "cell no longer holds text")),
        }
        ctx.restyle(&mut cell.font);
        Ok(())
    }

    fn finish(
        &self,
        document: &mut Document,
        rewritten: &[(&Segment, &str)],
        ctx: &RewriteContext,
        report: &mut RewriteReport,
    ) -> Result<(), TranslationError> {
        if !ctx.smart_column_width {
            return Ok(());
        }
        let Document::Spreadsheet(book) = document else {
            return Err(kind_mismatch(self.format(), document).into());
        };

        let mut image_columns: HashMap<usize, HashSet<u32>> = HashMap::new();
        let mut widened: HashSet<(usize, u32)> = HashSet::new();

        for (segment, text) in rewritten {
            if segment.in_merged_region {
                continue;
            }
            let Locator::Cell { sheet: sheet_index, col, .. } = segment.locator else {
                continue;
            };
            let Some(sheet) = book.sheets.get_mut(sheet_index) else {
                continue;
            };

            let pictures = image_columns.entry(sheet_index).or_insert_with(|| sheet.image_columns());
            let cap = if pictures.contains(&col) {
                ctx.max_column_width.min(IMAGE_COLUMN_MAX_WIDTH)
            } else {
                ctx.max_column_width
            };

            let current = sheet.column_width(col);
            let old_width = layout::display_width(&segment.text);
            let new_width = layout::display_width(text);
            if let Some(width) = layout::widened_column(current, old_width, new_width, cap) {
                sheet.column_widths.insert(col, width);
                widened.insert((sheet_index, col));
            }
        }

        report.columns_widened = widened.len();
        Ok(())
    }
}
