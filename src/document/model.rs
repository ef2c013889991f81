/*!
 * Building blocks shared by every document kind.
 *
 * Runs, paragraphs, tables and images are serializable so that a whole
 * document can be snapshotted to JSON and restored without loss.
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::layout;

/// Character formatting of a run or cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    /// Font family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,

    /// Bold weight
    #[serde(default)]
    pub bold: bool,

    /// Italic style
    #[serde(default)]
    pub italic: bool,

    /// Underline
    #[serde(default)]
    pub underline: bool,

    /// RGB colour such as `FF0000`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl FontStyle {
    /// Scale the font size by `ratio`, never going below the readable floor
    pub fn scale(&mut self, ratio: f64) {
        if let Some(size) = self.size {
            self.size = Some(layout::adjusted_font_size(size, ratio));
        }
    }
}

/// A span of text sharing one formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Run text
    pub text: String,

    /// Run formatting
    #[serde(default)]
    pub font: FontStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), font: FontStyle::default() }
    }

    pub fn styled(text: impl Into<String>, font: FontStyle) -> Self {
        Self { text: text.into(), font }
    }
}

/// Concatenated text of a run list
pub fn runs_text(runs: &[TextRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Character offsets where each run after the first begins
pub fn run_boundaries(runs: &[TextRun]) -> Vec<usize> {
    let mut offset = 0;
    let mut boundaries = Vec::with_capacity(runs.len().saturating_sub(1));
    for (i, run) in runs.iter().enumerate() {
        if i > 0 {
            boundaries.push(offset);
        }
        offset += run.text.chars().count();
    }
    boundaries
}

/// Write `text` into a run list.
///
/// The first run receives the whole text and keeps its formatting; later runs
/// are emptied when `keep_runs` is set, otherwise dropped.
pub fn replace_runs(runs: &mut Vec<TextRun>, text: &str, keep_runs: bool) {
    match runs.first_mut() {
        Some(first) => first.text = text.to_string(),
        None => {
            runs.push(TextRun::new(text));
            return;
        }
    }
    if keep_runs {
        for run in runs.iter_mut().skip(1) {
            run.text.clear();
        }
    } else {
        runs.truncate(1);
    }
}

/// A paragraph made of runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Runs in reading order
    #[serde(default)]
    pub runs: Vec<TextRun>,

    /// Named paragraph style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl Paragraph {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { runs: vec![TextRun::new(text)], style: None }
    }

    pub fn text(&self) -> String {
        runs_text(&self.runs)
    }

    pub fn has_text(&self) -> bool {
        self.runs.iter().any(|r| !r.text.trim().is_empty())
    }
}

/// How a table cell relates to merged neighbours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeState {
    /// Stand-alone cell
    #[default]
    None,
    /// First cell of a merged block; carries the content
    Start,
    /// Covered by a preceding `Start` cell
    Continue,
}

/// A table cell holding paragraphs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,

    #[serde(default)]
    pub merge: MergeState,
}

/// Grid of cells used by word tables and slide tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<Vec<TableCell>>,
}

/// Position of a picture inside its container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageAnchor {
    /// Moves with one cell
    OneCell {
        row: u32,
        col: u32,
        #[serde(default)]
        row_offset: i64,
        #[serde(default)]
        col_offset: i64,
    },
    /// Spans from one cell to another
    TwoCell {
        from_row: u32,
        from_col: u32,
        to_row: u32,
        to_col: u32,
    },
    /// Fixed position in document units
    Absolute { x: f64, y: f64, width: f64, height: f64 },
    /// Flows with a paragraph
    Inline { paragraph: usize },
}

impl ImageAnchor {
    /// Spreadsheet columns covered by the anchor
    pub fn columns(&self) -> Vec<u32> {
        match self {
            Self::OneCell { col, .. } => vec![*col],
            Self::TwoCell { from_col, to_col, .. } => {
                let (lo, hi) = if from_col <= to_col { (*from_col, *to_col) } else { (*to_col, *from_col) };
                (lo..=hi).collect()
            }
            Self::Absolute { .. } | Self::Inline { .. } => Vec::new(),
        }
    }
}

/// An embedded picture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// Identifier inside the document
    pub id: String,

    /// Raw image bytes
    #[serde(default)]
    pub bytes: Vec<u8>,

    /// Placement
    pub anchor: ImageAnchor,
}

impl ImageData {
    /// SHA-256 digest of the image bytes
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(&self.bytes).into()
    }
}
