//! Text measurement and sizing heuristics used by the rewriters.

/// Smallest font size a rewrite may produce, in points
pub const MIN_FONT_SIZE: f64 = 6.0;

/// A column is widened once its text is this much wider than the column
pub const OVERFLOW_THRESHOLD: f64 = 1.2;

/// Cap for columns that host pictures
pub const IMAGE_COLUMN_MAX_WIDTH: f64 = 30.0;

/// Excel's default column width in characters
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

/// Width of the longest line in character cells; ideographs count double
pub fn display_width(text: &str) -> f64 {
    text.lines()
        .map(|line| {
            line.chars()
                .filter(|c| !c.is_control())
                .map(|c| if is_wide(c) { 2.0 } else { 1.0 })
                .sum::<f64>()
        })
        .fold(0.0, f64::max)
}

/// Font size after applying `ratio`, rounded down to half points
pub fn adjusted_font_size(size: f64, ratio: f64) -> f64 {
    let scaled = (size * ratio * 2.0).floor() / 2.0;
    scaled.max(MIN_FONT_SIZE)
}

/// New width for a column whose text changed from `old_text_width` to
/// `new_text_width`, or `None` when the column is wide enough already.
/// The increase follows the length delta and never exceeds `cap`.
pub fn widened_column(
    column_width: f64,
    old_text_width: f64,
    new_text_width: f64,
    cap: f64,
) -> Option<f64> {
    if new_text_width <= column_width * OVERFLOW_THRESHOLD {
        return None;
    }
    let delta = (new_text_width - old_text_width).max(new_text_width - column_width);
    let widened = (column_width + delta.max(0.0) + 2.0).min(cap);
    (widened > column_width).then_some(widened)
}
