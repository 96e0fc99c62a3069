//! Glyph-run and line-level types.

use serde::{Deserialize, Serialize};

use crate::coords::{PagePoint, PageRect};

/// One positioned run of glyphs as reported by the page source.
///
/// Runs carry no line, paragraph or column structure; the layout
/// stages reconstruct that from geometry alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Decoded text of the run
    pub text: String,

    /// Left edge of the run in page points
    pub origin_x: f32,

    /// Baseline position, measured from the page bottom
    pub origin_y: f32,

    /// Advance width in points
    pub width: f32,

    /// Run height in points
    pub height: f32,

    /// Largest axis scale of the run's transform, rounded to 2 decimals
    pub font_size_estimate: f32,

    /// Font name as reported by the document (may carry a subset prefix)
    pub font_token: String,

    /// Page number (1-indexed)
    pub page_number: u32,

    /// Position of the run in its page's collected run list
    pub index: usize,
}

impl TextRun {
    /// Right edge of the run.
    pub fn right(&self) -> f32 {
        self.origin_x + self.width
    }

    /// Horizontal center of the run.
    pub fn center_x(&self) -> f32 {
        self.origin_x + self.width / 2.0
    }

    /// Center of the run's bounding box.
    pub fn center(&self) -> PagePoint {
        PagePoint::new(self.center_x(), self.origin_y + self.height / 2.0)
    }

    /// Bounding box of the run, starting at the baseline.
    pub fn bbox(&self) -> PageRect {
        PageRect::new(self.origin_x, self.origin_y, self.width, self.height)
    }

    /// Number of characters in the run.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Bounding box of an assembled line.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LineBox {
    /// Left edge of the first run
    pub x_start: f32,
    /// Right edge of the last run
    pub x_end: f32,
    /// Baseline of the line (lowest run origin)
    pub y: f32,
    /// Tallest run height
    pub height: f32,
}

impl LineBox {
    /// Line width.
    pub fn width(&self) -> f32 {
        self.x_end - self.x_start
    }
}

/// Runs sharing a vertical band within one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Runs ordered left to right
    pub runs: Vec<TextRun>,

    /// Run texts joined with inferred spaces
    pub merged_text: String,

    /// Bounding box of the line
    pub bbox: LineBox,

    /// Column the line belongs to (0 = leftmost)
    pub column_index: usize,

    /// Largest run font size on the line
    pub font_size: f32,
}

impl Line {
    /// Whether any run on the line has the given index.
    pub fn contains_run(&self, index: usize) -> bool {
        self.runs.iter().any(|r| r.index == index)
    }

    /// Number of characters in the merged text.
    pub fn char_count(&self) -> usize {
        self.merged_text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, width: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            origin_x: x,
            origin_y: 100.0,
            width,
            height: 12.0,
            font_size_estimate: 12.0,
            font_token: "Helvetica".to_string(),
            page_number: 1,
            index: 0,
        }
    }

    #[test]
    fn test_run_geometry() {
        let r = run("Hello", 50.0, 30.0);
        assert_eq!(r.right(), 80.0);
        assert_eq!(r.center_x(), 65.0);
        assert_eq!(r.center(), PagePoint::new(65.0, 106.0));
        assert_eq!(r.char_count(), 5);
    }

    #[test]
    fn test_line_box_width() {
        let bbox = LineBox {
            x_start: 72.0,
            x_end: 300.0,
            y: 700.0,
            height: 12.0,
        };
        assert_eq!(bbox.width(), 228.0);
    }
}
