//! Page-point ↔ percentage-space conversion.
//!
//! Page points follow PDF conventions: origin at the bottom-left corner,
//! Y growing upward, units of 1/72 inch. Percentage space is what the
//! interactive editor works in: origin at the top-left corner, Y growing
//! downward, both axes spanning 0–100 regardless of page size.

use serde::{Deserialize, Serialize};

/// A point in page space (points, bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PagePoint {
    /// Distance from the left edge
    pub x: f32,
    /// Distance from the bottom edge
    pub y: f32,
}

impl PagePoint {
    /// Create a new page point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: PagePoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A point in percentage space (top-left origin, 0–100).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentPoint {
    /// Horizontal position as percent of page width
    pub x: f32,
    /// Vertical position as percent of page height, from the top
    pub y: f32,
}

impl PercentPoint {
    /// Create a new percentage point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageRect {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
}

impl PageRect {
    /// Create a new rectangle from its bottom-left corner and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    pub fn center(&self) -> PagePoint {
        PagePoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Converts between page points and percentage space for one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransformer {
    page_width: f32,
    page_height: f32,
}

impl CoordinateTransformer {
    /// Create a transformer for a page of the given viewport size.
    ///
    /// Degenerate sizes are clamped to one point so conversions never
    /// divide by zero.
    pub fn new(page_width: f32, page_height: f32) -> Self {
        Self {
            page_width: page_width.max(1.0),
            page_height: page_height.max(1.0),
        }
    }

    /// Page width in points.
    pub fn page_width(&self) -> f32 {
        self.page_width
    }

    /// Page height in points.
    pub fn page_height(&self) -> f32 {
        self.page_height
    }

    /// Length of the page diagonal in points.
    pub fn diagonal(&self) -> f32 {
        self.page_width.hypot(self.page_height)
    }

    /// Convert a page point to percentage space.
    pub fn to_percent(&self, point: PagePoint) -> PercentPoint {
        PercentPoint {
            x: point.x / self.page_width * 100.0,
            y: (self.page_height - point.y) / self.page_height * 100.0,
        }
    }

    /// Convert a percentage-space point to page points.
    pub fn to_page_point(&self, point: PercentPoint) -> PagePoint {
        PagePoint {
            x: point.x / 100.0 * self.page_width,
            y: self.page_height - point.y / 100.0 * self.page_height,
        }
    }

    /// Convert a horizontal length in points to percent of page width.
    pub fn width_to_percent(&self, width: f32) -> f32 {
        width / self.page_width * 100.0
    }

    /// Convert a vertical length in points to percent of page height.
    pub fn height_to_percent(&self, height: f32) -> f32 {
        height / self.page_height * 100.0
    }

    /// Convert a percent of page width to points.
    pub fn percent_to_width(&self, percent: f32) -> f32 {
        percent / 100.0 * self.page_width
    }

    /// Convert a percent of page height to points.
    pub fn percent_to_height(&self, percent: f32) -> f32 {
        percent / 100.0 * self.page_height
    }
}
