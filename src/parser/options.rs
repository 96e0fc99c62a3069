//! Conversion, layout and editor configuration.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::model::{Alignment, Color};
use crate::style::CanonicalFamily;

/// Options for converting a document into a [`StructuredDocument`].
///
/// [`StructuredDocument`]: crate::model::StructuredDocument
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Which pages to convert
    pub pages: PageSelection,

    /// Whether to extract placed images as resources
    pub extract_images: bool,

    /// Layout thresholds
    pub layout: LayoutConfig,
}

impl ConvertOptions {
    /// Create new convert options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip pages whose text cannot be read).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Extract text only.
    pub fn text_only(mut self) -> Self {
        self.extract_images = false;
        self
    }

    /// Set layout thresholds.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            pages: PageSelection::All,
            extract_images: true,
            layout: LayoutConfig::default(),
        }
    }
}

/// Error handling mode during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on the first page whose text cannot be extracted
    #[default]
    Strict,
    /// Log and skip such pages
    Lenient,
}

/// Thresholds used by the layout stages.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Width of a column-coverage histogram bucket, in points
    pub column_bucket_width: f32,
    /// Pages with fewer runs than this get no column detection
    pub min_runs_for_columns: usize,
    /// Minimum gutter width as a fraction of page width
    pub min_gap_fraction: f32,
    /// Fraction of page width searched for gutters, centered
    pub gap_search_fraction: f32,
    /// Coverage fraction of total runs still counted as empty
    pub gap_coverage_fraction: f32,
    /// Maximum number of gutters reported per page
    pub max_gaps: usize,
    /// Vertical distance that starts a new line, in points
    pub line_break_threshold: f32,
    /// Horizontal gap, as a multiple of run height, that implies a space
    pub space_gap_ratio: f32,
    /// Baseline distance, as a multiple of line height, that ends a paragraph
    pub paragraph_gap_ratio: f32,
    /// Font-size change that ends a paragraph, in points
    pub paragraph_font_delta: f32,
    /// Run frequency at which a large size stops counting as a heading
    pub heading_frequency_limit: f32,
}

impl LayoutConfig {
    /// Create a layout config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line break threshold.
    pub fn with_line_break_threshold(mut self, points: f32) -> Self {
        self.line_break_threshold = points;
        self
    }

    /// Set the space insertion ratio.
    pub fn with_space_gap_ratio(mut self, ratio: f32) -> Self {
        self.space_gap_ratio = ratio;
        self
    }

    /// Set the paragraph break ratio.
    pub fn with_paragraph_gap_ratio(mut self, ratio: f32) -> Self {
        self.paragraph_gap_ratio = ratio;
        self
    }

    /// Set the maximum number of column gutters.
    pub fn with_max_gaps(mut self, max_gaps: usize) -> Self {
        self.max_gaps = max_gaps;
        self
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_bucket_width: 10.0,
            min_runs_for_columns: 10,
            min_gap_fraction: 0.05,
            gap_search_fraction: 0.8,
            gap_coverage_fraction: 0.02,
            max_gaps: 2,
            line_break_threshold: 2.0,
            space_gap_ratio: 0.3,
            paragraph_gap_ratio: 2.0,
            paragraph_font_delta: 1.0,
            heading_frequency_limit: 0.10,
        }
    }
}

/// Configuration for the interactive editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Radius for selecting an existing element, as a fraction of the page diagonal
    pub hit_radius_fraction: f32,
    /// Maximum click-to-run distance for matching text, in points
    pub match_cutoff: f32,
    /// Background color used when an element has none
    pub patch_color: Color,
    /// Style applied to elements created without overrides
    pub default_font_size: f32,
    /// Family applied to elements created without overrides
    pub default_family: CanonicalFamily,
    /// Text color applied to elements created without overrides
    pub default_color: Color,
    /// Alignment applied to elements created without overrides
    pub default_alignment: Alignment,
}

impl EditorConfig {
    /// Create an editor config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selection radius.
    pub fn with_hit_radius(mut self, fraction: f32) -> Self {
        self.hit_radius_fraction = fraction;
        self
    }

    /// Set the text match cutoff.
    pub fn with_match_cutoff(mut self, points: f32) -> Self {
        self.match_cutoff = points;
        self
    }

    /// Set the default background patch color.
    pub fn with_patch_color(mut self, color: Color) -> Self {
        self.patch_color = color;
        self
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            hit_radius_fraction: 0.03,
            match_cutoff: 50.0,
            patch_color: Color::WHITE,
            default_font_size: 12.0,
            default_family: CanonicalFamily::Sans,
            default_color: Color::BLACK,
            default_alignment: Alignment::Left,
        }
    }
}

/// Which pages to process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(BTreeSet<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = (parse_page(start)?, parse_page(end)?);
                if start > end {
                    return Err(Error::InvalidPageRange(s.to_string()));
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = BTreeSet::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (parse_page(start)?, parse_page(end)?);
                    if start > end {
                        return Err(Error::InvalidPageRange(part.trim().to_string()));
                    }
                    pages.extend(start..=end);
                }
                None => {
                    pages.insert(parse_page(part)?);
                }
            }
        }

        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page(s: &str) -> Result<u32> {
    let s = s.trim();
    match s.parse::<u32>() {
        Ok(0) | Err(_) => Err(Error::InvalidPageRange(s.to_string())),
        Ok(page) => Ok(page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .lenient()
            .text_only()
            .with_pages(PageSelection::Range(2..=4));

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(!options.extract_images);
        assert!(options.pages.includes(3));
        assert!(!options.pages.includes(5));
    }

    #[test]
    fn test_default_options() {
        let options = ConvertOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.extract_images);
        assert_eq!(options.layout.max_gaps, 2);
        assert_eq!(options.layout.line_break_threshold, 2.0);
    }

    #[test]
    fn test_editor_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.hit_radius_fraction, 0.03);
        assert_eq!(config.match_cutoff, 50.0);
        assert_eq!(config.patch_color, Color::WHITE);
    }

    #[test]
    fn test_page_selection_includes() {
        let all = PageSelection::All;
        assert!(all.includes(1));
        assert!(all.includes(100));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(
            PageSelection::parse("1-3").unwrap(),
            PageSelection::Range(1..=3)
        );

        let mixed = PageSelection::parse("1-3,5").unwrap();
        assert_eq!(
            mixed,
            PageSelection::Pages([1, 2, 3, 5].into_iter().collect())
        );

        assert!(matches!(
            PageSelection::parse("3-1"),
            Err(Error::InvalidPageRange(_))
        ));
        assert!(matches!(
            PageSelection::parse("0"),
            Err(Error::InvalidPageRange(_))
        ));
        assert!(PageSelection::parse("a,b").is_err());
    }
}
