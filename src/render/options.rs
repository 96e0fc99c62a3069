//! Rendering options.

use crate::parser::PageSelection;

/// Options for rendering a [`StructuredDocument`].
///
/// [`StructuredDocument`]: crate::model::StructuredDocument
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Prefix for image paths in output (e.g., "./images/")
    pub image_path_prefix: String,

    /// Deepest Markdown heading emitted (1-3)
    pub max_heading_level: u8,

    /// Include YAML frontmatter with metadata
    pub include_frontmatter: bool,

    /// Keep the source line breaks inside paragraphs
    pub preserve_line_breaks: bool,

    /// Character used for bullet list markers
    pub list_marker: char,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,

    /// Pages to render
    pub page_selection: PageSelection,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_path_prefix = prefix.into();
        self
    }

    /// Set maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 3);
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Set line break preservation.
    pub fn with_line_breaks(mut self, preserve: bool) -> Self {
        self.preserve_line_breaks = preserve;
        self
    }

    /// Set list marker character.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = marker;
        self
    }

    /// Enable or disable Markdown escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_path_prefix: String::new(),
            max_heading_level: 3,
            include_frontmatter: false,
            preserve_line_breaks: false,
            list_marker: '-',
            escape_special_chars: true,
            page_selection: PageSelection::All,
        }
    }
}
