//! # pagelift
//!
//! PDF layout reconstruction and vector-level text editing.
//!
//! Pages expose their text only as positioned glyph runs. pagelift
//! rebuilds columns, lines, paragraphs, headings and lists from that
//! geometry for format conversion, and lets callers edit text in place:
//! clicking near existing text picks it up into an editable element, and
//! saving draws the edits back into the page content as vector text.
//!
//! ## Conversion
//!
//! ```no_run
//! use pagelift::{render, ConvertOptions};
//!
//! fn main() -> pagelift::Result<()> {
//!     let doc = pagelift::convert_file("report.pdf", ConvertOptions::default())?;
//!     let markdown = render::to_markdown(&doc, &render::RenderOptions::default())?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Editing
//!
//! ```no_run
//! use pagelift::coords::PercentPoint;
//! use pagelift::edit::ClickOutcome;
//! use pagelift::model::ElementPatch;
//! use pagelift::style::{DirectoryFontSource, FontSources};
//!
//! fn main() -> pagelift::Result<()> {
//!     let fonts = FontSources::new().with_source(DirectoryFontSource::new("fonts"));
//!     let mut session = pagelift::open_editor("form.pdf", fonts)?;
//!
//!     if let ClickOutcome::Created(id, _) = session.click(1, PercentPoint::new(20.0, 15.0))? {
//!         session
//!             .store_mut()
//!             .update_element(id, &ElementPatch::text("Approved"))?;
//!     }
//!     session.save_file("form-edited.pdf")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Column detection**: gutters found from a horizontal coverage histogram
//! - **Structure**: headings from a document-wide font-size histogram, lists, alignment
//! - **Click-to-edit**: nearest-line pickup with inferred font, size and style
//! - **Undo/redo**: linear snapshot history with drag coalescing
//! - **Vector save-back**: overlays with embedded Unicode fonts, never rasterized

pub mod convert;
pub mod coords;
pub mod detect;
pub mod edit;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;
pub mod style;

// Re-export commonly used types
pub use convert::{convert_bytes, convert_file, CancellationToken, Converter, Progress};
#[cfg(feature = "async")]
pub use convert::load_document_async;
pub use coords::{CoordinateTransformer, PagePoint, PageRect, PercentPoint};
pub use detect::{is_pdf_bytes, sniff_header, PdfHeader};
pub use edit::{ClickOutcome, EditorSession};
pub use error::{Error, Result};
pub use model::{
    Alignment, Block, Classification, Color, EditElement, ElementId, ElementPatch, ImageBlock,
    Line, Metadata, Page, Paragraph, Resource, StructuredDocument, StyleOverrides, TextRun,
};
pub use parser::{
    ConvertOptions, EditorConfig, ErrorMode, LayoutConfig, LopdfBackend, PageSelection,
    PageSource,
};
pub use render::{JsonFormat, RenderOptions};
pub use style::{FontSources, StyleResolver};

use std::path::Path;

/// Open a PDF file for editing.
///
/// # Example
///
/// ```no_run
/// use pagelift::{open_editor, FontSources};
///
/// let session = open_editor("document.pdf", FontSources::new()).unwrap();
/// println!("Pages: {}", session.page_count());
/// ```
pub fn open_editor<P: AsRef<Path>>(path: P, fonts: FontSources) -> Result<EditorSession> {
    EditorSession::open_file(path, fonts)
}

/// Extract reconstructed plain text from a PDF file.
///
/// # Example
///
/// ```no_run
/// use pagelift::extract_text;
///
/// let text = extract_text("document.pdf").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = convert_file(path, ConvertOptions::default())?;
    Ok(doc.plain_text())
}

/// Convert a PDF to Markdown.
///
/// # Example
///
/// ```no_run
/// use pagelift::to_markdown;
///
/// let markdown = to_markdown("document.pdf").unwrap();
/// std::fs::write("output.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = convert_file(path, ConvertOptions::default())?;
    render::to_markdown(&doc, &RenderOptions::default())
}

/// Convert a PDF to JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = convert_file(path, ConvertOptions::default())?;
    render::to_json(&doc, format)
}

/// Builder for converting and rendering PDF documents.
///
/// # Example
///
/// ```no_run
/// use pagelift::Pagelift;
///
/// let markdown = Pagelift::new()
///     .with_frontmatter()
///     .lenient()
///     .convert("document.pdf")?
///     .to_markdown()?;
/// # Ok::<(), pagelift::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pagelift {
    convert_options: ConvertOptions,
    render_options: RenderOptions,
}

impl Pagelift {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip pages whose text cannot be read.
    pub fn lenient(mut self) -> Self {
        self.convert_options = self.convert_options.lenient();
        self
    }

    /// Extract text only.
    pub fn text_only(mut self) -> Self {
        self.convert_options = self.convert_options.text_only();
        self
    }

    /// Set layout thresholds.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.convert_options = self.convert_options.with_layout(layout);
        self
    }

    /// Enable frontmatter in Markdown output.
    pub fn with_frontmatter(mut self) -> Self {
        self.render_options = self.render_options.with_frontmatter(true);
        self
    }

    /// Set image path prefix for Markdown output.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.render_options = self.render_options.with_image_prefix(prefix);
        self
    }

    /// Set page selection for conversion and rendering.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.convert_options = self.convert_options.with_pages(pages.clone());
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Convert a PDF file.
    pub fn convert<P: AsRef<Path>>(self, path: P) -> Result<Conversion> {
        let document = convert_file(path, self.convert_options)?;
        Ok(Conversion {
            document,
            render_options: self.render_options,
        })
    }

    /// Convert PDF bytes.
    pub fn convert_bytes(self, data: &[u8]) -> Result<Conversion> {
        let document = convert_bytes(data, self.convert_options)?;
        Ok(Conversion {
            document,
            render_options: self.render_options,
        })
    }
}

/// A converted document plus the render options to apply.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The reconstructed document
    pub document: StructuredDocument,
    render_options: RenderOptions,
}

impl Conversion {
    /// Convert to Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        render::to_markdown(&self.document, &self.render_options)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document, &self.render_options)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    pub fn document(&self) -> &StructuredDocument {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let builder = Pagelift::new()
            .lenient()
            .text_only()
            .with_frontmatter()
            .with_pages(PageSelection::Range(1..=2));

        assert_eq!(builder.convert_options.error_mode, ErrorMode::Lenient);
        assert!(!builder.convert_options.extract_images);
        assert!(builder.render_options.include_frontmatter);
        assert!(!builder.render_options.page_selection.includes(3));
    }

    #[test]
    fn test_convert_bytes_empty_data() {
        assert!(matches!(
            convert_bytes(&[], ConvertOptions::default()),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_convert_bytes_unknown_magic() {
        let data = [0xFF, 0xFE, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        assert!(matches!(
            Pagelift::new().convert_bytes(&data),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_open_editor_missing_file() {
        let result = open_editor("/nonexistent/missing.pdf", FontSources::new());
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
