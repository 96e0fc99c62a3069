//! PDF access and configuration.

mod backend;
mod content;
mod options;

pub use backend::{
    decode_text_simple, LopdfBackend, PageContent, PageSource, PlacedImage, RawGlyphRun, Viewport,
};
pub use content::{ImagePlacement, InterpretedContent, Matrix};
pub use options::{ConvertOptions, EditorConfig, ErrorMode, LayoutConfig, PageSelection};
