//! Data model shared by the layout and editing paths.
//!
//! Conversion produces a [`StructuredDocument`] of classified paragraphs
//! and placed images; editing works on [`EditElement`]s anchored in
//! percentage space. All types serialize with serde.

mod document;
mod element;
mod page;
mod paragraph;
mod resource;
mod run;

pub use document::{Metadata, StructuredDocument};
pub use element::{Color, EditElement, ElementId, ElementPatch, StyleOverrides};
pub use page::{Block, ImageBlock, Page};
pub use paragraph::{Alignment, Classification, Paragraph};
pub use resource::Resource;
pub use run::{Line, LineBox, TextRun};
