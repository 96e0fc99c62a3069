//! Serializers for [`StructuredDocument`].
//!
//! [`StructuredDocument`]: crate::model::StructuredDocument

mod json;
mod markdown;
mod options;
mod text;

pub use json::{to_json, JsonFormat};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::RenderOptions;
pub use text::to_text;
