//! JSON rendering.

use crate::error::{Error, Result};
use crate::model::StructuredDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a document to JSON. Resource bytes are left out.
pub fn to_json(doc: &StructuredDocument, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, Page, Paragraph, Resource};

    #[test]
    fn test_to_json_pretty() {
        let mut doc = StructuredDocument::new();
        doc.metadata.title = Some("Test".to_string());
        let mut page = Page::letter(1);
        page.add_paragraph(Paragraph::with_text("Hello").with_classification(Classification::ListBullet));
        doc.add_page(page);

        let json = to_json(&doc, JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\""));
        assert!(json.contains("\"type\": \"paragraph\""));
        assert!(json.contains("\"classification\": \"list_bullet\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact_skips_resource_bytes() {
        let mut doc = StructuredDocument::new();
        doc.add_page(Page::letter(1));
        doc.add_resource(
            "page1_Im1".to_string(),
            Resource::image(vec![1, 2, 3], "image/png"),
        );

        let json = to_json(&doc, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"mime_type\":\"image/png\""));
        assert!(!json.contains("\"data\""));
    }
}
