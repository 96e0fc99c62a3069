//! Plain text rendering.

use crate::error::Result;
use crate::model::StructuredDocument;

use super::RenderOptions;

/// Paragraph text of the selected pages, separated by blank lines.
pub fn to_text(doc: &StructuredDocument, options: &RenderOptions) -> Result<String> {
    let output = doc
        .pages
        .iter()
        .filter(|p| options.page_selection.includes(p.number))
        .map(|p| p.plain_text())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(output.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Page, Paragraph};
    use crate::parser::PageSelection;

    #[test]
    fn test_to_text() {
        let mut doc = StructuredDocument::new();
        let mut page = Page::letter(1);
        page.add_paragraph(Paragraph::with_text("Hello, world!"));
        page.add_paragraph(Paragraph::with_text("Second paragraph."));
        doc.add_page(page);
        let mut page = Page::letter(2);
        page.add_paragraph(Paragraph::with_text("Page two."));
        doc.add_page(page);

        let all = to_text(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(all, "Hello, world!\n\nSecond paragraph.\n\nPage two.");

        let options = RenderOptions::new().with_pages(PageSelection::Range(2..=2));
        assert_eq!(to_text(&doc, &options).unwrap(), "Page two.");
    }
}
