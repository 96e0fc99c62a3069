//! Markdown rendering.

use crate::error::Result;
use crate::model::{Block, Classification, ImageBlock, Page, Paragraph, StructuredDocument};

use super::RenderOptions;

/// Convert a document to Markdown.
pub fn to_markdown(doc: &StructuredDocument, options: &RenderOptions) -> Result<String> {
    MarkdownRenderer::new(options.clone()).render(doc)
}

/// Markdown renderer.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: RenderOptions,
    /// Number of the next item in the current numbered list
    list_number: u32,
    in_list: bool,
}

impl MarkdownRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            list_number: 1,
            in_list: false,
        }
    }

    /// Render a document to Markdown.
    pub fn render(mut self, doc: &StructuredDocument) -> Result<String> {
        let mut output = String::new();

        if self.options.include_frontmatter {
            output.push_str(&doc.metadata.to_yaml_frontmatter());
        }

        for page in &doc.pages {
            if self.options.page_selection.includes(page.number) {
                self.render_page(&mut output, page);
            }
        }

        Ok(output.trim().to_string())
    }

    fn render_page(&mut self, output: &mut String, page: &Page) {
        for block in &page.blocks {
            match block {
                Block::Paragraph(p) => self.render_paragraph(output, p),
                Block::Image(image) => {
                    self.end_list(output);
                    self.render_image(output, image);
                }
            }
        }
        self.end_list(output);
    }

    fn render_paragraph(&mut self, output: &mut String, para: &Paragraph) {
        if para.is_empty() {
            return;
        }

        if !para.classification.is_list() {
            self.end_list(output);
        }

        let text = self.paragraph_text(para);
        match para.classification {
            Classification::Heading1 | Classification::Heading2 | Classification::Heading3 => {
                let level = para
                    .heading_level()
                    .unwrap_or(1)
                    .min(self.options.max_heading_level);
                output.push_str(&"#".repeat(level as usize));
                output.push(' ');
                output.push_str(&text.replace('\n', " "));
                output.push_str("\n\n");
            }
            Classification::ListBullet => {
                self.in_list = true;
                self.list_number = 1;
                output.push(self.options.list_marker);
                output.push(' ');
                output.push_str(&text);
                output.push('\n');
            }
            Classification::ListNumbered => {
                self.in_list = true;
                output.push_str(&format!("{}. ", self.list_number));
                self.list_number += 1;
                output.push_str(&text);
                output.push('\n');
            }
            Classification::Body => {
                output.push_str(&text);
                output.push_str("\n\n");
            }
        }
    }

    fn end_list(&mut self, output: &mut String) {
        if self.in_list {
            output.push('\n');
            self.in_list = false;
        }
        self.list_number = 1;
    }

    fn paragraph_text(&self, para: &Paragraph) -> String {
        let text = if self.options.preserve_line_breaks && para.lines.len() > 1 {
            para.lines
                .iter()
                .map(|l| l.merged_text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("  \n")
        } else {
            para.text.clone()
        };

        if self.options.escape_special_chars {
            escape_markdown(&text)
        } else {
            text
        }
    }

    fn render_image(&self, output: &mut String, image: &ImageBlock) {
        let path = format!("{}{}", self.options.image_path_prefix, image.resource_id);
        output.push_str(&format!("![{}]({})\n\n", image.resource_id, path));
    }
}

/// Escape characters that could be read as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Line, LineBox};

    fn doc_with(paragraphs: Vec<Paragraph>) -> StructuredDocument {
        let mut doc = StructuredDocument::new();
        let mut page = Page::letter(1);
        for p in paragraphs {
            page.add_paragraph(p);
        }
        doc.add_page(page);
        doc
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
        assert_eq!(escape_markdown("1. not a list"), "1. not a list");
    }

    #[test]
    fn test_render_headings_and_body() {
        let doc = doc_with(vec![
            Paragraph::heading("Chapter 1", 1),
            Paragraph::heading("Scope", 3),
            Paragraph::with_text("Hello, world!"),
        ]);
        let md = to_markdown(&doc, &RenderOptions::new()).unwrap();
        assert_eq!(md, "# Chapter 1\n\n### Scope\n\nHello, world!");

        let capped = to_markdown(&doc, &RenderOptions::new().with_max_heading(2)).unwrap();
        assert!(capped.contains("## Scope"));
    }

    #[test]
    fn test_render_lists() {
        let doc = doc_with(vec![
            Paragraph::with_text("first").with_classification(Classification::ListNumbered),
            Paragraph::with_text("second").with_classification(Classification::ListNumbered),
            Paragraph::with_text("after"),
            Paragraph::with_text("apple").with_classification(Classification::ListBullet),
            Paragraph::with_text("pear").with_classification(Classification::ListBullet),
        ]);
        let md = to_markdown(&doc, &RenderOptions::new()).unwrap();
        assert_eq!(md, "1. first\n2. second\n\nafter\n\n- apple\n- pear");
    }

    #[test]
    fn test_render_image_and_frontmatter() {
        let mut doc = doc_with(vec![Paragraph::with_text("Caption")]);
        doc.metadata.title = Some("Test Doc".to_string());
        doc.pages[0].add_block(Block::Image(ImageBlock {
            resource_id: "page1_Im1".to_string(),
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            y_position: 0.9,
            column_index: 0,
        }));

        let options = RenderOptions::new()
            .with_frontmatter(true)
            .with_image_prefix("./images/");
        let md = to_markdown(&doc, &options).unwrap();
        assert!(md.starts_with("---\n"));
        assert!(md.contains("title: \"Test Doc\""));
        assert!(md.ends_with("![page1_Im1](./images/page1_Im1)"));
    }

    #[test]
    fn test_preserve_line_breaks() {
        let line = |text: &str, y: f32| Line {
            runs: Vec::new(),
            merged_text: text.to_string(),
            bbox: LineBox {
                x_start: 72.0,
                x_end: 300.0,
                y,
                height: 10.0,
            },
            column_index: 0,
            font_size: 10.0,
        };
        let mut para = Paragraph::with_text("one two");
        para.lines = vec![line("one", 700.0), line("two", 688.0)];
        let doc = doc_with(vec![para]);

        let md = to_markdown(&doc, &RenderOptions::new().with_line_breaks(true)).unwrap();
        assert_eq!(md, "one  \ntwo");
        let joined = to_markdown(&doc, &RenderOptions::new()).unwrap();
        assert_eq!(joined, "one two");
    }
}
