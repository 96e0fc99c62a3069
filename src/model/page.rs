//! Page-level types.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// A single reconstructed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Content blocks in reading order
    pub blocks: Vec<Block>,
}

impl Page {
    /// Create a new page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            blocks: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }

    /// Add a block to the page.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Add a paragraph to the page.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// Paragraphs on the page, in block order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Image(_) => None,
        })
    }

    /// Get plain text content of the page.
    pub fn plain_text(&self) -> String {
        self.paragraphs()
            .filter(|p| !p.is_empty())
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Check if the page is empty (no content blocks).
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Sort blocks into reading order: column by column, top to bottom.
    pub fn sort_blocks(&mut self) {
        self.blocks.sort_by(|a, b| {
            a.column_index()
                .cmp(&b.column_index())
                .then(a.y_position().total_cmp(&b.y_position()))
        });
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::letter(1)
    }
}

/// A placed image on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    /// Key into the document's resource map
    pub resource_id: String,
    /// Left edge in page points
    pub x: f32,
    /// Bottom edge in page points
    pub y: f32,
    /// Drawn width in points
    pub width: f32,
    /// Drawn height in points
    pub height: f32,
    /// Top of the image, 0.0 = page top, 1.0 = page bottom
    pub y_position: f32,
    /// Column containing the image center
    pub column_index: usize,
}

/// A content block on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph of text
    Paragraph(Paragraph),

    /// An image reference
    Image(ImageBlock),
}

impl Block {
    /// Check if this block is a paragraph.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    /// Check if this block is an image.
    pub fn is_image(&self) -> bool {
        matches!(self, Block::Image(_))
    }

    /// Column of the block.
    pub fn column_index(&self) -> usize {
        match self {
            Block::Paragraph(p) => p.column_index,
            Block::Image(i) => i.column_index,
        }
    }

    /// Normalized vertical position of the block top.
    pub fn y_position(&self) -> f32 {
        match self {
            Block::Paragraph(p) => p.y_position,
            Block::Image(i) => i.y_position,
        }
    }
}
