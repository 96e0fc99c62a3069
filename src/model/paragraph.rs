//! Paragraph-level types.

use serde::{Deserialize, Serialize};

use super::Line;

/// Structural role of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Top-level heading
    Heading1,
    /// Second-level heading
    Heading2,
    /// Third-level heading
    Heading3,
    /// Regular body text
    #[default]
    Body,
    /// Bulleted list item
    ListBullet,
    /// Numbered list item
    ListNumbered,
}

impl Classification {
    /// Heading level (1-3) or None for non-headings.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Classification::Heading1 => Some(1),
            Classification::Heading2 => Some(2),
            Classification::Heading3 => Some(3),
            _ => None,
        }
    }

    /// Heading classification for a level, clamped to 1-3.
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => Classification::Heading1,
            2 => Classification::Heading2,
            _ => Classification::Heading3,
        }
    }

    /// Check if this is a heading.
    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Check if this is a list item.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Classification::ListBullet | Classification::ListNumbered
        )
    }
}

/// Horizontal alignment of a paragraph or edit element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// A classified block of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Text with list prefixes stripped; lines joined with spaces
    pub text: String,

    /// Structural role
    pub classification: Classification,

    /// Horizontal alignment
    pub alignment: Alignment,

    /// Top of the paragraph, 0.0 = page top, 1.0 = page bottom
    pub y_position: f32,

    /// Dominant font size in points
    pub font_size: f32,

    /// Column the paragraph belongs to
    pub column_index: usize,

    /// Source lines, top to bottom
    #[serde(skip)]
    pub lines: Vec<Line>,
}

impl Paragraph {
    /// Create a body paragraph with the given text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            classification: Classification::Body,
            alignment: Alignment::Left,
            y_position: 0.0,
            font_size: 0.0,
            column_index: 0,
            lines: Vec::new(),
        }
    }

    /// Create a heading paragraph.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        let mut p = Self::with_text(text);
        p.classification = Classification::heading(level);
        p
    }

    /// Set the classification.
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    /// Check if this is a heading.
    pub fn is_heading(&self) -> bool {
        self.classification.is_heading()
    }

    /// Heading level (1-3) or None.
    pub fn heading_level(&self) -> Option<u8> {
        self.classification.heading_level()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Number of characters across the source lines.
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(Line::char_count).sum()
    }
}
