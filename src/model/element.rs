//! Editable text elements.

use serde::{Deserialize, Serialize};

use super::Alignment;
use crate::coords::{PageRect, PercentPoint};
use crate::style::CanonicalFamily;

/// Identifier of an [`EditElement`]; unique for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Create a color from 8-bit channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels scaled to 0.0-1.0 for PDF color operators.
    pub fn components(&self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A user-authored or text-derived text object anchored to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditElement {
    pub id: ElementId,

    /// Text, possibly spanning several lines
    pub text: String,

    /// Anchor position in percentage space
    pub anchor: PercentPoint,

    /// Font size in points
    pub font_size: f32,

    pub font_family: CanonicalFamily,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,

    /// Rotation in degrees, clockwise as seen on screen
    pub rotation: f32,

    /// Opacity from 0.0 (invisible) to 1.0
    pub opacity: f32,

    pub alignment: Alignment,

    /// Horizontal scaling in percent (100 = normal)
    pub horizontal_scaling: f32,

    /// Color of the background patch; the editor default when unset
    pub background_color: Option<Color>,

    /// Original text area this element supersedes, in page points
    pub original_rect: Option<PageRect>,

    /// Page number (1-indexed)
    pub page_number: u32,
}

impl EditElement {
    /// Whether saving this element paints over original content.
    pub fn covers_original(&self) -> bool {
        self.original_rect.is_some()
    }
}

/// Style applied when creating an element. Unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleOverrides {
    pub font_size: Option<f32>,
    pub font_family: Option<CanonicalFamily>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<Color>,
    pub rotation: Option<f32>,
    pub opacity: Option<f32>,
    pub alignment: Option<Alignment>,
    pub horizontal_scaling: Option<f32>,
    pub background_color: Option<Color>,
    pub original_rect: Option<PageRect>,
}

impl StyleOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Set the font family.
    pub fn with_family(mut self, family: CanonicalFamily) -> Self {
        self.font_family = Some(family);
        self
    }

    /// Set weight and slant.
    pub fn with_style(mut self, bold: bool, italic: bool) -> Self {
        self.bold = Some(bold);
        self.italic = Some(italic);
        self
    }

    /// Set the text color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the alignment.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Set the rotation in degrees.
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = Some(degrees);
        self
    }

    /// Set the opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Set horizontal scaling in percent.
    pub fn with_horizontal_scaling(mut self, percent: f32) -> Self {
        self.horizontal_scaling = Some(percent);
        self
    }

    /// Record the original text area the element replaces.
    pub fn covering(mut self, rect: PageRect) -> Self {
        self.original_rect = Some(rect);
        self
    }
}

/// A partial update to an element. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementPatch {
    pub text: Option<String>,
    pub anchor: Option<PercentPoint>,
    pub style: StyleOverrides,
    /// Drop the background patch so original content shows through
    pub clear_background: bool,
}

impl ElementPatch {
    /// Patch that replaces the text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Patch that changes style only.
    pub fn style(style: StyleOverrides) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    /// Apply the patch to an element.
    pub fn apply_to(&self, element: &mut EditElement) {
        if let Some(ref text) = self.text {
            element.text = text.clone();
        }
        if let Some(anchor) = self.anchor {
            element.anchor = anchor;
        }

        let s = &self.style;
        if let Some(v) = s.font_size {
            element.font_size = v;
        }
        if let Some(v) = s.font_family {
            element.font_family = v;
        }
        if let Some(v) = s.bold {
            element.bold = v;
        }
        if let Some(v) = s.italic {
            element.italic = v;
        }
        if let Some(v) = s.color {
            element.color = v;
        }
        if let Some(v) = s.rotation {
            element.rotation = v;
        }
        if let Some(v) = s.opacity {
            element.opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = s.alignment {
            element.alignment = v;
        }
        if let Some(v) = s.horizontal_scaling {
            element.horizontal_scaling = v;
        }
        if let Some(v) = s.background_color {
            element.background_color = Some(v);
        }
        if let Some(v) = s.original_rect {
            element.original_rect = Some(v);
        }
        if self.clear_background {
            element.background_color = None;
            element.original_rect = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element() -> EditElement {
        EditElement {
            id: ElementId(1),
            text: "Draft".to_string(),
            anchor: PercentPoint::new(10.0, 10.0),
            font_size: 12.0,
            font_family: CanonicalFamily::Sans,
            bold: false,
            italic: false,
            color: Color::BLACK,
            rotation: 0.0,
            opacity: 1.0,
            alignment: Alignment::Left,
            horizontal_scaling: 100.0,
            background_color: None,
            original_rect: Some(PageRect::new(0.0, 0.0, 10.0, 10.0)),
            page_number: 1,
        }
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::from_hex("zzzzzz"), None);
        assert_eq!(Color::rgb(1, 2, 255).to_hex(), "#0102ff");
        assert_eq!(Color::WHITE.components(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut el = element();
        let patch = ElementPatch {
            text: Some("Final".to_string()),
            style: StyleOverrides::new().with_style(true, false).with_opacity(4.0),
            ..Default::default()
        };
        patch.apply_to(&mut el);

        assert_eq!(el.text, "Final");
        assert!(el.bold);
        assert_eq!(el.opacity, 1.0);
        assert_eq!(el.font_size, 12.0);
        assert!(el.covers_original());
    }

    #[test]
    fn test_patch_clears_background() {
        let mut el = element();
        ElementPatch {
            clear_background: true,
            ..Default::default()
        }
        .apply_to(&mut el);
        assert!(!el.covers_original());
    }
}
