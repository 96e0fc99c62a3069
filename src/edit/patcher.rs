//! Planning vector overlays for edited text.
//!
//! Each element becomes an optional background fill over the text it
//! replaces followed by a text draw. Nothing on the original page is
//! removed; the fill hides it and the new text is drawn on top.

use std::collections::BTreeMap;

use super::sanitize::{sanitize_text, split_lines};
use crate::coords::{CoordinateTransformer, PagePoint, PageRect};
use crate::model::{Alignment, Color, EditElement, ElementId};
use crate::parser::EditorConfig;
use crate::style::{ResolvedFont, StyleResolver};

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Offset from a line's vertical center down to its baseline, as a
/// multiple of the font size.
const BASELINE_DROP: f32 = 0.3;

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    /// Start of the line in page points
    pub x: f32,
    pub baseline: f32,
    /// Drawn width including horizontal scaling
    pub width: f32,
}

/// Text of one element, laid out and ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub element_id: ElementId,
    pub font: ResolvedFont,
    pub font_size: f32,
    pub color: Color,
    pub opacity: f32,
    /// Degrees, clockwise as seen on screen
    pub rotation: f32,
    /// Percent, 100 = normal
    pub horizontal_scaling: f32,
    /// Rotation center (the element anchor) in page points
    pub pivot: PagePoint,
    pub lines: Vec<PlacedLine>,
}

/// A drawing step, executed in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Opaque rectangle hiding original content
    FillRect { rect: PageRect, color: Color },
    Text(TextDraw),
}

/// Draw commands for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePatch {
    pub page_number: u32,
    pub commands: Vec<DrawCommand>,
}

impl PagePatch {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Text draws on this page.
    pub fn texts(&self) -> impl Iterator<Item = &TextDraw> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text(t) => Some(t),
            DrawCommand::FillRect { .. } => None,
        })
    }
}

/// Plans page overlays from edit elements.
#[derive(Debug, Clone)]
pub struct VectorPatcher {
    patch_color: Color,
}

impl VectorPatcher {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            patch_color: config.patch_color,
        }
    }

    /// Group elements by page and emit ordered draw commands.
    ///
    /// Elements on pages missing from `page_sizes` are skipped.
    pub fn plan<'a>(
        &self,
        elements: impl IntoIterator<Item = &'a EditElement>,
        resolver: &mut StyleResolver,
        page_sizes: &BTreeMap<u32, CoordinateTransformer>,
    ) -> Vec<PagePatch> {
        let mut by_page: BTreeMap<u32, Vec<&EditElement>> = BTreeMap::new();
        for element in elements {
            by_page.entry(element.page_number).or_default().push(element);
        }

        let mut patches = Vec::new();
        for (page_number, elements) in by_page {
            let Some(transformer) = page_sizes.get(&page_number) else {
                log::warn!(
                    "Skipping {} element(s) on missing page {}",
                    elements.len(),
                    page_number
                );
                continue;
            };

            let mut commands = Vec::new();
            for element in elements {
                if let Some(rect) = element.original_rect {
                    commands.push(DrawCommand::FillRect {
                        rect,
                        color: element.background_color.unwrap_or(self.patch_color),
                    });
                }
                if let Some(text) = self.layout_text(element, resolver, transformer) {
                    commands.push(DrawCommand::Text(text));
                }
            }

            if !commands.is_empty() {
                patches.push(PagePatch {
                    page_number,
                    commands,
                });
            }
        }
        patches
    }

    fn layout_text(
        &self,
        element: &EditElement,
        resolver: &mut StyleResolver,
        transformer: &CoordinateTransformer,
    ) -> Option<TextDraw> {
        let text = sanitize_text(&element.text);
        if text.trim().is_empty() {
            return None;
        }

        let font = resolver.resolve(&text, element.font_family, element.bold, element.italic);
        let size = element.font_size.max(0.1);
        let scale = element.horizontal_scaling / 100.0;
        let anchor = transformer.to_page_point(element.anchor);

        let raw_lines = split_lines(&text);
        let line_height = LINE_HEIGHT * size;
        let top = anchor.y + raw_lines.len() as f32 * line_height / 2.0;

        let lines = raw_lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let width = font.text_width(line, size) * scale;
                let x = match element.alignment {
                    Alignment::Left => anchor.x,
                    Alignment::Center => anchor.x - width / 2.0,
                    Alignment::Right => anchor.x - width,
                };
                let center = top - (i as f32 + 0.5) * line_height;
                PlacedLine {
                    text: line.to_string(),
                    x,
                    baseline: center - BASELINE_DROP * size,
                    width,
                }
            })
            .collect();

        Some(TextDraw {
            element_id: element.id,
            font,
            font_size: size,
            color: element.color,
            opacity: element.opacity.clamp(0.0, 1.0),
            rotation: element.rotation,
            horizontal_scaling: element.horizontal_scaling,
            pivot: anchor,
            lines,
        })
    }
}

impl Default for VectorPatcher {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::PercentPoint;
    use crate::style::{
        test_font_bytes, BaseFont, CanonicalFamily, FontSources, MemoryFontSource, UnicodeVariant,
    };

    fn element(id: u64, page: u32, text: &str) -> EditElement {
        EditElement {
            id: ElementId(id),
            text: text.to_string(),
            anchor: PercentPoint::new(50.0, 50.0),
            font_size: 10.0,
            font_family: CanonicalFamily::Sans,
            bold: false,
            italic: false,
            color: Color::BLACK,
            rotation: 0.0,
            opacity: 1.0,
            alignment: Alignment::Left,
            horizontal_scaling: 100.0,
            background_color: None,
            original_rect: None,
            page_number: page,
        }
    }

    fn sizes() -> BTreeMap<u32, CoordinateTransformer> {
        BTreeMap::from([
            (1, CoordinateTransformer::new(600.0, 800.0)),
            (2, CoordinateTransformer::new(600.0, 800.0)),
        ])
    }

    #[test]
    fn test_fill_precedes_text() {
        let mut el = element(1, 1, "Replaced");
        el.original_rect = Some(PageRect::new(100.0, 390.0, 80.0, 14.0));

        let patches =
            VectorPatcher::default().plan([&el], &mut StyleResolver::base_only(), &sizes());
        assert_eq!(patches.len(), 1);
        let commands = &patches[0].commands;
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0],
            DrawCommand::FillRect {
                rect: PageRect::new(100.0, 390.0, 80.0, 14.0),
                color: Color::WHITE,
            }
        );
        assert!(matches!(commands[1], DrawCommand::Text(_)));
    }

    #[test]
    fn test_background_color_used_for_fill() {
        let mut el = element(1, 1, "x");
        el.original_rect = Some(PageRect::new(0.0, 0.0, 10.0, 10.0));
        el.background_color = Some(Color::rgb(250, 240, 200));
        let patches =
            VectorPatcher::default().plan([&el], &mut StyleResolver::base_only(), &sizes());
        assert!(matches!(
            patches[0].commands[0],
            DrawCommand::FillRect { color, .. } if color == Color::rgb(250, 240, 200)
        ));
    }

    #[test]
    fn test_groups_by_page() {
        let a = element(1, 2, "two");
        let b = element(2, 1, "one");
        let c = element(3, 9, "nowhere");
        let patches =
            VectorPatcher::default().plan([&a, &b, &c], &mut StyleResolver::base_only(), &sizes());
        let pages: Vec<u32> = patches.iter().map(|p| p.page_number).collect();
        assert_eq!(pages, vec![1, 2]);
    }

    #[test]
    fn test_line_stacking_and_alignment() {
        let mut el = element(1, 1, "Hi\nHi");
        el.alignment = Alignment::Right;
        let patches =
            VectorPatcher::default().plan([&el], &mut StyleResolver::base_only(), &sizes());
        let text = patches[0].texts().next().unwrap();

        // anchor is (300, 400); block height 24, top at 412
        assert_eq!(text.pivot, PagePoint::new(300.0, 400.0));
        assert_eq!(text.lines.len(), 2);
        assert!((text.lines[0].baseline - 403.0).abs() < 1e-4);
        assert!((text.lines[1].baseline - 391.0).abs() < 1e-4);
        // "Hi" in Helvetica at 10pt is 9.44pt wide
        assert!((text.lines[0].x - (300.0 - 9.44)).abs() < 1e-3);
        assert_eq!(text.font, ResolvedFont::Base(BaseFont::Helvetica));
    }

    #[test]
    fn test_center_and_scaling() {
        let mut el = element(1, 1, "Hi");
        el.alignment = Alignment::Center;
        el.horizontal_scaling = 200.0;
        let patches =
            VectorPatcher::default().plan([&el], &mut StyleResolver::base_only(), &sizes());
        let line = &patches[0].texts().next().unwrap().lines[0];
        assert!((line.width - 18.88).abs() < 1e-3);
        assert!((line.x - (300.0 - 9.44)).abs() < 1e-3);
    }

    #[test]
    fn test_text_is_sanitized_and_unicode_resolved() {
        let sources = FontSources::new().with_source(
            MemoryFontSource::new().with_font(UnicodeVariant::Regular, test_font_bytes()),
        );
        let mut resolver = StyleResolver::new(sources);
        let el = element(1, 1, "\u{201C}Straße\u{201D}\u{0007}");
        let patches = VectorPatcher::default().plan([&el], &mut resolver, &sizes());
        let text = patches[0].texts().next().unwrap();
        assert_eq!(text.lines[0].text, "\"Straße\"");
        assert!(text.font.is_unicode());
    }

    #[test]
    fn test_blank_text_without_rect_emits_nothing() {
        let el = element(1, 1, "  \n ");
        let patches =
            VectorPatcher::default().plan([&el], &mut StyleResolver::base_only(), &sizes());
        assert!(patches.is_empty());
    }
}
