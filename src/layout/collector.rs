//! Conversion of raw glyph runs into [`TextRun`]s.

use crate::error::Result;
use crate::model::TextRun;
use crate::parser::{PageContent, PageSource, RawGlyphRun};

/// Average glyph advance as a fraction of the font size, used when the
/// source reports no width.
const FALLBACK_ADVANCE: f32 = 0.5;

/// Turns the page source's glyph runs into layout input.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphRunCollector;

impl GlyphRunCollector {
    pub fn new() -> Self {
        Self
    }

    /// Collect the runs of one page from a source.
    pub fn collect_page<S: PageSource + ?Sized>(
        &self,
        source: &S,
        page_number: u32,
    ) -> Result<(PageContent, Vec<TextRun>)> {
        let content = source.page_content(page_number)?;
        let runs = self.collect(page_number, &content.glyphs);
        Ok((content, runs))
    }

    /// Convert raw runs, dropping whitespace-only ones.
    ///
    /// `index` is assigned in output order, so it identifies a run within
    /// the returned list.
    pub fn collect(&self, page_number: u32, glyphs: &[RawGlyphRun]) -> Vec<TextRun> {
        let mut runs = Vec::with_capacity(glyphs.len());
        for glyph in glyphs {
            if glyph.text.trim().is_empty() {
                continue;
            }
            let index = runs.len();
            runs.push(to_text_run(glyph, page_number, index));
        }
        log::debug!(
            "Collected {} runs from {} glyph runs on page {}",
            runs.len(),
            glyphs.len(),
            page_number
        );
        runs
    }
}

fn to_text_run(glyph: &RawGlyphRun, page_number: u32, index: usize) -> TextRun {
    let [a, b, c, d, e, f] = glyph.transform;
    let size = font_size_estimate(a, b, c, d);
    let chars = glyph.text.chars().count() as f32;

    TextRun {
        text: glyph.text.clone(),
        origin_x: e,
        origin_y: f,
        width: glyph
            .width
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(FALLBACK_ADVANCE * size * chars),
        height: glyph
            .height
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or(size),
        font_size_estimate: size,
        font_token: glyph.font_token.clone(),
        page_number,
        index,
    }
}

/// Largest axis scale of a 2x2 transform, rounded to 2 decimals.
pub fn font_size_estimate(a: f32, b: f32, c: f32, d: f32) -> f32 {
    let scale_x = a.hypot(b);
    let scale_y = c.hypot(d);
    (scale_x.max(scale_y) * 100.0).round() / 100.0
}
