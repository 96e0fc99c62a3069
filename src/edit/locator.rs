//! Resolving a click to existing elements or nearby page text.

use serde::{Deserialize, Serialize};

use crate::coords::{CoordinateTransformer, PagePoint, PageRect, PercentPoint};
use crate::layout::LayoutAnalyzer;
use crate::model::{EditElement, ElementId, Line, TextRun};
use crate::parser::{EditorConfig, LayoutConfig};
use crate::style::{CanonicalFamily, FontStyle};

/// Depth of the descender area below the baseline, as a fraction of the
/// line height.
const DESCENDER_FRACTION: f32 = 0.2;

/// Page text found near a click, ready to become an edit element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMatch {
    /// Text of the whole line
    pub text: String,
    /// Left edge of the line
    pub anchor_x_percent: f32,
    /// Vertical center of the line's box
    pub anchor_y_percent: f32,
    pub width_percent: f32,
    pub height_percent: f32,
    pub font_size: f32,
    pub font_family: CanonicalFamily,
    pub bold: bool,
    pub italic: bool,
    /// Area covered by the original line, in page points
    pub original_rect: PageRect,
    /// Index of the run nearest the click
    pub run_index: usize,
}

impl TextMatch {
    pub fn anchor(&self) -> PercentPoint {
        PercentPoint::new(self.anchor_x_percent, self.anchor_y_percent)
    }
}

/// Outcome of a click.
#[derive(Debug, Clone, PartialEq)]
pub enum LocateResult {
    /// An existing element was hit
    Existing(ElementId),
    /// Page text was found near the click
    Text(TextMatch),
    /// Nothing within reach
    Miss,
}

/// Finds what a click on a page refers to.
#[derive(Debug, Clone)]
pub struct TextProximityLocator {
    hit_radius_fraction: f32,
    match_cutoff: f32,
    analyzer: LayoutAnalyzer,
}

impl TextProximityLocator {
    pub fn new(editor: &EditorConfig, layout: LayoutConfig) -> Self {
        Self {
            hit_radius_fraction: editor.hit_radius_fraction,
            match_cutoff: editor.match_cutoff,
            analyzer: LayoutAnalyzer::new(layout),
        }
    }

    /// Resolve a click given in percentage space.
    pub fn locate<'a>(
        &self,
        click: PercentPoint,
        transformer: &CoordinateTransformer,
        runs: &[TextRun],
        elements: impl IntoIterator<Item = &'a EditElement>,
    ) -> LocateResult {
        let point = transformer.to_page_point(click);

        if let Some(id) = self.nearest_element(point, transformer, elements) {
            return LocateResult::Existing(id);
        }

        let Some(run) = self.nearest_run(point, runs) else {
            return LocateResult::Miss;
        };

        let line = self
            .analyzer
            .line_containing(runs, transformer.page_width(), run.index)
            .unwrap_or_else(|| single_run_line(run));

        LocateResult::Text(build_match(run, &line, transformer))
    }

    fn nearest_element<'a>(
        &self,
        point: PagePoint,
        transformer: &CoordinateTransformer,
        elements: impl IntoIterator<Item = &'a EditElement>,
    ) -> Option<ElementId> {
        let radius = self.hit_radius_fraction * transformer.diagonal();
        elements
            .into_iter()
            .map(|el| (el.id, transformer.to_page_point(el.anchor).distance_to(point)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    fn nearest_run<'r>(&self, point: PagePoint, runs: &'r [TextRun]) -> Option<&'r TextRun> {
        let (run, distance) = runs
            .iter()
            .map(|r| (r, r.center().distance_to(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        if distance > self.match_cutoff {
            log::debug!("Nearest run is {:.1}pt away, beyond cutoff", distance);
            return None;
        }
        Some(run)
    }
}

impl Default for TextProximityLocator {
    fn default() -> Self {
        Self::new(&EditorConfig::default(), LayoutConfig::default())
    }
}

fn single_run_line(run: &TextRun) -> Line {
    Line {
        runs: vec![run.clone()],
        merged_text: run.text.clone(),
        bbox: crate::model::LineBox {
            x_start: run.origin_x,
            x_end: run.right(),
            y: run.origin_y,
            height: run.height,
        },
        column_index: 0,
        font_size: run.font_size_estimate,
    }
}

fn build_match(run: &TextRun, line: &Line, transformer: &CoordinateTransformer) -> TextMatch {
    let bbox = line.bbox;
    let top = line
        .runs
        .iter()
        .map(|r| r.origin_y + r.height)
        .fold(bbox.y + bbox.height, f32::max);
    let bottom = bbox.y - DESCENDER_FRACTION * bbox.height;
    let rect = PageRect::new(bbox.x_start, bottom, bbox.width(), top - bottom);

    let anchor = transformer.to_percent(PagePoint::new(rect.x, rect.center().y));
    let style = FontStyle::from_token(&run.font_token);

    TextMatch {
        text: line.merged_text.trim().to_string(),
        anchor_x_percent: anchor.x,
        anchor_y_percent: anchor.y,
        width_percent: transformer.width_to_percent(rect.width),
        height_percent: transformer.height_to_percent(rect.height),
        font_size: run.font_size_estimate,
        font_family: style.family,
        bold: style.bold,
        italic: style.italic,
        original_rect: rect,
        run_index: run.index,
    }
}
