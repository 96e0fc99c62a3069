//! Grouping runs into lines.

use crate::model::{Line, LineBox, TextRun};
use crate::parser::LayoutConfig;

/// Builds [`Line`]s from the runs of a single column.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    line_break_threshold: f32,
    space_gap_ratio: f32,
}

impl LineAssembler {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            line_break_threshold: config.line_break_threshold,
            space_gap_ratio: config.space_gap_ratio,
        }
    }

    /// Assemble lines, top to bottom.
    pub fn assemble(&self, runs: &[TextRun], column_index: usize) -> Vec<Line> {
        let mut sorted: Vec<&TextRun> = runs.iter().collect();
        sorted.sort_by(|a, b| {
            b.origin_y
                .total_cmp(&a.origin_y)
                .then(a.origin_x.total_cmp(&b.origin_x))
        });

        let mut lines = Vec::new();
        let mut current: Vec<TextRun> = Vec::new();
        let mut prev_y: Option<f32> = None;

        for run in sorted {
            if let Some(y) = prev_y {
                if (run.origin_y - y).abs() > self.line_break_threshold {
                    lines.push(self.build_line(std::mem::take(&mut current), column_index));
                }
            }
            prev_y = Some(run.origin_y);
            current.push(run.clone());
        }
        if !current.is_empty() {
            lines.push(self.build_line(current, column_index));
        }

        lines
    }

    fn build_line(&self, mut runs: Vec<TextRun>, column_index: usize) -> Line {
        runs.sort_by(|a, b| a.origin_x.total_cmp(&b.origin_x));

        let mut merged_text = String::new();
        let mut prev: Option<&TextRun> = None;
        for run in &runs {
            if let Some(p) = prev {
                if self.needs_space(p, run) {
                    merged_text.push(' ');
                }
            }
            merged_text.push_str(&run.text);
            prev = Some(run);
        }

        let mut bbox = LineBox {
            x_start: f32::MAX,
            x_end: f32::MIN,
            y: f32::MAX,
            height: 0.0,
        };
        let mut font_size: f32 = 0.0;
        for run in &runs {
            bbox.x_start = bbox.x_start.min(run.origin_x);
            bbox.x_end = bbox.x_end.max(run.right());
            bbox.y = bbox.y.min(run.origin_y);
            bbox.height = bbox.height.max(run.height);
            font_size = font_size.max(run.font_size_estimate);
        }

        Line {
            runs,
            merged_text,
            bbox,
            column_index,
            font_size,
        }
    }

    fn needs_space(&self, prev: &TextRun, next: &TextRun) -> bool {
        let gap = next.origin_x - prev.right();
        let already_spaced = prev.text.ends_with(char::is_whitespace)
            || next.text.starts_with(char::is_whitespace);
        gap > self.space_gap_ratio * next.height && !already_spaced
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}
