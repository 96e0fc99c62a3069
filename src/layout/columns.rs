//! Column gap detection from horizontal coverage.

use crate::model::TextRun;
use crate::parser::LayoutConfig;

/// Finds vertical whitespace gutters separating text columns.
#[derive(Debug, Clone)]
pub struct ColumnDetector {
    bucket_width: f32,
    min_runs: usize,
    min_gap_fraction: f32,
    search_fraction: f32,
    coverage_fraction: f32,
    max_gaps: usize,
}

impl ColumnDetector {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            bucket_width: config.column_bucket_width.max(1.0),
            min_runs: config.min_runs_for_columns,
            min_gap_fraction: config.min_gap_fraction,
            search_fraction: config.gap_search_fraction,
            coverage_fraction: config.gap_coverage_fraction,
            max_gaps: config.max_gaps,
        }
    }

    /// Gap centers in page points, left to right.
    pub fn detect(&self, runs: &[TextRun], page_width: f32) -> Vec<f32> {
        if runs.len() < self.min_runs || page_width <= 0.0 {
            return Vec::new();
        }

        let bw = self.bucket_width;
        let bucket_count = (page_width / bw).ceil() as usize;
        let mut coverage = vec![0usize; bucket_count.max(1)];
        let last = coverage.len() - 1;

        for run in runs {
            let left = run.origin_x.clamp(0.0, page_width);
            let right = run.right().clamp(left, page_width);
            let start = ((left / bw).floor() as usize).min(last);
            // A run ending exactly on a bucket edge does not touch the next bucket
            let end = (((right / bw).ceil() as usize).saturating_sub(1)).clamp(start, last);
            for bucket in &mut coverage[start..=end] {
                *bucket += 1;
            }
        }

        let threshold = (runs.len() as f32 * self.coverage_fraction).max(2.0);
        let margin = page_width * (1.0 - self.search_fraction) / 2.0;
        let first_bucket = (margin / bw).ceil() as usize;
        let end_bucket = (((page_width - margin) / bw).floor() as usize).min(coverage.len());
        let min_width = page_width * self.min_gap_fraction;

        // (start bucket, bucket count)
        let mut gaps: Vec<(usize, usize)> = Vec::new();
        let mut open: Option<usize> = None;
        for b in first_bucket..end_bucket {
            if coverage[b] as f32 <= threshold {
                open.get_or_insert(b);
            } else if let Some(start) = open.take() {
                gaps.push((start, b - start));
            }
        }
        if let Some(start) = open {
            gaps.push((start, end_bucket - start));
        }

        gaps.retain(|&(_, len)| len as f32 * bw >= min_width);
        // widest first; earlier gap wins ties
        gaps.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        gaps.truncate(self.max_gaps);

        let mut centers: Vec<f32> = gaps
            .iter()
            .map(|&(start, len)| (start as f32 + len as f32 / 2.0) * bw)
            .collect();
        centers.sort_by(f32::total_cmp);

        log::debug!(
            "Column gaps on {:.0}pt page from {} runs: {:?}",
            page_width,
            runs.len(),
            centers
        );
        centers
    }

    /// Column index (0 = leftmost) whose span holds the run's center.
    pub fn column_of(run: &TextRun, gaps: &[f32]) -> usize {
        let center = run.center_x();
        gaps.iter().filter(|&&g| g < center).count()
    }
}

impl Default for ColumnDetector {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}
