//! Layout reconstruction from positioned glyph runs.
//!
//! Pages arrive as flat lists of runs with no line, paragraph or column
//! structure. The stages here rebuild that structure from geometry:
//!
//! 1. [`GlyphRunCollector`] turns raw runs into [`TextRun`]s
//! 2. [`ColumnDetector`] finds gutters from a horizontal coverage histogram
//! 3. [`LineAssembler`] groups each column's runs into lines
//! 4. [`StructureClassifier`] merges lines into classified paragraphs
//!
//! [`TextRun`]: crate::model::TextRun

mod collector;
mod columns;
mod lines;
mod structure;

pub use collector::{font_size_estimate, GlyphRunCollector};
pub use columns::ColumnDetector;
pub use lines::LineAssembler;
pub use structure::{FontHistogram, HeadingTable, StructureClassifier};

use crate::model::{Line, Paragraph, TextRun};
use crate::parser::LayoutConfig;

/// Lines of a page, grouped by column.
#[derive(Debug, Clone, Default)]
pub struct PageLines {
    /// Gutter centers, left to right
    pub gaps: Vec<f32>,
    /// Lines of each column, top to bottom
    pub columns: Vec<Vec<Line>>,
}

impl PageLines {
    /// All lines, column by column.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.columns.iter().flatten()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Runs the column and line stages with one configuration.
#[derive(Debug, Clone, Default)]
pub struct LayoutAnalyzer {
    config: LayoutConfig,
}

impl LayoutAnalyzer {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Detect columns and assemble lines per column.
    pub fn page_lines(&self, runs: &[TextRun], page_width: f32) -> PageLines {
        let gaps = ColumnDetector::new(&self.config).detect(runs, page_width);
        let assembler = LineAssembler::new(&self.config);

        let mut buckets: Vec<Vec<TextRun>> = vec![Vec::new(); gaps.len() + 1];
        for run in runs {
            buckets[ColumnDetector::column_of(run, &gaps)].push(run.clone());
        }

        let columns = buckets
            .iter()
            .enumerate()
            .map(|(i, column)| assembler.assemble(column, i))
            .collect();

        PageLines { gaps, columns }
    }

    /// The line holding the run with `run_index`, assembled within the
    /// run's own column.
    pub fn line_containing(&self, runs: &[TextRun], page_width: f32, run_index: usize) -> Option<Line> {
        let target = runs.iter().find(|r| r.index == run_index)?;
        let gaps = ColumnDetector::new(&self.config).detect(runs, page_width);
        let column = ColumnDetector::column_of(target, &gaps);

        let column_runs: Vec<TextRun> = runs
            .iter()
            .filter(|r| ColumnDetector::column_of(r, &gaps) == column)
            .cloned()
            .collect();

        LineAssembler::new(&self.config)
            .assemble(&column_runs, column)
            .into_iter()
            .find(|line| line.contains_run(run_index))
    }

    /// Paragraphs of a page, column by column.
    pub fn paragraphs(
        &self,
        lines: PageLines,
        table: &HeadingTable,
        page_width: f32,
        page_height: f32,
    ) -> Vec<Paragraph> {
        let classifier = StructureClassifier::new(&self.config, table.clone());
        lines
            .columns
            .into_iter()
            .flat_map(|column| classifier.paragraphs(column, page_width, page_height))
            .collect()
    }
}
