//! Paragraph building and classification.
//!
//! Classification is two-pass. A [`FontHistogram`] over the whole document
//! fixes the body size and a table of heading sizes; each paragraph is
//! then classified from that table plus its own geometry, with no other
//! state, so re-running over the same runs gives the same result.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Alignment, Classification, Line, Paragraph, TextRun};
use crate::parser::LayoutConfig;

/// Maximum number of heading levels assigned from the histogram.
const MAX_HEADING_LEVELS: usize = 3;

/// Size ratios against body text for H1, H2 and H3 when a size is not in
/// the heading table.
const HEADING_RATIOS: [(f32, Classification); 3] = [
    (1.6, Classification::Heading1),
    (1.3, Classification::Heading2),
    (1.15, Classification::Heading3),
];

/// Bullets recognized on their own.
const BULLETS: &[char] = &['•', '◦', '▪', '▫', '‣', '⁃', '●', '○', '■', '□', '·'];

/// Bullets that only count when followed by whitespace.
const WEAK_BULLETS: &[char] = &['–', '-', '*'];

static NUMBERED_PREFIX: OnceLock<Option<Regex>> = OnceLock::new();

fn numbered_prefix() -> Option<&'static Regex> {
    NUMBERED_PREFIX
        .get_or_init(|| Regex::new(r"^(?:\d+[.)]|\(\d+\))\s+").ok())
        .as_ref()
}

/// Round to the nearest half point, as a bucket key.
fn size_key(size: f32) -> u32 {
    (size.max(0.0) * 2.0).round() as u32
}

fn key_size(key: u32) -> f32 {
    key as f32 / 2.0
}

#[derive(Debug, Clone, Copy, Default)]
struct SizeBucket {
    chars: usize,
    runs: usize,
}

/// Character-weighted distribution of font sizes across a document.
#[derive(Debug, Clone, Default)]
pub struct FontHistogram {
    buckets: BTreeMap<u32, SizeBucket>,
    total_runs: usize,
}

impl FontHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from all runs of a document.
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a TextRun>) -> Self {
        let mut histogram = Self::new();
        for run in runs {
            histogram.add_run(run);
        }
        histogram
    }

    pub fn add_run(&mut self, run: &TextRun) {
        let bucket = self
            .buckets
            .entry(size_key(run.font_size_estimate))
            .or_default();
        bucket.chars += run.char_count();
        bucket.runs += 1;
        self.total_runs += 1;
    }

    pub fn total_runs(&self) -> usize {
        self.total_runs
    }

    /// Size carrying the most characters; the smaller size wins ties.
    pub fn body_size(&self) -> Option<f32> {
        let mut best: Option<(u32, usize)> = None;
        for (&key, bucket) in &self.buckets {
            if best.map_or(true, |(_, chars)| bucket.chars > chars) {
                best = Some((key, bucket.chars));
            }
        }
        best.map(|(key, _)| key_size(key))
    }

    /// Heading sizes: sizes above body, largest first, while each stays
    /// under `frequency_limit` of all runs.
    pub fn heading_table(&self, frequency_limit: f32) -> HeadingTable {
        let Some(body) = self.body_size() else {
            return HeadingTable::default();
        };
        let body_key = size_key(body);

        let mut levels = Vec::new();
        for (&key, bucket) in self.buckets.range(body_key + 1..).rev() {
            let frequency = bucket.runs as f32 / self.total_runs as f32;
            if frequency >= frequency_limit || levels.len() == MAX_HEADING_LEVELS {
                break;
            }
            levels.push(key);
        }

        log::debug!(
            "Body size {}pt, heading sizes {:?}",
            body,
            levels.iter().map(|&k| key_size(k)).collect::<Vec<_>>()
        );

        HeadingTable {
            body_size: body,
            levels,
        }
    }
}

/// Result of the document pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadingTable {
    body_size: f32,
    /// Half-point keys, index 0 = Heading1
    levels: Vec<u32>,
}

impl HeadingTable {
    pub fn body_size(&self) -> f32 {
        self.body_size
    }

    /// Heading sizes in points, Heading1 first.
    pub fn heading_sizes(&self) -> Vec<f32> {
        self.levels.iter().map(|&k| key_size(k)).collect()
    }

    /// Classification of a font size: table hit, then ratio fallback.
    pub fn classify_size(&self, size: f32) -> Classification {
        let key = size_key(size);
        if let Some(pos) = self.levels.iter().position(|&k| k == key) {
            return Classification::heading(pos as u8 + 1);
        }
        if self.body_size > 0.0 {
            let ratio = size / self.body_size;
            for (threshold, class) in HEADING_RATIOS {
                if ratio >= threshold {
                    return class;
                }
            }
        }
        Classification::Body
    }
}

/// Merges lines into paragraphs and classifies them.
#[derive(Debug, Clone)]
pub struct StructureClassifier {
    table: HeadingTable,
    gap_ratio: f32,
    font_delta: f32,
}

impl StructureClassifier {
    pub fn new(config: &LayoutConfig, table: HeadingTable) -> Self {
        Self {
            table,
            gap_ratio: config.paragraph_gap_ratio,
            font_delta: config.paragraph_font_delta,
        }
    }

    pub fn table(&self) -> &HeadingTable {
        &self.table
    }

    /// Group a column's lines (top to bottom) into paragraph line sets.
    pub fn group_lines(&self, lines: Vec<Line>) -> Vec<Vec<Line>> {
        let mut groups: Vec<Vec<Line>> = Vec::new();
        for line in lines {
            let joins = groups
                .last()
                .and_then(|g| g.last())
                .is_some_and(|prev| self.continues(prev, &line));
            match groups.last_mut() {
                Some(group) if joins => group.push(line),
                _ => groups.push(vec![line]),
            }
        }
        groups
    }

    fn continues(&self, prev: &Line, line: &Line) -> bool {
        let distance = (prev.bbox.y - line.bbox.y).abs();
        prev.column_index == line.column_index
            && distance < self.gap_ratio * prev.bbox.height
            && (prev.font_size - line.font_size).abs() <= self.font_delta
    }

    /// Build and classify all paragraphs of a column.
    ///
    /// Every line ends up in exactly one paragraph, including lines whose
    /// text is consumed entirely by a list marker.
    pub fn paragraphs(&self, lines: Vec<Line>, page_width: f32, page_height: f32) -> Vec<Paragraph> {
        self.group_lines(lines)
            .into_iter()
            .map(|group| self.classify(group, page_width, page_height))
            .collect()
    }

    /// Classify one paragraph's lines.
    pub fn classify(&self, lines: Vec<Line>, page_width: f32, page_height: f32) -> Paragraph {
        let font_size = dominant_size(&lines);
        let alignment = alignment_of(&lines, page_width);
        let text = lines
            .iter()
            .map(|l| l.merged_text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let char_count: usize = lines.iter().map(Line::char_count).sum();

        let mut classification = self.table.classify_size(font_size);
        if classification == Classification::Body
            && alignment == Alignment::Center
            && char_count < 100
            && lines.len() <= 2
            && font_size > self.table.body_size
        {
            classification = Classification::Heading2;
        }

        let (classification, text) = if classification.is_heading() {
            (classification, text)
        } else {
            match strip_list_prefix(&text) {
                Some((class, rest)) => (class, rest.to_string()),
                None => (classification, text),
            }
        };

        let top = lines
            .iter()
            .map(|l| l.bbox.y + l.bbox.height)
            .fold(f32::MIN, f32::max);
        let y_position = if page_height > 0.0 {
            (1.0 - top / page_height).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Paragraph {
            text,
            classification,
            alignment,
            y_position,
            font_size,
            column_index: lines.first().map_or(0, |l| l.column_index),
            lines,
        }
    }
}

/// Line size carrying the most characters.
fn dominant_size(lines: &[Line]) -> f32 {
    let mut chars: BTreeMap<u32, usize> = BTreeMap::new();
    for line in lines {
        *chars.entry(size_key(line.font_size)).or_default() += line.char_count();
    }
    let mut best: Option<(u32, usize)> = None;
    for (key, count) in chars {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map_or(0.0, |(key, _)| key_size(key))
}

fn alignment_of(lines: &[Line], page_width: f32) -> Alignment {
    if lines.is_empty() || page_width <= 0.0 {
        return Alignment::Left;
    }
    let x_start = lines.iter().map(|l| l.bbox.x_start).fold(f32::MAX, f32::min);
    let x_end = lines.iter().map(|l| l.bbox.x_end).fold(f32::MIN, f32::max);
    let left = x_start;
    let right = page_width - x_end;
    let width = x_end - x_start;

    if (left - right).abs() < 0.10 * page_width && width < 0.70 * page_width {
        Alignment::Center
    } else if right < 0.15 * page_width && left > 0.30 * page_width {
        Alignment::Right
    } else {
        Alignment::Left
    }
}

/// Detect a list marker and return the remaining text.
fn strip_list_prefix(text: &str) -> Option<(Classification, &str)> {
    let mut chars = text.chars();
    let first = chars.next()?;
    let rest = chars.as_str();

    if BULLETS.contains(&first) {
        return Some((Classification::ListBullet, rest.trim_start()));
    }
    if WEAK_BULLETS.contains(&first) && rest.starts_with(char::is_whitespace) {
        return Some((Classification::ListBullet, rest.trim_start()));
    }
    if let Some(m) = numbered_prefix().and_then(|re| re.find(text)) {
        return Some((Classification::ListNumbered, &text[m.end()..]));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineBox;

    fn run(text: &str, size: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            origin_x: 72.0,
            origin_y: 700.0,
            width: 100.0,
            height: size,
            font_size_estimate: size,
            font_token: "Helvetica".to_string(),
            page_number: 1,
            index: 0,
        }
    }

    fn line(text: &str, x_start: f32, x_end: f32, y: f32, size: f32) -> Line {
        Line {
            runs: Vec::new(),
            merged_text: text.to_string(),
            bbox: LineBox {
                x_start,
                x_end,
                y,
                height: size,
            },
            column_index: 0,
            font_size: size,
        }
    }

    fn classifier(body: f32, headings: &[f32]) -> StructureClassifier {
        let table = HeadingTable {
            body_size: body,
            levels: headings.iter().map(|&s| size_key(s)).collect(),
        };
        StructureClassifier::new(&LayoutConfig::default(), table)
    }

    #[test]
    fn test_histogram_body_and_headings() {
        let mut runs = Vec::new();
        for _ in 0..50 {
            runs.push(run("body text run", 10.0));
        }
        runs.push(run("Title", 24.0));
        runs.push(run("Section", 16.0));
        runs.push(run("Section", 16.0));

        let table = FontHistogram::from_runs(&runs).heading_table(0.10);
        assert_eq!(table.body_size(), 10.0);
        assert_eq!(table.heading_sizes(), vec![24.0, 16.0]);
        assert_eq!(table.classify_size(24.0), Classification::Heading1);
        assert_eq!(table.classify_size(16.2), Classification::Heading2);
    }

    #[test]
    fn test_dominant_size_with_rare_large_size_is_heading1() {
        // 95% of characters at 10pt; 3 of 100 runs at 14pt
        let mut runs = Vec::new();
        for _ in 0..97 {
            runs.push(run("abcdefghijklmnopqrstuvwxyz", 10.0));
        }
        for _ in 0..3 {
            runs.push(run("Introduction", 14.0));
        }
        let table = FontHistogram::from_runs(&runs).heading_table(0.10);
        assert_eq!(table.body_size(), 10.0);
        assert_eq!(table.classify_size(14.0), Classification::Heading1);
    }

    #[test]
    fn test_frequent_size_stops_heading_assignment() {
        let mut runs = Vec::new();
        for _ in 0..60 {
            runs.push(run("body body body body", 10.0));
        }
        for _ in 0..20 {
            runs.push(run("x", 12.0));
        }
        runs.push(run("Big", 20.0));
        let table = FontHistogram::from_runs(&runs).heading_table(0.10);
        assert_eq!(table.heading_sizes(), vec![20.0]);
        // 12pt is not in the table but clears the H3 ratio
        assert_eq!(table.classify_size(12.0), Classification::Heading3);
        assert_eq!(table.classify_size(11.0), Classification::Body);
    }

    #[test]
    fn test_ratio_fallback() {
        let table = HeadingTable {
            body_size: 10.0,
            levels: Vec::new(),
        };
        assert_eq!(table.classify_size(16.0), Classification::Heading1);
        assert_eq!(table.classify_size(13.0), Classification::Heading2);
        assert_eq!(table.classify_size(11.5), Classification::Heading3);
        assert_eq!(table.classify_size(11.0), Classification::Body);
    }

    #[test]
    fn test_lines_merge_into_paragraphs() {
        let c = classifier(10.0, &[]);
        let lines = vec![
            line("First line of text", 72.0, 540.0, 700.0, 10.0),
            line("continues here.", 72.0, 300.0, 688.0, 10.0),
            line("New paragraph", 72.0, 540.0, 660.0, 10.0),
        ];
        let paragraphs = c.paragraphs(lines, 612.0, 792.0);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text, "First line of text continues here.");
        assert_eq!(paragraphs[0].lines.len(), 2);
        assert_eq!(paragraphs[1].text, "New paragraph");
    }

    #[test]
    fn test_every_line_in_one_paragraph() {
        let c = classifier(10.0, &[18.0]);
        let lines = vec![
            line("Heading", 72.0, 200.0, 740.0, 18.0),
            line("Body paragraph", 72.0, 540.0, 700.0, 10.0),
            line("\u{2022}", 72.0, 80.0, 660.0, 10.0),
            line("- item", 72.0, 200.0, 620.0, 10.0),
            line("tail", 72.0, 200.0, 608.0, 10.0),
        ];
        let input: Vec<String> = lines.iter().map(|l| l.merged_text.clone()).collect();

        let paragraphs = c.paragraphs(lines, 612.0, 792.0);
        let grouped: Vec<String> = paragraphs
            .iter()
            .flat_map(|p| p.lines.iter().map(|l| l.merged_text.clone()))
            .collect();
        assert_eq!(grouped, input);

        let bullet = &paragraphs[2];
        assert_eq!(bullet.classification, Classification::ListBullet);
        assert!(bullet.is_empty());
    }

    #[test]
    fn test_font_change_splits_paragraph() {
        let c = classifier(10.0, &[18.0]);
        let lines = vec![
            line("Heading", 72.0, 200.0, 720.0, 18.0),
            line("Body under heading", 72.0, 540.0, 700.0, 10.0),
        ];
        let paragraphs = c.paragraphs(lines, 612.0, 792.0);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].classification, Classification::Heading1);
        assert_eq!(paragraphs[1].classification, Classification::Body);
    }

    #[test]
    fn test_alignment() {
        let c = classifier(10.0, &[]);
        let centered = c.classify(vec![line("Centered", 256.0, 356.0, 700.0, 10.0)], 612.0, 792.0);
        assert_eq!(centered.alignment, Alignment::Center);

        let right = c.classify(vec![line("Right", 400.0, 540.0, 700.0, 10.0)], 612.0, 792.0);
        assert_eq!(right.alignment, Alignment::Right);

        let left = c.classify(vec![line("Left", 72.0, 540.0, 700.0, 10.0)], 612.0, 792.0);
        assert_eq!(left.alignment, Alignment::Left);
    }

    #[test]
    fn test_centered_larger_text_promoted() {
        let c = classifier(10.0, &[]);
        let p = c.classify(vec![line("Abstract", 270.0, 342.0, 700.0, 11.0)], 612.0, 792.0);
        assert_eq!(p.classification, Classification::Heading2);

        let same = c.classify(vec![line("Centered body", 256.0, 356.0, 700.0, 10.0)], 612.0, 792.0);
        assert_eq!(same.classification, Classification::Body);
    }

    #[test]
    fn test_list_detection() {
        let c = classifier(10.0, &[]);
        let classify = |text: &str| c.classify(vec![line(text, 72.0, 400.0, 700.0, 10.0)], 612.0, 792.0);

        let p = classify("• First item");
        assert_eq!(p.classification, Classification::ListBullet);
        assert_eq!(p.text, "First item");

        let p = classify("- dashed");
        assert_eq!(p.classification, Classification::ListBullet);
        assert_eq!(p.text, "dashed");

        let p = classify("-5 degrees");
        assert_eq!(p.classification, Classification::Body);

        let p = classify("12. Twelfth");
        assert_eq!(p.classification, Classification::ListNumbered);
        assert_eq!(p.text, "Twelfth");

        assert_eq!(classify("(3) third").text, "third");
        assert_eq!(classify("4) fourth").classification, Classification::ListNumbered);
        assert_eq!(classify("2024 was a year").classification, Classification::Body);
    }

    #[test]
    fn test_heading_skips_list_detection() {
        let c = classifier(10.0, &[18.0]);
        let p = c.classify(vec![line("1. Introduction", 72.0, 250.0, 700.0, 18.0)], 612.0, 792.0);
        assert_eq!(p.classification, Classification::Heading1);
        assert_eq!(p.text, "1. Introduction");
    }

    #[test]
    fn test_y_position_normalized() {
        let c = classifier(10.0, &[]);
        let p = c.classify(vec![line("Top", 72.0, 200.0, 782.0, 10.0)], 612.0, 792.0);
        assert_eq!(p.y_position, 0.0);
        let p = c.classify(vec![line("Middle", 72.0, 200.0, 386.0, 10.0)], 612.0, 792.0);
        assert!((p.y_position - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let c = classifier(10.0, &[18.0, 14.0]);
        let lines = vec![
            line("Title", 200.0, 412.0, 740.0, 18.0),
            line("• item one", 72.0, 300.0, 700.0, 10.0),
            line("Body text", 72.0, 540.0, 660.0, 10.0),
        ];
        let first = c.paragraphs(lines.clone(), 612.0, 792.0);
        let second = c.paragraphs(lines, 612.0, 792.0);
        assert_eq!(first, second);
    }
}
