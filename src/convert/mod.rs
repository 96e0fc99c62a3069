//! Multi-page conversion pipeline.
//!
//! Conversion runs in two passes. The first collects text runs (and
//! optionally images) from every selected page. The second builds one
//! document-wide font histogram, derives the heading table from it, and
//! reconstructs columns, lines and paragraphs page by page.
//!
//! ```no_run
//! use pagelift::convert::{ConvertOptions, Converter};
//! use pagelift::parser::LopdfBackend;
//!
//! fn main() -> pagelift::Result<()> {
//!     let backend = LopdfBackend::load_file("report.pdf")?;
//!     let mut converter = Converter::new(ConvertOptions::default())
//!         .on_progress(|p| println!("page {} ({:.0}%)", p.page, p.fraction * 100.0));
//!     let doc = converter.convert(&backend)?;
//!     println!("{}", doc.plain_text());
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::layout::{FontHistogram, GlyphRunCollector, LayoutAnalyzer};
use crate::model::{Block, ImageBlock, Metadata, Page, StructuredDocument, TextRun};
use crate::parser::{ErrorMode, LopdfBackend, PageSource, PlacedImage, Viewport};

pub use crate::parser::{ConvertOptions, PageSelection};

/// Cooperative cancellation flag shared between a caller and a running
/// conversion.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The converter stops before its next page.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Progress after one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Page just processed (1-indexed)
    pub page: u32,
    /// Selected pages processed so far
    pub completed: u32,
    /// Number of selected pages
    pub total: u32,
    /// `completed / total`, in 0.0..=1.0
    pub fraction: f32,
}

struct CollectedPage {
    number: u32,
    viewport: Viewport,
    runs: Vec<TextRun>,
    images: Vec<PlacedImage>,
}

/// Sequential page converter.
pub struct Converter<'a> {
    options: ConvertOptions,
    cancel: Option<CancellationToken>,
    progress: Option<Box<dyn FnMut(Progress) + 'a>>,
}

impl<'a> Converter<'a> {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            cancel: None,
            progress: None,
        }
    }

    /// Stop with [`Error::Cancelled`] once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Call `f` after each selected page.
    pub fn on_progress(mut self, f: impl FnMut(Progress) + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a document loaded with [`LopdfBackend`], including its
    /// Info-dictionary metadata.
    pub fn convert(&mut self, backend: &LopdfBackend) -> Result<StructuredDocument> {
        self.convert_source(backend, backend.metadata())
    }

    /// Convert any page source.
    pub fn convert_source<S: PageSource + ?Sized>(
        &mut self,
        source: &S,
        metadata: Metadata,
    ) -> Result<StructuredDocument> {
        let collected = self.collect_pages(source)?;

        let mut doc = StructuredDocument::new();
        doc.metadata = metadata;
        doc.metadata.page_count = source.page_count();

        let table = FontHistogram::from_runs(collected.iter().flat_map(|p| &p.runs))
            .heading_table(self.options.layout.heading_frequency_limit);

        let analyzer = LayoutAnalyzer::new(self.options.layout.clone());
        for page in collected {
            let (width, height) = (page.viewport.width, page.viewport.height);
            let mut out = Page::new(page.number, width, height);

            let lines = analyzer.page_lines(&page.runs, width);
            let gaps = lines.gaps.clone();
            for paragraph in analyzer.paragraphs(lines, &table, width, height) {
                out.add_paragraph(paragraph);
            }

            for image in page.images {
                let id = format!("page{}_{}", page.number, image.name);
                out.add_block(Block::Image(image_block(&id, &image, &gaps, height)));
                doc.add_resource(id, image.resource);
            }

            out.sort_blocks();
            doc.add_page(out);
        }

        Ok(doc)
    }

    fn collect_pages<S: PageSource + ?Sized>(&mut self, source: &S) -> Result<Vec<CollectedPage>> {
        let selected: Vec<u32> = (1..=source.page_count())
            .filter(|n| self.options.pages.includes(*n))
            .collect();
        let total = selected.len() as u32;
        let collector = GlyphRunCollector::new();
        let mut pages = Vec::with_capacity(selected.len());

        for (i, &number) in selected.iter().enumerate() {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                log::debug!("Conversion cancelled before page {}", number);
                return Err(Error::Cancelled);
            }

            match collector.collect_page(source, number) {
                Ok((content, runs)) => {
                    let images = if self.options.extract_images {
                        source.page_images(number).unwrap_or_else(|e| {
                            log::warn!("Skipping images on page {}: {}", number, e);
                            Vec::new()
                        })
                    } else {
                        Vec::new()
                    };
                    pages.push(CollectedPage {
                        number,
                        viewport: content.viewport,
                        runs,
                        images,
                    });
                }
                Err(e) if self.options.error_mode == ErrorMode::Strict => return Err(e),
                Err(e) => log::warn!("Skipping page {}: {}", number, e),
            }

            let completed = i as u32 + 1;
            if let Some(report) = self.progress.as_mut() {
                report(Progress {
                    page: number,
                    completed,
                    total,
                    fraction: completed as f32 / total as f32,
                });
            }
        }

        Ok(pages)
    }
}

impl fmt::Debug for Converter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("options", &self.options)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

fn image_block(id: &str, image: &PlacedImage, gaps: &[f32], page_height: f32) -> ImageBlock {
    let center = image.x + image.width / 2.0;
    let top = image.y + image.height;
    let y_position = if page_height > 0.0 {
        (1.0 - top / page_height).clamp(0.0, 1.0)
    } else {
        0.0
    };
    ImageBlock {
        resource_id: id.to_string(),
        x: image.x,
        y: image.y,
        width: image.width,
        height: image.height,
        y_position,
        column_index: gaps.iter().filter(|&&g| g < center).count(),
    }
}

/// Load a document from a file with `tokio::fs`.
#[cfg(feature = "async")]
pub async fn load_document_async(path: impl AsRef<Path>) -> Result<LopdfBackend> {
    let data = tokio::fs::read(path).await?;
    LopdfBackend::load_bytes(&data)
}

/// Load and convert a file.
pub fn convert_file(path: impl AsRef<Path>, options: ConvertOptions) -> Result<StructuredDocument> {
    let backend = LopdfBackend::load_file(path)?;
    Converter::new(options).convert(&backend)
}

/// Load and convert in-memory document bytes.
pub fn convert_bytes(data: &[u8], options: ConvertOptions) -> Result<StructuredDocument> {
    let backend = LopdfBackend::load_bytes(data)?;
    Converter::new(options).convert(&backend)
}
