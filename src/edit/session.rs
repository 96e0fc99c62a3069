//! Interactive editing session over one document.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::locator::{LocateResult, TextMatch, TextProximityLocator};
use super::patcher::{PagePatch, VectorPatcher};
use super::raster::{PageRasterSource, RasterSurface};
use super::store::EditElementStore;
use super::writer::PatchWriter;
use crate::coords::{CoordinateTransformer, PercentPoint};
use crate::error::{Error, Result};
use crate::layout::GlyphRunCollector;
use crate::model::{ElementId, StyleOverrides, TextRun};
use crate::parser::{EditorConfig, LayoutConfig, LopdfBackend, PageSource, Viewport};
use crate::style::{FontSources, StyleResolver};

/// What a click did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// An existing element was selected
    Selected(ElementId),
    /// Page text was picked up into a new element
    Created(ElementId, TextMatch),
    /// Nothing near the click
    Miss,
}

#[derive(Debug, Clone)]
struct PageRuns {
    viewport: Viewport,
    runs: Vec<TextRun>,
}

/// A loaded document plus its edit elements.
///
/// The original document is never modified; [`save`](Self::save) writes
/// the overlays into a copy, so saving twice does not stack patches.
#[derive(Debug)]
pub struct EditorSession {
    backend: LopdfBackend,
    resolver: StyleResolver,
    store: EditElementStore,
    locator: TextProximityLocator,
    patcher: VectorPatcher,
    collector: GlyphRunCollector,
    run_cache: HashMap<u32, PageRuns>,
}

impl EditorSession {
    /// Open a document with default configuration.
    pub fn open(data: &[u8], fonts: FontSources) -> Result<Self> {
        Self::open_with(data, fonts, EditorConfig::default(), LayoutConfig::default())
    }

    /// Open a document from a file.
    pub fn open_file(path: impl AsRef<Path>, fonts: FontSources) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::open(&data, fonts)
    }

    pub fn open_with(
        data: &[u8],
        fonts: FontSources,
        editor: EditorConfig,
        layout: LayoutConfig,
    ) -> Result<Self> {
        let backend = LopdfBackend::load_bytes(data)?;
        log::debug!("Editor session opened, {} page(s)", backend.page_count());
        Ok(Self {
            backend,
            resolver: StyleResolver::new(fonts),
            locator: TextProximityLocator::new(&editor, layout),
            patcher: VectorPatcher::new(&editor),
            store: EditElementStore::new(editor),
            collector: GlyphRunCollector::new(),
            run_cache: HashMap::new(),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.backend.page_count()
    }

    pub fn store(&self) -> &EditElementStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EditElementStore {
        &mut self.store
    }

    /// Coordinate mapping for a page.
    pub fn transformer(&self, page_number: u32) -> Result<CoordinateTransformer> {
        let viewport = self.backend.viewport(page_number)?;
        Ok(CoordinateTransformer::new(viewport.width, viewport.height))
    }

    /// Text runs of a page, collected once and cached.
    pub fn page_runs(&mut self, page_number: u32) -> Result<&[TextRun]> {
        let page = self.cached_page(page_number)?;
        Ok(&page.runs)
    }

    fn cached_page(&mut self, page_number: u32) -> Result<&PageRuns> {
        if !self.run_cache.contains_key(&page_number) {
            let (content, runs) = self.collector.collect_page(&self.backend, page_number)?;
            self.run_cache.insert(
                page_number,
                PageRuns {
                    viewport: content.viewport,
                    runs,
                },
            );
        }
        self.run_cache
            .get(&page_number)
            .ok_or(Error::PageOutOfRange(page_number, self.page_count()))
    }

    /// Resolve a click without changing anything.
    pub fn locate(&mut self, page_number: u32, click: PercentPoint) -> Result<LocateResult> {
        self.cached_page(page_number)?;
        let page = &self.run_cache[&page_number];
        let transformer = CoordinateTransformer::new(page.viewport.width, page.viewport.height);
        Ok(self.locator.locate(
            click,
            &transformer,
            &page.runs,
            self.store.elements_on_page(page_number),
        ))
    }

    /// Click-to-edit: select an element, or pick up the text line under
    /// the click as a new element covering the original.
    pub fn click(&mut self, page_number: u32, click: PercentPoint) -> Result<ClickOutcome> {
        Ok(match self.locate(page_number, click)? {
            LocateResult::Existing(id) => ClickOutcome::Selected(id),
            LocateResult::Miss => ClickOutcome::Miss,
            LocateResult::Text(found) => {
                let overrides = StyleOverrides::new()
                    .with_font_size(found.font_size)
                    .with_family(found.font_family)
                    .with_style(found.bold, found.italic)
                    .covering(found.original_rect);
                let id = self.store.create_element(
                    page_number,
                    found.anchor(),
                    found.text.clone(),
                    overrides,
                );
                ClickOutcome::Created(id, found)
            }
        })
    }

    /// Add a new free-standing text element.
    pub fn add_text(
        &mut self,
        page_number: u32,
        anchor: PercentPoint,
        text: impl Into<String>,
        overrides: StyleOverrides,
    ) -> Result<ElementId> {
        self.backend.page_id(page_number)?;
        Ok(self.store.create_element(page_number, anchor, text, overrides))
    }

    /// Render the backdrop of a page through a caller-supplied renderer.
    pub fn render_backdrop(
        &self,
        source: &dyn PageRasterSource,
        page_number: u32,
        scale: f32,
    ) -> Result<RasterSurface> {
        self.backend.page_id(page_number)?;
        source.render(page_number, scale).map_err(|e| match e {
            Error::Surface(_) | Error::PageOutOfRange(..) => e,
            other => Error::Surface(other.to_string()),
        })
    }

    /// Plan overlays for all current elements.
    pub fn plan(&mut self) -> Result<Vec<PagePatch>> {
        let mut sizes = BTreeMap::new();
        for page in self.store.elements().iter().map(|e| e.page_number) {
            if !sizes.contains_key(&page) {
                sizes.insert(page, self.transformer(page)?);
            }
        }
        Ok(self
            .patcher
            .plan(self.store.elements(), &mut self.resolver, &sizes))
    }

    /// Document bytes with all elements drawn in.
    pub fn save(&mut self) -> Result<Vec<u8>> {
        let patches = self.plan()?;
        let mut copy = self.backend.clone();
        PatchWriter::new(&mut copy).write(&patches)?;

        let mut out = Vec::new();
        copy.raw_doc_mut().save_to(&mut out)?;
        log::debug!(
            "Saved {} element(s) across {} page(s)",
            self.store.len(),
            patches.len()
        );
        Ok(out)
    }

    /// Save to a file.
    pub fn save_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let data = self.save()?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
