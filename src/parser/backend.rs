//! Page source abstraction.
//!
//! Layout and editing only see pages as a viewport plus a flat list of
//! positioned glyph runs. [`PageSource`] is that boundary; [`LopdfBackend`]
//! implements it by interpreting content streams with `lopdf`.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::content::{
    number, resolve, ContentInterpreter, ImagePlacement, InterpretedContent, Matrix,
};
use crate::detect::sniff_header;
use crate::error::{Error, Result};
use crate::model::{Metadata, Resource};

/// Visible page area in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
    /// Lower-left corner of the box in user space
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

/// One text-showing operation as it appears on the page.
///
/// `transform` is the text rendering matrix at the start of the run,
/// already shifted so the viewport origin sits at (0, 0).
#[derive(Debug, Clone, PartialEq)]
pub struct RawGlyphRun {
    pub text: String,
    pub transform: [f32; 6],
    /// Advance width in points, when known
    pub width: Option<f32>,
    /// Glyph box height in points, when known
    pub height: Option<f32>,
    pub font_token: String,
}

/// Glyph runs of one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub viewport: Viewport,
    pub glyphs: Vec<RawGlyphRun>,
}

/// An extracted image with its placement in viewport coordinates.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    /// Resource name on the page (e.g. "Im1")
    pub name: String,
    pub resource: Resource,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Source of positioned page text.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Viewport and glyph runs of a page (1-indexed).
    fn page_content(&self, page_number: u32) -> Result<PageContent>;

    /// Images drawn on a page (1-indexed).
    fn page_images(&self, page_number: u32) -> Result<Vec<PlacedImage>>;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// [`PageSource`] backed by `lopdf::Document`.
#[derive(Debug, Clone)]
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        sniff_header(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc)
    }

    /// Load from a reader.
    pub fn load_reader<R: std::io::Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes(&data)
    }

    /// Wrap an already parsed document.
    pub fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(Error::Corrupted("document has no pages".to_string()));
        }
        Ok(Self { doc, pages })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Mutable access for writing patches.
    pub(crate) fn raw_doc_mut(&mut self) -> &mut LopdfDocument {
        &mut self.doc
    }

    /// Object id of a page (1-indexed).
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        self.pages
            .get(&page_number)
            .copied()
            .ok_or(Error::PageOutOfRange(page_number, self.pages.len() as u32))
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Visible area of a page: CropBox when present, MediaBox otherwise.
    pub fn viewport(&self, page_number: u32) -> Result<Viewport> {
        let page_id = self.page_id(page_number)?;
        let rect = self
            .inherited(page_id, b"CropBox")
            .or_else(|| self.inherited(page_id, b"MediaBox"))
            .and_then(|o| o.as_array().ok())
            .and_then(|a| rect_from_array(&self.doc, a));

        Ok(match rect {
            Some([x0, y0, x1, y1]) => Viewport {
                width: (x1 - x0).abs(),
                height: (y1 - y0).abs(),
                origin_x: x0.min(x1),
                origin_y: y0.min(y1),
            },
            None => {
                log::debug!("Page {} has no usable MediaBox, assuming Letter", page_number);
                Viewport::default()
            }
        })
    }

    /// Resources dictionary of a page, following inheritance.
    pub(crate) fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        self.inherited(page_id, b"Resources")
            .and_then(|o| o.as_dict().ok())
    }

    /// Decompressed page content, concatenating content arrays.
    pub fn page_stream(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(Vec::new()),
        };

        let stream_data = |id: ObjectId| -> Result<Vec<u8>> {
            match self.doc.get_object(id)? {
                Object::Stream(s) => Ok(s
                    .decompressed_content()
                    .unwrap_or_else(|_| s.content.clone())),
                _ => Err(Error::TextExtract(format!(
                    "content object {} {} is not a stream",
                    id.0, id.1
                ))),
            }
        };

        match resolve(&self.doc, contents) {
            Some(Object::Stream(s)) => Ok(s
                .decompressed_content()
                .unwrap_or_else(|_| s.content.clone())),
            Some(Object::Array(arr)) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        content.extend_from_slice(&stream_data(*r)?);
                        content.push(b'\n');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::TextExtract("invalid page content".to_string())),
        }
    }

    /// Document metadata from the Info dictionary.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.version());
        metadata.page_count = self.page_count();

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| resolve(&self.doc, o))
            .and_then(|o| o.as_dict().ok());

        if let Some(info) = info {
            metadata.title = info_string(info, b"Title");
            metadata.author = info_string(info, b"Author");
            metadata.subject = info_string(info, b"Subject");
            metadata.creator = info_string(info, b"Creator");
            metadata.producer = info_string(info, b"Producer");
            metadata.created = info_string(info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modified = info_string(info, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }

        metadata
    }

    fn interpret(&self, page_number: u32) -> Result<(Viewport, InterpretedContent)> {
        let page_id = self.page_id(page_number)?;
        let viewport = self.viewport(page_number)?;
        let data = self.page_stream(page_id)?;
        let ctm = Matrix::translation(-viewport.origin_x, -viewport.origin_y);
        let content = ContentInterpreter::new(&self.doc)
            .run(&data, self.page_resources(page_id), ctm)
            .map_err(|e| Error::TextExtract(format!("page {}: {}", page_number, e)))?;
        Ok((viewport, content))
    }

    /// Walk the page tree upward for an inheritable attribute.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.doc.get_dictionary(page_id).ok();
        let mut hops = 0;
        while let Some(dict) = current {
            if let Ok(value) = dict.get(key) {
                return resolve(&self.doc, value);
            }
            hops += 1;
            if hops > 32 {
                return None;
            }
            current = dict
                .get(b"Parent")
                .ok()
                .and_then(|p| p.as_reference().ok())
                .and_then(|id| self.doc.get_dictionary(id).ok());
        }
        None
    }

    fn extract_image(&self, placement: &ImagePlacement) -> Result<Resource> {
        let stream = match self.doc.get_object(placement.object_id) {
            Ok(Object::Stream(stream)) => stream,
            _ => return Err(Error::ImageExtract("invalid image XObject".to_string())),
        };
        let dict = &stream.dict;

        let filter = match dict.get(b"Filter").ok().and_then(|f| resolve(&self.doc, f)) {
            Some(Object::Name(n)) => String::from_utf8_lossy(n).to_string(),
            Some(Object::Array(arr)) => arr
                .last()
                .and_then(|o| o.as_name_str().ok())
                .unwrap_or("")
                .to_string(),
            _ => String::new(),
        };

        let (mime_type, data) = match filter.as_str() {
            "DCTDecode" => ("image/jpeg".to_string(), stream.content.clone()),
            "JPXDecode" => ("image/jp2".to_string(), stream.content.clone()),
            _ => {
                let decoded = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                let mime = Resource::detect_mime_type(&decoded)
                    .unwrap_or("application/octet-stream")
                    .to_string();
                (mime, decoded)
            }
        };

        let mut resource = Resource::image(data, mime_type);

        let int = |key: &[u8]| dict.get(key).ok().and_then(|o| o.as_i64().ok());
        if let (Some(w), Some(h)) = (int(b"Width"), int(b"Height")) {
            resource = resource.with_dimensions(w as u32, h as u32);
        }
        if let Some(bits) = int(b"BitsPerComponent") {
            resource = resource.with_bits_per_component(bits as u8);
        }

        let color_space = match dict.get(b"ColorSpace").ok().and_then(|c| resolve(&self.doc, c)) {
            Some(Object::Name(n)) => Some(String::from_utf8_lossy(n).to_string()),
            Some(Object::Array(arr)) => arr
                .first()
                .and_then(|o| o.as_name_str().ok())
                .map(String::from),
            _ => None,
        };
        if let Some(cs) = color_space {
            resource = resource.with_color_space(cs);
        }

        Ok(resource)
    }
}

impl PageSource for LopdfBackend {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_content(&self, page_number: u32) -> Result<PageContent> {
        let (viewport, content) = self.interpret(page_number)?;
        Ok(PageContent {
            viewport,
            glyphs: content.glyphs,
        })
    }

    fn page_images(&self, page_number: u32) -> Result<Vec<PlacedImage>> {
        let (_, content) = self
            .interpret(page_number)
            .map_err(|e| Error::ImageExtract(e.to_string()))?;

        let mut images = Vec::with_capacity(content.images.len());
        for placement in &content.images {
            let resource = self.extract_image(placement)?;
            images.push(PlacedImage {
                name: placement.name.clone(),
                resource,
                x: placement.x,
                y: placement.y,
                width: placement.width,
                height: placement.height,
            });
        }
        Ok(images)
    }
}

fn rect_from_array(doc: &LopdfDocument, arr: &[Object]) -> Option<[f32; 4]> {
    if arr.len() < 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, obj) in rect.iter_mut().zip(arr) {
        *slot = resolve(doc, obj).and_then(number)?;
    }
    Some(rect)
}

/// Read a text string from an Info dictionary.
fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            let text = decode_text_simple(bytes);
            let text = text.trim_matches('\0').trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let field = |range: std::ops::Range<usize>, default: u32| {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };
    let (month, day) = (field(4..6, 1), field(6..8, 1));
    let (hour, minute, second) = (field(8..10, 0), field(10..12, 0), field(12..14, 0));

    let naive = chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))?;

    // Offset: Z, or +HH'mm / -HH'mm
    let offset_minutes = match s.get(14..15) {
        Some(sign @ ("+" | "-")) => {
            let hours: i64 = s.get(15..17).and_then(|h| h.parse().ok()).unwrap_or(0);
            let minutes: i64 = s
                .get(17..)
                .map(|m| m.trim_matches('\''))
                .and_then(|m| m.get(0..2))
                .and_then(|m| m.parse().ok())
                .unwrap_or(0);
            let total = hours * 60 + minutes;
            if sign == "-" {
                -total
            } else {
                total
            }
        }
        _ => 0,
    };

    let utc = naive - chrono::Duration::minutes(offset_minutes);
    Some(chrono::DateTime::from_naive_utc_and_offset(utc, chrono::Utc))
}
