//! Base fonts, bundled Unicode fonts and font byte sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ttf_parser::Face;

use crate::error::{Error, Result};

/// The twelve non-embedded Latin base fonts usable without a font program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl BaseFont {
    /// All base fonts.
    pub const ALL: [BaseFont; 12] = [
        BaseFont::Helvetica,
        BaseFont::HelveticaBold,
        BaseFont::HelveticaOblique,
        BaseFont::HelveticaBoldOblique,
        BaseFont::TimesRoman,
        BaseFont::TimesBold,
        BaseFont::TimesItalic,
        BaseFont::TimesBoldItalic,
        BaseFont::Courier,
        BaseFont::CourierBold,
        BaseFont::CourierOblique,
        BaseFont::CourierBoldOblique,
    ];

    /// PostScript name used in the `/BaseFont` entry.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            BaseFont::Helvetica => "Helvetica",
            BaseFont::HelveticaBold => "Helvetica-Bold",
            BaseFont::HelveticaOblique => "Helvetica-Oblique",
            BaseFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            BaseFont::TimesRoman => "Times-Roman",
            BaseFont::TimesBold => "Times-Bold",
            BaseFont::TimesItalic => "Times-Italic",
            BaseFont::TimesBoldItalic => "Times-BoldItalic",
            BaseFont::Courier => "Courier",
            BaseFont::CourierBold => "Courier-Bold",
            BaseFont::CourierOblique => "Courier-Oblique",
            BaseFont::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Look up a base font by its PostScript name, ignoring any subset prefix.
    pub fn from_pdf_name(name: &str) -> Option<BaseFont> {
        let name = name.split_once('+').map_or(name, |(_, rest)| rest);
        BaseFont::ALL.into_iter().find(|f| f.pdf_name() == name)
    }
}

/// Style variants of the bundled full-Unicode font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnicodeVariant {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl UnicodeVariant {
    /// All variants in preference order for fallback.
    pub const ALL: [UnicodeVariant; 4] = [
        UnicodeVariant::Regular,
        UnicodeVariant::Bold,
        UnicodeVariant::Italic,
        UnicodeVariant::BoldItalic,
    ];

    /// Variant matching a weight and slant.
    pub fn from_style(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => UnicodeVariant::Regular,
            (true, false) => UnicodeVariant::Bold,
            (false, true) => UnicodeVariant::Italic,
            (true, true) => UnicodeVariant::BoldItalic,
        }
    }

    /// File name looked up by directory sources.
    pub fn file_name(&self) -> &'static str {
        match self {
            UnicodeVariant::Regular => "NotoSans-Regular.ttf",
            UnicodeVariant::Bold => "NotoSans-Bold.ttf",
            UnicodeVariant::Italic => "NotoSans-Italic.ttf",
            UnicodeVariant::BoldItalic => "NotoSans-BoldItalic.ttf",
        }
    }

    /// This variant first, then the others.
    pub fn fallback_order(self) -> impl Iterator<Item = UnicodeVariant> {
        std::iter::once(self).chain(Self::ALL.into_iter().filter(move |v| *v != self))
    }
}

/// Width used when the face cannot be read.
const MISSING_WIDTH: u16 = 500;

/// A validated TrueType/OpenType font program.
#[derive(Debug, Clone)]
pub struct UnicodeFont {
    variant: UnicodeVariant,
    data: Vec<u8>,
    postscript_name: String,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
}

impl UnicodeFont {
    /// Parse and validate font bytes.
    pub fn parse(variant: UnicodeVariant, data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::FontLoad(format!("{:?}: empty font data", variant)));
        }
        let face = Face::parse(&data, 0)
            .map_err(|e| Error::FontLoad(format!("{:?}: {}", variant, e)))?;

        let postscript_name = face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|name| name.to_string())
            .unwrap_or_else(|| format!("PageliftUnicode-{:?}", variant));
        let bbox = face.global_bounding_box();
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascender);

        Ok(Self {
            variant,
            postscript_name,
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            data,
        })
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }

    pub fn variant(&self) -> UnicodeVariant {
        self.variant
    }

    /// Raw font program for embedding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    /// Convert font units to thousandths of an em.
    pub fn to_pdf_units(&self, value: i16) -> i32 {
        i32::from(value) * 1000 / i32::from(self.units_per_em.max(1))
    }

    pub fn pdf_ascender(&self) -> i32 {
        self.to_pdf_units(self.ascender)
    }

    pub fn pdf_descender(&self) -> i32 {
        self.to_pdf_units(self.descender)
    }

    pub fn pdf_cap_height(&self) -> i32 {
        self.to_pdf_units(self.cap_height)
    }

    pub fn pdf_bbox(&self) -> [i32; 4] {
        self.bbox.map(|v| self.to_pdf_units(v))
    }

    /// Glyph id for a character; 0 (`.notdef`) when unmapped.
    pub fn glyph_id(&self, ch: char) -> u16 {
        self.face()
            .and_then(|f| f.glyph_index(ch))
            .map_or(0, |g| g.0)
    }

    /// Glyph ids of a string, one per character.
    pub fn glyph_ids(&self, text: &str) -> Vec<u16> {
        match self.face() {
            Some(face) => text
                .chars()
                .map(|c| face.glyph_index(c).map_or(0, |g| g.0))
                .collect(),
            None => vec![0; text.chars().count()],
        }
    }

    /// Advance of a glyph in thousandths of an em.
    pub fn glyph_width(&self, glyph_id: u16) -> u16 {
        match self.face() {
            Some(face) => self.advance(&face, glyph_id),
            None => MISSING_WIDTH,
        }
    }

    /// Advances of several glyphs, parsing the face once.
    pub fn glyph_widths(&self, glyph_ids: &[u16]) -> Vec<u16> {
        match self.face() {
            Some(face) => glyph_ids.iter().map(|&g| self.advance(&face, g)).collect(),
            None => vec![MISSING_WIDTH; glyph_ids.len()],
        }
    }

    fn advance(&self, face: &Face<'_>, glyph_id: u16) -> u16 {
        let advance = face
            .glyph_hor_advance(ttf_parser::GlyphId(glyph_id))
            .unwrap_or(0);
        let scaled = u32::from(advance) * 1000 / u32::from(self.units_per_em.max(1));
        scaled.min(u32::from(u16::MAX)) as u16
    }

    /// Width of a string set at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = match self.face() {
            Some(face) => text
                .chars()
                .map(|c| face.glyph_index(c).map_or(0, |g| g.0))
                .map(|g| u32::from(self.advance(&face, g)))
                .sum(),
            None => text.chars().count() as u32 * u32::from(MISSING_WIDTH),
        };
        units as f32 * size / 1000.0
    }
}

/// Supplies raw font bytes for a Unicode variant.
pub trait FontSource {
    /// Short label used in log messages.
    fn name(&self) -> &str;

    /// Fetch the font program for a variant.
    fn fetch(&self, variant: UnicodeVariant) -> Result<Vec<u8>>;
}

/// Reads `NotoSans-*.ttf` files from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryFontSource {
    dir: PathBuf,
}

impl DirectoryFontSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl FontSource for DirectoryFontSource {
    fn name(&self) -> &str {
        "directory"
    }

    fn fetch(&self, variant: UnicodeVariant) -> Result<Vec<u8>> {
        let path = self.dir.join(variant.file_name());
        std::fs::read(&path).map_err(|e| Error::FontLoad(format!("{}: {}", path.display(), e)))
    }
}

/// Font bytes supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct MemoryFontSource {
    fonts: HashMap<UnicodeVariant, Vec<u8>>,
}

impl MemoryFontSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes for a variant.
    pub fn with_font(mut self, variant: UnicodeVariant, data: Vec<u8>) -> Self {
        self.fonts.insert(variant, data);
        self
    }
}

impl FontSource for MemoryFontSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, variant: UnicodeVariant) -> Result<Vec<u8>> {
        self.fonts
            .get(&variant)
            .cloned()
            .ok_or_else(|| Error::FontLoad(format!("{:?} not registered", variant)))
    }
}

/// Font sources tried in priority order.
#[derive(Default)]
pub struct FontSources {
    sources: Vec<Box<dyn FontSource>>,
}

impl FontSources {
    /// No sources: every Unicode request falls back to base fonts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with lower priority than those already added.
    pub fn with_source(mut self, source: impl FontSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Fetch and validate a variant from the first source that has it.
    pub fn load(&self, variant: UnicodeVariant) -> Result<UnicodeFont> {
        let mut last_error = None;
        for source in &self.sources {
            match source
                .fetch(variant)
                .and_then(|data| UnicodeFont::parse(variant, data))
            {
                Ok(font) => return Ok(font),
                Err(e) => {
                    log::debug!("Font source {} failed for {:?}: {}", source.name(), variant, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::FontLoad("no font sources configured".to_string())))
    }
}

impl std::fmt::Debug for FontSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("FontSources").field("sources", &names).finish()
    }
}

/// A minimal TrueType font for tests: glyphs for U+0020-U+04FF, 600 units wide.
#[cfg(test)]
pub(crate) fn test_font_bytes() -> Vec<u8> {
    test_font_with_metrics(1000, 600)
}

#[cfg(test)]
fn test_font_with_metrics(units_per_em: u16, advance: u16) -> Vec<u8> {
    const FIRST: u16 = 0x20;
    const LAST: u16 = 0x04FF;
    let num_glyphs = LAST - FIRST + 2;

    fn be16(out: &mut Vec<u8>, v: u16) {
        out.extend_from_slice(&v.to_be_bytes());
    }
    fn be32(out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    let mut cmap = Vec::new();
    be16(&mut cmap, 0);
    be16(&mut cmap, 1);
    be16(&mut cmap, 3);
    be16(&mut cmap, 1);
    be32(&mut cmap, 12);
    // format 4, two segments
    let seg_count = 2u16;
    be16(&mut cmap, 4);
    be16(&mut cmap, 16 + seg_count * 8);
    be16(&mut cmap, 0);
    be16(&mut cmap, seg_count * 2);
    be16(&mut cmap, 4);
    be16(&mut cmap, 1);
    be16(&mut cmap, 0);
    be16(&mut cmap, LAST);
    be16(&mut cmap, 0xFFFF);
    be16(&mut cmap, 0);
    be16(&mut cmap, FIRST);
    be16(&mut cmap, 0xFFFF);
    be16(&mut cmap, 1u16.wrapping_sub(FIRST));
    be16(&mut cmap, 1);
    be16(&mut cmap, 0);
    be16(&mut cmap, 0);

    let mut head = Vec::new();
    be32(&mut head, 0x0001_0000);
    be32(&mut head, 0x0001_0000);
    be32(&mut head, 0);
    be32(&mut head, 0x5F0F_3CF5);
    be16(&mut head, 0);
    be16(&mut head, units_per_em);
    head.extend_from_slice(&[0; 16]);
    for v in [0i16, -200, 600, 800] {
        be16(&mut head, v as u16);
    }
    be16(&mut head, 0);
    be16(&mut head, 8);
    be16(&mut head, 2);
    be16(&mut head, 0);
    be16(&mut head, 0);

    let mut hhea = Vec::new();
    be32(&mut hhea, 0x0001_0000);
    be16(&mut hhea, 800);
    be16(&mut hhea, (-200i16) as u16);
    be16(&mut hhea, 0);
    be16(&mut hhea, advance);
    hhea.extend_from_slice(&[0; 6]);
    be16(&mut hhea, 1);
    be16(&mut hhea, 0);
    hhea.extend_from_slice(&[0; 12]);
    be16(&mut hhea, 1);

    let mut hmtx = Vec::new();
    be16(&mut hmtx, advance);
    be16(&mut hmtx, 0);
    hmtx.extend(std::iter::repeat(0u8).take(2 * (num_glyphs as usize - 1)));

    let mut maxp = Vec::new();
    be32(&mut maxp, 0x0000_5000);
    be16(&mut maxp, num_glyphs);

    let tables: [(&[u8; 4], Vec<u8>); 5] = [
        (b"cmap", cmap),
        (b"head", head),
        (b"hhea", hhea),
        (b"hmtx", hmtx),
        (b"maxp", maxp),
    ];

    let mut font = Vec::new();
    be32(&mut font, 0x0001_0000);
    be16(&mut font, tables.len() as u16);
    be16(&mut font, 64);
    be16(&mut font, 2);
    be16(&mut font, 16);

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        font.extend_from_slice(*tag);
        be32(&mut font, 0);
        be32(&mut font, offset as u32);
        be32(&mut font, data.len() as u32);
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    font.extend_from_slice(&body);
    font
}
