//! Content stream interpretation.
//!
//! Walks a page's content operators with a graphics/text state machine and
//! reports every text-showing operation as a [`RawGlyphRun`] carrying the
//! text rendering matrix at its start. Image XObjects are reported with the
//! rectangle the CTM maps the unit square to. Form XObjects are entered
//! recursively with their own resources.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::backend::{decode_text_simple, RawGlyphRun};
use crate::error::{Error, Result};
use crate::style::BaseFont;

/// Nested form XObjects deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 8;

/// TJ adjustments (thousandths of an em) wider than this read as a word space.
const SPACE_ADJUSTMENT: f32 = 200.0;

/// Advance used for codes of fonts with no width information.
const FALLBACK_WIDTH: f32 = 500.0;

/// Composite font codes are read as two bytes.
const MAX_CID: u32 = 0xFFFF;

/// A 2D affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn from_array(m: [f32; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    pub fn to_array(self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Compose: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// An image XObject drawn on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// Object holding the image stream
    pub object_id: ObjectId,
    /// Resource name used by the `Do` operator
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything the interpreter found on one page.
#[derive(Debug, Clone, Default)]
pub struct InterpretedContent {
    pub glyphs: Vec<RawGlyphRun>,
    pub images: Vec<ImagePlacement>,
}

#[derive(Debug, Clone)]
enum Widths {
    Simple {
        first_char: u32,
        widths: Vec<f32>,
        missing: f32,
    },
    Composite {
        default: f32,
        widths: HashMap<u32, f32>,
    },
    Standard(BaseFont),
    Unknown,
}

#[derive(Debug, Clone)]
struct FontEntry<'a> {
    dict: Option<&'a Dictionary>,
    token: String,
    composite: bool,
    widths: Widths,
}

impl<'a> FontEntry<'a> {
    fn unknown(token: String) -> Self {
        Self {
            dict: None,
            token,
            composite: false,
            widths: Widths::Unknown,
        }
    }

    fn load(doc: &'a LopdfDocument, dict: &'a Dictionary) -> Self {
        let token = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_default();
        let composite = matches!(
            dict.get(b"Subtype").and_then(|o| o.as_name()),
            Ok(b"Type0")
        );

        let widths = if composite {
            composite_widths(doc, dict)
        } else {
            simple_widths(doc, dict, &token)
        };

        Self {
            dict: Some(dict),
            token,
            composite,
            widths,
        }
    }

    /// Glyph width in thousandths of an em.
    fn width(&self, code: u32) -> f32 {
        match &self.widths {
            Widths::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            Widths::Composite { default, widths } => {
                widths.get(&code).copied().unwrap_or(*default)
            }
            Widths::Standard(font) => font.char_width(char::from(code as u8)),
            Widths::Unknown => FALLBACK_WIDTH,
        }
    }

    fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|c| match c {
                    [hi, lo] => u32::from(*hi) << 8 | u32::from(*lo),
                    [b] => u32::from(*b),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }

    fn decode(&self, doc: &LopdfDocument, bytes: &[u8]) -> String {
        if let Some(dict) = self.dict {
            if let Ok(encoding) = dict.get_font_encoding(doc) {
                if let Ok(text) = LopdfDocument::decode_text(&encoding, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }
}

fn simple_widths(doc: &LopdfDocument, dict: &Dictionary, token: &str) -> Widths {
    let widths = dict
        .get(b"Widths")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok());

    match widths {
        Some(widths) => {
            let first_char = dict
                .get(b"FirstChar")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0)
                .max(0) as u32;
            let missing = dict
                .get(b"FontDescriptor")
                .ok()
                .and_then(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| d.get(b"MissingWidth").ok())
                .and_then(number)
                .unwrap_or(0.0);
            Widths::Simple {
                first_char,
                widths: widths
                    .iter()
                    .map(|w| resolve(doc, w).and_then(number).unwrap_or(0.0))
                    .collect(),
                missing,
            }
        }
        None => match BaseFont::from_pdf_name(token) {
            Some(base) => Widths::Standard(base),
            None => Widths::Unknown,
        },
    }
}

fn composite_widths(doc: &LopdfDocument, dict: &Dictionary) -> Widths {
    let descendant = dict
        .get(b"DescendantFonts")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|a| a.first())
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok());

    let Some(descendant) = descendant else {
        return Widths::Composite {
            default: 1000.0,
            widths: HashMap::new(),
        };
    };

    let default = descendant
        .get(b"DW")
        .ok()
        .and_then(number)
        .unwrap_or(1000.0);

    let mut widths = HashMap::new();
    let entries = descendant
        .get(b"W")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok());

    if let Some(entries) = entries {
        let mut i = 0;
        while i < entries.len() {
            let Some(start) = resolve(doc, &entries[i]).and_then(number) else {
                break;
            };
            let start = start as u32;
            match entries.get(i + 1).and_then(|o| resolve(doc, o)) {
                // c [w1 w2 ...]
                Some(Object::Array(list)) => {
                    for (offset, w) in list.iter().enumerate() {
                        let code = start.saturating_add(offset as u32);
                        if code > MAX_CID {
                            break;
                        }
                        if let Some(w) = number(w) {
                            widths.insert(code, w);
                        }
                    }
                    i += 2;
                }
                // c_first c_last w
                Some(end) => {
                    let end = number(end).unwrap_or(0.0) as u32;
                    let w = entries
                        .get(i + 2)
                        .and_then(|o| resolve(doc, o))
                        .and_then(number)
                        .unwrap_or(default);
                    if start <= MAX_CID {
                        for code in start..=end.clamp(start, MAX_CID) {
                            widths.insert(code, w);
                        }
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    Widths::Composite { default, widths }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Vec<u8>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    scaling: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

enum Segment<'o> {
    Bytes(&'o [u8]),
    Adjust(f32),
}

/// Interprets content streams of one document.
pub struct ContentInterpreter<'a> {
    doc: &'a LopdfDocument,
    out: InterpretedContent,
}

impl<'a> ContentInterpreter<'a> {
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self {
            doc,
            out: InterpretedContent::default(),
        }
    }

    /// Interpret a decompressed content stream under an initial CTM.
    pub fn run(
        mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
    ) -> Result<InterpretedContent> {
        self.interpret(content, resources, ctm, 0)?;
        Ok(self.out)
    }

    fn interpret(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        depth: usize,
    ) -> Result<()> {
        let content = Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut fonts: HashMap<Vec<u8>, FontEntry<'a>> = HashMap::new();
        let fallback = FontEntry::unknown(String::new());
        let mut gs = GraphicsState {
            ctm,
            text: TextState::default(),
        };
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operand(operands) {
                        gs.ctm = m.then(&gs.ctm);
                    }
                }
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let (Some(Object::Name(name)), Some(size)) =
                        (operands.first(), operands.get(1).and_then(number))
                    {
                        if !fonts.contains_key(name) {
                            let entry = self.load_font(resources, name);
                            fonts.insert(name.clone(), entry);
                        }
                        gs.text.font = Some(name.clone());
                        gs.text.size = size;
                    }
                }
                "Tc" => set_number(operands, &mut gs.text.char_spacing),
                "Tw" => set_number(operands, &mut gs.text.word_spacing),
                "TL" => set_number(operands, &mut gs.text.leading),
                "Ts" => set_number(operands, &mut gs.text.rise),
                "Tz" => {
                    if let Some(scale) = operands.first().and_then(number) {
                        gs.text.scaling = scale / 100.0;
                    }
                }
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (
                        operands.first().and_then(number),
                        operands.get(1).and_then(number),
                    ) {
                        if op.operator == "TD" {
                            gs.text.leading = -ty;
                        }
                        tlm = Matrix::translation(tx, ty).then(&tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operand(operands) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translation(0.0, -gs.text.leading).then(&tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let font = current_font(&fonts, &gs.text, &fallback);
                        self.show(&[Segment::Bytes(bytes)], &gs, &mut tm, font);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let segments: Vec<Segment<'_>> = items
                            .iter()
                            .filter_map(|item| match item {
                                Object::String(bytes, _) => Some(Segment::Bytes(bytes)),
                                other => number(other).map(Segment::Adjust),
                            })
                            .collect();
                        let font = current_font(&fonts, &gs.text, &fallback);
                        self.show(&segments, &gs, &mut tm, font);
                    }
                }
                "'" | "\"" => {
                    let text_index = if op.operator == "\"" {
                        if let (Some(aw), Some(ac)) = (
                            operands.first().and_then(number),
                            operands.get(1).and_then(number),
                        ) {
                            gs.text.word_spacing = aw;
                            gs.text.char_spacing = ac;
                        }
                        2
                    } else {
                        0
                    };
                    tlm = Matrix::translation(0.0, -gs.text.leading).then(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.get(text_index) {
                        let font = current_font(&fonts, &gs.text, &fallback);
                        self.show(&[Segment::Bytes(bytes)], &gs, &mut tm, font);
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.draw_xobject(resources, name, &gs.ctm, depth);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn load_font(&self, resources: Option<&'a Dictionary>, name: &[u8]) -> FontEntry<'a> {
        let dict = resources
            .and_then(|r| r.get(b"Font").ok())
            .and_then(|o| resolve(self.doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|fonts| fonts.get(name).ok())
            .and_then(|o| resolve(self.doc, o))
            .and_then(|o| o.as_dict().ok());

        match dict {
            Some(dict) => FontEntry::load(self.doc, dict),
            None => {
                log::debug!(
                    "Font resource {} not found, using fallback widths",
                    String::from_utf8_lossy(name)
                );
                FontEntry::unknown(String::from_utf8_lossy(name).to_string())
            }
        }
    }

    fn show(
        &mut self,
        segments: &[Segment<'_>],
        gs: &GraphicsState,
        tm: &mut Matrix,
        font: &FontEntry<'a>,
    ) {
        let ts = &gs.text;
        let rendering = Matrix::new(ts.size * ts.scaling, 0.0, 0.0, ts.size, 0.0, ts.rise)
            .then(tm)
            .then(&gs.ctm);

        let mut text = String::new();
        let mut tx = 0.0;
        for segment in segments {
            match segment {
                Segment::Bytes(bytes) => {
                    text.push_str(&font.decode(self.doc, bytes));
                    for code in font.codes(bytes) {
                        let mut advance = font.width(code) / 1000.0 * ts.size + ts.char_spacing;
                        if !font.composite && code == 32 {
                            advance += ts.word_spacing;
                        }
                        tx += advance * ts.scaling;
                    }
                }
                Segment::Adjust(adjust) => {
                    tx -= adjust / 1000.0 * ts.size * ts.scaling;
                    if -adjust > SPACE_ADJUSTMENT && wants_space(&text) {
                        text.push(' ');
                    }
                }
            }
        }

        let device = tm.then(&gs.ctm);
        let (x0, y0) = device.apply(0.0, ts.rise);
        let (x1, y1) = device.apply(tx, ts.rise);
        *tm = Matrix::translation(tx, 0.0).then(tm);

        if text.trim().is_empty() {
            return;
        }

        self.out.glyphs.push(RawGlyphRun {
            text,
            transform: rendering.to_array(),
            width: Some((x1 - x0).hypot(y1 - y0)),
            height: None,
            font_token: font.token.clone(),
        });
    }

    fn draw_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        ctm: &Matrix,
        depth: usize,
    ) {
        let doc = self.doc;
        let Some((object_id, stream)) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|x| x.get(name).ok())
            .and_then(|o| o.as_reference().ok())
            .and_then(|id| match doc.get_object(id) {
                Ok(Object::Stream(stream)) => Some((id, stream)),
                _ => None,
            })
        else {
            return;
        };

        match stream.dict.get(b"Subtype").and_then(|o| o.as_name()) {
            Ok(b"Image") => {
                let corners = [
                    ctm.apply(0.0, 0.0),
                    ctm.apply(1.0, 0.0),
                    ctm.apply(0.0, 1.0),
                    ctm.apply(1.0, 1.0),
                ];
                let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
                let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
                let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
                let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);
                self.out.images.push(ImagePlacement {
                    object_id,
                    name: String::from_utf8_lossy(name).to_string(),
                    x: min_x,
                    y: min_y,
                    width: max_x - min_x,
                    height: max_y - min_y,
                });
            }
            Ok(b"Form") => {
                if depth >= MAX_FORM_DEPTH {
                    log::warn!("Form XObject nesting exceeds {}, skipping", MAX_FORM_DEPTH);
                    return;
                }
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|o| o.as_array().ok())
                    .and_then(|a| matrix_operand(a.as_slice()))
                    .unwrap_or(Matrix::IDENTITY);
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|o| resolve(doc, o))
                    .and_then(|o| o.as_dict().ok())
                    .or(resources);
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                if let Err(e) =
                    self.interpret(&data, form_resources, form_matrix.then(ctm), depth + 1)
                {
                    log::warn!("Skipping unreadable form XObject: {}", e);
                }
            }
            _ => {}
        }
    }
}

fn current_font<'f, 'a>(
    fonts: &'f HashMap<Vec<u8>, FontEntry<'a>>,
    ts: &TextState,
    fallback: &'f FontEntry<'a>,
) -> &'f FontEntry<'a> {
    ts.font
        .as_ref()
        .and_then(|name| fonts.get(name))
        .unwrap_or(fallback)
}

/// Whether a TJ word-space adjustment should become a literal space.
fn wants_space(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && !is_spaceless_script_char(c),
        None => false,
    }
}

/// Scripts written without inter-word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x309F   // Hiragana
        | 0x30A0..=0x30FF // Katakana
        | 0x4E00..=0x9FFF // CJK Unified Ideographs
        | 0x3400..=0x4DBF // CJK Extension A
        | 0xAC00..=0xD7AF // Hangul Syllables
        | 0x0E00..=0x0E7F // Thai
        | 0x3000..=0x303F // CJK punctuation
        | 0xFF00..=0xFFEF // Fullwidth forms
    )
}

/// Follow a reference to its target object.
pub(crate) fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Read a numeric operand.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn set_number(operands: &[Object], target: &mut f32) {
    if let Some(value) = operands.first().and_then(number) {
        *target = value;
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(Matrix::from_array(m))
}
