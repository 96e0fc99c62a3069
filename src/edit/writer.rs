//! Writing planned patches into page content.
//!
//! The original content of each patched page is wrapped in `q ... Q` and
//! followed by a Flate-compressed overlay stream. Base fonts are added as
//! WinAnsi Type1 fonts; Unicode fonts are embedded as Type0 fonts over a
//! CIDFontType2 with Identity-H encoding, a `W` array and a ToUnicode CMap.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::sync::Arc;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};

use super::patcher::{DrawCommand, PagePatch, TextDraw};
use crate::error::{Error, Result};
use crate::model::Color;
use crate::parser::LopdfBackend;
use crate::style::{BaseFont, ResolvedFont, UnicodeFont, UnicodeVariant};

/// Maximum entries per `beginbfchar` section.
const BFCHAR_CHUNK: usize = 100;

struct UnicodeUsage {
    font: Arc<UnicodeFont>,
    /// glyph id -> character
    glyphs: BTreeMap<u16, char>,
}

/// Writes [`PagePatch`]es into a loaded document.
pub struct PatchWriter<'a> {
    backend: &'a mut LopdfBackend,
    fonts: HashMap<String, ObjectId>,
    gstates: HashMap<u32, ObjectId>,
}

impl<'a> PatchWriter<'a> {
    pub fn new(backend: &'a mut LopdfBackend) -> Self {
        Self {
            backend,
            fonts: HashMap::new(),
            gstates: HashMap::new(),
        }
    }

    /// Write all patches. Fonts are shared between pages.
    pub fn write(mut self, patches: &[PagePatch]) -> Result<()> {
        let usage = collect_unicode_usage(patches);
        for (key, usage) in &usage {
            let id = self.add_unicode_font(usage)?;
            self.fonts.insert(key.clone(), id);
        }

        for patch in patches.iter().filter(|p| !p.is_empty()) {
            self.write_page(patch)?;
        }
        Ok(())
    }

    fn write_page(&mut self, patch: &PagePatch) -> Result<()> {
        let page_id = self.backend.page_id(patch.page_number)?;
        let viewport = self.backend.viewport(patch.page_number)?;
        let mut resources = self.effective_resources(page_id);

        let mut font_entries = self.sub_dictionary(&resources, b"Font");
        let mut gstate_entries = self.sub_dictionary(&resources, b"ExtGState");

        let mut ops = Vec::new();
        ops.push(Operation::new("q", vec![]));
        if viewport.origin_x != 0.0 || viewport.origin_y != 0.0 {
            ops.push(Operation::new(
                "cm",
                reals(&[1.0, 0.0, 0.0, 1.0, viewport.origin_x, viewport.origin_y]),
            ));
        }

        for command in &patch.commands {
            match command {
                DrawCommand::FillRect { rect, color } => {
                    ops.push(Operation::new("q", vec![]));
                    ops.push(fill_color(*color));
                    ops.push(Operation::new(
                        "re",
                        reals(&[rect.x, rect.y, rect.width, rect.height]),
                    ));
                    ops.push(Operation::new("f", vec![]));
                    ops.push(Operation::new("Q", vec![]));
                }
                DrawCommand::Text(text) => {
                    let font_id = self.font_object(&text.font)?;
                    let font_name = format!("PLF{}", font_id.0);
                    font_entries.set(font_name.as_bytes(), Object::Reference(font_id));

                    let gstate = if text.opacity < 1.0 {
                        let id = self.gstate_object(text.opacity);
                        let name = format!("PLGS{}", id.0);
                        gstate_entries.set(name.as_bytes(), Object::Reference(id));
                        Some(name)
                    } else {
                        None
                    };

                    text_ops(&mut ops, text, &font_name, gstate.as_deref());
                }
            }
        }
        ops.push(Operation::new("Q", vec![]));

        let encoded = Content { operations: ops }
            .encode()
            .map_err(|e| Error::Render(format!("encoding overlay: {}", e)))?;
        let overlay = compressed_stream(Dictionary::new(), &encoded)?;

        resources.set("Font", Object::Dictionary(font_entries));
        if !gstate_entries.is_empty() {
            resources.set("ExtGState", Object::Dictionary(gstate_entries));
        }

        self.attach(page_id, resources, overlay)?;
        log::debug!(
            "Wrote {} draw command(s) to page {}",
            patch.commands.len(),
            patch.page_number
        );
        Ok(())
    }

    /// Resources of a page with inheritance resolved, as an owned copy.
    fn effective_resources(&self, page_id: ObjectId) -> Dictionary {
        self.backend
            .page_resources(page_id)
            .cloned()
            .unwrap_or_default()
    }

    fn sub_dictionary(&self, resources: &Dictionary, key: &[u8]) -> Dictionary {
        let doc = self.backend.raw_doc();
        match resources.get(key) {
            Ok(Object::Dictionary(d)) => d.clone(),
            Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
            _ => Dictionary::new(),
        }
    }

    fn attach(&mut self, page_id: ObjectId, resources: Dictionary, overlay: Stream) -> Result<()> {
        let doc = self.backend.raw_doc_mut();
        let existing = doc
            .get_dictionary(page_id)?
            .get(b"Contents")
            .ok()
            .cloned();

        let mut contents = Vec::new();
        match existing {
            Some(Object::Reference(id)) => match doc.get_object(id) {
                Ok(Object::Array(arr)) => contents.extend(arr.iter().cloned()),
                _ => contents.push(Object::Reference(id)),
            },
            Some(Object::Array(arr)) => contents.extend(arr),
            _ => {}
        }

        if !contents.is_empty() {
            let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let close = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            contents.insert(0, Object::Reference(open));
            contents.push(Object::Reference(close));
        }
        contents.push(Object::Reference(doc.add_object(overlay)));

        let page = doc.get_dictionary_mut(page_id)?;
        page.set("Contents", Object::Array(contents));
        page.set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    fn font_object(&mut self, font: &ResolvedFont) -> Result<ObjectId> {
        let key = font.key();
        if let Some(&id) = self.fonts.get(&key) {
            return Ok(id);
        }
        let id = match font {
            ResolvedFont::Base(base) => self.add_base_font(*base),
            ResolvedFont::Unicode(unicode) => self.add_unicode_font(&UnicodeUsage {
                font: Arc::clone(unicode),
                glyphs: BTreeMap::new(),
            })?,
        };
        self.fonts.insert(key, id);
        Ok(id)
    }

    fn add_base_font(&mut self, font: BaseFont) -> ObjectId {
        self.backend.raw_doc_mut().add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.pdf_name(),
            "Encoding" => "WinAnsiEncoding",
        })
    }

    fn add_unicode_font(&mut self, usage: &UnicodeUsage) -> Result<ObjectId> {
        let font = &usage.font;
        let name = font
            .postscript_name()
            .chars()
            .filter(|c| c.is_ascii_graphic() && !"[]()<>{}/%#".contains(*c))
            .collect::<String>();
        let doc = self.backend.raw_doc_mut();

        let mut file_dict = Dictionary::new();
        file_dict.set("Length1", Object::Integer(font.data().len() as i64));
        let font_file = doc.add_object(compressed_stream(file_dict, font.data())?);

        let bbox = font.pdf_bbox();
        let italic = matches!(
            font.variant(),
            UnicodeVariant::Italic | UnicodeVariant::BoldItalic
        );
        let descriptor = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(name.clone().into_bytes()),
            "Flags" => if italic { 32 + 64 } else { 32 },
            "FontBBox" => bbox.iter().map(|&v| Object::Integer(v.into())).collect::<Vec<_>>(),
            "ItalicAngle" => if italic { -12 } else { 0 },
            "Ascent" => font.pdf_ascender(),
            "Descent" => font.pdf_descender(),
            "CapHeight" => font.pdf_cap_height(),
            "StemV" => 80,
            "FontFile2" => font_file,
        });

        let cid_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(name.clone().into_bytes()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor,
            "DW" => 1000,
            "W" => widths_array(font, &usage.glyphs),
            "CIDToGIDMap" => "Identity",
        });

        let cmap = to_unicode_cmap(&usage.glyphs);
        let to_unicode = doc.add_object(compressed_stream(Dictionary::new(), cmap.as_bytes())?);

        Ok(doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(name.into_bytes()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font)],
            "ToUnicode" => to_unicode,
        }))
    }

    fn gstate_object(&mut self, opacity: f32) -> ObjectId {
        let key = (opacity.clamp(0.0, 1.0) * 1000.0).round() as u32;
        if let Some(&id) = self.gstates.get(&key) {
            return id;
        }
        let alpha = key as f32 / 1000.0;
        let id = self.backend.raw_doc_mut().add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(alpha),
            "CA" => Object::Real(alpha),
        });
        self.gstates.insert(key, id);
        id
    }
}

fn collect_unicode_usage(patches: &[PagePatch]) -> BTreeMap<String, UnicodeUsage> {
    let mut usage: BTreeMap<String, UnicodeUsage> = BTreeMap::new();
    for text in patches.iter().flat_map(PagePatch::texts) {
        let ResolvedFont::Unicode(font) = &text.font else {
            continue;
        };
        let entry = usage.entry(text.font.key()).or_insert_with(|| UnicodeUsage {
            font: Arc::clone(font),
            glyphs: BTreeMap::new(),
        });
        for line in &text.lines {
            for ch in line.text.chars() {
                entry.glyphs.entry(font.glyph_id(ch)).or_insert(ch);
            }
        }
    }
    usage
}

fn text_ops(ops: &mut Vec<Operation>, text: &TextDraw, font_name: &str, gstate: Option<&str>) {
    ops.push(Operation::new("q", vec![]));
    if let Some(name) = gstate {
        ops.push(Operation::new("gs", vec![Object::Name(name.as_bytes().to_vec())]));
    }
    if text.rotation != 0.0 {
        ops.push(Operation::new("cm", reals(&rotation_about(text.rotation, text.pivot.x, text.pivot.y))));
    }

    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![
            Object::Name(font_name.as_bytes().to_vec()),
            Object::Real(text.font_size),
        ],
    ));
    ops.push(fill_color(text.color));
    if text.horizontal_scaling != 100.0 {
        ops.push(Operation::new("Tz", vec![Object::Real(text.horizontal_scaling)]));
    }
    for line in &text.lines {
        ops.push(Operation::new(
            "Tm",
            reals(&[1.0, 0.0, 0.0, 1.0, line.x, line.baseline]),
        ));
        ops.push(Operation::new("Tj", vec![encode_text(&text.font, &line.text)]));
    }
    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
}

/// Rotation by `degrees` clockwise on screen about (px, py).
fn rotation_about(degrees: f32, px: f32, py: f32) -> [f32; 6] {
    let theta = (-degrees).to_radians();
    let (sin, cos) = theta.sin_cos();
    [
        cos,
        sin,
        -sin,
        cos,
        px - cos * px + sin * py,
        py - sin * px - cos * py,
    ]
}

fn fill_color(color: Color) -> Operation {
    Operation::new("rg", reals(&color.components()))
}

fn reals(values: &[f32]) -> Vec<Object> {
    values.iter().map(|&v| Object::Real(v)).collect()
}

/// Encode a line for the `Tj` operator of the given font.
fn encode_text(font: &ResolvedFont, text: &str) -> Object {
    match font {
        ResolvedFont::Base(_) => Object::String(encode_win_ansi(text), StringFormat::Literal),
        ResolvedFont::Unicode(font) => {
            let bytes = font
                .glyph_ids(text)
                .into_iter()
                .flat_map(u16::to_be_bytes)
                .collect();
            Object::String(bytes, StringFormat::Hexadecimal)
        }
    }
}

/// WinAnsi bytes; characters outside the encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            cp @ 0x20..=0x7E => cp as u8,
            cp @ 0xA0..=0xFF => cp as u8,
            _ => b'?',
        })
        .collect()
}

fn widths_array(font: &UnicodeFont, glyphs: &BTreeMap<u16, char>) -> Vec<Object> {
    let ids: Vec<u16> = glyphs.keys().copied().collect();
    let advances = font.glyph_widths(&ids);
    let mut result = Vec::new();
    let mut i = 0;
    while i < ids.len() {
        let start = ids[i];
        let mut widths = vec![Object::Integer(advances[i].into())];
        while i + 1 < ids.len() && ids[i + 1] == ids[i] + 1 {
            i += 1;
            widths.push(Object::Integer(advances[i].into()));
        }
        result.push(Object::Integer(start.into()));
        result.push(Object::Array(widths));
        i += 1;
    }
    result
}

fn to_unicode_cmap(glyphs: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    let mappings: Vec<(u16, char)> = glyphs
        .iter()
        .filter(|(&gid, _)| gid != 0)
        .map(|(&gid, &ch)| (gid, ch))
        .collect();
    for chunk in mappings.chunks(BFCHAR_CHUNK) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for &(gid, ch) in chunk {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

fn compressed_stream(mut dict: Dictionary, data: &[u8]) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;
    dict.set("Filter", "FlateDecode");
    Ok(Stream::new(dict, compressed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{PagePoint, PageRect};
    use crate::edit::patcher::PlacedLine;
    use crate::model::ElementId;
    use crate::parser::PageSource;
    use crate::style::test_font_bytes;
    use lopdf::Document as LopdfDocument;

    fn one_page_pdf(media_box: [i64; 4]) -> Vec<u8> {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal("Original")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => media_box.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn text_draw(font: ResolvedFont, text: &str, opacity: f32) -> TextDraw {
        TextDraw {
            element_id: ElementId(1),
            font,
            font_size: 12.0,
            color: Color::rgb(255, 0, 0),
            opacity,
            rotation: 0.0,
            horizontal_scaling: 100.0,
            pivot: PagePoint::new(100.0, 500.0),
            lines: vec![PlacedLine {
                text: text.to_string(),
                x: 100.0,
                baseline: 500.0,
                width: 50.0,
            }],
        }
    }

    fn save(backend: &mut LopdfBackend) -> Vec<u8> {
        let mut out = Vec::new();
        backend.raw_doc_mut().save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_written_text_is_extractable() {
        let mut backend = LopdfBackend::load_bytes(&one_page_pdf([0, 0, 612, 792])).unwrap();
        let patch = PagePatch {
            page_number: 1,
            commands: vec![
                DrawCommand::FillRect {
                    rect: PageRect::new(98.0, 697.0, 60.0, 14.0),
                    color: Color::WHITE,
                },
                DrawCommand::Text(text_draw(
                    ResolvedFont::Base(BaseFont::HelveticaBold),
                    "Edited",
                    1.0,
                )),
            ],
        };
        PatchWriter::new(&mut backend).write(&[patch]).unwrap();

        let reloaded = LopdfBackend::load_bytes(&save(&mut backend)).unwrap();
        let content = reloaded.page_content(1).unwrap();
        let texts: Vec<&str> = content.glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(texts, vec!["Original", "Edited"]);

        let edited = &content.glyphs[1];
        assert_eq!(edited.transform[4], 100.0);
        assert_eq!(edited.transform[5], 500.0);
        assert!(edited.font_token.contains("Helvetica-Bold"));
    }

    #[test]
    fn test_overlay_respects_viewport_origin() {
        let mut backend = LopdfBackend::load_bytes(&one_page_pdf([50, 100, 662, 892])).unwrap();
        let patch = PagePatch {
            page_number: 1,
            commands: vec![DrawCommand::Text(text_draw(
                ResolvedFont::Base(BaseFont::Helvetica),
                "Shifted",
                1.0,
            ))],
        };
        PatchWriter::new(&mut backend).write(&[patch]).unwrap();

        let reloaded = LopdfBackend::load_bytes(&save(&mut backend)).unwrap();
        let content = reloaded.page_content(1).unwrap();
        let shifted = content.glyphs.iter().find(|g| g.text == "Shifted").unwrap();
        assert!((shifted.transform[4] - 100.0).abs() < 1e-3);
        assert!((shifted.transform[5] - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_opacity_adds_ext_gstate() {
        let mut backend = LopdfBackend::load_bytes(&one_page_pdf([0, 0, 612, 792])).unwrap();
        let patch = PagePatch {
            page_number: 1,
            commands: vec![DrawCommand::Text(text_draw(
                ResolvedFont::Base(BaseFont::Courier),
                "Faint",
                0.5,
            ))],
        };
        PatchWriter::new(&mut backend).write(&[patch]).unwrap();

        let doc = backend.raw_doc();
        let page_id = backend.page_id(1).unwrap();
        let resources = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap();
        let gstates = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        assert_eq!(gstates.len(), 1);
        // the inherited font stays available
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1"));
        assert_eq!(fonts.len(), 2);
    }

    #[test]
    fn test_unicode_font_embedding() {
        let font = Arc::new(UnicodeFont::parse(UnicodeVariant::Regular, test_font_bytes()).unwrap());
        let mut backend = LopdfBackend::load_bytes(&one_page_pdf([0, 0, 612, 792])).unwrap();
        let patch = PagePatch {
            page_number: 1,
            commands: vec![DrawCommand::Text(text_draw(
                ResolvedFont::Unicode(Arc::clone(&font)),
                "Ωmega",
                1.0,
            ))],
        };
        PatchWriter::new(&mut backend).write(&[patch]).unwrap();

        let doc = backend.raw_doc();
        let type0 = doc
            .objects
            .values()
            .filter_map(|o| o.as_dict().ok())
            .find(|d| d.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Type0".as_slice()))
            .expect("Type0 font written");
        assert_eq!(
            type0.get(b"Encoding").and_then(Object::as_name).unwrap(),
            b"Identity-H"
        );
        assert!(type0.has(b"ToUnicode"));

        let descendant = type0.get(b"DescendantFonts").unwrap().as_array().unwrap()[0]
            .as_reference()
            .unwrap();
        let cid = doc.get_dictionary(descendant).unwrap();
        let w = cid.get(b"W").unwrap().as_array().unwrap();
        // one range per non-contiguous glyph id
        assert!(w.len() >= 4);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Abc"), b"Abc".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("Ω"), b"?".to_vec());
    }

    #[test]
    fn test_rotation_matrix_keeps_pivot() {
        let m = rotation_about(90.0, 100.0, 200.0);
        let x = m[0] * 100.0 + m[2] * 200.0 + m[4];
        let y = m[1] * 100.0 + m[3] * 200.0 + m[5];
        assert!((x - 100.0).abs() < 1e-3);
        assert!((y - 200.0).abs() < 1e-3);
        // clockwise on screen: +x axis turns to -y
        assert!(m[1] < -0.99);
    }

    #[test]
    fn test_to_unicode_cmap_chunks() {
        let glyphs: BTreeMap<u16, char> = (1..=150u16)
            .map(|g| (g, char::from_u32(0x40 + g as u32).unwrap()))
            .collect();
        let cmap = to_unicode_cmap(&glyphs);
        assert!(cmap.contains("100 beginbfchar"));
        assert!(cmap.contains("50 beginbfchar"));
        assert!(cmap.contains("<0001> <0041>"));
    }
}
