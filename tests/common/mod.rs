//! PDF fixtures built with lopdf.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Resource names of the fonts every fixture page carries.
pub const HELVETICA: &str = "F1";
pub const HELVETICA_BOLD: &str = "F2";
pub const COURIER: &str = "F3";

/// Show `text` at (x, y) in a standard font.
pub fn text(font: &str, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Build a Letter-size PDF with one content stream per page.
pub fn build_pdf(pages: Vec<Vec<Operation>>, title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font = |doc: &mut Document, name: &str| {
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => name,
        })
    };
    let f1 = font(&mut doc, "Helvetica");
    let f2 = font(&mut doc, "Helvetica-Bold");
    let f3 = font(&mut doc, "Courier");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => f1, "F2" => f2, "F3" => f3 },
    });

    let mut kids = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! { "Title" => Object::string_literal(title) });
        doc.trailer.set("Info", info_id);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Two Courier columns of twelve lines under a bold heading.
pub fn two_column_page() -> Vec<Operation> {
    let mut ops = text(HELVETICA_BOLD, 20.0, 72.0, 740.0, "Market Overview");
    for i in 0..12 {
        let y = 700.0 - i as f32 * 12.0;
        // 33 Courier characters at 10pt are 198pt wide
        ops.extend(text(COURIER, 10.0, 72.0, y, &format!("Left column sentence number {:02}.  ", i)));
        ops.extend(text(COURIER, 10.0, 330.0, y, &format!("Right column sentence number {:02}. ", i)));
    }
    ops
}

/// A bulleted and a numbered list, well separated.
pub fn list_page() -> Vec<Operation> {
    let mut ops = text(HELVETICA, 10.0, 72.0, 700.0, "- Apples");
    ops.extend(text(HELVETICA, 10.0, 72.0, 670.0, "- Pears"));
    ops.extend(text(HELVETICA, 10.0, 72.0, 640.0, "1. Check totals"));
    ops
}
