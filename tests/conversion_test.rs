//! End-to-end conversion of generated PDFs.

mod common;

use common::{build_pdf, list_page, two_column_page};
use pagelift::render::{to_json, to_markdown, JsonFormat, RenderOptions};
use pagelift::{
    convert_bytes, Block, Classification, ConvertOptions, Error, Pagelift, PageSelection,
};
use std::io::Write;

fn report() -> Vec<u8> {
    build_pdf(vec![two_column_page(), list_page()], Some("Q3 Report"))
}

#[test]
fn test_two_columns_and_heading() {
    let doc = convert_bytes(&report(), ConvertOptions::default()).unwrap();

    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.metadata.title.as_deref(), Some("Q3 Report"));
    assert_eq!(doc.metadata.page_count, 2);

    let page = &doc.pages[0];
    assert_eq!((page.width, page.height), (612.0, 792.0));
    let paragraphs: Vec<_> = page.paragraphs().collect();
    assert_eq!(paragraphs.len(), 3);

    assert_eq!(paragraphs[0].text, "Market Overview");
    assert_eq!(paragraphs[0].classification, Classification::Heading1);

    let left = paragraphs[1];
    let right = paragraphs[2];
    assert_eq!(left.column_index, 0);
    assert_eq!(right.column_index, 1);
    assert_eq!(left.lines.len(), 12);
    assert!(left.text.starts_with("Left column sentence number 00. Left column"));
    assert!(!left.text.contains("Right"));
    assert!(right.text.ends_with("Right column sentence number 11."));
    assert_eq!(right.classification, Classification::Body);
}

#[test]
fn test_lists_render_to_markdown() {
    let doc = convert_bytes(&report(), ConvertOptions::default()).unwrap();
    let classes: Vec<_> = doc.pages[1]
        .paragraphs()
        .map(|p| (p.classification, p.text.as_str()))
        .collect();
    assert_eq!(
        classes,
        vec![
            (Classification::ListBullet, "Apples"),
            (Classification::ListBullet, "Pears"),
            (Classification::ListNumbered, "Check totals"),
        ]
    );

    let md = to_markdown(&doc, &RenderOptions::new().with_frontmatter(true)).unwrap();
    assert!(md.starts_with("---\ntitle: \"Q3 Report\""));
    assert!(md.contains("# Market Overview\n\n"));
    assert!(md.contains("- Apples\n- Pears\n"));
    assert!(md.contains("1. Check totals"));
}

#[test]
fn test_json_output() {
    let doc = convert_bytes(&report(), ConvertOptions::default()).unwrap();
    let json = to_json(&doc, JsonFormat::Compact).unwrap();
    assert!(json.contains("\"classification\":\"heading1\""));
    assert!(json.contains("\"classification\":\"list_numbered\""));
}

#[test]
fn test_builder_from_file_with_page_selection() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&report()).unwrap();

    let conversion = Pagelift::new()
        .with_pages(PageSelection::parse("2").unwrap())
        .convert(file.path())
        .unwrap();
    assert_eq!(conversion.document().page_count(), 1);
    assert!(conversion
        .document()
        .pages
        .iter()
        .all(|p| p.blocks.iter().all(Block::is_paragraph)));
    assert_eq!(conversion.to_text().unwrap(), "Apples\n\nPears\n\nCheck totals");
}

#[test]
fn test_rejects_non_pdf() {
    assert!(matches!(
        convert_bytes(b"PK\x03\x04 not a pdf", ConvertOptions::default()),
        Err(Error::UnknownFormat)
    ));
}
