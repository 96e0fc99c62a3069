//! PDF header sniffing.
//!
//! Documents are checked before they reach `lopdf` so that non-PDF input
//! fails fast with [`Error::UnknownFormat`] instead of a parser error.

use crate::error::{Error, Result};

/// PDF header information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Byte offset of the `%PDF-` marker
    pub offset: usize,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Readers tolerate junk before the header as long as it starts within
/// the first kilobyte of the file.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Locate and validate the `%PDF-x.y` header.
pub fn sniff_header(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_start = offset + PDF_MAGIC.len();
    let version = data
        .get(version_start..version_start + 3)
        .ok_or(Error::UnknownFormat)?;

    match version {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            let version = String::from_utf8_lossy(version).to_string();
            if *major > b'2' {
                return Err(Error::UnsupportedVersion(version));
            }
            Ok(PdfHeader { version, offset })
        }
        _ => Err(Error::UnsupportedVersion(
            String::from_utf8_lossy(version).to_string(),
        )),
    }
}

/// Check whether bytes start like a PDF document.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    sniff_header(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_valid_header() {
        let header = sniff_header(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap();
        assert_eq!(header.version, "1.7");
        assert_eq!(header.offset, 0);
    }

    #[test]
    fn test_sniff_header_after_junk() {
        let header = sniff_header(b"\xef\xbb\xbfjunk%PDF-2.0\n").unwrap();
        assert_eq!(header.version, "2.0");
        assert_eq!(header.offset, 7);
    }

    #[test]
    fn test_sniff_rejects_other_formats() {
        assert!(matches!(
            sniff_header(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(sniff_header(b"%PDF"), Err(Error::UnknownFormat)));
        assert!(matches!(sniff_header(b""), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_sniff_rejects_bad_version() {
        assert!(matches!(
            sniff_header(b"%PDF-x.y\n"),
            Err(Error::UnsupportedVersion(_))
        ));
        assert!(matches!(
            sniff_header(b"%PDF-9.0\n"),
            Err(Error::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\n"));
        assert!(!is_pdf_bytes(b"Not a PDF"));
    }
}
