//! Extracted image resources.

use serde::{Deserialize, Serialize};

/// Image bytes pulled out of a page, referenced from [`ImageBlock`]s.
///
/// [`ImageBlock`]: super::ImageBlock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Raw (filter-decoded unless JPEG/JPEG 2000) image data
    #[serde(skip)]
    pub data: Vec<u8>,

    /// MIME type (e.g., "image/jpeg")
    pub mime_type: String,

    /// Width in pixels
    pub width: Option<u32>,

    /// Height in pixels
    pub height: Option<u32>,

    /// Color space (e.g., "DeviceRGB")
    pub color_space: Option<String>,

    /// Bits per component (e.g., 8)
    pub bits_per_component: Option<u8>,
}

impl Resource {
    /// Create an image resource.
    pub fn image(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            width: None,
            height: None,
            color_space: None,
            bits_per_component: None,
        }
    }

    /// Set image dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set color space.
    pub fn with_color_space(mut self, color_space: impl Into<String>) -> Self {
        self.color_space = Some(color_space.into());
        self
    }

    /// Set bits per component.
    pub fn with_bits_per_component(mut self, bits: u8) -> Self {
        self.bits_per_component = Some(bits);
        self
    }

    /// Get the size of the resource data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get a suggested filename for a resource id.
    pub fn suggested_filename(&self, id: &str) -> String {
        format!("{}.{}", id, self.extension())
    }

    /// Get the file extension based on MIME type.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/tiff" => "tiff",
            "image/jp2" => "jp2",
            // Decoded samples without a container
            _ => "raw",
        }
    }

    /// Detect MIME type from data magic bytes.
    pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
        if data.len() < 8 {
            return None;
        }

        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("image/jpeg");
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("image/png");
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some("image/gif");
        }
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("image/tiff");
        }
        if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20]) {
            return Some("image/jp2");
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mime_type() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(Resource::detect_mime_type(&jpeg), Some("image/jpeg"));

        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(Resource::detect_mime_type(&png), Some("image/png"));

        assert_eq!(Resource::detect_mime_type(&[0u8; 16]), None);
        assert_eq!(Resource::detect_mime_type(&[0xFF, 0xD8]), None);
    }

    #[test]
    fn test_suggested_filename() {
        let res = Resource::image(vec![1, 2, 3], "image/jpeg").with_dimensions(4, 4);
        assert_eq!(res.suggested_filename("page1_Im1"), "page1_Im1.jpg");
        assert_eq!(res.size(), 3);

        let raw = Resource::image(vec![], "application/octet-stream");
        assert_eq!(raw.suggested_filename("img"), "img.raw");
    }
}
