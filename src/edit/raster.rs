//! Page raster boundary for the editor backdrop.
//!
//! Rasterizing is not done by this crate. Callers plug in a renderer
//! through [`PageRasterSource`]; the editor only uses the result as a
//! backdrop under the interactive elements.

use crate::error::{Error, Result};

/// Largest surface side accepted, in pixels.
pub const MAX_SURFACE_SIDE: u32 = 16_384;

/// An RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterSurface {
    /// Allocate a surface filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        check_size(width, height)?;
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Wrap an existing RGBA buffer.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        check_size(width, height)?;
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::Surface(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at (x, y), top-left origin.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.pixels.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}

fn check_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::Surface(format!("empty surface {}x{}", width, height)));
    }
    if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
        return Err(Error::Surface(format!(
            "surface {}x{} exceeds {} pixels per side",
            width, height, MAX_SURFACE_SIDE
        )));
    }
    Ok(())
}

/// Renders pages to pixels.
pub trait PageRasterSource {
    /// Render a page (1-indexed) at `scale` pixels per point.
    fn render(&self, page_number: u32, scale: f32) -> Result<RasterSurface>;
}

/// Renders every page as plain paper of the right size.
#[derive(Debug, Clone)]
pub struct BlankPageSource {
    /// Page sizes in points, indexed by page number - 1
    sizes: Vec<(f32, f32)>,
    paper: [u8; 4],
}

impl BlankPageSource {
    pub fn new(sizes: Vec<(f32, f32)>) -> Self {
        Self {
            sizes,
            paper: [255, 255, 255, 255],
        }
    }
}

impl PageRasterSource for BlankPageSource {
    fn render(&self, page_number: u32, scale: f32) -> Result<RasterSurface> {
        let &(width, height) = page_number
            .checked_sub(1)
            .and_then(|i| self.sizes.get(i as usize))
            .ok_or(Error::PageOutOfRange(page_number, self.sizes.len() as u32))?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::Surface(format!("invalid scale {}", scale)));
        }
        RasterSurface::filled(
            (width * scale).round() as u32,
            (height * scale).round() as u32,
            self.paper,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_validation() {
        assert!(matches!(RasterSurface::filled(0, 10, [0; 4]), Err(Error::Surface(_))));
        assert!(RasterSurface::filled(MAX_SURFACE_SIDE + 1, 1, [0; 4]).is_err());
        assert!(RasterSurface::from_rgba(2, 2, vec![0; 15]).is_err());

        let s = RasterSurface::from_rgba(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(s.pixel(1, 0), Some([5, 6, 7, 8]));
        assert_eq!(s.pixel(2, 0), None);
    }

    #[test]
    fn test_blank_source() {
        let source = BlankPageSource::new(vec![(612.0, 792.0)]);
        let surface = source.render(1, 0.5).unwrap();
        assert_eq!((surface.width(), surface.height()), (306, 396));
        assert_eq!(surface.pixel(10, 10), Some([255, 255, 255, 255]));

        assert!(matches!(source.render(2, 1.0), Err(Error::PageOutOfRange(2, 1))));
        assert!(matches!(source.render(1, 0.0), Err(Error::Surface(_))));
        assert!(matches!(source.render(1, 100.0), Err(Error::Surface(_))));
    }
}
