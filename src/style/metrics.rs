//! Advance widths for the non-embedded base fonts.
//!
//! Widths come from the Adobe Font Metrics files of the standard 14 fonts,
//! in thousandths of an em, for the printable ASCII range 0x20-0x7E.
//! Obliques share the metrics of their upright face; Courier is fixed pitch.

use super::fonts::BaseFont;

const FIRST_CHAR: u32 = 0x20;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

const COURIER_WIDTH: u16 = 600;

impl BaseFont {
    /// Advance width of a character in thousandths of an em.
    ///
    /// Characters outside printable ASCII use a typical lowercase width.
    pub fn char_width(&self, ch: char) -> f32 {
        let table = match self {
            BaseFont::Helvetica | BaseFont::HelveticaOblique => &HELVETICA,
            BaseFont::HelveticaBold | BaseFont::HelveticaBoldOblique => &HELVETICA_BOLD,
            BaseFont::TimesRoman | BaseFont::TimesItalic => &TIMES_ROMAN,
            BaseFont::TimesBold | BaseFont::TimesBoldItalic => &TIMES_BOLD,
            BaseFont::Courier
            | BaseFont::CourierBold
            | BaseFont::CourierOblique
            | BaseFont::CourierBoldOblique => return f32::from(COURIER_WIDTH),
        };

        let width = (ch as u32)
            .checked_sub(FIRST_CHAR)
            .and_then(|i| table.get(i as usize))
            .copied()
            // 'n' is a representative lowercase advance
            .unwrap_or(table[(u32::from(b'n') - FIRST_CHAR) as usize]);
        f32::from(width)
    }

    /// Width of a string set at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.char_width(c)).sum::<f32>() * size / 1000.0
    }
}
