//! Font handling.
//!
//! Font tokens found in documents are analyzed into a [`CanonicalFamily`]
//! plus weight and slant. At write time the [`StyleResolver`] picks either
//! one of the twelve non-embedded base fonts or, for text outside ASCII, a
//! bundled full-Unicode font fetched through [`FontSources`].

mod fonts;
mod metrics;
mod resolver;

pub use fonts::{
    BaseFont, DirectoryFontSource, FontSource, FontSources, MemoryFontSource, UnicodeFont,
    UnicodeVariant,
};
pub use resolver::{normalize_token, CanonicalFamily, FontStyle, ResolvedFont, StyleResolver};

#[cfg(test)]
pub(crate) use fonts::test_font_bytes;
