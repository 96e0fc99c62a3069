//! Font token analysis and write-time font selection.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::fonts::{BaseFont, FontSources, UnicodeFont, UnicodeVariant};

/// Generic family a font token maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalFamily {
    #[default]
    Sans,
    Serif,
    Monospace,
}

const BOLD_MARKERS: &[&str] = &["bold", "heavy", "black", "medium", "demi"];
const ITALIC_MARKERS: &[&str] = &["italic", "oblique", "slanted"];
const MONO_MARKERS: &[&str] = &["mono", "courier", "consolas", "menlo", "code"];
const SERIF_MARKERS: &[&str] = &[
    "times",
    "serif",
    "georgia",
    "garamond",
    "cambria",
    "roman",
    "book antiqua",
    "bookantiqua",
    "palatino",
    "minion",
];
const SANS_MARKERS: &[&str] = &[
    "helvetica",
    "arial",
    "inter",
    "roboto",
    "verdana",
    "tahoma",
    "calibri",
    "segoe",
    "open sans",
    "opensans",
    "lato",
    "noto sans",
    "notosans",
    "dejavu sans",
    "dejavusans",
    "liberation sans",
    "liberationsans",
    "trebuchet",
    "gill sans",
    "futura",
    "frutiger",
    "myriad",
];

/// Style inferred from a font token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontStyle {
    pub family: CanonicalFamily,
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    /// Analyze a raw font token such as `ABCDEF+Arial-BoldMT`.
    pub fn from_token(token: &str) -> Self {
        let normalized = normalize_token(token);
        Self {
            family: canonical_family(&normalized),
            bold: BOLD_MARKERS.iter().any(|m| normalized.contains(m)),
            italic: ITALIC_MARKERS.iter().any(|m| normalized.contains(m)),
        }
    }
}

/// Strip a subset prefix (`ABCDEF+`) and lowercase.
pub fn normalize_token(token: &str) -> String {
    token
        .split_once('+')
        .map_or(token, |(_, rest)| rest)
        .trim()
        .to_lowercase()
}

fn canonical_family(normalized: &str) -> CanonicalFamily {
    if MONO_MARKERS.iter().any(|m| normalized.contains(m)) {
        return CanonicalFamily::Monospace;
    }
    if !normalized.contains("sans") && SERIF_MARKERS.iter().any(|m| normalized.contains(m)) {
        return CanonicalFamily::Serif;
    }
    if SANS_MARKERS.iter().any(|m| normalized.contains(m)) {
        return CanonicalFamily::Sans;
    }
    CanonicalFamily::Sans
}

impl BaseFont {
    /// Base font for a family, weight and slant.
    pub fn from_style(family: CanonicalFamily, bold: bool, italic: bool) -> Self {
        match (family, bold, italic) {
            (CanonicalFamily::Sans, false, false) => BaseFont::Helvetica,
            (CanonicalFamily::Sans, true, false) => BaseFont::HelveticaBold,
            (CanonicalFamily::Sans, false, true) => BaseFont::HelveticaOblique,
            (CanonicalFamily::Sans, true, true) => BaseFont::HelveticaBoldOblique,
            (CanonicalFamily::Serif, false, false) => BaseFont::TimesRoman,
            (CanonicalFamily::Serif, true, false) => BaseFont::TimesBold,
            (CanonicalFamily::Serif, false, true) => BaseFont::TimesItalic,
            (CanonicalFamily::Serif, true, true) => BaseFont::TimesBoldItalic,
            (CanonicalFamily::Monospace, false, false) => BaseFont::Courier,
            (CanonicalFamily::Monospace, true, false) => BaseFont::CourierBold,
            (CanonicalFamily::Monospace, false, true) => BaseFont::CourierOblique,
            (CanonicalFamily::Monospace, true, true) => BaseFont::CourierBoldOblique,
        }
    }
}

/// The font chosen for drawing a piece of text.
#[derive(Debug, Clone)]
pub enum ResolvedFont {
    /// Non-embedded base font, WinAnsi encoded
    Base(BaseFont),
    /// Embedded full-Unicode font
    Unicode(Arc<UnicodeFont>),
}

impl ResolvedFont {
    /// Width of `text` set at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        match self {
            ResolvedFont::Base(font) => font.text_width(text, size),
            ResolvedFont::Unicode(font) => font.text_width(text, size),
        }
    }

    pub fn is_unicode(&self) -> bool {
        matches!(self, ResolvedFont::Unicode(_))
    }

    /// Stable key identifying the font within a page's resources.
    pub fn key(&self) -> String {
        match self {
            ResolvedFont::Base(font) => font.pdf_name().to_string(),
            ResolvedFont::Unicode(font) => format!("unicode-{:?}", font.variant()),
        }
    }
}

impl PartialEq for ResolvedFont {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResolvedFont::Base(a), ResolvedFont::Base(b)) => a == b,
            (ResolvedFont::Unicode(a), ResolvedFont::Unicode(b)) => a.variant() == b.variant(),
            _ => false,
        }
    }
}

/// Picks fonts for drawing, caching Unicode font loads per instance.
#[derive(Debug, Default)]
pub struct StyleResolver {
    sources: FontSources,
    cache: HashMap<UnicodeVariant, Option<Arc<UnicodeFont>>>,
}

impl StyleResolver {
    pub fn new(sources: FontSources) -> Self {
        Self {
            sources,
            cache: HashMap::new(),
        }
    }

    /// Resolver without Unicode fonts; all text uses base fonts.
    pub fn base_only() -> Self {
        Self::default()
    }

    /// Infer family, weight and slant from a font token.
    pub fn analyze(&self, token: &str) -> FontStyle {
        FontStyle::from_token(token)
    }

    /// Choose the font for `text` in the requested style.
    ///
    /// Any non-ASCII character forces a Unicode variant. When no variant can
    /// be loaded, the base font is used and the text may not render fully.
    pub fn resolve(
        &mut self,
        text: &str,
        family: CanonicalFamily,
        bold: bool,
        italic: bool,
    ) -> ResolvedFont {
        let base = BaseFont::from_style(family, bold, italic);
        if text.is_ascii() {
            return ResolvedFont::Base(base);
        }

        let requested = UnicodeVariant::from_style(bold, italic);
        for variant in requested.fallback_order() {
            if let Some(font) = self.load(variant) {
                if variant != requested {
                    log::debug!("Using {:?} in place of {:?}", variant, requested);
                }
                return ResolvedFont::Unicode(font);
            }
        }

        log::warn!(
            "No Unicode font available, drawing non-ASCII text with {}",
            base.pdf_name()
        );
        ResolvedFont::Base(base)
    }

    fn load(&mut self, variant: UnicodeVariant) -> Option<Arc<UnicodeFont>> {
        if let Some(cached) = self.cache.get(&variant) {
            return cached.clone();
        }
        let loaded = match self.sources.load(variant) {
            Ok(font) => Some(Arc::new(font)),
            Err(e) => {
                log::warn!("Failed to load Unicode font {:?}: {}", variant, e);
                None
            }
        };
        self.cache.insert(variant, loaded.clone());
        loaded
    }
}
