#![warn(missing_docs)]
//! `mathdoc-fonts` - the font metrics seam consumed by `mathdoc-core`.
//!
//! The layout engine never shapes or rasterizes text itself. It asks a [`FontMetrics`]
//! implementation for advance widths, vertical extents and (optionally) glyph coverage images,
//! keyed by a grapheme and a [`FontStyle`].
//!
//! - [`FontMetrics`] is the provider trait a host implements on top of its font stack.
//! - [`CellMetrics`] is an approximate, font-free provider based on UAX #11 cell widths. It is
//!   deterministic, which makes it the provider of choice for tests and headless use.
//! - [`FontCache`] memoizes per-glyph queries. Entries are populated lazily and never evicted:
//!   the key space (graphemes in use × a handful of styles) stays small.

mod cache;
mod cell;

pub use cache::FontCache;
pub use cell::CellMetrics;

use unicode_segmentation::UnicodeSegmentation;

/// Typeface variant used to render a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontFace {
    /// Regular text face.
    #[default]
    Book,
    /// Bold text face.
    Bold,
    /// Italic text face.
    Italic,
    /// Bold italic text face.
    BoldItalic,
    /// Face used for characters inside math constructs.
    Math,
}

impl FontFace {
    /// Pick the text face for a combination of bold/italic markers.
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Book,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (true, true) => Self::BoldItalic,
        }
    }
}

/// Style key for metric queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontStyle {
    /// Typeface variant.
    pub face: FontFace,
    /// Reduced size used for sub/superscripts and radical degrees.
    pub script: bool,
}

impl FontStyle {
    /// Full-size style for `face`.
    pub const fn new(face: FontFace) -> Self {
        Self {
            face,
            script: false,
        }
    }

    /// The same face at script size.
    pub const fn to_script(self) -> Self {
        Self {
            face: self.face,
            script: true,
        }
    }
}

/// Metrics of a single rendered glyph (or grapheme cluster).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphExtents {
    /// Horizontal advance.
    pub advance: f32,
    /// Height of the ink box.
    pub height: f32,
    /// Horizontal offset from the pen position to the left edge of the ink box.
    pub left_bearing: f32,
    /// Vertical offset from the ascent line down to the top edge of the ink box.
    pub top_bearing: f32,
}

/// An 8-bit coverage image of a rendered glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphSurface {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major coverage values, `width * height` bytes.
    pub pixels: Vec<u8>,
}

/// A font metrics oracle.
///
/// Implementations must behave as pure functions of their inputs; callers are free to cache
/// results (see [`FontCache`]). Descents are signed: a value below zero lies under the
/// baseline.
pub trait FontMetrics {
    /// Measure `text` as a single shaped unit, returning one entry per grapheme cluster.
    ///
    /// The default measures each grapheme independently; providers with a real shaper should
    /// override it so kerning inside the unit is reflected in the advances.
    fn measure(&self, text: &str, style: FontStyle) -> Vec<GlyphExtents> {
        text.graphemes(true)
            .map(|grapheme| self.measure_single(grapheme, style))
            .collect()
    }

    /// Measure a single grapheme cluster.
    fn measure_single(&self, grapheme: &str, style: FontStyle) -> GlyphExtents;

    /// Distance from the baseline up to the top of the line box for `style`.
    fn ascent(&self, style: FontStyle) -> f32;

    /// Signed distance from the baseline to the bottom of the line box for `style` (`<= 0`).
    fn descent(&self, style: FontStyle) -> f32;

    /// Rendered coverage image for a grapheme, if the provider can rasterize.
    fn surface(&self, _grapheme: &str, _style: FontStyle) -> Option<GlyphSurface> {
        None
    }
}

impl<T: FontMetrics + ?Sized> FontMetrics for Box<T> {
    fn measure(&self, text: &str, style: FontStyle) -> Vec<GlyphExtents> {
        (**self).measure(text, style)
    }

    fn measure_single(&self, grapheme: &str, style: FontStyle) -> GlyphExtents {
        (**self).measure_single(grapheme, style)
    }

    fn ascent(&self, style: FontStyle) -> f32 {
        (**self).ascent(style)
    }

    fn descent(&self, style: FontStyle) -> f32 {
        (**self).descent(style)
    }

    fn surface(&self, grapheme: &str, style: FontStyle) -> Option<GlyphSurface> {
        (**self).surface(grapheme, style)
    }
}
