//! Approximate metrics based on terminal-style character cells.

use crate::{FontMetrics, FontStyle, GlyphExtents, GlyphSurface};
use unicode_width::UnicodeWidthStr;

/// Font-free metrics provider.
///
/// Every grapheme advances by its UAX #11 cell count (narrow = 1, wide = 2) times
/// `cell_width`. Vertical metrics are fixed fractions of `font_size`. Script styles are scaled by
/// `script_scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    /// Nominal font size.
    pub font_size: f32,
    /// Advance of a single narrow cell at full size.
    pub cell_width: f32,
    /// Ascent as a fraction of the font size.
    pub ascent_ratio: f32,
    /// Descent (positive fraction) of the font size.
    pub descent_ratio: f32,
    /// Scale factor applied to script-size styles.
    pub script_scale: f32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self::for_size(16.0)
    }
}

impl CellMetrics {
    /// Metrics for `font_size` with a half-em cell.
    pub fn for_size(font_size: f32) -> Self {
        Self {
            font_size,
            cell_width: font_size * 0.5,
            ascent_ratio: 0.8,
            descent_ratio: 0.2,
            script_scale: 0.7,
        }
    }

    fn scale(&self, style: FontStyle) -> f32 {
        if style.script { self.script_scale } else { 1.0 }
    }

    /// Advance of one narrow cell for `style`.
    pub fn cell_advance(&self, style: FontStyle) -> f32 {
        self.cell_width * self.scale(style)
    }

    fn cells(grapheme: &str) -> usize {
        if grapheme.is_empty() {
            0
        } else {
            UnicodeWidthStr::width(grapheme).max(1)
        }
    }
}

impl FontMetrics for CellMetrics {
    fn measure_single(&self, grapheme: &str, style: FontStyle) -> GlyphExtents {
        let advance = Self::cells(grapheme) as f32 * self.cell_advance(style);
        if grapheme.chars().all(char::is_whitespace) {
            return GlyphExtents {
                advance,
                ..GlyphExtents::default()
            };
        }

        let ascent = self.ascent(style);
        let height = ascent * 0.875;
        GlyphExtents {
            advance,
            height,
            left_bearing: 0.0,
            top_bearing: ascent - height,
        }
    }

    fn ascent(&self, style: FontStyle) -> f32 {
        self.font_size * self.ascent_ratio * self.scale(style)
    }

    fn descent(&self, style: FontStyle) -> f32 {
        -(self.font_size * self.descent_ratio * self.scale(style))
    }

    fn surface(&self, grapheme: &str, style: FontStyle) -> Option<GlyphSurface> {
        let extents = self.measure_single(grapheme, style);
        if extents.height <= 0.0 {
            return None;
        }

        // Solid ink box: good enough for hosts that only need something to blit.
        let width = extents.advance.ceil().max(1.0) as u32;
        let height = extents.height.ceil().max(1.0) as u32;
        Some(GlyphSurface {
            width,
            height,
            pixels: vec![u8::MAX; (width * height) as usize],
        })
    }
}
