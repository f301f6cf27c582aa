//! Memoization of font metric queries.

use crate::{FontMetrics, FontStyle, GlyphExtents, GlyphSurface};
use std::collections::HashMap;
use std::fmt;

/// Caching front for a [`FontMetrics`] provider.
///
/// Per-glyph extents, vertical metrics and surfaces are cached by `(grapheme, style)`.
/// Whole-unit measurements ([`FontCache::measure`]) go straight to the provider, since a shaped
/// word is not a stable cache key. Nothing is ever evicted.
pub struct FontCache {
    provider: Box<dyn FontMetrics>,
    extents: HashMap<(String, FontStyle), GlyphExtents>,
    vertical: HashMap<FontStyle, (f32, f32)>,
    surfaces: HashMap<(String, FontStyle), Option<GlyphSurface>>,
}

impl FontCache {
    /// Wrap `provider`.
    pub fn new(provider: impl FontMetrics + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            extents: HashMap::new(),
            vertical: HashMap::new(),
            surfaces: HashMap::new(),
        }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &dyn FontMetrics {
        self.provider.as_ref()
    }

    /// Measure `text` as one shaped unit (uncached).
    pub fn measure(&self, text: &str, style: FontStyle) -> Vec<GlyphExtents> {
        self.provider.measure(text, style)
    }

    /// Extents of a single grapheme (cached).
    pub fn measure_single(&mut self, grapheme: &str, style: FontStyle) -> GlyphExtents {
        if let Some(extents) = self.extents.get(&(grapheme.to_string(), style)) {
            return *extents;
        }

        tracing::trace!(grapheme, ?style, "glyph extents cache miss");
        let extents = self.provider.measure_single(grapheme, style);
        self.extents.insert((grapheme.to_string(), style), extents);
        extents
    }

    fn vertical(&mut self, style: FontStyle) -> (f32, f32) {
        *self.vertical.entry(style).or_insert_with(|| {
            (self.provider.ascent(style), self.provider.descent(style))
        })
    }

    /// Ascent for `style` (cached).
    pub fn ascent(&mut self, style: FontStyle) -> f32 {
        self.vertical(style).0
    }

    /// Signed descent for `style` (cached).
    pub fn descent(&mut self, style: FontStyle) -> f32 {
        self.vertical(style).1
    }

    /// Coverage image for a grapheme (cached, including misses).
    pub fn surface(&mut self, grapheme: &str, style: FontStyle) -> Option<&GlyphSurface> {
        let key = (grapheme.to_string(), style);
        if !self.surfaces.contains_key(&key) {
            let surface = self.provider.surface(grapheme, style);
            self.surfaces.insert(key.clone(), surface);
        }
        self.surfaces.get(&key).and_then(Option::as_ref)
    }

    /// Number of cached glyph extents.
    pub fn cached_glyph_count(&self) -> usize {
        self.extents.len()
    }
}

impl fmt::Debug for FontCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontCache")
            .field("extents", &self.extents.len())
            .field("vertical", &self.vertical.len())
            .field("surfaces", &self.surfaces.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellMetrics;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingMetrics {
        inner: CellMetrics,
        calls: Rc<Cell<usize>>,
    }

    impl FontMetrics for CountingMetrics {
        fn measure_single(&self, grapheme: &str, style: FontStyle) -> GlyphExtents {
            self.calls.set(self.calls.get() + 1);
            self.inner.measure_single(grapheme, style)
        }

        fn ascent(&self, style: FontStyle) -> f32 {
            self.inner.ascent(style)
        }

        fn descent(&self, style: FontStyle) -> f32 {
            self.inner.descent(style)
        }
    }

    #[test]
    fn test_single_glyph_queries_are_memoized() {
        let calls = Rc::new(Cell::new(0));
        let mut cache = FontCache::new(CountingMetrics {
            inner: CellMetrics::default(),
            calls: Rc::clone(&calls),
        });

        let style = FontStyle::default();
        let first = cache.measure_single("a", style);
        let second = cache.measure_single("a", style);
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);

        cache.measure_single("a", style.to_script());
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.cached_glyph_count(), 2);
    }

    #[test]
    fn test_vertical_metrics_pass_through() {
        let metrics = CellMetrics::default();
        let mut cache = FontCache::new(metrics);
        let style = FontStyle::default();
        assert_eq!(cache.ascent(style), metrics.ascent(style));
        assert_eq!(cache.descent(style), metrics.descent(style));
    }

    #[test]
    fn test_surface_misses_are_cached() {
        let mut cache = FontCache::new(CellMetrics::default());
        assert!(cache.surface(" ", FontStyle::default()).is_none());
        assert!(cache.surface("x", FontStyle::default()).is_some());
    }
}
