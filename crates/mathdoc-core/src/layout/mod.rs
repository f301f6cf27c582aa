//! Layout Layer
//!
//! Turns the document tree into a tree of positioned boxes:
//!
//! ```text
//! Document
//! └── Paragraph (one per line node)
//!     └── Line (one per physical line after breaking)
//!         ├── Word ── Glyph…
//!         ├── Glyph (whitespace) / Eol / Placeholder / Widget
//!         └── Script | Fraction | Root ── MathList ── Glyph… End
//! ```
//!
//! Boxes store offsets relative to their parent; absolute coordinates are computed on demand.
//! Font metrics come from a [`FontCache`] owned by the [`Layouter`].

mod boxes;
mod breaking;
mod math;

pub use boxes::{BoxId, BoxKind, LayoutBox, Point, Rect, Segment};

use crate::ast::Ast;
use crate::document::Document;
use crate::node::{NodeId, NodeKind, TagSet};
use boxes::BoxArena;
use breaking::{Unit, break_lines, content_width};
use mathdoc_fonts::{CellMetrics, FontCache, FontFace, FontMetrics, FontStyle, GlyphExtents};
use std::collections::HashMap;

/// Vertical order of the two branches of a script construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptOrder {
    /// Superscript above subscript.
    #[default]
    SuperscriptTop,
    /// Subscript above superscript.
    SubscriptTop,
}

/// Layout parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Available width of the document.
    pub width: f32,
    /// Horizontal space per indentation level.
    pub indent_width: f32,
    /// Leading gap before the branches of a script.
    pub script_gutter: f32,
    /// Which script branch goes on top.
    pub script_order: ScriptOrder,
    /// Vertical gap between numerator and denominator (holds the rule).
    pub fraction_gap: f32,
    /// Horizontal padding on each side of a fraction.
    pub fraction_padding: f32,
    /// Width of the radical stroke.
    pub radical_width: f32,
    /// Space between the radical stroke and the radicand.
    pub radical_padding: f32,
    /// Distance moved by page up/down.
    pub page_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            indent_width: 24.0,
            script_gutter: 1.0,
            script_order: ScriptOrder::default(),
            fraction_gap: 4.0,
            fraction_padding: 2.0,
            radical_width: 10.0,
            radical_padding: 2.0,
            page_height: 400.0,
        }
    }
}

/// Headless layout engine.
///
/// [`Layouter::update`] rebuilds the box tree only when the document's revision (or the
/// configuration) changed since the last pass. [`BoxId`]s are invalidated by every rebuild.
#[derive(Debug)]
pub struct Layouter {
    config: LayoutConfig,
    fonts: FontCache,
    arena: BoxArena,
    root: Option<BoxId>,
    lines: Vec<BoxId>,
    node_boxes: HashMap<NodeId, BoxId>,
    token: Option<u64>,
}

impl Default for Layouter {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), CellMetrics::default())
    }
}

impl Layouter {
    /// Create a layouter measuring with `metrics`.
    pub fn new(config: LayoutConfig, metrics: impl FontMetrics + 'static) -> Self {
        Self {
            config,
            fonts: FontCache::new(metrics),
            arena: BoxArena::default(),
            root: None,
            lines: Vec::new(),
            node_boxes: HashMap::new(),
            token: None,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the configuration. The next [`Layouter::update`] rebuilds.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.token = None;
    }

    /// Set the available width. The next [`Layouter::update`] rebuilds.
    pub fn set_width(&mut self, width: f32) {
        if self.config.width != width {
            self.config.width = width;
            self.token = None;
        }
    }

    /// The font cache.
    pub fn fonts(&self) -> &FontCache {
        &self.fonts
    }

    /// Mutable font cache (surface lookups populate it).
    pub fn fonts_mut(&mut self) -> &mut FontCache {
        &mut self.fonts
    }

    /// Rebuild the layout if `document` changed since the last pass. Returns whether it rebuilt.
    pub fn update(&mut self, document: &Document) -> bool {
        if self.token == Some(document.ast().revision()) {
            return false;
        }
        self.update_layout(document);
        true
    }

    /// Unconditionally rebuild the layout.
    pub fn update_layout(&mut self, document: &Document) {
        let ast = document.ast();
        self.arena.clear();
        self.lines.clear();
        self.node_boxes.clear();

        let root = self.arena.push(BoxKind::Document, Some(ast.root()));
        let mut paragraphs = Vec::with_capacity(ast.lines().len());
        let mut y = 0.0f32;
        for &line in ast.lines() {
            let paragraph = self.layout_paragraph(ast, line);
            if let Some(b) = self.arena.get_mut(paragraph) {
                b.y = y;
                y += b.height;
            }
            paragraphs.push(paragraph);
        }
        self.arena.adopt(root, paragraphs);
        if let Some(b) = self.arena.get_mut(root) {
            b.width = self.config.width;
            b.height = y;
        }

        self.root = Some(root);
        self.token = Some(ast.revision());
        tracing::trace!(
            revision = ast.revision(),
            boxes = self.arena.len(),
            physical_lines = self.lines.len(),
            "layout rebuilt"
        );
    }

    fn layout_paragraph(&mut self, ast: &Ast, line: NodeId) -> BoxId {
        let indent = f32::from(ast.indentation(line).unwrap_or(0)) * self.config.indent_width;
        let available = (self.config.width - indent).max(0.0);

        let units = self.paragraph_units(ast, line);
        let widths: Vec<Unit> = units
            .iter()
            .filter_map(|id| self.arena.get(*id))
            .map(|b| Unit {
                width: b.width,
                break_after: b.break_after,
            })
            .collect();

        let paragraph = self.arena.push(BoxKind::Paragraph, Some(line));
        self.node_boxes.insert(line, paragraph);

        let mut rows = Vec::new();
        let mut y = 0.0f32;
        for range in break_lines(&widths, available) {
            let row = self.arena.push(BoxKind::Line, None);
            self.arena.adopt(row, units[range].to_vec());
            self.arena.align_row(row);
            if let Some(b) = self.arena.get_mut(row) {
                b.x = indent;
                b.y = y;
                y += b.height;
            }
            self.lines.push(row);
            rows.push(row);
        }
        self.arena.adopt(paragraph, rows);
        if let Some(b) = self.arena.get_mut(paragraph) {
            b.width = self.config.width;
            b.height = y;
        }
        paragraph
    }

    /// Break units of a line: words, whitespace, sentinels, widgets and math constructs.
    fn paragraph_units(&mut self, ast: &Ast, line: NodeId) -> Vec<BoxId> {
        let mut units = Vec::new();
        let mut word: Vec<NodeId> = Vec::new();
        let mut word_tags: Option<&TagSet> = None;

        for &child in ast.children(line) {
            let Some(kind) = ast.kind(child) else {
                continue;
            };
            if let NodeKind::Char(data) = kind
                && !data.is_whitespace()
            {
                if word_tags.is_some_and(|tags| *tags != data.tags) {
                    units.push(self.word(ast, &word));
                    word.clear();
                }
                word_tags = Some(&data.tags);
                word.push(child);
                continue;
            }

            if !word.is_empty() {
                units.push(self.word(ast, &word));
                word.clear();
            }
            word_tags = None;

            let unit = match kind {
                NodeKind::Char(data) => {
                    let style = FontStyle::new(data.font_face());
                    let id = self.glyph(child, data.content(), style);
                    self.set_break_after(id);
                    id
                }
                NodeKind::Eol => {
                    let id = self.sentinel(child, BoxKind::Eol, FontStyle::default());
                    self.set_break_after(id);
                    id
                }
                NodeKind::Placeholder => self.placeholder(child, FontStyle::default()),
                NodeKind::Widget(widget) => {
                    let id = self.arena.push(BoxKind::Widget, Some(child));
                    if let Some(b) = self.arena.get_mut(id) {
                        b.width = widget.width;
                        b.height = widget.height;
                    }
                    self.node_boxes.insert(child, id);
                    id
                }
                other => match other.math_kind() {
                    Some(math) => self.layout_construct(ast, child, math),
                    None => continue,
                },
            };
            units.push(unit);
        }
        if !word.is_empty() {
            units.push(self.word(ast, &word));
        }
        units
    }

    /// A word box holding one glyph per character, shaped as a single unit.
    fn word(&mut self, ast: &Ast, chars: &[NodeId]) -> BoxId {
        let data: Vec<(NodeId, &str, FontFace)> = chars
            .iter()
            .filter_map(|id| {
                ast.char_data(*id)
                    .map(|data| (*id, data.content(), data.font_face()))
            })
            .collect();
        let style = FontStyle::new(data.first().map_or(FontFace::Book, |(_, _, face)| *face));
        let text: String = data.iter().map(|(_, content, _)| *content).collect();

        let mut extents = self.fonts.measure(&text, style);
        if extents.len() != data.len() {
            extents = data
                .iter()
                .map(|(_, content, _)| self.fonts.measure_single(content, style))
                .collect();
        }

        let glyphs: Vec<BoxId> = data
            .iter()
            .zip(extents)
            .map(|((id, _, _), extents)| self.glyph_box(*id, style, extents))
            .collect();
        let word = self.arena.push(BoxKind::Word, None);
        self.arena.adopt(word, glyphs);
        self.arena.align_row(word);
        word
    }

    fn glyph(&mut self, node: NodeId, content: &str, style: FontStyle) -> BoxId {
        let extents = self.fonts.measure_single(content, style);
        self.glyph_box(node, style, extents)
    }

    fn glyph_box(&mut self, node: NodeId, style: FontStyle, extents: GlyphExtents) -> BoxId {
        let kind = BoxKind::Glyph {
            style,
            left_bearing: extents.left_bearing,
            top_bearing: extents.top_bearing,
        };
        let id = self.leaf(node, kind, style);
        if let Some(b) = self.arena.get_mut(id) {
            b.width = extents.advance;
        }
        id
    }

    fn placeholder(&mut self, node: NodeId, style: FontStyle) -> BoxId {
        let width = self.fonts.measure_single("0", style).advance;
        let id = self.leaf(node, BoxKind::Placeholder, style);
        if let Some(b) = self.arena.get_mut(id) {
            b.width = width;
        }
        id
    }

    fn sentinel(&mut self, node: NodeId, kind: BoxKind, style: FontStyle) -> BoxId {
        self.leaf(node, kind, style)
    }

    /// Zero-width leaf as tall as a line of `style`.
    fn leaf(&mut self, node: NodeId, kind: BoxKind, style: FontStyle) -> BoxId {
        let ascent = self.fonts.ascent(style);
        let descent = self.fonts.descent(style);
        let id = self.arena.push(kind, Some(node));
        if let Some(b) = self.arena.get_mut(id) {
            b.height = ascent - descent;
            b.descent = descent;
        }
        self.node_boxes.insert(node, id);
        id
    }

    fn set_break_after(&mut self, id: BoxId) {
        if let Some(b) = self.arena.get_mut(id) {
            b.break_after = true;
        }
    }

    /// The document box, once laid out.
    pub fn root_box(&self) -> Option<BoxId> {
        self.root
    }

    /// Box by id.
    pub fn get_box(&self, id: BoxId) -> Option<&LayoutBox> {
        self.arena.get(id)
    }

    /// Number of boxes in the current layout.
    pub fn box_count(&self) -> usize {
        self.arena.len()
    }

    /// Box built for `node`, if it has one.
    pub fn box_for_node(&self, node: NodeId) -> Option<BoxId> {
        self.node_boxes.get(&node).copied()
    }

    /// Absolute position of the top-left corner of a box.
    pub fn get_absolute_xy(&self, id: BoxId) -> Option<Point> {
        self.arena.get(id)?;
        let (x, y) = self.arena.absolute_xy(id);
        Some(Point::new(x, y))
    }

    /// Absolute rectangle of a box.
    pub fn get_absolute_rect(&self, id: BoxId) -> Option<Rect> {
        self.arena.absolute_rect(id)
    }

    /// Physical line boxes, top to bottom.
    pub fn physical_lines(&self) -> &[BoxId] {
        &self.lines
    }

    /// Units (words, glyphs, sentinels, constructs) of physical line `index`.
    pub fn line_units(&self, index: usize) -> Option<&[BoxId]> {
        let line = self.lines.get(index)?;
        self.arena.get(*line).map(|b| b.children.as_slice())
    }

    /// Width of physical line `index` without trailing whitespace and end of line.
    pub fn line_content_width(&self, index: usize) -> Option<f32> {
        let units: Vec<Unit> = self
            .line_units(index)?
            .iter()
            .filter_map(|id| self.arena.get(*id))
            .map(|b| Unit {
                width: b.width,
                break_after: b.break_after,
            })
            .collect();
        Some(content_width(&units))
    }

    /// Index of the physical line containing a box.
    pub fn line_index_of_box(&self, id: BoxId) -> Option<usize> {
        let mut current = Some(id);
        while let Some(id) = current {
            let b = self.arena.get(id)?;
            if b.kind == BoxKind::Line {
                return self.lines.iter().position(|line| *line == id);
            }
            current = b.parent;
        }
        None
    }

    /// Index of the physical line holding `node`'s box.
    pub fn line_index_of_node(&self, node: NodeId) -> Option<usize> {
        self.line_index_of_box(self.box_for_node(node)?)
    }

    /// Total height of the laid out document.
    pub fn document_height(&self) -> f32 {
        self.root
            .and_then(|root| self.arena.get(root))
            .map_or(0.0, |b| b.height)
    }

    /// Physical line at vertical coordinate `y`, clamped to the first/last line.
    pub fn line_at_y(&self, y: f32) -> Option<usize> {
        let last = self.lines.len().checked_sub(1)?;
        for (index, line) in self.lines.iter().enumerate() {
            let Some(rect) = self.arena.absolute_rect(*line) else {
                continue;
            };
            if y < rect.y + rect.height {
                return Some(index);
            }
        }
        Some(last)
    }

    fn line_leaves(&self, index: usize) -> Vec<BoxId> {
        let mut leaves = Vec::new();
        if let Some(line) = self.lines.get(index) {
            self.arena.leaves(*line, &mut leaves);
        }
        leaves
    }

    /// Leaf node whose box contains `(x, y)`.
    ///
    /// The physical line is picked by `y` (clamped), then its leaves are tested for strict
    /// containment of the point.
    pub fn get_leaf_at_xy(&self, x: f32, y: f32) -> Option<NodeId> {
        let index = self.line_at_y(y)?;
        self.line_leaves(index).into_iter().find_map(|id| {
            let rect = self.arena.absolute_rect(id)?;
            if rect.contains(x, y) {
                self.arena.get(id)?.node
            } else {
                None
            }
        })
    }

    /// Leaf node closest to `(x, y)`.
    ///
    /// The physical line is picked by `y` (clamped); within it the leaf with the nearest
    /// horizontal centre wins, vertical distance breaking ties.
    pub fn get_cursor_holding_layout_close_to_xy(&self, x: f32, y: f32) -> Option<NodeId> {
        let index = self.line_at_y(y)?;
        self.line_leaves(index)
            .into_iter()
            .filter_map(|id| {
                let rect = self.arena.absolute_rect(id)?;
                let node = self.arena.get(id)?.node?;
                Some(((rect.center_x() - x).abs(), (rect.center_y() - y).abs(), node))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)))
            .map(|(_, _, node)| node)
    }

    /// Absolute x of the slot before `node` (the left edge of its box).
    pub fn slot_x(&self, node: NodeId) -> Option<f32> {
        self.get_absolute_xy(self.box_for_node(node)?).map(|p| p.x)
    }

    /// Paragraph-level slot on physical line `index` whose left edge is closest to `x`.
    pub fn closest_slot_in_line(&self, index: usize, x: f32) -> Option<NodeId> {
        let mut best: Option<(f32, NodeId)> = None;
        for unit in self.line_units(index)? {
            let Some(b) = self.arena.get(*unit) else {
                continue;
            };
            let slots = if b.kind == BoxKind::Word {
                b.children.as_slice()
            } else {
                std::slice::from_ref(unit)
            };
            for slot in slots {
                let Some(node) = self.arena.get(*slot).and_then(|b| b.node) else {
                    continue;
                };
                let distance = (self.arena.absolute_xy(*slot).0 - x).abs();
                if best.is_none_or(|(d, _)| distance < d) {
                    best = Some((distance, node));
                }
            }
        }
        best.map(|(_, node)| node)
    }
}
