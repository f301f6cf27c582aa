//! Box tree storage and geometry helpers.

use crate::node::NodeId;
use mathdoc_fonts::FontStyle;

/// Index of a box in the layouter's arena. Only valid until the next rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId(pub(crate) usize);

/// A point in layout coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Point at `(x, y)`.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A straight stroke.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    /// Start point.
    pub from: Point,
    /// End point.
    pub to: Point,
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Whether `(x, y)` lies inside (left/top inclusive, right/bottom exclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Horizontal centre.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Vertical centre.
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// What a box represents.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxKind {
    /// The whole document.
    Document,
    /// One line node (paragraph), holding its physical lines.
    Paragraph,
    /// One physical line after breaking.
    Line,
    /// A run of identically styled non-whitespace characters.
    Word,
    /// A single character.
    Glyph {
        /// Style the glyph is measured and drawn with.
        style: FontStyle,
        /// Offset of the ink box from the pen position.
        left_bearing: f32,
        /// Offset of the ink box from the top of the box.
        top_bearing: f32,
    },
    /// End-of-line sentinel.
    Eol,
    /// End sentinel of a math list.
    End,
    /// Placeholder slot.
    Placeholder,
    /// Embedded object.
    Widget,
    /// One branch of a math construct.
    MathList,
    /// Sub/superscript stack.
    Script,
    /// Fraction with its rule.
    Fraction {
        /// Fraction rule, relative to the box.
        rule: Segment,
    },
    /// Radical with its stroke.
    Root {
        /// Radical stroke polyline, relative to the box.
        stroke: [Point; 4],
    },
}

/// A positioned box.
///
/// `x`/`y` are offsets of the top-left corner relative to the parent box; absolute coordinates
/// come from [`Layouter::get_absolute_xy`](super::Layouter::get_absolute_xy). `descent` is signed:
/// the baseline lies `height + descent` below the top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    /// What the box represents.
    pub kind: BoxKind,
    /// Node the box was built for, if any.
    pub node: Option<NodeId>,
    /// Parent box.
    pub parent: Option<BoxId>,
    /// Child boxes, in visual order.
    pub children: Vec<BoxId>,
    /// Horizontal offset within the parent.
    pub x: f32,
    /// Vertical offset within the parent.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Signed descent (`<= 0` below the baseline).
    pub descent: f32,
    /// Whether a line may break after this unit (whitespace and end of line).
    pub break_after: bool,
}

impl LayoutBox {
    /// Distance from the top edge down to the baseline.
    pub fn ascent(&self) -> f32 {
        self.height + self.descent
    }

    /// Whether the box is a cursor-holding leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self.kind,
            BoxKind::Glyph { .. }
                | BoxKind::Eol
                | BoxKind::End
                | BoxKind::Placeholder
                | BoxKind::Widget
        )
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct BoxArena {
    boxes: Vec<LayoutBox>,
}

impl BoxArena {
    pub(crate) fn clear(&mut self) {
        self.boxes.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.boxes.len()
    }

    pub(crate) fn push(&mut self, kind: BoxKind, node: Option<NodeId>) -> BoxId {
        let id = BoxId(self.boxes.len());
        self.boxes.push(LayoutBox {
            kind,
            node,
            parent: None,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            descent: 0.0,
            break_after: false,
        });
        id
    }

    pub(crate) fn get(&self, id: BoxId) -> Option<&LayoutBox> {
        self.boxes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: BoxId) -> Option<&mut LayoutBox> {
        self.boxes.get_mut(id.0)
    }

    pub(crate) fn adopt(&mut self, parent: BoxId, children: Vec<BoxId>) {
        for child in &children {
            if let Some(child) = self.get_mut(*child) {
                child.parent = Some(parent);
            }
        }
        if let Some(parent) = self.get_mut(parent) {
            parent.children = children;
        }
    }

    /// Lay the children of `parent` out left to right on one baseline and size `parent`.
    pub(crate) fn align_row(&mut self, parent: BoxId) {
        let children = self
            .get(parent)
            .map(|b| b.children.clone())
            .unwrap_or_default();

        let mut x = 0.0f32;
        let mut max_ascent = 0.0f32;
        let mut min_descent = 0.0f32;
        for (i, id) in children.iter().enumerate() {
            let Some(child) = self.get_mut(*id) else {
                continue;
            };
            child.x = x;
            x += child.width;
            if i == 0 {
                max_ascent = child.ascent();
                min_descent = child.descent;
            } else {
                max_ascent = max_ascent.max(child.ascent());
                min_descent = min_descent.min(child.descent);
            }
        }
        for id in &children {
            if let Some(child) = self.get_mut(*id) {
                child.y = max_ascent - child.ascent();
            }
        }

        if let Some(parent) = self.get_mut(parent) {
            parent.width = x;
            parent.height = max_ascent - min_descent;
            parent.descent = min_descent;
        }
    }

    pub(crate) fn absolute_xy(&self, id: BoxId) -> (f32, f32) {
        let (mut x, mut y) = (0.0, 0.0);
        let mut current = self.get(id);
        while let Some(b) = current {
            x += b.x;
            y += b.y;
            current = b.parent.and_then(|parent| self.get(parent));
        }
        (x, y)
    }

    pub(crate) fn absolute_rect(&self, id: BoxId) -> Option<Rect> {
        let b = self.get(id)?;
        let (x, y) = self.absolute_xy(id);
        Some(Rect {
            x,
            y,
            width: b.width,
            height: b.height,
        })
    }

    /// Cursor-holding leaves below `id`, in visual order.
    pub(crate) fn leaves(&self, id: BoxId, out: &mut Vec<BoxId>) {
        let Some(b) = self.get(id) else {
            return;
        };
        if b.is_leaf() {
            out.push(id);
            return;
        }
        for child in &b.children {
            self.leaves(*child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(arena: &mut BoxArena, width: f32, height: f32, descent: f32) -> BoxId {
        let id = arena.push(BoxKind::Placeholder, None);
        let b = arena.get_mut(id).unwrap();
        b.width = width;
        b.height = height;
        b.descent = descent;
        id
    }

    #[test]
    fn test_align_row_shares_baseline() {
        let mut arena = BoxArena::default();
        let tall = sized(&mut arena, 10.0, 20.0, -4.0);
        let short = sized(&mut arena, 5.0, 8.0, -2.0);
        let deep = sized(&mut arena, 5.0, 10.0, -8.0);
        let row = arena.push(BoxKind::Line, None);
        arena.adopt(row, vec![tall, short, deep]);
        arena.align_row(row);

        let row_box = arena.get(row).unwrap();
        // max ascent 16, min descent -8.
        assert_eq!(row_box.height, 24.0);
        assert_eq!(row_box.descent, -8.0);
        assert_eq!(row_box.width, 20.0);

        for id in [tall, short, deep] {
            let b = arena.get(id).unwrap();
            assert_eq!(b.y + b.ascent(), 16.0);
        }
        assert_eq!(arena.get(deep).unwrap().x, 15.0);
    }

    #[test]
    fn test_absolute_xy_sums_offsets() {
        let mut arena = BoxArena::default();
        let outer = arena.push(BoxKind::Paragraph, None);
        let inner = sized(&mut arena, 1.0, 1.0, 0.0);
        arena.adopt(outer, vec![inner]);
        arena.get_mut(outer).unwrap().x = 3.0;
        arena.get_mut(outer).unwrap().y = 4.0;
        arena.get_mut(inner).unwrap().x = 1.5;

        assert_eq!(arena.absolute_xy(inner), (4.5, 4.0));
        assert!(arena.absolute_rect(inner).unwrap().contains(4.5, 4.0));
        assert!(!arena.absolute_rect(inner).unwrap().contains(5.5, 4.0));
    }
}
