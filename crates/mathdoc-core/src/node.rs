//! Node kinds and payloads of the document tree.
//!
//! The kind set is closed: every traversal matches on [`NodeKind`] exhaustively instead of
//! dispatching through per-kind interfaces.

use mathdoc_fonts::FontFace;
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a node in an [`Ast`](crate::Ast) arena.
///
/// Ids are allocated monotonically and never reused, so an id that outlives its node resolves
/// to `None` instead of silently addressing a different node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Raw numeric value (stable for the lifetime of the node).
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inline style marker carried by characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Highlighted text (background mark, no metric effect).
    Highlight,
}

/// Set of inline style markers.
pub type TagSet = BTreeSet<Tag>;

/// Payload of a character node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharData {
    content: String,
    /// Inline style markers.
    pub tags: TagSet,
    /// Hyperlink target, if the character is part of a link.
    pub link: Option<String>,
    is_whitespace: bool,
}

impl CharData {
    /// Character holding `content` (one grapheme cluster), without tags or link.
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let is_whitespace = !content.is_empty() && content.chars().all(char::is_whitespace);
        Self {
            content,
            tags: TagSet::new(),
            link: None,
            is_whitespace,
        }
    }

    /// Replace the tag set.
    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    /// Set the link target.
    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    /// The grapheme cluster this node displays.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the content is whitespace (derived from the content, never stored separately).
    pub fn is_whitespace(&self) -> bool {
        self.is_whitespace
    }

    /// Text face implied by the bold/italic tags.
    pub fn font_face(&self) -> FontFace {
        FontFace::from_flags(self.tags.contains(&Tag::Bold), self.tags.contains(&Tag::Italic))
    }
}

/// Payload of an embedded object (e.g. an image).
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetData {
    /// Host-defined identifier of the embedded object.
    pub name: String,
    /// Intrinsic width.
    pub width: f32,
    /// Intrinsic height (the widget sits on the baseline).
    pub height: f32,
}

impl WidgetData {
    /// Widget named `name` with an intrinsic size.
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// The three math constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathKind {
    /// Sub/superscript pair: `[subscript, superscript]`.
    Script,
    /// Fraction: `[numerator, denominator]`.
    Fraction,
    /// Radical: `[radicand, degree]`.
    Root,
}

/// Kind (and payload) of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Document root; children are lines.
    Root,
    /// A paragraph.
    Line {
        /// Indentation level of the paragraph.
        indentation: u8,
    },
    /// A character.
    Char(CharData),
    /// End-of-line sentinel, always the last child of a line.
    Eol,
    /// An empty slot rendered as a box.
    Placeholder,
    /// An embedded object.
    Widget(WidgetData),
    /// Sub/superscript construct.
    MathScript,
    /// Fraction construct.
    MathFraction,
    /// Radical construct.
    MathRoot,
    /// One branch of a math construct.
    MathList,
    /// End sentinel of a math list.
    End,
}

impl NodeKind {
    /// Construct node kind for `kind`.
    pub fn math(kind: MathKind) -> Self {
        match kind {
            MathKind::Script => Self::MathScript,
            MathKind::Fraction => Self::MathFraction,
            MathKind::Root => Self::MathRoot,
        }
    }

    /// Short lowercase name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Line { .. } => "line",
            Self::Char(_) => "char",
            Self::Eol => "eol",
            Self::Placeholder => "placeholder",
            Self::Widget(_) => "widget",
            Self::MathScript => "mathscript",
            Self::MathFraction => "mathfraction",
            Self::MathRoot => "mathroot",
            Self::MathList => "mathlist",
            Self::End => "end",
        }
    }

    /// Which math construct this is, if any.
    pub fn math_kind(&self) -> Option<MathKind> {
        match self {
            Self::MathScript => Some(MathKind::Script),
            Self::MathFraction => Some(MathKind::Fraction),
            Self::MathRoot => Some(MathKind::Root),
            _ => None,
        }
    }

    /// Whether this is a line.
    pub fn is_line(&self) -> bool {
        matches!(self, Self::Line { .. })
    }

    /// Whether this is a character.
    pub fn is_char(&self) -> bool {
        matches!(self, Self::Char(_))
    }

    /// Whether this is a whitespace character.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::Char(data) if data.is_whitespace())
    }

    /// Whether this is the end-of-line sentinel.
    pub fn is_eol(&self) -> bool {
        matches!(self, Self::Eol)
    }

    /// Whether this is the end sentinel of a math list.
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Whether this is a math list.
    pub fn is_math_list(&self) -> bool {
        matches!(self, Self::MathList)
    }

    /// Whether this is a script, fraction or root.
    pub fn is_math_construct(&self) -> bool {
        self.math_kind().is_some()
    }

    /// Whether this kind never has children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Char(_) | Self::Eol | Self::Placeholder | Self::Widget(_) | Self::End
        )
    }

    /// Whether the kind may appear as a child of a line.
    pub fn allowed_in_line(&self) -> bool {
        matches!(
            self,
            Self::Char(_)
                | Self::Placeholder
                | Self::Eol
                | Self::Widget(_)
                | Self::MathScript
                | Self::MathFraction
                | Self::MathRoot
        )
    }

    /// Whether the kind may appear as a child of a math list.
    pub fn allowed_in_math_list(&self) -> bool {
        matches!(self, Self::Char(_) | Self::Placeholder | Self::End)
    }

    /// Character payload, if any.
    pub fn as_char(&self) -> Option<&CharData> {
        match self {
            Self::Char(data) => Some(data),
            _ => None,
        }
    }
}

/// A node stored in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// Kind and payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Non-owning back-reference to the parent.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Owned children, in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An owned, detached copy of a subtree.
///
/// Fragments carry no ids; materializing one creates fresh nodes. They are what undo snapshots,
/// copy/paste and structural comparisons work with.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Kind and payload of the subtree root.
    pub kind: NodeKind,
    /// Child subtrees.
    pub children: Vec<Fragment>,
}

impl Fragment {
    /// Leaf fragment.
    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Plain character.
    pub fn char(content: &str) -> Self {
        Self::leaf(NodeKind::Char(CharData::new(content)))
    }

    /// End-of-line sentinel.
    pub fn eol() -> Self {
        Self::leaf(NodeKind::Eol)
    }

    /// A line holding one character per grapheme of `text` plus the `Eol`.
    pub fn line(text: &str) -> Self {
        use unicode_segmentation::UnicodeSegmentation;

        let mut children: Vec<Fragment> = text.graphemes(true).map(Self::char).collect();
        children.push(Self::eol());
        Self {
            kind: NodeKind::Line { indentation: 0 },
            children,
        }
    }

    /// A math list holding one character per grapheme of `text` plus the `End`.
    pub fn math_list(text: &str) -> Self {
        use unicode_segmentation::UnicodeSegmentation;

        let mut children: Vec<Fragment> = text.graphemes(true).map(Self::char).collect();
        children.push(Self::leaf(NodeKind::End));
        Self {
            kind: NodeKind::MathList,
            children,
        }
    }

    /// A math construct whose two branches hold `first` and `second`.
    pub fn math(kind: MathKind, first: &str, second: &str) -> Self {
        Self {
            kind: NodeKind::math(kind),
            children: vec![Self::math_list(first), Self::math_list(second)],
        }
    }

    /// Number of nodes in the fragment.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Fragment::node_count).sum::<usize>()
    }

    /// Whether the fragment satisfies the container and sentinel invariants of the tree.
    pub fn is_well_formed(&self) -> bool {
        let children_ok = self.children.iter().all(|child| {
            let allowed = match &self.kind {
                NodeKind::Root => child.kind.is_line(),
                NodeKind::Line { .. } => child.kind.allowed_in_line(),
                NodeKind::MathList => child.kind.allowed_in_math_list(),
                kind if kind.is_math_construct() => child.kind.is_math_list(),
                _ => false,
            };
            allowed && child.is_well_formed()
        });
        let shape_ok = match &self.kind {
            NodeKind::Line { .. } => terminated(&self.children, NodeKind::is_eol),
            NodeKind::MathList => terminated(&self.children, NodeKind::is_end),
            kind if kind.is_math_construct() => self.children.len() == 2,
            _ => true,
        };
        children_ok && shape_ok
    }
}

fn terminated(children: &[Fragment], is_terminator: fn(&NodeKind) -> bool) -> bool {
    match children.split_last() {
        Some((last, body)) => {
            is_terminator(&last.kind) && !body.iter().any(|child| is_terminator(&child.kind))
        }
        None => false,
    }
}
