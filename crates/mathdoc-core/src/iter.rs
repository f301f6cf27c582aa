//! Cursor-slot navigation.
//!
//! A slot is "before node X" for every X whose parent is a line or a math list; the `Eol` and
//! `End` sentinels provide the end-of-container slots. [`NodeIterator`] walks these slots in
//! document order, entering and leaving math constructs.
//!
//! Crossing a line boundary never skips a character: stepping back from a line's first slot
//! lands on the previous line's `Eol` (its end-of-line slot), and stepping forward from an `Eol`
//! lands on the next line's first child.

use crate::ast::Ast;
use crate::node::NodeId;

/// Whether `id` is a cursor slot (a child of a line or a math list).
pub fn is_slot(ast: &Ast, id: NodeId) -> bool {
    ast.parent(id)
        .and_then(|parent| ast.kind(parent))
        .is_some_and(|kind| kind.is_line() || kind.is_math_list())
}

/// First slot of the document.
pub fn first_slot(ast: &Ast) -> Option<NodeId> {
    ast.first_child(*ast.lines().first()?)
}

/// Last slot of the document (the last line's `Eol`).
pub fn last_slot(ast: &Ast) -> Option<NodeId> {
    ast.last_child(*ast.lines().last()?)
}

/// Slot following `node`, if any.
pub fn next_slot(ast: &Ast, node: NodeId) -> Option<NodeId> {
    let kind = ast.kind(node)?;
    if kind.is_math_construct() {
        let list = ast.first_child(node)?;
        return ast.first_child(list);
    }
    if kind.is_end() {
        let list = ast.parent(node)?;
        if let Some(next_list) = ast.next_sibling(list) {
            return ast.first_child(next_list);
        }
        return ast.next_sibling(ast.parent(list)?);
    }
    if kind.is_eol() {
        let line = ast.parent(node)?;
        return ast.first_child(ast.next_sibling(line)?);
    }
    ast.next_sibling(node)
}

/// Slot preceding `node`, if any.
pub fn prev_slot(ast: &Ast, node: NodeId) -> Option<NodeId> {
    if let Some(prev) = ast.prev_sibling(node) {
        if ast.kind(prev)?.is_math_construct() {
            return ast.last_child(ast.last_child(prev)?);
        }
        return Some(prev);
    }

    let container = ast.parent(node)?;
    if ast.kind(container)?.is_math_list() {
        return match ast.prev_sibling(container) {
            Some(prev_list) => ast.last_child(prev_list),
            None => ast.parent(container),
        };
    }
    ast.last_child(ast.prev_sibling(container)?)
}

/// Stateful walker over cursor slots.
///
/// `prev`/`next` return `false` and leave the iterator in place at the document's first/last
/// slot.
#[derive(Debug, Clone, Copy)]
pub struct NodeIterator<'a> {
    ast: &'a Ast,
    node: NodeId,
}

impl<'a> NodeIterator<'a> {
    /// Iterator positioned at `node`.
    pub fn new(ast: &'a Ast, node: NodeId) -> Self {
        Self { ast, node }
    }

    /// Current node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Reposition the iterator.
    pub fn set_node(&mut self, node: NodeId) {
        self.node = node;
    }

    /// Step to the next slot.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        match next_slot(self.ast, self.node) {
            Some(node) => {
                self.node = node;
                true
            }
            None => false,
        }
    }

    /// Step to the previous slot.
    pub fn prev(&mut self) -> bool {
        match prev_slot(self.ast, self.node) {
            Some(node) => {
                self.node = node;
                true
            }
            None => false,
        }
    }

    /// Whether the current node is the first child of a line.
    pub fn starts_line(&self) -> bool {
        self.in_line() && self.ast.get_index(self.node) == Some(0)
    }

    /// Whether the current node is the last child of a line.
    pub fn ends_line(&self) -> bool {
        self.in_line()
            && self
                .ast
                .parent(self.node)
                .and_then(|line| self.ast.last_child(line))
                == Some(self.node)
    }

    /// The line containing the current node.
    pub fn get_line(&self) -> Option<NodeId> {
        self.ast.get_line(self.node)
    }

    fn in_line(&self) -> bool {
        self.ast
            .parent(self.node)
            .and_then(|parent| self.ast.kind(parent))
            .is_some_and(|kind| kind.is_line())
    }
}
