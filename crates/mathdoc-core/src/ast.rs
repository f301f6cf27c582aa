//! The document tree.
//!
//! All nodes live in one arena owned by [`Ast`]. Containers list their children by [`NodeId`];
//! each node keeps a non-owning `parent` back-reference used for traversal only.

use crate::node::{CharData, Fragment, Node, NodeId, NodeKind};
use crate::position::Position;
use std::collections::HashMap;
use std::ops::Range;
use thiserror::Error;

/// Errors reported by tree mutations and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The id does not name a live node.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    /// A child index is past the end of the parent.
    #[error("index {index} out of bounds for {len} children")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of children.
        len: usize,
    },
    /// Inserting a node that already has a parent.
    #[error("node {0} is already attached")]
    Attached(NodeId),
    /// The node is not attached to a parent.
    #[error("node {0} has no parent")]
    Detached(NodeId),
    /// A line was required.
    #[error("expected a line, found {found} {node}")]
    NotALine {
        /// Offending node.
        node: NodeId,
        /// Its kind name.
        found: &'static str,
    },
    /// `child` is not a direct child of `parent`.
    #[error("node {child} is not a child of {parent}")]
    NotAChild {
        /// Expected parent.
        parent: NodeId,
        /// Offending node.
        child: NodeId,
    },
    /// Inserting a node below itself.
    #[error("cannot insert {0} into its own subtree")]
    Cycle(NodeId),
    /// The root node cannot be removed or moved.
    #[error("the root node cannot be detached")]
    RootRemoval,
    /// No node lives at the position.
    #[error("no node at position {0}")]
    InvalidPosition(Position),
}

/// First structural invariant violation found by [`Ast::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The root node is not of kind `Root`.
    #[error("root node {0} is not of kind root")]
    RootKind(NodeId),
    /// The document has no lines.
    #[error("the document has no lines")]
    EmptyDocument,
    /// A child id does not resolve to a stored node.
    #[error("node {0} is referenced but not stored")]
    Dangling(NodeId),
    /// Parent back-reference disagrees with the owning container.
    #[error("node {node} records parent {recorded:?} but is owned by {owner:?}")]
    ParentMismatch {
        /// Offending node.
        node: NodeId,
        /// Parent stored on the node.
        recorded: Option<NodeId>,
        /// Container that lists the node.
        owner: Option<NodeId>,
    },
    /// A kind that may not appear inside its container.
    #[error("{child_kind} {child} is not allowed inside {parent_kind} {parent}")]
    UnexpectedChild {
        /// Container.
        parent: NodeId,
        /// Container kind name.
        parent_kind: &'static str,
        /// Offending child.
        child: NodeId,
        /// Child kind name.
        child_kind: &'static str,
    },
    /// A line or math list does not end with its sentinel.
    #[error("{kind} {node} must end with {expected}")]
    MissingTerminator {
        /// Container.
        node: NodeId,
        /// Container kind name.
        kind: &'static str,
        /// Expected sentinel kind name.
        expected: &'static str,
    },
    /// A sentinel appears before the last child.
    #[error("{kind} {node} has a terminator before its last child")]
    MisplacedTerminator {
        /// Container.
        node: NodeId,
        /// Container kind name.
        kind: &'static str,
    },
    /// A math construct without exactly two branches.
    #[error("{kind} {node} has {found} branches, expected 2")]
    Arity {
        /// Construct.
        node: NodeId,
        /// Construct kind name.
        kind: &'static str,
        /// Number of children found.
        found: usize,
    },
}

/// The document tree arena.
///
/// Every mutation bumps [`Ast::revision`], which downstream consumers (the layouter) use as a
/// change token.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    revision: u64,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    /// A document holding one empty line.
    pub fn new() -> Self {
        Self::from_lines([Fragment::line("")])
    }

    /// A document with one line per `\n`-separated segment of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n').map(Fragment::line))
    }

    /// A document built from line fragments. An empty iterator yields one empty line.
    pub fn from_lines(lines: impl IntoIterator<Item = Fragment>) -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            },
        );
        let mut ast = Self {
            nodes,
            root,
            next_id: 1,
            revision: 0,
        };

        for line in lines {
            let id = ast.materialize(&line);
            ast.link(root, ast.length(root), id);
        }
        if ast.length(root) == 0 {
            let id = ast.materialize(&Fragment::line(""));
            ast.link(root, 0, id);
        }
        ast
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Change token, bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Whether `id` names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Kind of a node.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(Node::kind)
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Children of a node (empty for unknown ids and leaves).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// The lines of the document.
    pub fn lines(&self) -> &[NodeId] {
        self.children(self.root)
    }

    /// Character payload of a node.
    pub fn char_data(&self, id: NodeId) -> Option<&CharData> {
        self.kind(id).and_then(NodeKind::as_char)
    }

    /// Mutable character payload of a node. Counts as a mutation.
    pub fn char_data_mut(&mut self, id: NodeId) -> Option<&mut CharData> {
        self.revision += 1;
        match self.nodes.get_mut(&id).map(|node| &mut node.kind) {
            Some(NodeKind::Char(data)) => Some(data),
            _ => None,
        }
    }

    /// Indentation level of a line.
    pub fn indentation(&self, line: NodeId) -> Option<u8> {
        match self.kind(line) {
            Some(NodeKind::Line { indentation }) => Some(*indentation),
            _ => None,
        }
    }

    /// Set the indentation level of a line, returning the previous level.
    pub fn set_indentation(&mut self, line: NodeId, level: u8) -> Result<u8, TreeError> {
        let found = self.kind_name(line)?;
        let previous = match &mut self.node_mut(line)?.kind {
            NodeKind::Line { indentation } => std::mem::replace(indentation, level),
            _ => return Err(TreeError::NotALine { node: line, found }),
        };
        self.revision += 1;
        Ok(previous)
    }

    /// Allocate a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Allocate a detached copy of `fragment`, returning its root.
    pub fn materialize(&mut self, fragment: &Fragment) -> NodeId {
        let id = self.create(fragment.kind.clone());
        for child in &fragment.children {
            let child_id = self.materialize(child);
            self.link(id, self.length(id), child_id);
        }
        id
    }

    /// Owned copy of the subtree rooted at `id`.
    pub fn snapshot(&self, id: NodeId) -> Option<Fragment> {
        let node = self.node(id)?;
        Some(Fragment {
            kind: node.kind.clone(),
            children: node
                .children
                .iter()
                .filter_map(|child| self.snapshot(*child))
                .collect(),
        })
    }

    /// Insert the detached node `child` as the `index`-th child of `parent`.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), TreeError> {
        let len = self
            .node(parent)
            .ok_or(TreeError::UnknownNode(parent))?
            .children
            .len();
        let child_node = self.node(child).ok_or(TreeError::UnknownNode(child))?;
        if child_node.parent.is_some() {
            return Err(TreeError::Attached(child));
        }
        if child == self.root {
            return Err(TreeError::RootRemoval);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle(child));
        }
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }

        self.link(parent, index, child);
        Ok(())
    }

    /// Append the detached node `child` to `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let len = self.node(parent).ok_or(TreeError::UnknownNode(parent))?.children.len();
        self.insert(parent, len, child)
    }

    /// Insert the detached node `child` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) -> Result<(), TreeError> {
        let (parent, index) = self.slot_of(sibling)?;
        self.insert(parent, index, child)
    }

    /// Insert the detached node `child` immediately after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, child: NodeId) -> Result<(), TreeError> {
        let (parent, index) = self.slot_of(sibling)?;
        self.insert(parent, index + 1, child)
    }

    /// Allocate `fragment` and insert it as the `index`-th child of `parent`.
    ///
    /// On error the freshly allocated nodes are released again.
    pub fn insert_fragment(
        &mut self,
        parent: NodeId,
        index: usize,
        fragment: &Fragment,
    ) -> Result<NodeId, TreeError> {
        let id = self.materialize(fragment);
        match self.insert(parent, index, id) {
            Ok(()) => Ok(id),
            Err(err) => {
                self.take(id);
                Err(err)
            }
        }
    }

    /// Allocate `fragment` and insert it immediately before `sibling`.
    pub fn insert_fragment_before(
        &mut self,
        sibling: NodeId,
        fragment: &Fragment,
    ) -> Result<NodeId, TreeError> {
        let (parent, index) = self.slot_of(sibling)?;
        self.insert_fragment(parent, index, fragment)
    }

    /// Remove `id` and its subtree from the arena, returning an owned copy.
    pub fn remove(&mut self, id: NodeId) -> Result<Fragment, TreeError> {
        if id == self.root {
            return Err(TreeError::RootRemoval);
        }
        self.unlink(id)?;
        self.take(id).ok_or(TreeError::UnknownNode(id))
    }

    /// The `index`-th child of `parent`.
    pub fn get_child(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).get(index).copied()
    }

    /// Index of `id` within its parent.
    pub fn get_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    /// Number of children of `parent`.
    pub fn length(&self, parent: NodeId) -> usize {
        self.children(parent).len()
    }

    /// First child of `id`.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Last child of `id`.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Following sibling of `id`.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let index = self.get_index(id)?;
        self.get_child(self.parent(id)?, index + 1)
    }

    /// Preceding sibling of `id`.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let index = self.get_index(id)?.checked_sub(1)?;
        self.get_child(self.parent(id)?, index)
    }

    /// The line containing `id` (the ancestor-or-self whose parent is the root).
    pub fn get_line(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if parent == self.root {
                return self.kind(current).filter(|k| k.is_line()).map(|_| current);
            }
            current = parent;
        }
    }

    /// Index of the line containing `id`.
    pub fn line_index(&self, id: NodeId) -> Option<usize> {
        self.get_index(self.get_line(id)?)
    }

    /// Path of child indices from the root to `id`. `None` for detached nodes.
    pub fn position_of(&self, id: NodeId) -> Option<Position> {
        let mut indices = Vec::new();
        let mut current = id;
        while current != self.root {
            indices.push(self.get_index(current)?);
            current = self.parent(current)?;
        }
        indices.reverse();
        Some(Position::new(indices))
    }

    /// Resolve a path of child indices from the root.
    pub fn node_at(&self, position: &Position) -> Option<NodeId> {
        position
            .indices()
            .iter()
            .try_fold(self.root, |node, index| self.get_child(node, *index))
    }

    /// Split `line` before its child `at`.
    ///
    /// The children before `at` move to a new line inserted in front of `line`, which receives a
    /// fresh `Eol` and the same indentation. Returns `(left, right)`; `right` is `line` itself and
    /// keeps `at` and the original `Eol`.
    pub fn split(&mut self, line: NodeId, at: NodeId) -> Result<(NodeId, NodeId), TreeError> {
        let indentation = self.require_line(line)?;
        let index = self.child_index(line, at)?;
        let (parent, line_index) = self.slot_of(line)?;

        let moved: Vec<NodeId> = self.node_mut(line)?.children.drain(..index).collect();
        let left = self.create(NodeKind::Line { indentation });
        for child in &moved {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = Some(left);
            }
        }
        self.node_mut(left)?.children = moved;
        let eol = self.create(NodeKind::Eol);
        self.link(left, index, eol);
        self.link(parent, line_index, left);
        Ok((left, line))
    }

    /// Concatenate `line_b` onto `line_a`, dropping `line_a`'s `Eol` and removing `line_b`.
    pub fn merge(&mut self, line_a: NodeId, line_b: NodeId) -> Result<NodeId, TreeError> {
        self.require_line(line_a)?;
        self.require_line(line_b)?;
        if line_a == line_b {
            return Err(TreeError::Cycle(line_b));
        }

        if let Some(eol) = self.last_child(line_a)
            && self.kind(eol).is_some_and(NodeKind::is_eol)
        {
            self.remove(eol)?;
        }
        let moved = std::mem::take(&mut self.node_mut(line_b)?.children);
        for child in &moved {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = Some(line_a);
            }
        }
        self.node_mut(line_a)?.children.extend(moved);
        self.remove(line_b)?;
        Ok(line_a)
    }

    /// Owned copies of the half-open sibling range between two positions.
    ///
    /// The positions are normalized so the first is not after the second. The range lives under
    /// their deepest common ancestor, from the ancestor's child containing the first position up
    /// to (excluding) the child containing the second. When one position is an ancestor of the
    /// other the range is empty.
    pub fn get_subtree(&self, pos1: &Position, pos2: &Position) -> Result<Vec<Fragment>, TreeError> {
        let (parent, range) = self.sibling_range(pos1, pos2)?;
        Ok(self.children(parent)[range]
            .iter()
            .filter_map(|child| self.snapshot(*child))
            .collect())
    }

    /// Remove the range [`Ast::get_subtree`] would copy, returning the removed fragments.
    pub fn remove_range(
        &mut self,
        pos1: &Position,
        pos2: &Position,
    ) -> Result<Vec<Fragment>, TreeError> {
        let (parent, range) = self.sibling_range(pos1, pos2)?;
        let doomed: Vec<NodeId> = self.children(parent)[range].to_vec();
        doomed.into_iter().map(|id| self.remove(id)).collect()
    }

    /// Pre-order iterator over `id` and its descendants.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            ast: self,
            stack: if self.contains(id) { vec![id] } else { Vec::new() },
        }
    }

    /// Check the structural invariants of the attached tree.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let root = self
            .node(self.root)
            .ok_or(ValidationError::Dangling(self.root))?;
        if root.kind != NodeKind::Root {
            return Err(ValidationError::RootKind(self.root));
        }
        if root.parent.is_some() {
            return Err(ValidationError::ParentMismatch {
                node: self.root,
                recorded: root.parent,
                owner: None,
            });
        }
        if root.children.is_empty() {
            return Err(ValidationError::EmptyDocument);
        }
        self.validate_node(self.root)
    }

    fn validate_node(&self, id: NodeId) -> Result<(), ValidationError> {
        let node = self.node(id).ok_or(ValidationError::Dangling(id))?;
        for &child in &node.children {
            let child_node = self.node(child).ok_or(ValidationError::Dangling(child))?;
            if child_node.parent != Some(id) {
                return Err(ValidationError::ParentMismatch {
                    node: child,
                    recorded: child_node.parent,
                    owner: Some(id),
                });
            }

            let allowed = match &node.kind {
                NodeKind::Root => child_node.kind.is_line(),
                NodeKind::Line { .. } => child_node.kind.allowed_in_line(),
                NodeKind::MathList => child_node.kind.allowed_in_math_list(),
                NodeKind::MathScript | NodeKind::MathFraction | NodeKind::MathRoot => {
                    child_node.kind.is_math_list()
                }
                NodeKind::Char(_)
                | NodeKind::Eol
                | NodeKind::Placeholder
                | NodeKind::Widget(_)
                | NodeKind::End => false,
            };
            if !allowed {
                return Err(ValidationError::UnexpectedChild {
                    parent: id,
                    parent_kind: node.kind.name(),
                    child,
                    child_kind: child_node.kind.name(),
                });
            }
            self.validate_node(child)?;
        }

        match &node.kind {
            NodeKind::Line { .. } => self.validate_terminator(id, node, NodeKind::is_eol, "eol"),
            NodeKind::MathList => self.validate_terminator(id, node, NodeKind::is_end, "end"),
            kind if kind.is_math_construct() && node.children.len() != 2 => {
                Err(ValidationError::Arity {
                    node: id,
                    kind: kind.name(),
                    found: node.children.len(),
                })
            }
            _ => Ok(()),
        }
    }

    fn validate_terminator(
        &self,
        id: NodeId,
        node: &Node,
        is_terminator: fn(&NodeKind) -> bool,
        expected: &'static str,
    ) -> Result<(), ValidationError> {
        let Some((last, body)) = node.children.split_last() else {
            return Err(ValidationError::MissingTerminator {
                node: id,
                kind: node.kind.name(),
                expected,
            });
        };
        if !self.kind(*last).is_some_and(is_terminator) {
            return Err(ValidationError::MissingTerminator {
                node: id,
                kind: node.kind.name(),
                expected,
            });
        }
        if body
            .iter()
            .any(|child| self.kind(*child).is_some_and(is_terminator))
        {
            return Err(ValidationError::MisplacedTerminator {
                node: id,
                kind: node.kind.name(),
            });
        }
        Ok(())
    }

    fn sibling_range(
        &self,
        pos1: &Position,
        pos2: &Position,
    ) -> Result<(NodeId, Range<usize>), TreeError> {
        let (start, end) = if pos1 <= pos2 { (pos1, pos2) } else { (pos2, pos1) };
        let depth = start.common_prefix_len(end);
        let parent_path = if depth < start.len() {
            Position::new(start.indices()[..depth].to_vec())
        } else {
            start.parent().unwrap_or_else(Position::root)
        };
        let parent = self
            .node_at(&parent_path)
            .ok_or_else(|| TreeError::InvalidPosition(parent_path.clone()))?;
        let len = self.length(parent);

        let (from, to) = match (start.indices().get(depth), end.indices().get(depth)) {
            (Some(from), Some(to)) => (*from, *to),
            _ => {
                let at = start.indices().last().copied().unwrap_or(0);
                (at, at)
            }
        };
        if to > len {
            return Err(TreeError::IndexOutOfBounds { index: to, len });
        }
        if from >= len && from != to {
            return Err(TreeError::InvalidPosition(start.clone()));
        }
        Ok((parent, from..to))
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(&id).ok_or(TreeError::UnknownNode(id))
    }

    fn kind_name(&self, id: NodeId) -> Result<&'static str, TreeError> {
        self.kind(id).map(NodeKind::name).ok_or(TreeError::UnknownNode(id))
    }

    fn require_line(&self, id: NodeId) -> Result<u8, TreeError> {
        let found = self.kind_name(id)?;
        self.indentation(id)
            .ok_or(TreeError::NotALine { node: id, found })
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
        self.children(parent)
            .iter()
            .position(|id| *id == child)
            .ok_or(TreeError::NotAChild { parent, child })
    }

    fn slot_of(&self, id: NodeId) -> Result<(NodeId, usize), TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        let parent = self.parent(id).ok_or(TreeError::Detached(id))?;
        Ok((parent, self.child_index(parent, id)?))
    }

    // Callers have checked that both nodes exist, `child` is detached and `index` is in range.
    fn link(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.insert(index, child);
        }
        self.revision += 1;
    }

    fn unlink(&mut self, id: NodeId) -> Result<(), TreeError> {
        let parent = self.node(id).ok_or(TreeError::UnknownNode(id))?.parent;
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.retain(|child| *child != id);
            }
            if let Some(node) = self.nodes.get_mut(&id) {
                node.parent = None;
            }
            self.revision += 1;
        }
        Ok(())
    }

    fn take(&mut self, id: NodeId) -> Option<Fragment> {
        let node = self.nodes.remove(&id)?;
        let children = node
            .children
            .into_iter()
            .filter_map(|child| self.take(child))
            .collect();
        Some(Fragment {
            kind: node.kind,
            children,
        })
    }
}

/// Pre-order iterator returned by [`Ast::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.ast.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::MathKind;

    fn line_text(ast: &Ast, line: NodeId) -> String {
        ast.children(line)
            .iter()
            .filter_map(|id| ast.char_data(*id))
            .map(CharData::content)
            .collect()
    }

    #[test]
    fn test_new_document_is_valid() {
        let ast = Ast::new();
        assert_eq!(ast.lines().len(), 1);
        assert_eq!(ast.length(ast.lines()[0]), 1);
        assert!(ast.validate().is_ok());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut ast = Ast::from_text("ac");
        let line = ast.lines()[0];
        let b = ast.create(NodeKind::Char(CharData::new("b")));
        let c = ast.get_child(line, 1).unwrap();
        ast.insert_before(c, b).unwrap();
        assert_eq!(line_text(&ast, line), "abc");
        assert_eq!(ast.get_index(b), Some(1));

        let removed = ast.remove(b).unwrap();
        assert_eq!(removed, Fragment::char("b"));
        assert!(!ast.contains(b));
        assert_eq!(line_text(&ast, line), "ac");
        assert!(ast.validate().is_ok());
    }

    #[test]
    fn test_insert_rejects_attached_and_cycles() {
        let mut ast = Ast::from_text("a");
        let line = ast.lines()[0];
        let a = ast.get_child(line, 0).unwrap();
        assert_eq!(ast.insert(line, 0, a), Err(TreeError::Attached(a)));

        let list = ast.materialize(&Fragment::math_list("x"));
        let inner = ast.first_child(list).unwrap();
        // Detach the list's first char and try to insert the list below it.
        ast.unlink(inner).unwrap();
        assert!(ast.insert(list, 0, inner).is_ok());
        assert_eq!(ast.insert(inner, 0, list), Err(TreeError::Cycle(list)));
        assert_eq!(
            ast.insert(line, 9, list),
            Err(TreeError::IndexOutOfBounds { index: 9, len: 2 })
        );
    }

    #[test]
    fn test_split_keeps_at_on_the_right() {
        let mut ast = Ast::from_text("abcd");
        let line = ast.lines()[0];
        ast.set_indentation(line, 2).unwrap();
        let c = ast.get_child(line, 2).unwrap();

        let (left, right) = ast.split(line, c).unwrap();
        assert_eq!(right, line);
        assert_eq!(ast.lines(), &[left, right]);
        assert_eq!(line_text(&ast, left), "ab");
        assert_eq!(line_text(&ast, right), "cd");
        assert_eq!(ast.indentation(left), Some(2));
        assert!(ast.validate().is_ok());
    }

    #[test]
    fn test_split_at_first_child_leaves_empty_line() {
        let mut ast = Ast::from_text("ab");
        let line = ast.lines()[0];
        let a = ast.first_child(line).unwrap();
        let (left, _) = ast.split(line, a).unwrap();
        assert_eq!(ast.length(left), 1);
        assert!(ast.validate().is_ok());
    }

    #[test]
    fn test_merge_drops_first_eol() {
        let mut ast = Ast::from_text("ab\ncd");
        let (a, b) = (ast.lines()[0], ast.lines()[1]);
        let merged = ast.merge(a, b).unwrap();
        assert_eq!(merged, a);
        assert_eq!(ast.lines(), &[a]);
        assert_eq!(line_text(&ast, a), "abcd");
        assert!(!ast.contains(b));
        assert!(ast.validate().is_ok());
    }

    #[test]
    fn test_positions_round_trip() {
        let mut ast = Ast::from_text("a\nb");
        let line = ast.lines()[1];
        let frac = ast.materialize(&Fragment::math(MathKind::Fraction, "1", "2"));
        ast.insert(line, 1, frac).unwrap();
        let denominator_char = ast.first_child(ast.get_child(frac, 1).unwrap()).unwrap();

        let position = ast.position_of(denominator_char).unwrap();
        assert_eq!(position, Position::new(vec![1, 1, 1, 0]));
        assert_eq!(ast.node_at(&position), Some(denominator_char));
        assert_eq!(ast.get_line(denominator_char), Some(line));
        assert_eq!(ast.node_at(&Position::new(vec![5])), None);
    }

    #[test]
    fn test_get_subtree_and_remove_range() {
        let mut ast = Ast::from_text("abcd");
        let from = Position::new(vec![0, 1]);
        let to = Position::new(vec![0, 3]);

        let copied = ast.get_subtree(&to, &from).unwrap();
        assert_eq!(copied, vec![Fragment::char("b"), Fragment::char("c")]);

        let removed = ast.remove_range(&from, &to).unwrap();
        assert_eq!(removed, copied);
        assert_eq!(line_text(&ast, ast.lines()[0]), "ad");
        assert!(ast.get_subtree(&from, &from).unwrap().is_empty());
    }

    #[test]
    fn test_get_subtree_lifts_to_common_ancestor() {
        let mut ast = Ast::from_text("ab");
        let line = ast.lines()[0];
        let root = ast.materialize(&Fragment::math(MathKind::Root, "x", ""));
        ast.insert(line, 1, root).unwrap();

        // From inside the radicand to the trailing `b`: the whole construct is included.
        let copied = ast
            .get_subtree(&Position::new(vec![0, 1, 0, 0]), &Position::new(vec![0, 2]))
            .unwrap();
        assert_eq!(copied, vec![Fragment::math(MathKind::Root, "x", "")]);
    }

    #[test]
    fn test_validate_reports_violations() {
        let mut ast = Ast::from_text("ab");
        let line = ast.lines()[0];
        let eol = ast.last_child(line).unwrap();
        ast.remove(eol).unwrap();
        assert!(matches!(
            ast.validate(),
            Err(ValidationError::MissingTerminator { expected: "eol", .. })
        ));

        let mut ast = Ast::new();
        let line = ast.lines()[0];
        let end = ast.create(NodeKind::End);
        ast.insert(line, 0, end).unwrap();
        assert!(matches!(
            ast.validate(),
            Err(ValidationError::UnexpectedChild { child_kind: "end", .. })
        ));

        let mut ast = Ast::new();
        let line = ast.lines()[0];
        let frac = ast.create(NodeKind::MathFraction);
        ast.insert(line, 0, frac).unwrap();
        assert!(matches!(
            ast.validate(),
            Err(ValidationError::Arity { found: 0, .. })
        ));
    }

    #[test]
    fn test_failed_fragment_insert_releases_nodes() {
        let mut ast = Ast::from_text("ab");
        let line = ast.lines()[0];
        let count = ast.node_count();

        let fraction = Fragment::math(MathKind::Fraction, "12", "3");
        let err = ast.insert_fragment(line, 9, &fraction).unwrap_err();
        assert_eq!(err, TreeError::IndexOutOfBounds { index: 9, len: 3 });
        assert_eq!(ast.node_count(), count);

        let b = ast.get_child(line, 1).unwrap();
        let id = ast.insert_fragment_before(b, &fraction).unwrap();
        assert_eq!(ast.get_index(id), Some(1));
        assert_eq!(ast.node_count(), count + fraction.node_count());
        assert!(ast.validate().is_ok());
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut ast = Ast::from_text("ab");
        let before = ast.revision();
        let line = ast.lines()[0];
        ast.set_indentation(line, 1).unwrap();
        assert!(ast.revision() > before);

        let before = ast.revision();
        let _ = ast.snapshot(line);
        let _ = ast.position_of(line);
        assert_eq!(ast.revision(), before);
    }

    #[test]
    fn test_descendants_are_preorder() {
        let ast = Ast::from_text("a\nb");
        let kinds: Vec<&str> = ast
            .descendants(ast.root())
            .filter_map(|id| ast.kind(id))
            .map(NodeKind::name)
            .collect();
        assert_eq!(
            kinds,
            vec!["root", "line", "char", "eol", "line", "char", "eol"]
        );
    }
}
