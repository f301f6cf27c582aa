//! Insertion point and selection.

use crate::ast::{Ast, TreeError};
use crate::iter::is_slot;
use crate::node::NodeId;
use crate::position::Position;

/// Insertion point plus selection bound, both addressed as cursor slots.
///
/// The selection is empty when both ends name the same node. Ordering of the two ends is always
/// decided by comparing their [`Position`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    insert: NodeId,
    selection: NodeId,
    implicit_x: Option<f32>,
}

/// Serializable cursor snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CursorState {
    /// Insertion point.
    pub insert: Position,
    /// Selection bound (equal to `insert` when nothing is selected).
    pub selection: Position,
}

impl CursorState {
    /// Collapsed state at `position`.
    pub fn collapsed(position: Position) -> Self {
        Self {
            insert: position.clone(),
            selection: position,
        }
    }

    /// The two ends in document order.
    pub fn ordered(&self) -> (&Position, &Position) {
        if self.insert <= self.selection {
            (&self.insert, &self.selection)
        } else {
            (&self.selection, &self.insert)
        }
    }

    /// Whether the ends differ.
    pub fn has_selection(&self) -> bool {
        self.insert != self.selection
    }
}

impl Cursor {
    /// Collapsed cursor before `node`.
    pub fn new(node: NodeId) -> Self {
        Self {
            insert: node,
            selection: node,
            implicit_x: None,
        }
    }

    /// Insertion node.
    pub fn get_node(&self) -> NodeId {
        self.insert
    }

    /// Move the insertion point to `node` and collapse the selection onto it.
    pub fn set_node(&mut self, node: NodeId) {
        self.insert = node;
        self.selection = node;
    }

    /// Move only the insertion point, extending (or shrinking) the selection.
    pub fn set_insert_node(&mut self, node: NodeId) {
        self.insert = node;
    }

    /// Selection bound.
    pub fn get_selection_node(&self) -> NodeId {
        self.selection
    }

    /// Move only the selection bound.
    pub fn set_selection_node(&mut self, node: NodeId) {
        self.selection = node;
    }

    /// Whether the insertion point and the selection bound differ.
    pub fn has_selection(&self) -> bool {
        self.insert != self.selection
    }

    /// Sticky horizontal coordinate for vertical motion.
    pub fn implicit_x(&self) -> Option<f32> {
        self.implicit_x
    }

    /// Set or clear the sticky horizontal coordinate.
    pub fn set_implicit_x(&mut self, x: Option<f32>) {
        self.implicit_x = x;
    }

    /// Position of the insertion point.
    pub fn get_position(&self, ast: &Ast) -> Option<Position> {
        ast.position_of(self.insert)
    }

    /// Collapse the cursor onto the slot at `position`.
    pub fn set_position(&mut self, ast: &Ast, position: &Position) -> Result<(), TreeError> {
        let node = resolve_slot(ast, position)?;
        self.set_node(node);
        Ok(())
    }

    /// Both ends as positions.
    pub fn get_state(&self, ast: &Ast) -> Option<CursorState> {
        Some(CursorState {
            insert: ast.position_of(self.insert)?,
            selection: ast.position_of(self.selection)?,
        })
    }

    /// Restore both ends from positions.
    pub fn set_state(&mut self, ast: &Ast, state: &CursorState) -> Result<(), TreeError> {
        let insert = resolve_slot(ast, &state.insert)?;
        let selection = resolve_slot(ast, &state.selection)?;
        self.insert = insert;
        self.selection = selection;
        Ok(())
    }

    /// The selection end that comes first in document order.
    pub fn get_first_node(&self, ast: &Ast) -> NodeId {
        self.ordered(ast).0
    }

    /// The selection end that comes last in document order.
    pub fn get_last_node(&self, ast: &Ast) -> NodeId {
        self.ordered(ast).1
    }

    fn ordered(&self, ast: &Ast) -> (NodeId, NodeId) {
        match (ast.position_of(self.insert), ast.position_of(self.selection)) {
            (Some(insert), Some(selection)) if selection < insert => (self.selection, self.insert),
            _ => (self.insert, self.selection),
        }
    }
}

fn resolve_slot(ast: &Ast, position: &Position) -> Result<NodeId, TreeError> {
    ast.node_at(position)
        .filter(|node| is_slot(ast, *node))
        .ok_or_else(|| TreeError::InvalidPosition(position.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_tracks_both_ends() {
        let ast = Ast::from_text("abc");
        let line = ast.lines()[0];
        let a = ast.get_child(line, 0).unwrap();
        let c = ast.get_child(line, 2).unwrap();

        let mut cursor = Cursor::new(c);
        assert!(!cursor.has_selection());
        cursor.set_selection_node(a);
        assert!(cursor.has_selection());
        assert_eq!(cursor.get_first_node(&ast), a);
        assert_eq!(cursor.get_last_node(&ast), c);
        assert_eq!(cursor.get_node(), c);
    }

    #[test]
    fn test_state_round_trip() {
        let ast = Ast::from_text("ab\ncd");
        let mut cursor = Cursor::new(ast.lines()[1]);
        let state = CursorState {
            insert: Position::new(vec![0, 1]),
            selection: Position::new(vec![1, 2]),
        };
        cursor.set_state(&ast, &state).unwrap();
        assert_eq!(cursor.get_state(&ast), Some(state.clone()));
        assert_eq!(
            state.ordered(),
            (&Position::new(vec![0, 1]), &Position::new(vec![1, 2]))
        );
    }

    #[test]
    fn test_invalid_positions_are_rejected() {
        let ast = Ast::from_text("ab");
        let mut cursor = Cursor::new(ast.lines()[0]);
        // Out of range.
        assert!(cursor.set_position(&ast, &Position::new(vec![0, 7])).is_err());
        // A line is not a cursor slot.
        assert!(cursor.set_position(&ast, &Position::new(vec![0])).is_err());
        assert!(cursor.set_position(&ast, &Position::new(vec![0, 2])).is_ok());
        assert_eq!(cursor.get_position(&ast), Some(Position::new(vec![0, 2])));
    }
}
