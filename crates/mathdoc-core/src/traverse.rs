//! Read-only traversal.
//!
//! Consumers implement the subset of [`Visitor`] they care about and hand it to [`walk`].

use crate::ast::Ast;
use crate::node::{CharData, NodeId, NodeKind};

/// Callbacks invoked by [`walk`]. Every method defaults to a no-op.
pub trait Visitor {
    /// Called once for the root, before any line.
    fn visit_lines(&mut self, _ast: &Ast, _root: NodeId) {}

    /// Called for each line, before its children.
    fn visit_line(&mut self, _ast: &Ast, _line: NodeId, _indentation: u8) {}

    /// Called for each character, including characters inside math lists.
    fn visit_char(&mut self, _ast: &Ast, _id: NodeId, _data: &CharData) {}

    /// Called for each end-of-line sentinel.
    fn visit_eol(&mut self, _ast: &Ast, _id: NodeId) {}

    /// Called for every other node (placeholders, widgets, math constructs, lists and `End`).
    fn visit_node(&mut self, _ast: &Ast, _id: NodeId, _kind: &NodeKind) {}
}

/// Visit every attached node in document (pre-order, left-to-right) order.
pub fn walk<V: Visitor + ?Sized>(ast: &Ast, visitor: &mut V) {
    for id in ast.descendants(ast.root()) {
        let Some(kind) = ast.kind(id) else {
            continue;
        };
        match kind {
            NodeKind::Root => visitor.visit_lines(ast, id),
            NodeKind::Line { indentation } => visitor.visit_line(ast, id, *indentation),
            NodeKind::Char(data) => visitor.visit_char(ast, id, data),
            NodeKind::Eol => visitor.visit_eol(ast, id),
            NodeKind::Placeholder
            | NodeKind::Widget(_)
            | NodeKind::MathScript
            | NodeKind::MathFraction
            | NodeKind::MathRoot
            | NodeKind::MathList
            | NodeKind::End => visitor.visit_node(ast, id, kind),
        }
    }
}

#[derive(Default)]
struct PlainText {
    text: String,
    lines: usize,
}

impl Visitor for PlainText {
    fn visit_line(&mut self, _ast: &Ast, _line: NodeId, _indentation: u8) {
        if self.lines > 0 {
            self.text.push('\n');
        }
        self.lines += 1;
    }

    fn visit_char(&mut self, _ast: &Ast, _id: NodeId, data: &CharData) {
        self.text.push_str(data.content());
    }
}

/// Character content of the document, lines joined with `\n`.
pub fn plain_text(ast: &Ast) -> String {
    let mut visitor = PlainText::default();
    walk(ast, &mut visitor);
    visitor.text
}
