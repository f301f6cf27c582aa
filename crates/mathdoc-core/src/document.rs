//! A document: tree, cursor and title.

use crate::ast::Ast;
use crate::cursor::Cursor;
use crate::iter::{first_slot, next_slot};
use crate::node::{Fragment, NodeKind};
use crate::traverse;

/// The editable unit owned by a [`CommandExecutor`](crate::CommandExecutor).
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) ast: Ast,
    pub(crate) cursor: Cursor,
    pub(crate) title: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document with one empty line and the cursor on its `Eol`.
    pub fn new() -> Self {
        Self::from_ast(Ast::new())
    }

    /// A document holding `text`, with the cursor at the start.
    pub fn from_text(text: &str) -> Self {
        Self::from_ast(Ast::from_text(text))
    }

    /// Wrap an existing tree, placing the cursor at the document start.
    pub fn from_ast(ast: Ast) -> Self {
        let start = first_slot(&ast).unwrap_or_else(|| ast.root());
        Self {
            ast,
            cursor: Cursor::new(start),
            title: String::new(),
        }
    }

    /// The tree.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// The cursor.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Character content, lines joined with `\n`.
    pub fn plain_text(&self) -> String {
        traverse::plain_text(&self.ast)
    }

    /// Text of the selection (empty when nothing is selected). Line breaks become `\n`.
    pub fn selected_text(&self) -> String {
        let first = self.cursor.get_first_node(&self.ast);
        let last = self.cursor.get_last_node(&self.ast);

        let mut text = String::new();
        let mut current = Some(first);
        while let Some(node) = current
            && node != last
        {
            match self.ast.kind(node) {
                Some(NodeKind::Char(data)) => text.push_str(data.content()),
                Some(NodeKind::Eol) => text.push('\n'),
                _ => {}
            }
            current = next_slot(&self.ast, node);
        }
        text
    }

    /// Owned copies of the selected top-level nodes (the range under the selection's common
    /// container), for copy/paste.
    pub fn selected_fragments(&self) -> Vec<Fragment> {
        let Some(state) = self.cursor.get_state(&self.ast) else {
            return Vec::new();
        };
        let (first, last) = state.ordered();
        self.ast.get_subtree(first, last).unwrap_or_default()
    }
}
