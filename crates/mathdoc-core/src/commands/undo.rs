use super::CommandError;
use crate::ast::Ast;
use crate::cursor::CursorState;
use crate::document::Document;
use crate::node::{Fragment, TagSet};
use crate::position::Position;

/// State captured by a command to revert it.
#[derive(Debug, Clone)]
pub(crate) enum UndoRecord {
    /// Cursor-only change.
    Cursor {
        state: CursorState,
        implicit_x: Option<f32>,
    },
    /// Structural change confined to a contiguous span of lines.
    Lines {
        first: usize,
        saved: Vec<Fragment>,
        after_count: usize,
        cursor: CursorState,
        implicit_x: Option<f32>,
    },
    /// Character attribute change.
    Chars {
        before: Vec<(Position, TagSet, Option<String>)>,
    },
    /// Line indentation change, by line index.
    Indentation { before: Vec<(usize, u8)> },
    /// Title change.
    Title { before: String },
}

impl UndoRecord {
    /// Cursor state of `document` as it is now.
    pub(crate) fn cursor(document: &Document) -> Result<Self, CommandError> {
        Ok(Self::Cursor {
            state: cursor_state(document)?,
            implicit_x: document.cursor.implicit_x(),
        })
    }

    pub(crate) fn revert(&self, document: &mut Document) -> Result<(), CommandError> {
        match self {
            Self::Cursor { state, implicit_x } => {
                document.cursor.set_state(&document.ast, state)?;
                document.cursor.set_implicit_x(*implicit_x);
            }
            Self::Lines {
                first,
                saved,
                after_count,
                cursor,
                implicit_x,
            } => {
                let root = document.ast.root();
                for _ in 0..*after_count {
                    let line = document
                        .ast
                        .get_child(root, *first)
                        .ok_or(CommandError::InvalidPosition(Position::new(vec![*first])))?;
                    document.ast.remove(line)?;
                }
                for (offset, fragment) in saved.iter().enumerate() {
                    document.ast.insert_fragment(root, first + offset, fragment)?;
                }
                document.cursor.set_state(&document.ast, cursor)?;
                document.cursor.set_implicit_x(*implicit_x);
            }
            Self::Chars { before } => {
                for (position, tags, link) in before {
                    let node = document
                        .ast
                        .node_at(position)
                        .ok_or_else(|| CommandError::InvalidPosition(position.clone()))?;
                    if let Some(data) = document.ast.char_data_mut(node) {
                        data.tags = tags.clone();
                        data.link = link.clone();
                    }
                }
            }
            Self::Indentation { before } => {
                for (index, level) in before {
                    let line = document
                        .ast
                        .get_child(document.ast.root(), *index)
                        .ok_or(CommandError::InvalidPosition(Position::new(vec![*index])))?;
                    document.ast.set_indentation(line, *level)?;
                }
            }
            Self::Title { before } => document.title = before.clone(),
        }
        Ok(())
    }
}

pub(crate) fn cursor_state(document: &Document) -> Result<CursorState, CommandError> {
    document
        .cursor
        .get_state(&document.ast)
        .ok_or(CommandError::DetachedCursor)
}

/// Snapshot of the lines a structural edit may touch.
///
/// The span covers the lines under the cursor plus one neighbour on each side, which is enough
/// for merges with the previous or next line. Lines outside the span are never modified.
pub(crate) struct LineSpan {
    first: usize,
    saved: Vec<Fragment>,
    before_total: usize,
    cursor: CursorState,
    implicit_x: Option<f32>,
}

impl LineSpan {
    pub(crate) fn capture(document: &Document) -> Result<Self, CommandError> {
        let ast = &document.ast;
        let first_node = document.cursor.get_first_node(ast);
        let last_node = document.cursor.get_last_node(ast);
        let first_line = ast
            .line_index(first_node)
            .ok_or(CommandError::DetachedCursor)?;
        let last_line = ast
            .line_index(last_node)
            .ok_or(CommandError::DetachedCursor)?;

        let before_total = ast.lines().len();
        let first = first_line.saturating_sub(1);
        let last = (last_line + 1).min(before_total.saturating_sub(1));
        Ok(Self {
            first,
            saved: snapshot_lines(ast, first, last),
            before_total,
            cursor: cursor_state(document)?,
            implicit_x: document.cursor.implicit_x(),
        })
    }

    pub(crate) fn finish(self, document: &Document) -> UndoRecord {
        let after_total = document.ast.lines().len();
        UndoRecord::Lines {
            first: self.first,
            after_count: (self.saved.len() + after_total).saturating_sub(self.before_total),
            saved: self.saved,
            cursor: self.cursor,
            implicit_x: self.implicit_x,
        }
    }
}

fn snapshot_lines(ast: &Ast, first: usize, last: usize) -> Vec<Fragment> {
    ast.lines()
        .get(first..=last)
        .unwrap_or_default()
        .iter()
        .filter_map(|line| ast.snapshot(*line))
        .collect()
}
