use super::undo::UndoRecord;
use super::{CommandError, CursorCommand, Motion};
use crate::ast::Ast;
use crate::document::Document;
use crate::iter::{first_slot, is_slot, last_slot, next_slot, prev_slot};
use crate::layout::Layouter;
use crate::node::{NodeId, NodeKind, TagSet};

pub(super) fn run(
    document: &mut Document,
    layouter: &Layouter,
    command: &CursorCommand,
) -> Result<UndoRecord, CommandError> {
    let record = UndoRecord::cursor(document)?;
    match command {
        CursorCommand::Move { motion, select } => {
            if motion.is_vertical() {
                move_vertically(document, layouter, *motion, *select);
            } else {
                move_horizontally(document, *motion, *select);
                document.cursor.set_implicit_x(None);
            }
        }
        CursorCommand::SetPosition { position, select } => {
            let node = document
                .ast
                .node_at(position)
                .filter(|node| is_slot(&document.ast, *node))
                .ok_or_else(|| CommandError::InvalidPosition(position.clone()))?;
            place(document, node, *select);
            document.cursor.set_implicit_x(None);
        }
        CursorCommand::ClickAt { x, y, select } => {
            if let Some(node) = layouter.get_cursor_holding_layout_close_to_xy(*x, *y) {
                place(document, node, *select);
            }
            document.cursor.set_implicit_x(None);
        }
        CursorCommand::SelectAll => {
            let ast = &document.ast;
            if let (Some(first), Some(last)) = (first_slot(ast), last_slot(ast)) {
                document.cursor.set_node(last);
                document.cursor.set_selection_node(first);
            }
            document.cursor.set_implicit_x(None);
        }
    }
    Ok(record)
}

fn place(document: &mut Document, node: NodeId, select: bool) {
    if select {
        document.cursor.set_insert_node(node);
    } else {
        document.cursor.set_node(node);
    }
}

fn move_horizontally(document: &mut Document, motion: Motion, select: bool) {
    let ast = &document.ast;
    let current = document.cursor.get_node();

    // Without shift, an arrow key first collapses the selection to the side it points at.
    if !select && document.cursor.has_selection() {
        let collapsed = match motion {
            Motion::Left => Some(document.cursor.get_first_node(ast)),
            Motion::Right => Some(document.cursor.get_last_node(ast)),
            _ => None,
        };
        if let Some(node) = collapsed {
            document.cursor.set_node(node);
            return;
        }
    }

    let target = match motion {
        Motion::Left => prev_slot(ast, current),
        Motion::Right => next_slot(ast, current),
        Motion::LineStart => ast.get_line(current).and_then(|line| ast.first_child(line)),
        Motion::LineEnd => ast.get_line(current).and_then(|line| ast.last_child(line)),
        Motion::DocumentStart => first_slot(ast),
        Motion::DocumentEnd => last_slot(ast),
        Motion::WordLeft => word_left(ast, current),
        Motion::WordRight => word_right(ast, current),
        Motion::Up | Motion::Down | Motion::PageUp | Motion::PageDown => None,
    };
    if let Some(node) = target {
        place(document, node, select);
    }
}

fn move_vertically(document: &mut Document, layouter: &Layouter, motion: Motion, select: bool) {
    let current = document.cursor.get_node();
    let (Some(line), Some(slot_x)) = (
        layouter.line_index_of_node(current),
        layouter.slot_x(current),
    ) else {
        return;
    };
    let x = document.cursor.implicit_x().unwrap_or(slot_x);
    document.cursor.set_implicit_x(Some(x));

    let target = match motion {
        Motion::Up => line.checked_sub(1),
        Motion::Down => Some(line + 1).filter(|next| *next < layouter.physical_lines().len()),
        Motion::PageUp | Motion::PageDown => {
            let page = layouter.config().page_height;
            layouter
                .box_for_node(current)
                .and_then(|id| layouter.get_absolute_rect(id))
                .and_then(|rect| {
                    let y = if motion == Motion::PageUp {
                        rect.center_y() - page
                    } else {
                        rect.center_y() + page
                    };
                    layouter.line_at_y(y)
                })
        }
        _ => None,
    };

    if let Some(node) = target.and_then(|index| layouter.closest_slot_in_line(index, x)) {
        place(document, node, select);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordClass<'a> {
    Whitespace,
    Word(&'a TagSet),
    Other,
}

fn word_class(ast: &Ast, node: NodeId) -> WordClass<'_> {
    match ast.kind(node) {
        Some(NodeKind::Char(data)) if data.is_whitespace() => WordClass::Whitespace,
        Some(NodeKind::Char(data)) => WordClass::Word(&data.tags),
        _ => WordClass::Other,
    }
}

/// Start of the next word. Words end at whitespace, at a style change and around non-text nodes.
fn word_right(ast: &Ast, node: NodeId) -> Option<NodeId> {
    let kind = ast.kind(node)?;
    if kind.is_eol() || kind.is_end() {
        return next_slot(ast, node);
    }

    let start = word_class(ast, node);
    let mut current = ast.next_sibling(node)?;
    if matches!(start, WordClass::Word(_)) {
        while word_class(ast, current) == start {
            current = ast.next_sibling(current)?;
        }
    }
    while word_class(ast, current) == WordClass::Whitespace {
        current = ast.next_sibling(current)?;
    }
    Some(current)
}

/// Start of the word before the cursor.
fn word_left(ast: &Ast, node: NodeId) -> Option<NodeId> {
    let Some(mut current) = ast.prev_sibling(node) else {
        return prev_slot(ast, node);
    };
    while word_class(ast, current) == WordClass::Whitespace {
        match ast.prev_sibling(current) {
            Some(prev) => current = prev,
            None => return Some(current),
        }
    }

    let class = word_class(ast, current);
    if matches!(class, WordClass::Word(_)) {
        while let Some(prev) = ast.prev_sibling(current)
            && word_class(ast, prev) == class
        {
            current = prev;
        }
    }
    Some(current)
}
