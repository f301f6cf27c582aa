use super::undo::LineSpan;
use super::{CommandError, EditCommand, Outcome};
use crate::ast::{Ast, TreeError};
use crate::document::Document;
use crate::links::{find_urls, link_target};
use crate::node::{CharData, Fragment, MathKind, NodeId, NodeKind, TagSet, WidgetData};
use unicode_segmentation::UnicodeSegmentation;

pub(super) fn run(document: &mut Document, command: &EditCommand) -> Result<Outcome, CommandError> {
    match command {
        EditCommand::InsertText { text } => {
            let span = LineSpan::capture(document)?;
            insert_text(document, text)?;
            Ok(Outcome::checkpoint(span.finish(document)))
        }
        EditCommand::Return => {
            let span = LineSpan::capture(document)?;
            insert_text(document, "\n")?;
            Ok(Outcome::checkpoint(span.finish(document)))
        }
        EditCommand::DeleteText => {
            let span = LineSpan::capture(document)?;
            delete_forward(document)?;
            Ok(Outcome::checkpoint(span.finish(document)))
        }
        EditCommand::Backspace => {
            let span = LineSpan::capture(document)?;
            if backspace(document)? {
                Ok(Outcome::checkpoint(span.finish(document)))
            } else {
                Ok(Outcome::noop())
            }
        }
        EditCommand::Delete => {
            let span = LineSpan::capture(document)?;
            if delete_forward(document)? {
                Ok(Outcome::checkpoint(span.finish(document)))
            } else {
                Ok(Outcome::noop())
            }
        }
        EditCommand::InsertMath { kind } => {
            reject_in_math(document, NodeKind::math(*kind).name())?;
            let span = LineSpan::capture(document)?;
            insert_math(document, *kind)?;
            Ok(Outcome::checkpoint(span.finish(document)))
        }
        EditCommand::InsertWidget { widget } => {
            reject_in_math(document, "widget")?;
            let span = LineSpan::capture(document)?;
            insert_widget(document, widget)?;
            Ok(Outcome::checkpoint(span.finish(document)))
        }
        EditCommand::InsertFragments { fragments } => {
            let lines = check_fragments(document, fragments)?;
            let span = LineSpan::capture(document)?;
            insert_fragments(document, fragments, lines)?;
            Ok(Outcome::checkpoint(span.finish(document)))
        }
    }
}

/// Container the next insertion lands in, once the selection is gone.
fn insertion_container(document: &Document) -> Result<NodeId, CommandError> {
    let ast = &document.ast;
    let first = document.cursor.get_first_node(ast);
    let last = document.cursor.get_last_node(ast);
    let container = ast.parent(first).ok_or(CommandError::DetachedCursor)?;
    if first == last || ast.parent(last) == Some(container) {
        return Ok(container);
    }
    ast.get_line(first).ok_or(CommandError::DetachedCursor)
}

fn in_math(document: &Document) -> Result<bool, CommandError> {
    let container = insertion_container(document)?;
    Ok(document
        .ast
        .kind(container)
        .is_some_and(NodeKind::is_math_list))
}

fn reject_in_math(document: &Document, kind: &'static str) -> Result<(), CommandError> {
    if in_math(document)? {
        return Err(CommandError::NotAllowedInMath { kind });
    }
    Ok(())
}

/// Validates pasted fragments; returns whether they are whole lines.
fn check_fragments(document: &Document, fragments: &[Fragment]) -> Result<bool, CommandError> {
    let in_math = in_math(document)?;
    let lines = !fragments.is_empty() && fragments.iter().all(|f| f.kind.is_line());
    for fragment in fragments {
        let fits = if lines {
            !in_math
        } else if in_math {
            fragment.kind.allowed_in_math_list() && !fragment.kind.is_end()
        } else {
            fragment.kind.allowed_in_line() && !fragment.kind.is_eol()
        };
        if !fits || !fragment.is_well_formed() {
            return Err(CommandError::InvalidFragment {
                kind: fragment.kind.name(),
            });
        }
    }
    Ok(lines)
}

fn is_newline(grapheme: &str) -> bool {
    matches!(grapheme, "\n" | "\r\n" | "\r")
}

fn inherited_attributes(ast: &Ast, anchor: NodeId) -> (TagSet, Option<String>) {
    ast.prev_sibling(anchor)
        .and_then(|prev| ast.char_data(prev))
        .map(|data| (data.tags.clone(), data.link.clone()))
        .unwrap_or_default()
}

fn insert_text(document: &mut Document, text: &str) -> Result<(), CommandError> {
    delete_selection(document)?;
    let anchor = document.cursor.get_node();
    let ast = &mut document.ast;
    let math = ast
        .parent(anchor)
        .and_then(|parent| ast.kind(parent))
        .is_some_and(NodeKind::is_math_list);
    let (tags, link) = inherited_attributes(ast, anchor);

    let mut inserted = Vec::new();
    for (offset, grapheme) in text.grapheme_indices(true) {
        if is_newline(grapheme) {
            if !math {
                let line = ast.get_line(anchor).ok_or(TreeError::Detached(anchor))?;
                ast.split(line, anchor)?;
            }
            continue;
        }
        let data = CharData::new(grapheme)
            .with_tags(tags.clone())
            .with_link(link.clone());
        let id = ast.insert_fragment_before(anchor, &Fragment::leaf(NodeKind::Char(data)))?;
        inserted.push((offset, id));
    }

    for range in find_urls(text) {
        let target = link_target(&text[range.clone()]);
        for (offset, id) in &inserted {
            if range.contains(offset)
                && let Some(data) = ast.char_data_mut(*id)
            {
                data.link = Some(target.clone());
            }
        }
    }

    document.cursor.set_node(anchor);
    Ok(())
}

fn insert_math(document: &mut Document, kind: MathKind) -> Result<(), CommandError> {
    delete_selection(document)?;
    let anchor = document.cursor.get_node();
    let ast = &mut document.ast;
    let construct = ast.insert_fragment_before(anchor, &Fragment::math(kind, "", ""))?;
    let entry = ast
        .first_child(construct)
        .and_then(|list| ast.first_child(list))
        .ok_or(TreeError::UnknownNode(construct))?;
    document.cursor.set_node(entry);
    Ok(())
}

fn insert_widget(document: &mut Document, widget: &WidgetData) -> Result<(), CommandError> {
    delete_selection(document)?;
    let anchor = document.cursor.get_node();
    document
        .ast
        .insert_fragment_before(anchor, &Fragment::leaf(NodeKind::Widget(widget.clone())))?;
    document.cursor.set_node(anchor);
    Ok(())
}

fn insert_fragments(
    document: &mut Document,
    fragments: &[Fragment],
    lines: bool,
) -> Result<(), CommandError> {
    delete_selection(document)?;
    let anchor = document.cursor.get_node();
    let ast = &mut document.ast;

    if !lines {
        for fragment in fragments {
            ast.insert_fragment_before(anchor, fragment)?;
        }
    } else {
        // Each pasted line ends with a line break; text after the cursor follows the last one.
        for fragment in fragments {
            let content = fragment
                .children
                .iter()
                .filter(|child| !child.kind.is_eol());
            for child in content {
                ast.insert_fragment_before(anchor, child)?;
            }
            let line = ast.get_line(anchor).ok_or(TreeError::Detached(anchor))?;
            ast.split(line, anchor)?;
        }
    }

    document.cursor.set_node(anchor);
    Ok(())
}

/// Child of the enclosing line that contains `node`.
fn lift(ast: &Ast, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(parent) = ast.parent(current) {
        if ast.kind(parent).is_none_or(NodeKind::is_line) {
            break;
        }
        current = parent;
    }
    current
}

/// Like [`lift`], but a node nested in a construct resolves to the slot after the construct.
fn lift_end(ast: &Ast, node: NodeId) -> Result<NodeId, TreeError> {
    let lifted = lift(ast, node);
    if lifted == node {
        return Ok(node);
    }
    ast.next_sibling(lifted).ok_or(TreeError::Detached(lifted))
}

/// Remove the siblings from `from` up to (excluding) `to`.
fn remove_siblings(ast: &mut Ast, from: NodeId, to: NodeId) -> Result<(), TreeError> {
    let mut current = from;
    while current != to {
        let next = ast.next_sibling(current).ok_or(TreeError::Detached(to))?;
        ast.remove(current)?;
        current = next;
    }
    Ok(())
}

/// Remove the selected range and collapse the cursor onto the slot after it.
fn delete_selection(document: &mut Document) -> Result<bool, CommandError> {
    if !document.cursor.has_selection() {
        return Ok(false);
    }
    let ast = &mut document.ast;
    let first = document.cursor.get_first_node(ast);
    let last = document.cursor.get_last_node(ast);

    let container = ast.parent(first).ok_or(CommandError::DetachedCursor)?;
    if ast.parent(last) == Some(container) {
        remove_siblings(ast, first, last)?;
        document.cursor.set_node(last);
        return Ok(true);
    }

    let line_a = ast.get_line(first).ok_or(CommandError::DetachedCursor)?;
    let line_b = ast.get_line(last).ok_or(CommandError::DetachedCursor)?;
    let start = lift(ast, first);
    let end = lift_end(ast, last)?;

    if line_a == line_b {
        remove_siblings(ast, start, end)?;
    } else {
        let eol = ast.last_child(line_a).ok_or(TreeError::UnknownNode(line_a))?;
        remove_siblings(ast, start, eol)?;
        while let Some(between) = ast.next_sibling(line_a)
            && between != line_b
        {
            ast.remove(between)?;
        }
        let head = ast.first_child(line_b).ok_or(TreeError::UnknownNode(line_b))?;
        remove_siblings(ast, head, end)?;
        ast.merge(line_a, line_b)?;
    }

    document.cursor.set_node(end);
    Ok(true)
}

/// Remove the construct owning `list` when all of its branches are empty.
fn remove_empty_construct(document: &mut Document, list: NodeId) -> Result<bool, CommandError> {
    let ast = &mut document.ast;
    let construct = ast.parent(list).ok_or(TreeError::Detached(list))?;
    let empty = ast
        .children(construct)
        .iter()
        .all(|branch| ast.length(*branch) == 1);
    if !empty {
        return Ok(false);
    }

    let next = ast
        .next_sibling(construct)
        .ok_or(TreeError::Detached(construct))?;
    ast.remove(construct)?;
    document.cursor.set_node(next);
    Ok(true)
}

fn backspace(document: &mut Document) -> Result<bool, CommandError> {
    if delete_selection(document)? {
        return Ok(true);
    }
    let node = document.cursor.get_node();
    let ast = &mut document.ast;

    if let Some(prev) = ast.prev_sibling(node) {
        ast.remove(prev)?;
        return Ok(true);
    }

    let container = ast.parent(node).ok_or(CommandError::DetachedCursor)?;
    if ast.kind(container).is_some_and(NodeKind::is_math_list) {
        return remove_empty_construct(document, container);
    }
    match ast.prev_sibling(container) {
        Some(prev_line) => {
            ast.merge(prev_line, container)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn delete_forward(document: &mut Document) -> Result<bool, CommandError> {
    if delete_selection(document)? {
        return Ok(true);
    }
    let node = document.cursor.get_node();
    let ast = &mut document.ast;
    let container = ast.parent(node).ok_or(CommandError::DetachedCursor)?;

    let (is_eol, is_end) = match ast.kind(node) {
        Some(kind) => (kind.is_eol(), kind.is_end()),
        None => return Err(CommandError::DetachedCursor),
    };

    if is_eol {
        let Some(next_line) = ast.next_sibling(container) else {
            return Ok(false);
        };
        let head = ast
            .first_child(next_line)
            .ok_or(TreeError::UnknownNode(next_line))?;
        ast.merge(container, next_line)?;
        document.cursor.set_node(head);
        return Ok(true);
    }
    if is_end {
        return remove_empty_construct(document, container);
    }

    let next = ast.next_sibling(node).ok_or(TreeError::Detached(node))?;
    ast.remove(node)?;
    document.cursor.set_node(next);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::traverse::plain_text;

    fn document(text: &str, position: &[usize]) -> Document {
        let mut document = Document::from_text(text);
        document
            .cursor
            .set_position(&document.ast, &Position::new(position.to_vec()))
            .unwrap();
        document
    }

    fn select(document: &mut Document, from: &[usize], to: &[usize]) {
        let ast = &document.ast;
        let from = ast.node_at(&Position::new(from.to_vec())).unwrap();
        let to = ast.node_at(&Position::new(to.to_vec())).unwrap();
        document.cursor.set_node(to);
        document.cursor.set_selection_node(from);
    }

    #[test]
    fn test_insert_text_splits_lines() {
        let mut doc = Document::new();
        insert_text(&mut doc, "ab\ncd").unwrap();
        assert_eq!(plain_text(&doc.ast), "ab\ncd");
        assert_eq!(
            doc.cursor.get_position(&doc.ast),
            Some(Position::new(vec![1, 2]))
        );
        assert!(doc.ast.validate().is_ok());
    }

    #[test]
    fn test_insert_text_inherits_attributes() {
        let mut doc = document("ab", &[0, 1]);
        let a = doc.ast.node_at(&Position::new(vec![0, 0])).unwrap();
        doc.ast
            .char_data_mut(a)
            .unwrap()
            .tags
            .insert(crate::node::Tag::Bold);
        insert_text(&mut doc, "x").unwrap();
        let x = doc.ast.node_at(&Position::new(vec![0, 1])).unwrap();
        assert!(doc.ast.char_data(x).unwrap().tags.contains(&crate::node::Tag::Bold));
    }

    #[test]
    fn test_insert_text_autolinks_urls() {
        let mut doc = Document::new();
        insert_text(&mut doc, "go www.a.org now").unwrap();
        let links = crate::links::links(&doc.ast);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text, "www.a.org");
        assert_eq!(links[0].target, "http://www.a.org");
    }

    #[test]
    fn test_newlines_are_dropped_in_math() {
        let mut doc = Document::new();
        insert_math(&mut doc, MathKind::Fraction).unwrap();
        insert_text(&mut doc, "1\n2").unwrap();
        assert_eq!(doc.ast.lines().len(), 1);
        assert_eq!(plain_text(&doc.ast), "12");
    }

    #[test]
    fn test_delete_selection_within_line() {
        let mut doc = Document::from_text("abcdef");
        select(&mut doc, &[0, 1], &[0, 4]);
        assert!(delete_selection(&mut doc).unwrap());
        assert_eq!(plain_text(&doc.ast), "aef");
        assert_eq!(
            doc.cursor.get_position(&doc.ast),
            Some(Position::new(vec![0, 1]))
        );
    }

    #[test]
    fn test_delete_selection_across_lines() {
        let mut doc = Document::from_text("abc\nmid\ndef");
        select(&mut doc, &[0, 1], &[2, 2]);
        assert!(delete_selection(&mut doc).unwrap());
        assert_eq!(plain_text(&doc.ast), "af");
        assert!(doc.ast.validate().is_ok());
        assert_eq!(
            doc.cursor.get_position(&doc.ast),
            Some(Position::new(vec![0, 1]))
        );
    }

    #[test]
    fn test_delete_selection_out_of_construct_takes_it_whole() {
        let mut doc = document("ab", &[0, 1]);
        insert_math(&mut doc, MathKind::Script).unwrap();
        insert_text(&mut doc, "2").unwrap();
        // From inside the subscript to the trailing `b`.
        select(&mut doc, &[0, 1, 0, 0], &[0, 2]);
        assert!(delete_selection(&mut doc).unwrap());
        assert_eq!(plain_text(&doc.ast), "ab");
        assert_eq!(doc.ast.length(doc.ast.lines()[0]), 3);
    }

    #[test]
    fn test_backspace_at_document_start_is_noop() {
        let mut doc = document("ab", &[0, 0]);
        assert!(!backspace(&mut doc).unwrap());
        assert_eq!(plain_text(&doc.ast), "ab");
    }

    #[test]
    fn test_backspace_merges_lines() {
        let mut doc = document("ab\ncd", &[1, 0]);
        assert!(backspace(&mut doc).unwrap());
        assert_eq!(plain_text(&doc.ast), "abcd");
        assert_eq!(
            doc.cursor.get_position(&doc.ast),
            Some(Position::new(vec![0, 2]))
        );
    }

    #[test]
    fn test_backspace_removes_empty_construct() {
        let mut doc = document("ab", &[0, 1]);
        insert_math(&mut doc, MathKind::Root).unwrap();
        assert!(backspace(&mut doc).unwrap());
        assert_eq!(doc.ast.length(doc.ast.lines()[0]), 3);
        assert_eq!(
            doc.cursor.get_position(&doc.ast),
            Some(Position::new(vec![0, 1]))
        );
    }

    #[test]
    fn test_backspace_keeps_non_empty_construct() {
        let mut doc = Document::new();
        insert_math(&mut doc, MathKind::Fraction).unwrap();
        insert_text(&mut doc, "1").unwrap();
        // Move to the first slot of the numerator.
        doc.cursor
            .set_position(&doc.ast, &Position::new(vec![0, 0, 0, 0]))
            .unwrap();
        assert!(!backspace(&mut doc).unwrap());
    }

    #[test]
    fn test_delete_joins_with_next_line() {
        let mut doc = document("ab\ncd", &[0, 2]);
        assert!(delete_forward(&mut doc).unwrap());
        assert_eq!(plain_text(&doc.ast), "abcd");
        assert_eq!(
            doc.cursor.get_position(&doc.ast),
            Some(Position::new(vec![0, 2]))
        );

        let mut doc = document("ab", &[0, 2]);
        assert!(!delete_forward(&mut doc).unwrap());
    }

    #[test]
    fn test_reject_math_inside_math() {
        let mut doc = Document::new();
        insert_math(&mut doc, MathKind::Script).unwrap();
        assert_eq!(
            run(
                &mut doc,
                &EditCommand::InsertMath {
                    kind: MathKind::Fraction
                }
            )
            .unwrap_err(),
            CommandError::NotAllowedInMath {
                kind: "mathfraction"
            }
        );
    }

    #[test]
    fn test_paste_lines() {
        let mut doc = document("xy", &[0, 1]);
        let fragments = vec![Fragment::line("ab"), Fragment::line("cd")];
        let lines = check_fragments(&doc, &fragments).unwrap();
        assert!(lines);
        insert_fragments(&mut doc, &fragments, lines).unwrap();
        assert_eq!(plain_text(&doc.ast), "xab\ncd\ny");
        assert!(doc.ast.validate().is_ok());
    }

    #[test]
    fn test_paste_rejects_misplaced_fragments() {
        let doc = Document::new();
        assert!(check_fragments(&doc, &[Fragment::eol()]).is_err());
        assert!(check_fragments(&doc, &[Fragment::char("a"), Fragment::line("b")]).is_err());
        assert_eq!(check_fragments(&doc, &[Fragment::char("a")]), Ok(false));
    }
}
