use super::undo::UndoRecord;
use super::{CommandError, FormatCommand, MAX_INDENTATION};
use crate::document::Document;
use crate::iter::next_slot;
use crate::node::{CharData, NodeId};

pub(super) fn run(document: &mut Document, command: &FormatCommand) -> Result<UndoRecord, CommandError> {
    match command {
        FormatCommand::AddTag { tag } => update_chars(document, |data| {
            data.tags.insert(*tag);
        }),
        FormatCommand::RemoveTag { tag } => update_chars(document, |data| {
            data.tags.remove(tag);
        }),
        FormatCommand::SetLink { target } => update_chars(document, |data| {
            data.link = target.clone();
        }),
        FormatCommand::SetIndentationLevel { level } => set_indentation(document, *level),
        FormatCommand::SetTitle { title } => Ok(UndoRecord::Title {
            before: std::mem::replace(&mut document.title, title.clone()),
        }),
    }
}

/// Characters between the selection ends, including those inside math constructs.
fn selected_chars(document: &Document) -> Vec<NodeId> {
    let ast = &document.ast;
    let last = document.cursor.get_last_node(ast);
    let mut chars = Vec::new();
    let mut current = Some(document.cursor.get_first_node(ast));
    while let Some(node) = current
        && node != last
    {
        if ast.char_data(node).is_some() {
            chars.push(node);
        }
        current = next_slot(ast, node);
    }
    chars
}

fn update_chars(
    document: &mut Document,
    mut update: impl FnMut(&mut CharData),
) -> Result<UndoRecord, CommandError> {
    let chars = selected_chars(document);
    let mut before = Vec::with_capacity(chars.len());
    for id in &chars {
        let position = document
            .ast
            .position_of(*id)
            .ok_or(CommandError::DetachedCursor)?;
        if let Some(data) = document.ast.char_data(*id) {
            before.push((position, data.tags.clone(), data.link.clone()));
        }
    }

    for id in chars {
        if let Some(data) = document.ast.char_data_mut(id) {
            update(data);
        }
    }
    Ok(UndoRecord::Chars { before })
}

fn set_indentation(document: &mut Document, level: u8) -> Result<UndoRecord, CommandError> {
    if level > MAX_INDENTATION {
        return Err(CommandError::IndentationOutOfRange {
            level,
            max: MAX_INDENTATION,
        });
    }

    let ast = &document.ast;
    let first = ast
        .line_index(document.cursor.get_first_node(ast))
        .ok_or(CommandError::DetachedCursor)?;
    let last = ast
        .line_index(document.cursor.get_last_node(ast))
        .ok_or(CommandError::DetachedCursor)?;

    let mut before = Vec::with_capacity(last - first + 1);
    for index in first..=last {
        let line = document.ast.lines()[index];
        before.push((index, document.ast.set_indentation(line, level)?));
    }
    Ok(UndoRecord::Indentation { before })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Tag;
    use crate::position::Position;

    fn select_all(document: &mut Document) {
        let ast = &document.ast;
        let first = crate::iter::first_slot(ast).unwrap();
        let last = crate::iter::last_slot(ast).unwrap();
        document.cursor.set_node(last);
        document.cursor.set_selection_node(first);
    }

    #[test]
    fn test_add_tag_and_revert() {
        let mut document = Document::from_text("ab\nc");
        select_all(&mut document);
        let record = run(&mut document, &FormatCommand::AddTag { tag: Tag::Bold }).unwrap();

        let c = document.ast.node_at(&Position::new(vec![1, 0])).unwrap();
        assert!(document.ast.char_data(c).unwrap().tags.contains(&Tag::Bold));

        record.revert(&mut document).unwrap();
        assert!(document.ast.char_data(c).unwrap().tags.is_empty());
    }

    #[test]
    fn test_set_link_only_touches_selection() {
        let mut document = Document::from_text("abc");
        let line = document.ast.lines()[0];
        let b = document.ast.get_child(line, 1).unwrap();
        let c = document.ast.get_child(line, 2).unwrap();
        document.cursor.set_node(c);
        document.cursor.set_selection_node(b);

        run(
            &mut document,
            &FormatCommand::SetLink {
                target: Some("https://a.org".to_string()),
            },
        )
        .unwrap();
        let links = crate::links::links(&document.ast);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text, "b");
    }

    #[test]
    fn test_indentation_range_is_checked() {
        let mut document = Document::from_text("a");
        assert_eq!(
            run(
                &mut document,
                &FormatCommand::SetIndentationLevel { level: 99 }
            )
            .unwrap_err(),
            CommandError::IndentationOutOfRange {
                level: 99,
                max: MAX_INDENTATION
            }
        );

        let record = run(&mut document, &FormatCommand::SetIndentationLevel { level: 2 }).unwrap();
        let line = document.ast.lines()[0];
        assert_eq!(document.ast.indentation(line), Some(2));
        record.revert(&mut document).unwrap();
        assert_eq!(document.ast.indentation(line), Some(0));
    }

    #[test]
    fn test_set_title() {
        let mut document = Document::new();
        let record = run(
            &mut document,
            &FormatCommand::SetTitle {
                title: "Notes".to_string(),
            },
        )
        .unwrap();
        assert_eq!(document.title(), "Notes");
        record.revert(&mut document).unwrap();
        assert_eq!(document.title(), "");
    }
}
