use mathdoc_core::{
    Command, CommandExecutor, CursorCommand, Document, EditCommand, FormatCommand, Motion,
    Position, Tag,
};
use pretty_assertions::assert_eq;

fn insert(text: &str) -> Command {
    EditCommand::InsertText {
        text: text.to_string(),
    }
    .into()
}

fn move_cursor(motion: Motion) -> Command {
    CursorCommand::Move {
        motion,
        select: false,
    }
    .into()
}

fn position(executor: &CommandExecutor) -> Vec<usize> {
    let document = executor.document();
    document
        .cursor()
        .get_position(document.ast())
        .unwrap()
        .indices()
        .to_vec()
}

#[test]
fn test_motions_undo_with_preceding_edit() {
    let mut executor = CommandExecutor::new(Document::new());
    executor
        .add_commands(vec![
            insert("hello"),
            move_cursor(Motion::Left),
            move_cursor(Motion::Left),
            insert("X"),
        ])
        .unwrap();
    assert_eq!(executor.document().plain_text(), "helXlo");
    assert_eq!(executor.undo_depth(), 2);

    assert!(executor.undo());
    assert_eq!(executor.document().plain_text(), "hello");
    assert_eq!(position(&executor), vec![0, 3]);
    assert_eq!(executor.undo_depth(), 1);

    assert!(executor.undo());
    assert_eq!(executor.document().plain_text(), "");
    assert_eq!(position(&executor), vec![0, 0]);
    assert!(!executor.undo());

    assert!(executor.redo());
    assert_eq!(executor.document().plain_text(), "hello");
    assert_eq!(position(&executor), vec![0, 3]);
    assert_eq!(executor.redo_depth(), 1);

    assert!(executor.redo());
    assert_eq!(executor.document().plain_text(), "helXlo");
    assert_eq!(position(&executor), vec![0, 4]);
    assert!(!executor.redo());
}

#[test]
fn test_trailing_motions_undo_with_edit() {
    let mut executor = CommandExecutor::new(Document::new());
    executor
        .add_commands(vec![
            insert("ab"),
            move_cursor(Motion::LineStart),
            move_cursor(Motion::Right),
        ])
        .unwrap();
    assert_eq!(position(&executor), vec![0, 1]);

    assert!(executor.undo());
    assert_eq!(executor.document().plain_text(), "");
    assert!(!executor.can_undo());

    assert!(executor.redo());
    assert_eq!(executor.document().plain_text(), "ab");
    assert_eq!(position(&executor), vec![0, 1]);
}

#[test]
fn test_boundary_deletions_add_no_undo_step() {
    let mut executor = CommandExecutor::new(Document::new());
    executor
        .add_commands(vec![
            insert("x"),
            move_cursor(Motion::Left),
            EditCommand::Backspace.into(),
        ])
        .unwrap();
    assert_eq!(executor.document().plain_text(), "x");
    assert_eq!(executor.undo_depth(), 1);

    assert!(executor.undo());
    assert_eq!(executor.document().plain_text(), "");
    assert!(!executor.undo());

    let mut executor = CommandExecutor::new(Document::new());
    executor
        .add_commands(vec![insert("ab"), insert("c")])
        .unwrap();
    assert_eq!(executor.undo_depth(), 2);
    executor.add_command(EditCommand::Delete).unwrap();
    executor.add_command(EditCommand::Delete).unwrap();
    assert_eq!(executor.document().plain_text(), "abc");
    assert_eq!(executor.undo_depth(), 2);

    assert!(executor.undo());
    assert_eq!(executor.document().plain_text(), "ab");
    assert_eq!(position(&executor), vec![0, 2]);
}

#[test]
fn test_new_command_truncates_redo_tail() {
    let mut executor = CommandExecutor::new(Document::new());
    executor.add_commands(vec![insert("a"), insert("b")]).unwrap();
    executor.undo();
    assert!(executor.can_redo());

    executor.add_command(insert("c")).unwrap();
    assert!(!executor.can_redo());
    assert_eq!(executor.log().len(), 2);
    assert_eq!(executor.document().plain_text(), "ac");
}

#[test]
fn test_redo_reproduces_identical_tree() {
    let mut executor = CommandExecutor::new(Document::from_text("one two\nthree"));
    executor
        .add_commands(vec![
            move_cursor(Motion::WordRight),
            CursorCommand::Move {
                motion: Motion::LineEnd,
                select: true,
            }
            .into(),
            FormatCommand::AddTag { tag: Tag::Bold }.into(),
            move_cursor(Motion::DocumentEnd),
            EditCommand::Return.into(),
            FormatCommand::SetIndentationLevel { level: 2 }.into(),
        ])
        .unwrap();

    let ast = executor.document().ast();
    let after = ast.snapshot(ast.root()).unwrap();
    let cursor_after = executor.document().cursor().get_state(ast).unwrap();

    while executor.undo() {}
    assert_eq!(executor.document().plain_text(), "one two\nthree");
    while executor.redo() {}

    let ast = executor.document().ast();
    assert_eq!(ast.snapshot(ast.root()).unwrap(), after);
    assert_eq!(executor.document().cursor().get_state(ast).unwrap(), cursor_after);
    assert_eq!(ast.indentation(ast.lines()[2]), Some(2));
}

#[test]
fn test_failed_command_is_not_logged() {
    let mut executor = CommandExecutor::new(Document::from_text("ab"));
    let err = executor
        .add_command(CursorCommand::SetPosition {
            position: Position::new(vec![3, 0]),
            select: false,
        })
        .unwrap_err();
    assert_eq!(
        err,
        mathdoc_core::CommandError::InvalidPosition(Position::new(vec![3, 0]))
    );
    assert!(executor.log().is_empty());
    assert!(!executor.can_undo());
}

#[test]
fn test_reset_undo_stack() {
    let mut executor = CommandExecutor::new(Document::new());
    executor.add_command(insert("bulk")).unwrap();
    executor.reset_undo_stack();
    assert!(!executor.can_undo());
    assert!(!executor.undo());
    assert_eq!(executor.document().plain_text(), "bulk");
}
