//! End-to-end editing scenarios through the command executor.

use mathdoc_core::{
    CommandExecutor, CursorState, Document, EditCommand, Fragment, NodeKind, Position,
};
use pretty_assertions::assert_eq;

fn insert(text: &str) -> EditCommand {
    EditCommand::InsertText {
        text: text.to_string(),
    }
}

fn root_snapshot(executor: &CommandExecutor) -> Fragment {
    let ast = executor.document().ast();
    ast.snapshot(ast.root()).unwrap()
}

fn cursor_state(executor: &CommandExecutor) -> CursorState {
    let document = executor.document();
    document.cursor().get_state(document.ast()).unwrap()
}

/// Undo is the exact inverse of the insertion: the document returns to its single empty line
/// with the cursor where it was, rather than to a merged `[a, b, c, d, EOL]` line.
#[test]
fn test_split_insert_then_undo() {
    let mut executor = CommandExecutor::new(Document::new());
    let tree_before = root_snapshot(&executor);
    let cursor_before = cursor_state(&executor);

    executor.add_command(insert("ab\ncd")).unwrap();

    let ast = executor.document().ast();
    assert_eq!(ast.lines().len(), 2);
    assert_eq!(ast.snapshot(ast.lines()[0]).unwrap(), Fragment::line("ab"));
    assert_eq!(ast.snapshot(ast.lines()[1]).unwrap(), Fragment::line("cd"));
    assert_eq!(
        cursor_state(&executor),
        CursorState::collapsed(Position::new(vec![1, 2]))
    );

    assert!(executor.undo());
    assert_eq!(root_snapshot(&executor), tree_before);
    assert_eq!(cursor_state(&executor), cursor_before);
    assert!(executor.document().ast().validate().is_ok());
}

#[test]
fn test_backspace_at_document_start_is_noop() {
    let mut executor = CommandExecutor::new(Document::from_text("abc"));
    let tree_before = root_snapshot(&executor);
    assert_eq!(
        cursor_state(&executor),
        CursorState::collapsed(Position::new(vec![0, 0]))
    );

    executor.add_command(EditCommand::Backspace).unwrap();

    let entry = executor.log().last_executed().unwrap();
    assert!(!entry.is_undo_checkpoint());
    assert!(!entry.has_undo_state());
    assert_eq!(root_snapshot(&executor), tree_before);
    assert_eq!(
        cursor_state(&executor),
        CursorState::collapsed(Position::new(vec![0, 0]))
    );
}

#[test]
fn test_delete_at_document_end_is_noop() {
    let mut executor = CommandExecutor::new(Document::from_text("abc"));
    executor
        .add_command(mathdoc_core::CursorCommand::Move {
            motion: mathdoc_core::Motion::DocumentEnd,
            select: false,
        })
        .unwrap();
    let tree_before = root_snapshot(&executor);

    executor.add_command(EditCommand::Delete).unwrap();
    assert!(!executor.log().last_executed().unwrap().is_undo_checkpoint());
    assert_eq!(root_snapshot(&executor), tree_before);
}

#[test]
fn test_click_above_document_resolves_to_first_leaf() {
    let executor = CommandExecutor::new(Document::from_text("hello world\nsecond line"));
    let ast = executor.document().ast();
    let first_leaf = ast.get_child(ast.lines()[0], 0).unwrap();

    let hit = executor
        .layouter()
        .get_cursor_holding_layout_close_to_xy(0.0, -5.0)
        .unwrap();
    assert_eq!(hit, first_leaf);
    assert!(matches!(ast.kind(hit), Some(NodeKind::Char(_))));
}

#[test]
fn test_math_insertion_round_trip() {
    let mut executor = CommandExecutor::new(Document::new());
    executor.add_command(insert("x = ")).unwrap();
    executor
        .add_command(EditCommand::InsertMath {
            kind: mathdoc_core::MathKind::Root,
        })
        .unwrap();
    executor.add_command(insert("2")).unwrap();

    assert_eq!(executor.document().plain_text(), "x = 2");
    assert_eq!(
        executor
            .add_command(EditCommand::InsertMath {
                kind: mathdoc_core::MathKind::Fraction,
            })
            .unwrap_err(),
        mathdoc_core::CommandError::NotAllowedInMath {
            kind: NodeKind::MathFraction.name(),
        }
    );
    assert_eq!(executor.undo_depth(), 3);
    assert!(executor.document().ast().validate().is_ok());

    executor.undo();
    executor.undo();
    assert_eq!(executor.document().plain_text(), "x = ");
}
