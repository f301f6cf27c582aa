//! Command interface example
//!
//! Drives a document through `CommandExecutor` and prints the resulting layout.
//! Run with `RUST_LOG=mathdoc_core=debug` to see the command log events.

use mathdoc_core::{
    BoxKind, CommandExecutor, CursorCommand, Document, EditCommand, FormatCommand, MathKind,
    Motion, Tag,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let mut executor = CommandExecutor::new(Document::new());

    println!("1. Text editing:");
    executor
        .add_command(EditCommand::InsertText {
            text: "Quadratic roots, see www.example.org\nx = ".to_string(),
        })
        .unwrap();
    println!("  text: {:?}", executor.document().plain_text());
    for link in mathdoc_core::links(executor.document().ast()) {
        println!("  link: {} -> {}", link.text, link.target);
    }

    println!("\n2. Math:");
    executor
        .add_command(EditCommand::InsertMath {
            kind: MathKind::Fraction,
        })
        .unwrap();
    executor
        .add_command(EditCommand::InsertText {
            text: "-b".to_string(),
        })
        .unwrap();
    executor
        .add_command(CursorCommand::Move {
            motion: Motion::Right,
            select: false,
        })
        .unwrap();
    executor
        .add_command(EditCommand::InsertText {
            text: "2a".to_string(),
        })
        .unwrap();
    println!("  text: {:?}", executor.document().plain_text());

    println!("\n3. Formatting:");
    executor
        .add_command(CursorCommand::SetPosition {
            position: mathdoc_core::Position::new(vec![0, 0]),
            select: false,
        })
        .unwrap();
    executor
        .add_command(CursorCommand::Move {
            motion: Motion::WordRight,
            select: true,
        })
        .unwrap();
    executor
        .add_command(FormatCommand::AddTag { tag: Tag::Bold })
        .unwrap();
    println!("  selected: {:?}", executor.document().selected_text());

    println!("\n4. Layout:");
    let layouter = executor.layouter();
    for index in 0..layouter.physical_lines().len() {
        let id = layouter.physical_lines()[index];
        let rect = layouter.get_absolute_rect(id).unwrap();
        println!(
            "  line {index}: y={:.1} height={:.1} content width={:.1}",
            rect.y,
            rect.height,
            layouter.line_content_width(index).unwrap()
        );
        for unit in layouter.line_units(index).unwrap() {
            let b = layouter.get_box(*unit).unwrap();
            if let BoxKind::Fraction { rule } = &b.kind {
                println!(
                    "    fraction {:.1}x{:.1}, rule at y={:.1}",
                    b.width, b.height, rule.from.y
                );
            }
        }
    }

    println!("\n5. Undo/redo:");
    println!("  undo depth: {}", executor.undo_depth());
    while executor.undo() {
        println!("  undo -> {:?}", executor.document().plain_text());
    }
    while executor.redo() {
        println!("  redo -> {:?}", executor.document().plain_text());
    }
}
