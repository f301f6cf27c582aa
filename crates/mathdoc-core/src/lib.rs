#![warn(missing_docs)]
//! mathdoc Core - Headless Document Engine for Text and Math
//!
//! # Overview
//!
//! `mathdoc-core` edits structured documents that mix plain text, inline formatting, links and
//! mathematical expressions (scripts, fractions, radicals). It owns the document tree, the
//! cursor and an undoable command log, and turns the tree into positioned boxes for a host to
//! paint. Rendering, input handling and font rasterization stay outside: glyph metrics come
//! from a [`mathdoc_fonts::FontMetrics`] provider.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Command Interface (CommandExecutor)        │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Layouter (boxes, line breaking, math)      │  ← Geometry
//! ├─────────────────────────────────────────────┤
//! │  Cursor & Selection                         │
//! ├─────────────────────────────────────────────┤
//! │  Position & Slot Iterator                   │  ← Addressing
//! ├─────────────────────────────────────────────┤
//! │  Document Tree (arena of nodes)             │  ← Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use mathdoc_core::{CommandExecutor, CursorCommand, Document, EditCommand, MathKind, Motion};
//!
//! let mut executor = CommandExecutor::new(Document::new());
//!
//! executor
//!     .add_command(EditCommand::InsertText { text: "area = ".to_string() })
//!     .unwrap();
//! executor
//!     .add_command(EditCommand::InsertMath { kind: MathKind::Fraction })
//!     .unwrap();
//! executor
//!     .add_command(EditCommand::InsertText { text: "1".to_string() })
//!     .unwrap();
//! executor
//!     .add_command(CursorCommand::Move { motion: Motion::Right, select: false })
//!     .unwrap();
//! executor
//!     .add_command(EditCommand::InsertText { text: "2".to_string() })
//!     .unwrap();
//!
//! assert_eq!(executor.document().plain_text(), "area = 12");
//! assert!(executor.layouter().document_height() > 0.0);
//!
//! executor.undo();
//! assert_eq!(executor.document().plain_text(), "area = 1");
//! ```
//!
//! # Module Description
//!
//! - [`node`] - node kinds, payloads and detached [`Fragment`]s
//! - [`ast`] - the document tree and its structural operations
//! - [`position`] - index paths from the root
//! - [`iter`] - cursor slots and their document order
//! - [`cursor`] - insertion point and selection
//! - [`document`] - tree, cursor and title bundled together
//! - [`traverse`] - visitor-based read-only walks
//! - [`links`] - link extraction and URL detection
//! - [`commands`] - commands, undo/redo log and the executor
//! - [`layout`] - box tree, line breaking, math composition and hit testing

pub mod ast;
pub mod commands;
pub mod cursor;
pub mod document;
pub mod iter;
pub mod layout;
pub mod links;
pub mod node;
pub mod position;
pub mod traverse;

pub use ast::{Ast, Descendants, TreeError, ValidationError};
pub use commands::{
    Command, CommandError, CommandExecutor, CommandLog, CursorCommand, EditCommand,
    FormatCommand, LogEntry, MAX_INDENTATION, Motion,
};
pub use cursor::{Cursor, CursorState};
pub use document::Document;
pub use iter::NodeIterator;
pub use layout::{
    BoxId, BoxKind, LayoutBox, LayoutConfig, Layouter, Point, Rect, ScriptOrder, Segment,
};
pub use links::{Link, links};
pub use node::{CharData, Fragment, MathKind, Node, NodeId, NodeKind, Tag, TagSet, WidgetData};
pub use position::Position;
pub use traverse::{Visitor, plain_text, walk};
