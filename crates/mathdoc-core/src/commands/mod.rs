//! Command Interface Layer
//!
//! Every user-facing editing action is a [`Command`] submitted to a [`CommandExecutor`], which
//! runs it against the [`Document`], records what is needed to invert it, and keeps the
//! undo/redo log.
//!
//! # Undo grouping
//!
//! Each logged entry carries an `is_undo_checkpoint` flag. Content edits are checkpoints; cursor
//! motion is not. [`CommandExecutor::undo`] reverts the newest entry and keeps going while the
//! entry it just reverted was not a checkpoint, so an edit and the motions (or no-op deletions)
//! logged after it are undone in one call. [`CommandExecutor::redo`] mirrors this: it re-runs
//! the next entry and keeps going until the following entry would be a checkpoint.
//!
//! ```text
//! log:    Insert*  Left  Left  Backspace(no-op)  Insert*  Right
//!         |------- undo step 1 ---------------|  |-- step 2 --|
//! ```

mod edit;
mod format;
mod log;
mod motion;
mod undo;

pub use log::{CommandLog, LogEntry};

use crate::ast::TreeError;
use crate::document::Document;
use crate::layout::Layouter;
use crate::node::{Fragment, MathKind, Tag, WidgetData};
use crate::position::Position;
use thiserror::Error;
use undo::UndoRecord;

/// Highest indentation level accepted by [`FormatCommand::SetIndentationLevel`].
pub const MAX_INDENTATION: u8 = 8;

/// Cursor movement units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    /// Previous slot.
    Left,
    /// Next slot.
    Right,
    /// Closest slot on the physical line above.
    Up,
    /// Closest slot on the physical line below.
    Down,
    /// First slot of the paragraph.
    LineStart,
    /// End-of-line slot of the paragraph.
    LineEnd,
    /// Closest slot one page height above.
    PageUp,
    /// Closest slot one page height below.
    PageDown,
    /// First slot of the document.
    DocumentStart,
    /// Last slot of the document.
    DocumentEnd,
    /// Start of the previous word.
    WordLeft,
    /// Start of the next word.
    WordRight,
}

impl Motion {
    /// Whether the motion uses (and preserves) the sticky horizontal coordinate.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::PageUp | Self::PageDown)
    }
}

/// Cursor & selection commands
#[derive(Debug, Clone, PartialEq)]
pub enum CursorCommand {
    /// Move the insertion point.
    Move {
        /// Movement unit.
        motion: Motion,
        /// Extend the selection instead of collapsing it.
        select: bool,
    },
    /// Place the insertion point at a slot.
    SetPosition {
        /// Target slot.
        position: Position,
        /// Extend the selection instead of collapsing it.
        select: bool,
    },
    /// Place the insertion point closest to a point in layout coordinates.
    ClickAt {
        /// Horizontal coordinate.
        x: f32,
        /// Vertical coordinate.
        y: f32,
        /// Extend the selection instead of collapsing it.
        select: bool,
    },
    /// Select the whole document.
    SelectAll,
}

/// Content editing commands
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Replace the selection with `text`. `\n` splits the line (dropped inside math lists).
    InsertText {
        /// Text to insert.
        text: String,
    },
    /// Split the line at the cursor.
    Return,
    /// Delete the selection, or the slot after the cursor.
    DeleteText,
    /// Delete the selection, or the node before the cursor.
    Backspace,
    /// Delete the selection, or the node after the cursor.
    Delete,
    /// Insert an empty math construct and move into its first branch.
    InsertMath {
        /// Construct to insert.
        kind: MathKind,
    },
    /// Insert an embedded object before the cursor.
    InsertWidget {
        /// Widget payload.
        widget: WidgetData,
    },
    /// Paste previously copied fragments.
    InsertFragments {
        /// Either inline nodes or whole lines.
        fragments: Vec<Fragment>,
    },
}

/// Formatting commands
#[derive(Debug, Clone, PartialEq)]
pub enum FormatCommand {
    /// Add a tag to the selected characters.
    AddTag {
        /// Tag to add.
        tag: Tag,
    },
    /// Remove a tag from the selected characters.
    RemoveTag {
        /// Tag to remove.
        tag: Tag,
    },
    /// Set (or clear) the link target of the selected characters.
    SetLink {
        /// New link target.
        target: Option<String>,
    },
    /// Set the indentation level of the lines touched by the cursor.
    SetIndentationLevel {
        /// New level.
        level: u8,
    },
    /// Change the document title.
    SetTitle {
        /// New title.
        title: String,
    },
}

/// Unified command enum
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Cursor command
    Cursor(CursorCommand),
    /// Content editing commands
    Edit(EditCommand),
    /// Formatting commands
    Format(FormatCommand),
}

impl From<CursorCommand> for Command {
    fn from(command: CursorCommand) -> Self {
        Self::Cursor(command)
    }
}

impl From<EditCommand> for Command {
    fn from(command: EditCommand) -> Self {
        Self::Edit(command)
    }
}

impl From<FormatCommand> for Command {
    fn from(command: FormatCommand) -> Self {
        Self::Format(command)
    }
}

/// Command error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No cursor slot at the position.
    #[error("invalid position: {0}")]
    InvalidPosition(Position),
    /// The node kind may not appear inside a math list.
    #[error("{kind} cannot be inserted inside a math list")]
    NotAllowedInMath {
        /// Kind name of the rejected node.
        kind: &'static str,
    },
    /// A pasted fragment does not fit the insertion point.
    #[error("fragment of kind {kind} cannot be inserted here")]
    InvalidFragment {
        /// Kind name of the rejected fragment.
        kind: &'static str,
    },
    /// Indentation level above [`MAX_INDENTATION`].
    #[error("indentation level {level} exceeds the maximum of {max}")]
    IndentationOutOfRange {
        /// Requested level.
        level: u8,
        /// Highest accepted level.
        max: u8,
    },
    /// The cursor refers to a node that is no longer attached.
    #[error("cursor is not attached to the document")]
    DetachedCursor,
    /// A tree operation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// What running a command produced.
#[derive(Debug)]
pub(crate) struct Outcome {
    record: Option<UndoRecord>,
    checkpoint: bool,
}

impl Outcome {
    fn checkpoint(record: UndoRecord) -> Self {
        Self {
            record: Some(record),
            checkpoint: true,
        }
    }

    fn transient(record: UndoRecord) -> Self {
        Self {
            record: Some(record),
            checkpoint: false,
        }
    }

    fn noop() -> Self {
        Self {
            record: None,
            checkpoint: false,
        }
    }
}

/// Command executor
///
/// Owns the [`Document`], the [`Layouter`] and the command log. The layout is refreshed after
/// every command, undo and redo (a no-op when the tree did not change).
#[derive(Debug)]
pub struct CommandExecutor {
    document: Document,
    layouter: Layouter,
    log: CommandLog,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl CommandExecutor {
    /// Executor over `document` with a default layouter.
    pub fn new(document: Document) -> Self {
        Self::with_layouter(document, Layouter::default())
    }

    /// Executor over `document` laid out by `layouter`.
    pub fn with_layouter(document: Document, mut layouter: Layouter) -> Self {
        layouter.update(&document);
        Self {
            document,
            layouter,
            log: CommandLog::default(),
        }
    }

    /// The document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The layouter (up to date with the document).
    pub fn layouter(&self) -> &Layouter {
        &self.layouter
    }

    /// Mutable layouter, e.g. to change its configuration. Call
    /// [`CommandExecutor::refresh_layout`] afterwards.
    pub fn layouter_mut(&mut self) -> &mut Layouter {
        &mut self.layouter
    }

    /// Bring the layout up to date.
    pub fn refresh_layout(&mut self) {
        self.layouter.update(&self.document);
    }

    /// The command log.
    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    /// Run `command`, truncating any redo tail and appending it to the log.
    ///
    /// A command that fails is not logged and leaves the document untouched.
    pub fn add_command(&mut self, command: impl Into<Command>) -> Result<(), CommandError> {
        let command = command.into();
        let outcome = self.run(&command)?;
        tracing::debug!(
            ?command,
            checkpoint = outcome.checkpoint,
            "command executed"
        );

        let dropped = self.log.push(LogEntry {
            command,
            record: outcome.record,
            is_undo_checkpoint: outcome.checkpoint,
        });
        if dropped > 0 {
            tracing::debug!(dropped, "redo tail truncated");
        }
        self.layouter.update(&self.document);
        Ok(())
    }

    /// Run a batch of commands, stopping at the first error.
    pub fn add_commands(&mut self, commands: Vec<Command>) -> Result<(), CommandError> {
        for command in commands {
            self.add_command(command)?;
        }
        Ok(())
    }

    /// Revert the newest group of commands. Returns whether anything was undone.
    pub fn undo(&mut self) -> bool {
        let mut undone = 0;
        while let Some(entry) = self.log.undo_candidate() {
            if let Some(record) = &entry.record
                && let Err(err) = record.revert(&mut self.document)
            {
                tracing::warn!(%err, "failed to revert command");
                break;
            }
            let checkpoint = entry.is_undo_checkpoint;
            self.log.executed -= 1;
            undone += 1;

            if checkpoint {
                break;
            }
        }

        if undone > 0 {
            tracing::debug!(undone, executed = self.log.executed, "undo");
            self.layouter.update(&self.document);
        }
        undone > 0
    }

    /// Re-run the next group of undone commands. Returns whether anything was redone.
    pub fn redo(&mut self) -> bool {
        let mut redone = 0;
        while let Some(command) = self.log.redo_candidate().map(|entry| entry.command.clone()) {
            self.layouter.update(&self.document);
            let outcome = match self.run(&command) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(%err, "failed to redo command");
                    break;
                }
            };

            let index = self.log.executed;
            self.log.entries[index].record = outcome.record;
            self.log.entries[index].is_undo_checkpoint = outcome.checkpoint;
            self.log.executed += 1;
            redone += 1;

            if self.log.redo_candidate().is_none_or(|next| next.is_undo_checkpoint) {
                break;
            }
        }

        if redone > 0 {
            tracing::debug!(redone, executed = self.log.executed, "redo");
            self.layouter.update(&self.document);
        }
        redone > 0
    }

    /// Forget all logged commands.
    pub fn reset_undo_stack(&mut self) {
        tracing::debug!(entries = self.log.len(), "undo stack reset");
        self.log.clear();
    }

    /// Whether there is anything to undo.
    pub fn can_undo(&self) -> bool {
        self.log.executed > 0
    }

    /// Whether there is anything to redo.
    pub fn can_redo(&self) -> bool {
        self.log.executed < self.log.len()
    }

    /// Number of `undo` calls that would change something.
    pub fn undo_depth(&self) -> usize {
        self.log.groups(0, self.log.executed)
    }

    /// Number of `redo` calls that would change something.
    pub fn redo_depth(&self) -> usize {
        self.log.groups(self.log.executed, self.log.len())
    }

    fn run(&mut self, command: &Command) -> Result<Outcome, CommandError> {
        match command {
            Command::Cursor(command) => {
                motion::run(&mut self.document, &self.layouter, command).map(Outcome::transient)
            }
            Command::Edit(command) => edit::run(&mut self.document, command),
            Command::Format(command) => {
                format::run(&mut self.document, command).map(Outcome::checkpoint)
            }
        }
    }
}
