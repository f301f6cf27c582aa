use super::Command;
use super::undo::UndoRecord;

/// One executed (or undone) command.
#[derive(Debug)]
pub struct LogEntry {
    pub(super) command: Command,
    pub(super) record: Option<UndoRecord>,
    pub(super) is_undo_checkpoint: bool,
}

impl LogEntry {
    /// The command as submitted.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Whether the entry opens an undo group (it is reverted last within its group).
    pub fn is_undo_checkpoint(&self) -> bool {
        self.is_undo_checkpoint
    }

    /// Whether the entry captured state to revert (no-op commands capture nothing).
    pub fn has_undo_state(&self) -> bool {
        self.record.is_some()
    }
}

/// Ordered command history plus the number of entries currently applied.
#[derive(Debug, Default)]
pub struct CommandLog {
    pub(super) entries: Vec<LogEntry>,
    pub(super) executed: usize,
}

impl CommandLog {
    /// All entries, applied ones first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of applied entries.
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The newest applied entry.
    pub fn last_executed(&self) -> Option<&LogEntry> {
        self.undo_candidate()
    }

    // Drops the redo tail, appends `entry`, returns how many entries were dropped.
    pub(super) fn push(&mut self, entry: LogEntry) -> usize {
        let dropped = self.entries.len() - self.executed;
        self.entries.truncate(self.executed);
        self.entries.push(entry);
        self.executed += 1;
        dropped
    }

    pub(super) fn undo_candidate(&self) -> Option<&LogEntry> {
        self.executed.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub(super) fn redo_candidate(&self) -> Option<&LogEntry> {
        self.entries.get(self.executed)
    }

    // Undo groups among `entries[start..end]`: one per checkpoint, plus one for leading
    // non-checkpoint entries.
    pub(super) fn groups(&self, start: usize, end: usize) -> usize {
        self.entries[start..end]
            .iter()
            .enumerate()
            .filter(|(offset, entry)| *offset == 0 || entry.is_undo_checkpoint)
            .count()
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
        self.executed = 0;
    }
}
