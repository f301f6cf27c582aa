//! Greedy line breaking.

use std::ops::Range;

/// A unit offered to the line breaker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Unit {
    pub(crate) width: f32,
    /// Whitespace or end of line: appended first, may hang past the available width.
    pub(crate) break_after: bool,
}

/// Split `units` into lines no wider than `available`.
///
/// An ordinary unit that would overflow a non-empty line starts a new line. A break-after unit
/// is always appended to the current line; if that overflows, the line ends before the next
/// ordinary unit. Consecutive break-after units keep hanging on the same line, so a line never
/// starts with whitespace and a run of spaces is never split.
pub(crate) fn break_lines(units: &[Unit], available: f32) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut width = 0.0f32;
    let mut pending = false;

    for (i, unit) in units.iter().enumerate() {
        if !unit.break_after {
            if pending || (i > start && width + unit.width > available) {
                lines.push(start..i);
                start = i;
                width = 0.0;
            }
            pending = false;
        }

        width += unit.width;
        if unit.break_after && width > available {
            pending = true;
        }
    }
    if start < units.len() || lines.is_empty() {
        lines.push(start..units.len());
    }
    lines
}

/// Width of a line without its trailing break-after units.
pub(crate) fn content_width(units: &[Unit]) -> f32 {
    let hanging = units.iter().rev().take_while(|u| u.break_after).count();
    units[..units.len() - hanging].iter().map(|u| u.width).sum()
}
