//! Line ranges for block-level commands.

use std::ops::RangeInclusive;

use super::buffer::{Cursor, TextBuffer};

/// Lines a block command applies to.
///
/// With a selection this is every line the selection touches, including a
/// last line the selection only reaches at column 0. Without one it is the
/// cursor's line. The range is never empty and always addresses existing
/// lines.
pub fn resolve_block_range<B: TextBuffer + ?Sized>(cursor: &Cursor, buffer: &B) -> RangeInclusive<usize> {
    let last = buffer.line_count().saturating_sub(1);
    match cursor.selection_range() {
        Some((start, end)) => start.line.min(last)..=end.line.min(last),
        None => {
            let line = cursor.line.min(last);
            line..=line
        }
    }
}
