use std::ops::{Deref, DerefMut};

use ropey::Rope;
use tracing::{trace, warn};

/// A location in the buffer.
///
/// Positions order line-major, so `a < b` means `a` comes first in the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column (byte offset within the line).
    pub col: usize,
}

impl Position {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Where this position lands after text spanning `at..end` was inserted.
    ///
    /// A position sitting exactly at the insertion point moves with the
    /// inserted text.
    #[must_use]
    pub const fn after_insert(self, at: Self, end: Self) -> Self {
        if self.line < at.line || (self.line == at.line && self.col < at.col) {
            return self;
        }
        if self.line == at.line {
            Self::new(end.line, end.col + (self.col - at.col))
        } else {
            Self::new(self.line + end.line.saturating_sub(at.line), self.col)
        }
    }

    /// Where this position lands after `start..end` was deleted.
    #[must_use]
    pub fn after_delete(self, start: Self, end: Self) -> Self {
        if self <= start {
            self
        } else if self <= end {
            start
        } else if self.line == end.line {
            Self::new(start.line, start.col + self.col.saturating_sub(end.col))
        } else {
            Self::new(self.line.saturating_sub(end.line.saturating_sub(start.line)), self.col)
        }
    }

    /// Where this position lands after `start..old_end` was replaced by text
    /// ending at `new_end`. Positions inside the replaced text snap to `start`.
    #[must_use]
    pub fn after_replace(self, start: Self, old_end: Self, new_end: Self) -> Self {
        if self <= start {
            self
        } else if self < old_end {
            start
        } else {
            self.after_delete(start, old_end).after_insert(start, new_end)
        }
    }
}

/// Cursor position in the editor buffer, with an optional selection anchor.
///
/// The head (`line`, `col`) is the active end where edits are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column (byte offset within the line).
    pub col: usize,
    anchor: Option<Position>,
}

impl Cursor {
    /// Create a cursor at line 0, column 0.
    pub const fn new() -> Self {
        Self {
            line: 0,
            col: 0,
            anchor: None,
        }
    }

    /// Create a cursor at a specific position, with no selection.
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            anchor: None,
        }
    }

    /// Create a cursor selecting from `anchor` to `head`.
    pub const fn selecting(anchor: Position, head: Position) -> Self {
        Self {
            line: head.line,
            col: head.col,
            anchor: Some(anchor),
        }
    }

    pub const fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    pub const fn anchor(&self) -> Option<Position> {
        self.anchor
    }

    /// Whether a non-empty selection exists.
    pub fn has_selection(&self) -> bool {
        self.anchor.is_some_and(|anchor| anchor != self.position())
    }

    /// The selected range as `(start, end)` in document order.
    pub fn selection_range(&self) -> Option<(Position, Position)> {
        let head = self.position();
        self.anchor
            .filter(|anchor| *anchor != head)
            .map(|anchor| {
                if anchor <= head {
                    (anchor, head)
                } else {
                    (head, anchor)
                }
            })
    }

    #[must_use]
    pub fn after_insert(self, at: Position, end: Position) -> Self {
        self.map(|pos| pos.after_insert(at, end))
    }

    #[must_use]
    pub fn after_delete(self, start: Position, end: Position) -> Self {
        self.map(|pos| pos.after_delete(start, end))
    }

    #[must_use]
    pub fn after_replace(self, start: Position, old_end: Position, new_end: Position) -> Self {
        self.map(|pos| pos.after_replace(start, old_end, new_end))
    }

    fn map(self, f: impl Fn(Position) -> Position) -> Self {
        let head = f(self.position());
        Self {
            line: head.line,
            col: head.col,
            anchor: self.anchor.map(f),
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Position> for Cursor {
    fn from(pos: Position) -> Self {
        Self::at(pos.line, pos.col)
    }
}

/// Result of a key handler that may decline a keystroke.
///
/// `Unhandled` tells the caller to fall back to default character editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled(Cursor),
    Unhandled,
}

impl KeyOutcome {
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

/// The buffer operations the editing engines rely on.
///
/// Cursor state is never stored behind this trait: every engine takes a
/// [`Cursor`] and returns the updated one.
pub trait TextBuffer {
    /// Total number of lines in the buffer (at least one).
    fn line_count(&self) -> usize;

    /// Content of a line without its line terminator.
    fn line_at(&self, line: usize) -> Option<String>;

    /// Insert `text` at `at` and return the position just past it.
    fn insert_text(&mut self, at: Position, text: &str) -> Position;

    /// Delete the text between two positions, in either order.
    fn delete_range(&mut self, start: Position, end: Position);

    /// Open an edit group. Groups nest; only the outermost close commits.
    fn begin_edit_group(&mut self);

    fn end_edit_group(&mut self);

    /// Line terminator to use when breaking `line`.
    fn line_break(&self, _line: usize) -> &'static str {
        "\n"
    }

    /// Nearest valid position: an existing line, a char boundary within it.
    fn clamp_position(&self, pos: Position) -> Position {
        let line = pos.line.min(self.line_count().saturating_sub(1));
        let text = self.line_at(line).unwrap_or_default();
        Position::new(line, floor_char_boundary(&text, pos.col))
    }

    /// The cursor with head and anchor clamped to the buffer.
    fn clamp_cursor(&self, cursor: Cursor) -> Cursor {
        cursor.map(|pos| self.clamp_position(pos))
    }

    /// Length of a line in bytes (without line terminator).
    fn line_len(&self, line: usize) -> usize {
        self.line_at(line).map_or(0, |s| s.len())
    }

    /// Position just past the last character of the buffer.
    fn end_position(&self) -> Position {
        let last = self.line_count().saturating_sub(1);
        Position::new(last, self.line_len(last))
    }

    /// Replace `start..end` with `text` and return the position past it.
    fn replace_range(&mut self, start: Position, end: Position, text: &str) -> Position {
        let (start, end) = (start.min(end), start.max(end));
        self.delete_range(start, end);
        self.insert_text(start, text)
    }

    /// Text between two positions, lines joined with `\n`.
    fn text_range(&self, start: Position, end: Position) -> String {
        let (start, end) = (start.min(end), start.max(end));
        let mut out = String::new();
        for line in start.line..=end.line {
            let Some(text) = self.line_at(line) else {
                break;
            };
            let from = if line == start.line {
                floor_char_boundary(&text, start.col)
            } else {
                0
            };
            let to = if line == end.line {
                floor_char_boundary(&text, end.col)
            } else {
                text.len()
            };
            if line > start.line {
                out.push('\n');
            }
            if from < to {
                out.push_str(&text[from..to]);
            }
        }
        out
    }
}

/// Largest char boundary in `text` that is not past `idx`.
pub(crate) fn floor_char_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Scoped edit group: opened on creation, closed when dropped.
///
/// Holding the buffer through the guard means no exit path of a command can
/// leave its group open.
pub struct EditGroup<'a, B: TextBuffer + ?Sized> {
    buffer: &'a mut B,
}

impl<'a, B: TextBuffer + ?Sized> EditGroup<'a, B> {
    pub fn open(buffer: &'a mut B) -> Self {
        buffer.begin_edit_group();
        Self { buffer }
    }
}

impl<B: TextBuffer + ?Sized> Deref for EditGroup<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.buffer
    }
}

impl<B: TextBuffer + ?Sized> DerefMut for EditGroup<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.buffer
    }
}

impl<B: TextBuffer + ?Sized> Drop for EditGroup<'_, B> {
    fn drop(&mut self) {
        self.buffer.end_edit_group();
    }
}

/// A single recorded mutation, kept for undo/redo.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Insert { at: Position, text: String },
    Delete { at: Position, text: String },
}

/// A text buffer backed by a rope data structure.
///
/// Mutations are recorded per edit group, so undo and redo revert or replay
/// a whole structural command at once.
pub struct EditorBuffer {
    rope: Rope,
    revision: u64,
    group_depth: usize,
    pending: Vec<Edit>,
    undo_stack: Vec<Vec<Edit>>,
    redo_stack: Vec<Vec<Edit>>,
}

impl EditorBuffer {
    /// Create a new buffer from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            revision: 0,
            group_depth: 0,
            pending: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Counter bumped by every change to the text, including undo and redo.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Number of edit groups currently open.
    pub const fn edit_group_depth(&self) -> usize {
        self.group_depth
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Revert the most recent edit group.
    ///
    /// Returns where the cursor belongs afterwards.
    pub fn undo(&mut self) -> Option<Position> {
        let group = self.undo_stack.pop()?;
        for edit in group.iter().rev() {
            match edit {
                Edit::Insert { at, text } => {
                    let end = end_of_insert(*at, text);
                    self.raw_delete(*at, end);
                }
                Edit::Delete { at, text } => {
                    self.raw_insert(*at, text);
                }
            }
        }
        let pos = group.first().map(|edit| match edit {
            Edit::Insert { at, .. } | Edit::Delete { at, .. } => *at,
        });
        self.redo_stack.push(group);
        pos
    }

    /// Replay the most recently undone edit group.
    pub fn redo(&mut self) -> Option<Position> {
        let group = self.redo_stack.pop()?;
        let mut pos = None;
        for edit in &group {
            pos = Some(match edit {
                Edit::Insert { at, text } => self.raw_insert(*at, text),
                Edit::Delete { at, text } => {
                    self.raw_delete(*at, end_of_insert(*at, text));
                    *at
                }
            });
        }
        self.undo_stack.push(group);
        pos
    }

    // --- Private helpers ---

    fn line_text(&self, line_idx: usize) -> String {
        let s = self.rope.line(line_idx).to_string();
        s.trim_end_matches('\n').trim_end_matches('\r').to_string()
    }

    /// Convert a (clamped) position to a ropey char index.
    fn char_idx(&self, pos: Position) -> usize {
        let line_start = self.rope.line_to_char(pos.line);
        let text = self.line_text(pos.line);
        line_start + text[..pos.col].chars().count()
    }

    fn raw_insert(&mut self, at: Position, text: &str) -> Position {
        let char_idx = self.char_idx(at);
        self.rope.insert(char_idx, text);
        self.touch();
        end_of_insert(at, text)
    }

    fn raw_delete(&mut self, start: Position, end: Position) -> String {
        let from = self.char_idx(start);
        let to = self.char_idx(end);
        let removed = self.rope.slice(from..to).to_string();
        self.rope.remove(from..to);
        self.touch();
        removed
    }

    const fn touch(&mut self) {
        self.revision += 1;
    }

    fn record(&mut self, edit: Edit) {
        self.redo_stack.clear();
        if self.group_depth > 0 {
            self.pending.push(edit);
        } else {
            self.undo_stack.push(vec![edit]);
        }
    }
}

impl TextBuffer for EditorBuffer {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        Some(self.line_text(line_idx))
    }

    fn line_break(&self, line_idx: usize) -> &'static str {
        // The last line has no terminator; it follows the line above.
        let last = self.rope.len_lines().saturating_sub(1);
        let line = self.rope.line(line_idx.min(last.saturating_sub(1)));
        let len = line.len_chars();
        if len >= 2 && line.char(len - 2) == '\r' && line.char(len - 1) == '\n' {
            "\r\n"
        } else {
            "\n"
        }
    }

    fn insert_text(&mut self, at: Position, text: &str) -> Position {
        let at = self.clamp_position(at);
        if text.is_empty() {
            return at;
        }
        trace!(line = at.line, col = at.col, len = text.len(), "insert");
        let end = self.raw_insert(at, text);
        self.record(Edit::Insert {
            at,
            text: text.to_string(),
        });
        end
    }

    fn delete_range(&mut self, start: Position, end: Position) {
        let (start, end) = (
            self.clamp_position(start.min(end)),
            self.clamp_position(start.max(end)),
        );
        if start == end {
            return;
        }
        trace!(
            from_line = start.line,
            from_col = start.col,
            to_line = end.line,
            to_col = end.col,
            "delete"
        );
        let text = self.raw_delete(start, end);
        self.record(Edit::Delete { at: start, text });
    }

    fn begin_edit_group(&mut self) {
        self.group_depth += 1;
    }

    fn end_edit_group(&mut self) {
        if self.group_depth == 0 {
            warn!("end_edit_group called without a matching begin");
            return;
        }
        self.group_depth -= 1;
        if self.group_depth == 0 && !self.pending.is_empty() {
            let group = std::mem::take(&mut self.pending);
            self.undo_stack.push(group);
        }
    }
}

/// Position just past `text` when inserted at `at`.
fn end_of_insert(at: Position, text: &str) -> Position {
    match text.rfind('\n') {
        Some(idx) => Position::new(at.line + text.matches('\n').count(), text.len() - idx - 1),
        None => Position::new(at.line, at.col + text.len()),
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("revision", &self.revision)
            .field("group_depth", &self.group_depth)
            .field("undo_steps", &self.undo_stack.len())
            .finish_non_exhaustive()
    }
}
