//! An editing session: one buffer, its cursor, and the settings the
//! structural engines consult on every key press.

use tracing::{debug, trace};

use super::buffer::{Cursor, EditGroup, EditorBuffer, KeyOutcome, Position, TextBuffer};
use super::command::Command;
use super::focus::{FocusRange, UnicodeSentences, compute_focus_ranges};
use super::pairs::{PairedDelimiters, handle_end_pair_character_typed, insert_paired_characters};
use super::structure::{
    Markup, create_numbered_list, handle_backspace_key, handle_carriage_return, indent,
    insert_comment, insert_formatting_markup, insert_prefix_for_blocks, remove_blockquote,
    toggle_task_complete, unindent,
};
use crate::config::EditorConfig;

/// A key press as seen by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Shift inserts a hard line break first; Ctrl skips list continuation.
    Enter { shift: bool, ctrl: bool },
    Backspace,
    Delete,
    Tab,
    BackTab,
    Char(char),
}

/// Transitions between typing and idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingEvent {
    Resumed,
    Paused,
}

/// Tracks whether the user is typing, driven by text changes and an
/// external idle timer.
#[derive(Debug, Clone)]
pub struct TypingMonitor {
    has_paused: bool,
    paused_reported: bool,
}

impl Default for TypingMonitor {
    fn default() -> Self {
        Self {
            has_paused: true,
            paused_reported: true,
        }
    }
}

impl TypingMonitor {
    /// Call on every text change. Reports `Resumed` on the first change
    /// after a pause.
    pub const fn on_text_changed(&mut self) -> Option<TypingEvent> {
        if self.has_paused {
            self.has_paused = false;
            self.paused_reported = false;
            return Some(TypingEvent::Resumed);
        }
        None
    }

    /// Call on every idle-timer tick. A tick with no text change since the
    /// previous tick reports `Paused`, once per pause.
    pub const fn check_if_typing_paused(&mut self) -> Option<TypingEvent> {
        let event = if self.has_paused && !self.paused_reported {
            self.paused_reported = true;
            Some(TypingEvent::Paused)
        } else {
            None
        };
        self.has_paused = true;
        event
    }
}

/// Buffer, cursor and configuration of one open document.
#[derive(Debug)]
pub struct EditorSession {
    buffer: EditorBuffer,
    cursor: Cursor,
    config: EditorConfig,
    pairs: PairedDelimiters,
    typing: TypingMonitor,
}

impl EditorSession {
    pub fn new(text: &str) -> Self {
        Self {
            buffer: EditorBuffer::from_text(text),
            cursor: Cursor::new(),
            config: EditorConfig::default(),
            pairs: PairedDelimiters::default(),
            typing: TypingMonitor::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_pairs(mut self, pairs: PairedDelimiters) -> Self {
        self.pairs = pairs;
        self
    }

    pub const fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Move the cursor, clamping both ends to the buffer.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = self.buffer.clamp_cursor(cursor);
    }

    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub const fn config_mut(&mut self) -> &mut EditorConfig {
        &mut self.config
    }

    pub const fn pairs(&self) -> &PairedDelimiters {
        &self.pairs
    }

    pub const fn pairs_mut(&mut self) -> &mut PairedDelimiters {
        &mut self.pairs
    }

    /// Forward an idle-timer tick to the typing monitor.
    pub const fn check_if_typing_paused(&mut self) -> Option<TypingEvent> {
        self.typing.check_if_typing_paused()
    }

    /// Spans to fade for the configured focus mode.
    pub fn focus_ranges(&self) -> FocusRange {
        compute_focus_ranges(&self.buffer, &self.cursor, self.config.focus_mode(), &UnicodeSentences)
    }

    /// Process one key press.
    ///
    /// Returns a typing event when the key changed the text after a pause.
    pub fn handle_key(&mut self, key: Key) -> Option<TypingEvent> {
        let revision = self.buffer.revision();
        trace!(?key, line = self.cursor.line, col = self.cursor.col, "key");
        self.cursor = match key {
            Key::Enter { .. } if self.cursor.has_selection() => {
                let newline = self.buffer.line_break(self.cursor.line);
                self.insert_str(newline)
            }
            Key::Enter { shift, ctrl } => self.enter(shift, ctrl),
            Key::Backspace | Key::Delete if self.config.hemingway_mode() => {
                debug!(?key, "deletion disabled in hemingway mode");
                self.cursor
            }
            Key::Backspace => match handle_backspace_key(&mut self.buffer, self.cursor, &self.pairs) {
                KeyOutcome::Handled(cursor) => cursor,
                KeyOutcome::Unhandled => self.delete_back(),
            },
            Key::Delete => self.delete_forward(),
            Key::Tab => indent(&mut self.buffer, self.cursor, &self.config),
            Key::BackTab => unindent(&mut self.buffer, self.cursor, &self.config),
            Key::Char(ch) => self.type_char(ch),
        };
        self.text_changed_since(revision)
    }

    /// Run a named command.
    pub fn execute(&mut self, command: &Command) -> Option<TypingEvent> {
        let revision = self.buffer.revision();
        let (buffer, cursor) = (&mut self.buffer, self.cursor);
        self.cursor = match command {
            Command::Bold => insert_formatting_markup(buffer, cursor, Markup::Bold),
            Command::Italic => insert_formatting_markup(buffer, cursor, Markup::Italic),
            Command::Strikethrough => insert_formatting_markup(buffer, cursor, Markup::Strikethrough),
            Command::Comment => insert_comment(buffer, cursor),
            Command::Bullet(marker) => insert_prefix_for_blocks(buffer, cursor, &format!("{marker} ")),
            Command::Numbered(delimiter) => create_numbered_list(buffer, cursor, *delimiter),
            Command::Task => insert_prefix_for_blocks(buffer, cursor, "- [ ] "),
            Command::Quote => insert_prefix_for_blocks(buffer, cursor, "> "),
            Command::Unquote => remove_blockquote(buffer, cursor),
            Command::Indent => indent(buffer, cursor, &self.config),
            Command::Unindent => unindent(buffer, cursor, &self.config),
            Command::ToggleTask => toggle_task_complete(buffer, cursor),
            Command::Undo => buffer.undo().map_or(cursor, Cursor::from),
            Command::Redo => buffer.redo().map_or(cursor, Cursor::from),
            Command::Key(key) => return self.handle_key(*key),
            Command::Type(text) => {
                let mut event = None;
                for ch in text.chars() {
                    let key = match ch {
                        '\n' => Key::Enter {
                            shift: false,
                            ctrl: false,
                        },
                        '\t' => Key::Tab,
                        ch => Key::Char(ch),
                    };
                    event = event.or(self.handle_key(key));
                }
                return event;
            }
        };
        self.text_changed_since(revision)
    }

    fn text_changed_since(&mut self, revision: u64) -> Option<TypingEvent> {
        if self.buffer.revision() == revision {
            return None;
        }
        self.typing.on_text_changed()
    }

    fn enter(&mut self, shift: bool, ctrl: bool) -> Cursor {
        let mut group = EditGroup::open(&mut self.buffer);
        let mut cursor = self.cursor;
        if shift {
            cursor = Cursor::from(group.insert_text(cursor.position(), "  "));
        }
        if ctrl {
            let newline = group.line_break(cursor.line);
            Cursor::from(group.insert_text(cursor.position(), newline))
        } else {
            handle_carriage_return(&mut *group, cursor)
        }
    }

    fn type_char(&mut self, ch: char) -> Cursor {
        if let KeyOutcome::Handled(cursor) =
            handle_end_pair_character_typed(&self.buffer, self.cursor, &self.pairs, ch)
        {
            return cursor;
        }
        if let KeyOutcome::Handled(cursor) =
            insert_paired_characters(&mut self.buffer, self.cursor, &self.pairs, ch)
        {
            return cursor;
        }
        self.insert_str(ch.encode_utf8(&mut [0; 4]))
    }

    // --- Default editing, used when no structural handler applies ---

    fn insert_str(&mut self, text: &str) -> Cursor {
        let end = match self.cursor.selection_range() {
            Some((start, end)) => {
                let mut group = EditGroup::open(&mut self.buffer);
                group.replace_range(start, end, text)
            }
            None => self.buffer.insert_text(self.cursor.position(), text),
        };
        Cursor::from(end)
    }

    fn delete_back(&mut self) -> Cursor {
        if let Some((start, end)) = self.cursor.selection_range() {
            self.buffer.delete_range(start, end);
            return Cursor::from(start);
        }
        let head = self.buffer.clamp_position(self.cursor.position());
        let start = if head.col > 0 {
            let text = self.buffer.line_at(head.line).unwrap_or_default();
            let width = text[..head.col].chars().next_back().map_or(1, char::len_utf8);
            Position::new(head.line, head.col - width)
        } else if head.line > 0 {
            Position::new(head.line - 1, self.buffer.line_len(head.line - 1))
        } else {
            return Cursor::from(head);
        };
        self.buffer.delete_range(start, head);
        Cursor::from(start)
    }

    fn delete_forward(&mut self) -> Cursor {
        if let Some((start, end)) = self.cursor.selection_range() {
            self.buffer.delete_range(start, end);
            return Cursor::from(start);
        }
        let head = self.buffer.clamp_position(self.cursor.position());
        let text = self.buffer.line_at(head.line).unwrap_or_default();
        let end = if let Some(next) = text[head.col..].chars().next() {
            Position::new(head.line, head.col + next.len_utf8())
        } else if head.line + 1 < self.buffer.line_count() {
            Position::new(head.line + 1, 0)
        } else {
            return Cursor::from(head);
        };
        self.buffer.delete_range(head, end);
        Cursor::from(head)
    }
}
