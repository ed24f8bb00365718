//! Markdown-aware structural edits: list continuation, block prefixes,
//! indentation, bullet cycling, task toggling and smart backspace.
//!
//! Every operation takes the cursor it acts on and returns the cursor the
//! editor should show afterwards. All buffer mutations of one call happen
//! inside a single [`EditGroup`], so undo reverts a command as a whole.

use tracing::debug;

use super::buffer::{Cursor, EditGroup, KeyOutcome, Position, TextBuffer, floor_char_boundary};
use super::classify::{
    LineMatch, StructuralKind, checkbox_offset, leading_whitespace, match_line, number_span,
};
use super::pairs::{PairedDelimiters, delete_matched_pair};
use super::range::resolve_block_range;
use crate::config::EditorConfig;

/// Inline emphasis markup that wraps a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Bold,
    Italic,
    Strikethrough,
}

impl Markup {
    /// The delimiter written on both sides of the text.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Bold => "**",
            Self::Italic => "*",
            Self::Strikethrough => "~~",
        }
    }
}

/// Bullet glyph after `marker` in the indent cycle `* → - → + → *`.
pub const fn next_bullet(marker: char) -> char {
    match marker {
        '*' => '-',
        '-' => '+',
        '+' => '*',
        other => other,
    }
}

/// Bullet glyph after `marker` in the unindent cycle `* → + → - → *`.
pub const fn previous_bullet(marker: char) -> char {
    match marker {
        '*' => '+',
        '+' => '-',
        '-' => '*',
        other => other,
    }
}

/// Prepend `prefix` to every line in the block range.
pub fn insert_prefix_for_blocks<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    cursor: Cursor,
    prefix: &str,
) -> Cursor {
    let cursor = buffer.clamp_cursor(cursor);
    let lines = resolve_block_range(&cursor, &*buffer);
    let mut group = EditGroup::open(buffer);
    let mut cursor = cursor;
    for line in lines {
        let at = Position::new(line, 0);
        let end = group.insert_text(at, prefix);
        cursor = cursor.after_insert(at, end);
    }
    cursor
}

/// Number every line in the block range `1<delimiter> `, `2<delimiter> `, …
pub fn create_numbered_list<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    cursor: Cursor,
    delimiter: char,
) -> Cursor {
    let cursor = buffer.clamp_cursor(cursor);
    let lines = resolve_block_range(&cursor, &*buffer);
    let mut group = EditGroup::open(buffer);
    let mut cursor = cursor;
    for (n, line) in lines.enumerate() {
        let at = Position::new(line, 0);
        let end = group.insert_text(at, &format!("{}{delimiter} ", n + 1));
        cursor = cursor.after_insert(at, end);
    }
    cursor
}

/// Strip one leading `>` and the spaces right after it from each line.
pub fn remove_blockquote<B: TextBuffer + ?Sized>(buffer: &mut B, cursor: Cursor) -> Cursor {
    let cursor = buffer.clamp_cursor(cursor);
    let lines = resolve_block_range(&cursor, &*buffer);
    let mut group = EditGroup::open(buffer);
    let mut cursor = cursor;
    for line in lines {
        let text = group.line_at(line).unwrap_or_default();
        let Some(rest) = text.strip_prefix('>') else {
            continue;
        };
        let len = 1 + rest.bytes().take_while(|b| *b == b' ').count();
        let (start, end) = (Position::new(line, 0), Position::new(line, len));
        group.delete_range(start, end);
        cursor = cursor.after_delete(start, end);
    }
    cursor
}

/// Tab key.
///
/// With a selection every line in range gets one indentation unit. Without
/// one, list items are nested (numbering restarts at 1, bullets cycle) and
/// anything else is padded to the next tab stop at the cursor.
pub fn indent<B: TextBuffer + ?Sized>(buffer: &mut B, cursor: Cursor, config: &EditorConfig) -> Cursor {
    let cursor = buffer.clamp_cursor(cursor);
    let lines = resolve_block_range(&cursor, &*buffer);
    let mut group = EditGroup::open(buffer);

    if cursor.has_selection() {
        let unit = config.indent_unit();
        let mut cursor = cursor;
        for line in lines {
            let at = Position::new(line, 0);
            let end = group.insert_text(at, &unit);
            cursor = cursor.after_insert(at, end);
        }
        return cursor;
    }

    let line = *lines.start();
    let text = group.line_at(line).unwrap_or_default();
    let line_match = match_line(&text);
    match line_match.kind {
        StructuralKind::NumberedListItem { .. } => {
            let mut cursor = cursor;
            if let Some(span) = number_span(&text, &line_match) {
                let (start, end) = (Position::new(line, span.start), Position::new(line, span.end));
                let new_end = group.replace_range(start, end, "1");
                cursor = cursor.after_replace(start, end, new_end);
            }
            nest_list_item(&mut *group, cursor, line, config)
        }
        StructuralKind::BulletListItem { marker, .. } => {
            if config.bullet_cycling() {
                let next = next_bullet(marker);
                debug!(line, from = %marker, to = %next, "cycling bullet forward");
                replace_marker(&mut *group, line, line_match.marker_start, next);
            }
            nest_list_item(&mut *group, cursor, line, config)
        }
        StructuralKind::TaskListItem { .. } => nest_list_item(&mut *group, cursor, line, config),
        StructuralKind::Plain | StructuralKind::Blockquote { .. } => {
            let col = floor_char_boundary(&text, cursor.col);
            let column = text[..col].chars().count();
            let at = Position::new(line, col);
            let end = group.insert_text(at, &config.indent_to_next_stop(column));
            Cursor::from(end)
        }
    }
}

/// Insert one indentation unit at the start of `line`, carrying the cursor.
fn nest_list_item<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    cursor: Cursor,
    line: usize,
    config: &EditorConfig,
) -> Cursor {
    let at = Position::new(line, 0);
    let end = buffer.insert_text(at, &config.indent_unit());
    cursor.after_insert(at, end)
}

/// Swap the one-character marker at `col`.
fn replace_marker<B: TextBuffer + ?Sized>(buffer: &mut B, line: usize, col: usize, marker: char) {
    buffer.replace_range(
        Position::new(line, col),
        Position::new(line, col + 1),
        marker.encode_utf8(&mut [0; 4]),
    );
}

/// Shift+Tab.
///
/// Each line in range loses one leading tab, or else up to `tab_width`
/// leading spaces. A lone bullet line then cycles its marker backward.
pub fn unindent<B: TextBuffer + ?Sized>(buffer: &mut B, cursor: Cursor, config: &EditorConfig) -> Cursor {
    let cursor = buffer.clamp_cursor(cursor);
    let lines = resolve_block_range(&cursor, &*buffer);
    let mut group = EditGroup::open(buffer);
    let mut next_cursor = cursor;

    for line in lines.clone() {
        let text = group.line_at(line).unwrap_or_default();
        let len = if text.starts_with('\t') {
            1
        } else {
            text.bytes()
                .take(config.tab_width())
                .take_while(|b| *b == b' ')
                .count()
        };
        if len == 0 {
            continue;
        }
        let (start, end) = (Position::new(line, 0), Position::new(line, len));
        group.delete_range(start, end);
        next_cursor = next_cursor.after_delete(start, end);
    }

    if !cursor.has_selection() && config.bullet_cycling() {
        let line = *lines.start();
        let text = group.line_at(line).unwrap_or_default();
        let line_match = match_line(&text);
        if let StructuralKind::BulletListItem { marker, .. } = line_match.kind {
            let previous = previous_bullet(marker);
            debug!(line, from = %marker, to = %previous, "cycling bullet backward");
            replace_marker(&mut *group, line, line_match.marker_start, previous);
        }
    }
    next_cursor
}

/// Flip the checkbox of every task item in range between `x` and space.
pub fn toggle_task_complete<B: TextBuffer + ?Sized>(buffer: &mut B, cursor: Cursor) -> Cursor {
    let cursor = buffer.clamp_cursor(cursor);
    let lines = resolve_block_range(&cursor, &*buffer);
    let mut group = EditGroup::open(buffer);
    for line in lines {
        let text = group.line_at(line).unwrap_or_default();
        let line_match = match_line(&text);
        let StructuralKind::TaskListItem { checked, .. } = line_match.kind else {
            continue;
        };
        let Some(offset) = checkbox_offset(&text, &line_match) else {
            continue;
        };
        let mark = if checked { " " } else { "x" };
        group.replace_range(Position::new(line, offset), Position::new(line, offset + 1), mark);
    }
    cursor
}

/// What a new line starts with after Enter.
#[derive(Debug, PartialEq, Eq)]
enum Continuation {
    /// Text to write after the line break.
    Carry(String),
    /// The current line is an empty list item: drop its marker and end the list.
    EndList,
}

/// Enter key: break the line and continue the current block.
///
/// List items carry their marker (numbers incremented, task boxes cleared),
/// blockquotes carry their full quote prefix, and other lines keep their
/// indentation. Enter on an empty list item ends the list instead. Breaking
/// a line in the middle only carries indentation.
pub fn handle_carriage_return<B: TextBuffer + ?Sized>(buffer: &mut B, cursor: Cursor) -> Cursor {
    let mut cursor = buffer.clamp_cursor(cursor);
    let mut group = EditGroup::open(buffer);
    if let Some((start, end)) = cursor.selection_range() {
        group.delete_range(start, end);
        cursor = Cursor::from(start);
    }

    let line = cursor.line;
    let text = group.line_at(line).unwrap_or_default();
    let newline = group.line_break(line);
    let col = floor_char_boundary(&text, cursor.col);

    let continuation = if col < text.len() {
        let indent = leading_whitespace(&text);
        Continuation::Carry(indent[..floor_char_boundary(indent, col)].to_string())
    } else {
        continuation_at_end_of_line(&text, &match_line(&text))
    };

    match continuation {
        Continuation::Carry(prefix) => {
            let end = group.insert_text(Position::new(line, col), &format!("{newline}{prefix}"));
            Cursor::from(end)
        }
        Continuation::EndList => {
            debug!(line, "empty list item ends the list");
            let indent = leading_whitespace(&text).len();
            let start = Position::new(line, indent);
            group.delete_range(start, Position::new(line, text.len()));
            let end = group.insert_text(start, newline);
            Cursor::from(end)
        }
    }
}

fn continuation_at_end_of_line(text: &str, line_match: &LineMatch) -> Continuation {
    let prefix = line_match.prefix(text);
    match line_match.kind {
        _ if line_match.is_empty_item(text) => Continuation::EndList,
        StructuralKind::NumberedListItem { number, .. } => match number_span(text, line_match) {
            Some(span) => Continuation::Carry(format!(
                "{}{}{}",
                &prefix[..span.start],
                number.saturating_add(1),
                &prefix[span.end..]
            )),
            None => Continuation::Carry(prefix.to_string()),
        },
        StructuralKind::TaskListItem { .. } => match checkbox_offset(text, line_match) {
            Some(offset) => Continuation::Carry(format!(
                "{} {}",
                &prefix[..offset],
                &prefix[offset + 1..]
            )),
            None => Continuation::Carry(prefix.to_string()),
        },
        StructuralKind::BulletListItem { .. } | StructuralKind::Blockquote { .. } => {
            Continuation::Carry(prefix.to_string())
        }
        StructuralKind::Plain => Continuation::Carry(leading_whitespace(text).to_string()),
    }
}

/// Backspace key.
///
/// Inside a list or quote marker the whole marker region goes in one step.
/// The deletion runs to the end of the line, so text after the marker is
/// discarded along with it. Between an auto-matched pair both delimiters go.
/// Everything else, including any selection, is left to the caller.
pub fn handle_backspace_key<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    cursor: Cursor,
    pairs: &PairedDelimiters,
) -> KeyOutcome {
    let cursor = buffer.clamp_cursor(cursor);
    if cursor.has_selection() {
        return KeyOutcome::Unhandled;
    }
    let Some(text) = buffer.line_at(cursor.line) else {
        return KeyOutcome::Unhandled;
    };

    let line_match = match_line(&text);
    if !line_match.kind.is_plain()
        && line_match.marker_start < cursor.col
        && cursor.col <= line_match.prefix_len
    {
        let start = Position::new(cursor.line, line_match.marker_start);
        debug!(line = cursor.line, kind = ?line_match.kind, "removing marker region");
        let mut group = EditGroup::open(buffer);
        group.delete_range(start, Position::new(cursor.line, text.len()));
        return KeyOutcome::Handled(Cursor::from(start));
    }

    delete_matched_pair(buffer, cursor, pairs)
}

/// Wrap the selection in `markup`, or insert an empty pair around the cursor.
///
/// A wrapped selection stays selected, delimiters excluded.
pub fn insert_formatting_markup<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    cursor: Cursor,
    markup: Markup,
) -> Cursor {
    let cursor = buffer.clamp_cursor(cursor);
    let token = markup.token();
    let mut group = EditGroup::open(buffer);
    if let Some((start, end)) = cursor.selection_range() {
        let inner_start = group.insert_text(start, token);
        let inner_end = end.after_insert(start, inner_start);
        group.insert_text(inner_end, token);
        return Cursor::selecting(inner_start, inner_end);
    }
    let between = group.insert_text(cursor.position(), token);
    group.insert_text(between, token);
    Cursor::from(between)
}

const COMMENT_OPEN: &str = "<!-- ";
const COMMENT_CLOSE: &str = " -->";

/// Turn the selection into an HTML comment, or insert an empty one with the
/// cursor inside.
pub fn insert_comment<B: TextBuffer + ?Sized>(buffer: &mut B, cursor: Cursor) -> Cursor {
    let cursor = buffer.clamp_cursor(cursor);
    let mut group = EditGroup::open(buffer);
    if let Some((start, end)) = cursor.selection_range() {
        let inner = group.text_range(start, end);
        let end = group.replace_range(start, end, &format!("{COMMENT_OPEN}{inner}{COMMENT_CLOSE}"));
        return Cursor::from(end);
    }
    let at = cursor.position();
    let inside = group.insert_text(at, COMMENT_OPEN);
    group.insert_text(inside, COMMENT_CLOSE);
    Cursor::from(inside)
}
