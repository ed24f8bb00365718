//! Automatic pairing of markdown delimiters.
//!
//! Typing an opener inserts its closer (or wraps a single-line selection),
//! typing a closer in front of an identical one skips over it, and
//! backspace between an adjacent pair removes both.

use tracing::debug;

use super::buffer::{Cursor, EditGroup, KeyOutcome, Position, TextBuffer};

/// Opener/closer pairs enabled out of the box.
pub const DEFAULT_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('(', ')'),
    ('[', ']'),
    ('{', '}'),
    ('*', '*'),
    ('_', '_'),
    ('`', '`'),
    ('<', '>'),
];

/// One entry of the delimiter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterPair {
    pub open: char,
    pub close: char,
    /// Whether typing `open` inserts `close` automatically.
    pub auto_match: bool,
}

/// Ordered opener → closer table with per-opener auto-match flags.
///
/// Each opener appears at most once. An opener may map to itself, which
/// gives symmetric pairs such as quotes and emphasis markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedDelimiters {
    pairs: Vec<DelimiterPair>,
    enabled: bool,
}

impl Default for PairedDelimiters {
    fn default() -> Self {
        Self::new(DEFAULT_PAIRS.iter().copied())
    }
}

impl PairedDelimiters {
    /// Build a table; later duplicates of an opener replace earlier ones.
    pub fn new(pairs: impl IntoIterator<Item = (char, char)>) -> Self {
        let mut table = Self::empty();
        for (open, close) in pairs {
            table.set_pair(open, close);
        }
        table
    }

    /// A table with no pairs and auto-matching switched on.
    pub const fn empty() -> Self {
        Self {
            pairs: Vec::new(),
            enabled: true,
        }
    }

    /// Global auto-match switch.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Add a pair, or change the closer of an existing opener in place.
    pub fn set_pair(&mut self, open: char, close: char) {
        if let Some(pair) = self.pairs.iter_mut().find(|pair| pair.open == open) {
            pair.close = close;
        } else {
            self.pairs.push(DelimiterPair {
                open,
                close,
                auto_match: true,
            });
        }
    }

    /// Remove the pair for `open`. Returns whether one existed.
    pub fn remove_pair(&mut self, open: char) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|pair| pair.open != open);
        self.pairs.len() != before
    }

    /// Enable or disable auto-matching for one opener.
    ///
    /// Returns `false` if `open` is not in the table.
    pub fn set_auto_match_enabled(&mut self, open: char, enabled: bool) -> bool {
        self.pairs
            .iter_mut()
            .find(|pair| pair.open == open)
            .map(|pair| pair.auto_match = enabled)
            .is_some()
    }

    pub fn closer_for(&self, open: char) -> Option<char> {
        self.find(open).map(|pair| pair.close)
    }

    /// The first opener (in table order) whose closer is `close`.
    pub fn opener_for(&self, close: char) -> Option<char> {
        self.pairs
            .iter()
            .find(|pair| pair.close == close)
            .map(|pair| pair.open)
    }

    /// Auto-matching is on both globally and for `open`.
    pub fn auto_matches(&self, open: char) -> bool {
        self.enabled && self.find(open).is_some_and(|pair| pair.auto_match)
    }

    pub fn pairs(&self) -> &[DelimiterPair] {
        &self.pairs
    }

    fn find(&self, open: char) -> Option<&DelimiterPair> {
        self.pairs.iter().find(|pair| pair.open == open)
    }
}

/// Handle a typed opener.
///
/// A selection on one line is wrapped and stays selected (delimiters
/// excluded). Without a selection the pair is inserted with the cursor
/// between, provided auto-matching is on for `ch`.
pub fn insert_paired_characters<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    cursor: Cursor,
    pairs: &PairedDelimiters,
    ch: char,
) -> KeyOutcome {
    let cursor = buffer.clamp_cursor(cursor);
    let Some(close) = pairs.closer_for(ch) else {
        return KeyOutcome::Unhandled;
    };

    if let Some((start, end)) = cursor.selection_range() {
        if start.line != end.line {
            return KeyOutcome::Unhandled;
        }
        let mut group = EditGroup::open(buffer);
        let inner_start = group.insert_text(start, ch.encode_utf8(&mut [0; 4]));
        let inner_end = end.after_insert(start, inner_start);
        group.insert_text(inner_end, close.encode_utf8(&mut [0; 4]));
        debug!(open = %ch, close = %close, "wrapped selection");
        return KeyOutcome::Handled(Cursor::selecting(inner_start, inner_end));
    }

    if !pairs.auto_matches(ch) {
        return KeyOutcome::Unhandled;
    }
    let mut group = EditGroup::open(buffer);
    let between = group.insert_text(cursor.position(), ch.encode_utf8(&mut [0; 4]));
    group.insert_text(between, close.encode_utf8(&mut [0; 4]));
    KeyOutcome::Handled(Cursor::from(between))
}

/// Handle a typed closer: step over an identical closer right after the
/// cursor instead of inserting a second one.
pub fn handle_end_pair_character_typed<B: TextBuffer + ?Sized>(
    buffer: &B,
    cursor: Cursor,
    pairs: &PairedDelimiters,
    ch: char,
) -> KeyOutcome {
    let cursor = buffer.clamp_cursor(cursor);
    if cursor.has_selection() {
        return KeyOutcome::Unhandled;
    }
    let Some(open) = pairs.opener_for(ch) else {
        return KeyOutcome::Unhandled;
    };
    if !pairs.auto_matches(open) {
        return KeyOutcome::Unhandled;
    }

    let text = buffer.line_at(cursor.line).unwrap_or_default();
    let next = text.get(cursor.col..).and_then(|rest| rest.chars().next());
    if next == Some(ch) {
        debug!(close = %ch, "skipped over existing closer");
        return KeyOutcome::Handled(Cursor::at(cursor.line, cursor.col + ch.len_utf8()));
    }
    KeyOutcome::Unhandled
}

/// Backspace between an auto-matched opener and its closer removes both.
pub fn delete_matched_pair<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    cursor: Cursor,
    pairs: &PairedDelimiters,
) -> KeyOutcome {
    let cursor = buffer.clamp_cursor(cursor);
    if cursor.has_selection() || cursor.col == 0 {
        return KeyOutcome::Unhandled;
    }
    let text = buffer.line_at(cursor.line).unwrap_or_default();
    let (Some(before), Some(after)) = (text.get(..cursor.col), text.get(cursor.col..)) else {
        return KeyOutcome::Unhandled;
    };
    let (Some(prev), Some(next)) = (before.chars().next_back(), after.chars().next()) else {
        return KeyOutcome::Unhandled;
    };
    if !pairs.auto_matches(prev) || pairs.closer_for(prev) != Some(next) {
        return KeyOutcome::Unhandled;
    }

    let start = Position::new(cursor.line, cursor.col - prev.len_utf8());
    let end = Position::new(cursor.line, cursor.col + next.len_utf8());
    let mut group = EditGroup::open(buffer);
    group.delete_range(start, end);
    KeyOutcome::Handled(Cursor::from(start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::buffer::EditorBuffer;

    fn type_char(buf: &mut EditorBuffer, cursor: Cursor, pairs: &PairedDelimiters, ch: char) -> Cursor {
        if let KeyOutcome::Handled(next) = handle_end_pair_character_typed(buf, cursor, pairs, ch) {
            return next;
        }
        if let KeyOutcome::Handled(next) = insert_paired_characters(buf, cursor, pairs, ch) {
            return next;
        }
        let end = buf.insert_text(cursor.position(), &ch.to_string());
        Cursor::from(end)
    }

    // --- Table configuration ---

    #[test]
    fn test_default_table() {
        let pairs = PairedDelimiters::default();
        assert_eq!(pairs.pairs().len(), 9);
        assert_eq!(pairs.closer_for('('), Some(')'));
        assert_eq!(pairs.closer_for('<'), Some('>'));
        assert_eq!(pairs.opener_for(']'), Some('['));
        assert!(DEFAULT_PAIRS.iter().all(|(open, _)| pairs.auto_matches(*open)));
    }

    #[test]
    fn test_set_pair_updates_in_place() {
        let mut pairs = PairedDelimiters::default();
        pairs.set_pair('(', ']');
        assert_eq!(pairs.pairs()[2].close, ']');
        pairs.set_pair('«', '»');
        assert_eq!(pairs.pairs().last().map(|p| p.open), Some('«'));
    }

    #[test]
    fn test_remove_pair() {
        let mut pairs = PairedDelimiters::default();
        assert!(pairs.remove_pair('<'));
        assert!(!pairs.remove_pair('<'));
        assert_eq!(pairs.closer_for('<'), None);
    }

    #[test]
    fn test_per_opener_and_global_switches() {
        let mut pairs = PairedDelimiters::default();
        assert!(pairs.set_auto_match_enabled('*', false));
        assert!(!pairs.auto_matches('*'));
        assert!(!pairs.set_auto_match_enabled('#', false));

        pairs.set_enabled(false);
        assert!(!pairs.auto_matches('('));
    }

    // --- Insertion ---

    #[test]
    fn test_open_then_close_is_never_doubled() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::empty();
        let cursor = type_char(&mut buf, Cursor::new(), &pairs, '(');
        assert_eq!(buf.text(), "()");
        assert_eq!(cursor, Cursor::at(0, 1));

        let cursor = type_char(&mut buf, cursor, &pairs, ')');
        assert_eq!(buf.text(), "()");
        assert_eq!(cursor, Cursor::at(0, 2));
    }

    #[test]
    fn test_wrap_selection_keeps_inner_text_selected() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::from_text("hello");
        let cursor = Cursor::selecting(Position::new(0, 0), Position::new(0, 5));
        let outcome = insert_paired_characters(&mut buf, cursor, &pairs, '"');
        assert_eq!(buf.text(), "\"hello\"");
        let KeyOutcome::Handled(cursor) = outcome else {
            panic!("wrapping should be handled");
        };
        assert_eq!(cursor.selection_range(), Some((Position::new(0, 1), Position::new(0, 6))));
        assert_eq!(buf.text_range(Position::new(0, 1), Position::new(0, 6)), "hello");
    }

    #[test]
    fn test_wrap_is_one_undo_step() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::from_text("a word here");
        let cursor = Cursor::selecting(Position::new(0, 6), Position::new(0, 2));
        insert_paired_characters(&mut buf, cursor, &pairs, '[');
        assert_eq!(buf.text(), "a [word] here");
        buf.undo();
        assert_eq!(buf.text(), "a word here");
    }

    #[test]
    fn test_multi_line_selection_is_not_wrapped() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::from_text("one\ntwo");
        let cursor = Cursor::selecting(Position::new(0, 1), Position::new(1, 1));
        assert_eq!(
            insert_paired_characters(&mut buf, cursor, &pairs, '('),
            KeyOutcome::Unhandled
        );
        assert_eq!(buf.text(), "one\ntwo");
    }

    #[test]
    fn test_wrap_ignores_auto_match_switch() {
        let mut pairs = PairedDelimiters::default();
        pairs.set_enabled(false);
        let mut buf = EditorBuffer::from_text("x");
        let cursor = Cursor::selecting(Position::new(0, 0), Position::new(0, 1));
        assert!(insert_paired_characters(&mut buf, cursor, &pairs, '_').is_handled());
        assert_eq!(buf.text(), "_x_");
    }

    #[test]
    fn test_disabled_opener_inserts_nothing() {
        let mut pairs = PairedDelimiters::default();
        pairs.set_auto_match_enabled('`', false);
        let mut buf = EditorBuffer::empty();
        assert_eq!(
            insert_paired_characters(&mut buf, Cursor::new(), &pairs, '`'),
            KeyOutcome::Unhandled
        );
        assert_eq!(buf.text(), "");
    }

    #[test]
    fn test_unknown_character_is_unhandled() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::empty();
        assert_eq!(
            insert_paired_characters(&mut buf, Cursor::new(), &pairs, 'a'),
            KeyOutcome::Unhandled
        );
    }

    // --- Skip-over ---

    #[test]
    fn test_closer_without_match_ahead_is_unhandled() {
        let pairs = PairedDelimiters::default();
        let buf = EditorBuffer::from_text("(x");
        assert_eq!(
            handle_end_pair_character_typed(&buf, Cursor::at(0, 2), &pairs, ')'),
            KeyOutcome::Unhandled
        );
    }

    #[test]
    fn test_symmetric_pair_skips_over_quote() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::empty();
        let cursor = type_char(&mut buf, Cursor::new(), &pairs, '"');
        let cursor = type_char(&mut buf, cursor, &pairs, 'a');
        let cursor = type_char(&mut buf, cursor, &pairs, '"');
        assert_eq!(buf.text(), "\"a\"");
        assert_eq!(cursor, Cursor::at(0, 3));
    }

    #[test]
    fn test_skip_over_respects_disabled_opener() {
        let mut pairs = PairedDelimiters::default();
        pairs.set_auto_match_enabled('(', false);
        let buf = EditorBuffer::from_text("()");
        assert_eq!(
            handle_end_pair_character_typed(&buf, Cursor::at(0, 1), &pairs, ')'),
            KeyOutcome::Unhandled
        );
    }

    #[test]
    fn test_self_mapped_opener() {
        let mut pairs = PairedDelimiters::empty();
        pairs.set_pair('|', '|');
        let mut buf = EditorBuffer::empty();
        let cursor = type_char(&mut buf, Cursor::new(), &pairs, '|');
        let cursor = type_char(&mut buf, cursor, &pairs, '|');
        assert_eq!(buf.text(), "||");
        assert_eq!(cursor, Cursor::at(0, 2));
    }

    // --- Pair deletion ---

    #[test]
    fn test_delete_matched_pair() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::from_text("say {} now");
        let outcome = delete_matched_pair(&mut buf, Cursor::at(0, 5), &pairs);
        assert_eq!(outcome, KeyOutcome::Handled(Cursor::at(0, 4)));
        assert_eq!(buf.text(), "say  now");
    }

    #[test]
    fn test_delete_mismatched_pair_is_unhandled() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::from_text("(]");
        assert_eq!(
            delete_matched_pair(&mut buf, Cursor::at(0, 1), &pairs),
            KeyOutcome::Unhandled
        );
    }

    #[test]
    fn test_delete_pair_at_line_edges_is_unhandled() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::from_text("()");
        assert_eq!(
            delete_matched_pair(&mut buf, Cursor::at(0, 0), &pairs),
            KeyOutcome::Unhandled
        );
        assert_eq!(
            delete_matched_pair(&mut buf, Cursor::at(0, 2), &pairs),
            KeyOutcome::Unhandled
        );
    }

    #[test]
    fn test_selection_past_the_end_is_clamped() {
        let pairs = PairedDelimiters::default();
        let mut buf = EditorBuffer::from_text("abc");
        let cursor = Cursor::selecting(Position::new(5, 0), Position::new(6, 0));
        let outcome = insert_paired_characters(&mut buf, cursor, &pairs, '(');
        assert_eq!(outcome, KeyOutcome::Handled(Cursor::at(0, 4)));
        assert_eq!(buf.text(), "abc()");

        let outcome = handle_end_pair_character_typed(&buf, Cursor::at(0, 40), &pairs, ')');
        assert_eq!(outcome, KeyOutcome::Unhandled);
        let outcome = delete_matched_pair(&mut buf, Cursor::at(3, 4), &pairs);
        assert_eq!(outcome, KeyOutcome::Handled(Cursor::at(0, 3)));
        assert_eq!(buf.text(), "abc");
    }
}
