//! Focus mode: which parts of the document fade around the cursor.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use super::buffer::{Cursor, Position, TextBuffer, floor_char_boundary};

/// How much text around the cursor stays sharp.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusMode {
    /// Nothing fades.
    #[default]
    Disabled,
    #[value(name = "line")]
    CurrentLine,
    /// The current line and the two above it.
    ThreeLines,
    /// The blank-line delimited paragraph holding the cursor.
    Paragraph,
    /// The sentence holding the cursor, within the current line.
    Sentence,
}

impl FocusMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::CurrentLine => "line",
            Self::ThreeLines => "three-lines",
            Self::Paragraph => "paragraph",
            Self::Sentence => "sentence",
        }
    }
}

/// Spans to de-emphasize on either side of the sharp range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusRange {
    pub before: Option<Range<Position>>,
    pub after: Option<Range<Position>>,
}

/// Sentence segmentation within a single line.
///
/// Offsets are byte offsets into `text`. `None` means no boundary was
/// found on that side.
pub trait SentenceBoundaries {
    /// Start of the sentence holding `pos`.
    fn previous_boundary(&self, text: &str, pos: usize) -> Option<usize>;

    /// End of the sentence holding `pos`.
    fn next_boundary(&self, text: &str, pos: usize) -> Option<usize>;
}

/// UAX #29 sentence boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentences;

impl SentenceBoundaries for UnicodeSentences {
    fn previous_boundary(&self, text: &str, pos: usize) -> Option<usize> {
        text.split_sentence_bound_indices()
            .map(|(start, _)| start)
            .take_while(|start| *start <= pos)
            .last()
    }

    fn next_boundary(&self, text: &str, pos: usize) -> Option<usize> {
        text.split_sentence_bound_indices()
            .map(|(start, sentence)| start + sentence.len())
            .find(|end| *end > pos)
    }
}

/// Compute the faded spans for `mode` around the cursor head.
pub fn compute_focus_ranges<B: TextBuffer + ?Sized>(
    buffer: &B,
    cursor: &Cursor,
    mode: FocusMode,
    sentences: &dyn SentenceBoundaries,
) -> FocusRange {
    let last = buffer.line_count().saturating_sub(1);
    let line = cursor.line.min(last);
    let line_end = |line: usize| Position::new(line, buffer.line_len(line));

    let sharp = match mode {
        FocusMode::Disabled => return FocusRange::default(),
        FocusMode::CurrentLine => Position::new(line, 0)..line_end(line),
        FocusMode::ThreeLines => Position::new(line.saturating_sub(2), 0)..line_end(line),
        FocusMode::Paragraph => {
            let (first, last) = paragraph_bounds(buffer, line);
            Position::new(first, 0)..line_end(last)
        }
        FocusMode::Sentence => {
            let text = buffer.line_at(line).unwrap_or_default();
            let col = floor_char_boundary(&text, cursor.col);
            let start = sentences.previous_boundary(&text, col).unwrap_or(0);
            let end = sentences.next_boundary(&text, col).unwrap_or(text.len());
            Position::new(line, start)..Position::new(line, end)
        }
    };

    let origin = Position::default();
    let before = (sharp.start > origin).then(|| {
        let end = if sharp.start.col == 0 {
            line_end(sharp.start.line - 1)
        } else {
            sharp.start
        };
        origin..end
    });
    let document_end = buffer.end_position();
    let after = (sharp.end < document_end).then(|| sharp.end..document_end);

    FocusRange { before, after }
}

/// First and last line of the paragraph holding `line`.
///
/// A blank line is a paragraph of its own.
fn paragraph_bounds<B: TextBuffer + ?Sized>(buffer: &B, line: usize) -> (usize, usize) {
    let is_blank = |idx: usize| {
        buffer
            .line_at(idx)
            .is_none_or(|text| text.trim().is_empty())
    };
    if is_blank(line) {
        return (line, line);
    }
    let mut first = line;
    while first > 0 && !is_blank(first - 1) {
        first -= 1;
    }
    let mut last = line;
    while last + 1 < buffer.line_count() && !is_blank(last + 1) {
        last += 1;
    }
    (first, last)
}
