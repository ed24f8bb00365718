//! Line classification by markdown structural role.
//!
//! Classification is a pure function of one line's text. Results are never
//! cached: any edit can change a line's kind, so callers re-classify on
//! every query.

use std::sync::LazyLock;

use regex::Regex;

static NUMBERED_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]+)([.)])\s+").expect("numbered list pattern should compile")
});

static TASK_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-\s\[([x ])\]\s+").expect("task list pattern should compile")
});

static BULLET_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+*-])\s+").expect("bullet list pattern should compile")
});

static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s{0,3}(>\s*)+").expect("blockquote pattern should compile")
});

/// The markdown role of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralKind {
    Plain,
    /// `1. item` or `1) item`
    NumberedListItem {
        number: u64,
        delimiter: char,
        /// Byte length of the leading whitespace.
        indent: usize,
    },
    /// `* item`, `- item`, `+ item`
    BulletListItem { marker: char, indent: usize },
    /// `- [ ] item` or `- [x] item`
    TaskListItem {
        marker: char,
        indent: usize,
        checked: bool,
    },
    /// `> quote`, `> > nested`
    Blockquote { depth: usize, indent: usize },
}

impl StructuralKind {
    pub const fn is_plain(&self) -> bool {
        matches!(self, Self::Plain)
    }

    /// Numbered, bullet, or task list item.
    pub const fn is_list_item(&self) -> bool {
        matches!(
            self,
            Self::NumberedListItem { .. } | Self::BulletListItem { .. } | Self::TaskListItem { .. }
        )
    }
}

/// A classified line together with the byte offsets of its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch {
    pub kind: StructuralKind,
    /// Offset of the first significant marker character (digit, bullet, `>`).
    pub marker_start: usize,
    /// Length of the whole marker prefix, trailing whitespace included.
    pub prefix_len: usize,
}

impl LineMatch {
    const fn plain() -> Self {
        Self {
            kind: StructuralKind::Plain,
            marker_start: 0,
            prefix_len: 0,
        }
    }

    /// The matched marker prefix of `line`.
    pub fn prefix<'a>(&self, line: &'a str) -> &'a str {
        &line[..self.prefix_len.min(line.len())]
    }

    /// A list item whose line holds nothing but its marker.
    pub const fn is_empty_item(&self, line: &str) -> bool {
        self.kind.is_list_item() && line.len() == self.prefix_len
    }
}

/// Classify a line. Total: anything unrecognized is [`StructuralKind::Plain`].
pub fn classify(line: &str) -> StructuralKind {
    match_line(line).kind
}

/// Classify a line and capture its marker offsets.
///
/// Numbered items win over task items, task items over plain bullets, and
/// bullets over blockquotes.
pub fn match_line(line: &str) -> LineMatch {
    let indent = leading_whitespace(line).len();
    match_numbered(line, indent)
        .or_else(|| match_task(line, indent))
        .or_else(|| match_bullet(line, indent))
        .or_else(|| match_blockquote(line, indent))
        .unwrap_or_else(LineMatch::plain)
}

fn match_numbered(line: &str, indent: usize) -> Option<LineMatch> {
    let caps = NUMBERED_LIST.captures(line)?;
    let (whole, digits, delimiter) = (caps.get(0)?, caps.get(1)?, caps.get(2)?);
    Some(LineMatch {
        kind: StructuralKind::NumberedListItem {
            number: digits.as_str().parse().unwrap_or(u64::MAX),
            delimiter: delimiter.as_str().chars().next()?,
            indent,
        },
        marker_start: digits.start(),
        prefix_len: whole.end(),
    })
}

fn match_task(line: &str, indent: usize) -> Option<LineMatch> {
    let caps = TASK_LIST.captures(line)?;
    let (whole, checkbox) = (caps.get(0)?, caps.get(1)?);
    Some(LineMatch {
        kind: StructuralKind::TaskListItem {
            marker: '-',
            indent,
            checked: checkbox.as_str() == "x",
        },
        marker_start: indent,
        prefix_len: whole.end(),
    })
}

fn match_bullet(line: &str, indent: usize) -> Option<LineMatch> {
    let caps = BULLET_LIST.captures(line)?;
    let (whole, marker) = (caps.get(0)?, caps.get(1)?);
    Some(LineMatch {
        kind: StructuralKind::BulletListItem {
            marker: marker.as_str().chars().next()?,
            indent,
        },
        marker_start: marker.start(),
        prefix_len: whole.end(),
    })
}

fn match_blockquote(line: &str, indent: usize) -> Option<LineMatch> {
    let whole = BLOCKQUOTE.find(line)?;
    let prefix = whole.as_str();
    Some(LineMatch {
        kind: StructuralKind::Blockquote {
            depth: prefix.matches('>').count(),
            indent,
        },
        marker_start: prefix.find('>')?,
        prefix_len: whole.end(),
    })
}

/// The whitespace run a line starts with.
pub fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Offset range of the number in a numbered item's marker.
pub fn number_span(line: &str, line_match: &LineMatch) -> Option<std::ops::Range<usize>> {
    if !matches!(line_match.kind, StructuralKind::NumberedListItem { .. }) {
        return None;
    }
    let start = line_match.marker_start;
    let len = line
        .get(start..)?
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    Some(start..start + len)
}

/// Offset of the checkbox character in a task item (the `x` or space).
pub fn checkbox_offset(line: &str, line_match: &LineMatch) -> Option<usize> {
    if !matches!(line_match.kind, StructuralKind::TaskListItem { .. }) {
        return None;
    }
    let start = line_match.marker_start;
    line.get(start..)?.find('[').map(|open| start + open + 1)
}
