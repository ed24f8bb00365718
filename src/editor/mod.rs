//! Markdown-aware editing core.
//!
//! Provides a rope-backed text buffer with grouped undo, a line classifier,
//! and the structural, delimiter and focus engines built on top of them.
//! Every engine takes the cursor explicitly and returns the new one.

mod buffer;
pub mod classify;
pub mod command;
pub mod focus;
pub mod pairs;
mod range;
pub mod session;
pub mod structure;

pub use buffer::{Cursor, EditGroup, EditorBuffer, KeyOutcome, Position, TextBuffer};
pub use classify::{LineMatch, StructuralKind, classify, match_line};
pub use command::{Command, CommandParseError};
pub use focus::{FocusMode, FocusRange, SentenceBoundaries, UnicodeSentences, compute_focus_ranges};
pub use pairs::{DEFAULT_PAIRS, DelimiterPair, PairedDelimiters};
pub use range::resolve_block_range;
pub use session::{EditorSession, Key, TypingEvent, TypingMonitor};
pub use structure::Markup;
