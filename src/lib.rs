// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. editor::EditorBuffer)
    clippy::module_name_repetitions
)]

//! # mdcraft
//!
//! The markdown-aware editing core of a plain-text editor.
//!
//! mdcraft decides how a line-oriented buffer changes on each keystroke
//! or command so that markdown structure stays coherent:
//! - List continuation, renumbering and termination on Enter
//! - Bullet cycling on Tab / Shift+Tab
//! - Blockquote and task-list prefixes
//! - Auto-closing and skip-over of paired delimiters
//! - Focus-mode fade ranges around the cursor
//!
//! ## Architecture
//!
//! Lines are classified on demand by a pure function; nothing about a
//! line's structure is cached. Engines take a [`editor::Cursor`] and return
//! the new one, and every command mutates the buffer inside one
//! [`editor::EditGroup`] so it undoes as a unit.
//!
//! ## Modules
//!
//! - [`editor`]: buffer model, classifier and editing engines
//! - [`config`]: editor settings and rc-file flags

pub mod config;
pub mod editor;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::EditorConfig;
    pub use crate::editor::{
        Command, Cursor, EditorBuffer, EditorSession, FocusMode, Key, KeyOutcome,
        PairedDelimiters, Position, TextBuffer,
    };
}
