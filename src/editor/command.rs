//! Named editing commands, as accepted on the command line.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::session::Key;

/// A structural command or key press that can be replayed on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Bold,
    Italic,
    Strikethrough,
    Comment,
    /// Bullet list with the given marker (`*`, `-` or `+`).
    Bullet(char),
    /// Numbered list with the given delimiter (`.` or `)`).
    Numbered(char),
    Task,
    Quote,
    Unquote,
    Indent,
    Unindent,
    ToggleTask,
    Undo,
    Redo,
    Key(Key),
    /// Type text one character at a time, `\n` as Enter.
    Type(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("invalid marker '{marker}' for {command} (expected one of {expected})")]
    InvalidMarker {
        command: &'static str,
        marker: String,
        expected: &'static str,
    },
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(text) = s.strip_prefix("type:") {
            return Ok(Self::Type(text.to_string()));
        }
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        let command = match name {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "strikethrough" | "strike" => Self::Strikethrough,
            "comment" => Self::Comment,
            "bullet" => Self::Bullet(marker_arg("bullet", arg, '*', "*-+")?),
            "numbered" => Self::Numbered(marker_arg("numbered", arg, '.', ".)")?),
            "task" => Self::Task,
            "quote" => Self::Quote,
            "unquote" => Self::Unquote,
            "indent" => Self::Indent,
            "unindent" => Self::Unindent,
            "toggle-task" => Self::ToggleTask,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "enter" => Self::Key(Key::Enter {
                shift: false,
                ctrl: false,
            }),
            "shift-enter" => Self::Key(Key::Enter {
                shift: true,
                ctrl: false,
            }),
            "ctrl-enter" => Self::Key(Key::Enter {
                shift: false,
                ctrl: true,
            }),
            "shift-ctrl-enter" => Self::Key(Key::Enter {
                shift: true,
                ctrl: true,
            }),
            "backspace" => Self::Key(Key::Backspace),
            "delete" => Self::Key(Key::Delete),
            "tab" => Self::Key(Key::Tab),
            "backtab" => Self::Key(Key::BackTab),
            _ => return Err(CommandParseError::Unknown(s.to_string())),
        };
        if arg.is_some() && !matches!(command, Self::Bullet(_) | Self::Numbered(_)) {
            return Err(CommandParseError::Unknown(s.to_string()));
        }
        Ok(command)
    }
}

fn marker_arg(
    command: &'static str,
    arg: Option<&str>,
    default: char,
    expected: &'static str,
) -> Result<char, CommandParseError> {
    let Some(arg) = arg else {
        return Ok(default);
    };
    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some(marker), None) if expected.contains(marker) => Ok(marker),
        _ => Err(CommandParseError::InvalidMarker {
            command,
            marker: arg.to_string(),
            expected,
        }),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bold => f.write_str("bold"),
            Self::Italic => f.write_str("italic"),
            Self::Strikethrough => f.write_str("strikethrough"),
            Self::Comment => f.write_str("comment"),
            Self::Bullet(marker) => write!(f, "bullet:{marker}"),
            Self::Numbered(delimiter) => write!(f, "numbered:{delimiter}"),
            Self::Task => f.write_str("task"),
            Self::Quote => f.write_str("quote"),
            Self::Unquote => f.write_str("unquote"),
            Self::Indent => f.write_str("indent"),
            Self::Unindent => f.write_str("unindent"),
            Self::ToggleTask => f.write_str("toggle-task"),
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
            Self::Key(Key::Enter { shift, ctrl }) => f.write_str(match (*shift, *ctrl) {
                (true, true) => "shift-ctrl-enter",
                (true, false) => "shift-enter",
                (false, true) => "ctrl-enter",
                (false, false) => "enter",
            }),
            Self::Key(Key::Backspace) => f.write_str("backspace"),
            Self::Key(Key::Delete) => f.write_str("delete"),
            Self::Key(Key::Tab) => f.write_str("tab"),
            Self::Key(Key::BackTab) => f.write_str("backtab"),
            Self::Key(Key::Char(ch)) => write!(f, "type:{ch}"),
            Self::Type(text) => write!(f, "type:{text}"),
        }
    }
}
