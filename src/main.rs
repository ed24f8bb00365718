//! mdcraft - markdown-aware structural editing from the command line.
//!
//! # Usage
//!
//! ```bash
//! mdcraft notes.md --at 3:9 -c enter
//! mdcraft notes.md --select-from 1:1 --at 4:1 -c numbered -c indent --in-place
//! mdcraft notes.md --at 2:4 --focus sentence --report
//! ```

use std::fmt::Write as _;
use std::fs;
use std::ops::Range;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use mdcraft::config::{
    ConfigFlags, EditorConfig, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use mdcraft::editor::{Command, Cursor, EditorSession, FocusMode, PairedDelimiters, Position};

/// Markdown-aware structural editing for plain-text buffers
#[derive(Parser, Debug)]
#[command(name = "mdcraft", version, about, long_about = None)]
struct Cli {
    /// Markdown file to edit
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Cursor position, 1-based (column counts bytes)
    #[arg(long, value_name = "LINE:COL", value_parser = parse_position)]
    at: Option<Position>,

    /// Select from this position to the cursor
    #[arg(long, value_name = "LINE:COL", value_parser = parse_position)]
    select_from: Option<Position>,

    /// Command to run (bold, bullet:-, numbered:), enter, tab, type:TEXT, ...); repeatable
    #[arg(short = 'c', long = "command", value_name = "COMMAND")]
    commands: Vec<Command>,

    /// Write the result back to FILE instead of printing it
    #[arg(short, long)]
    in_place: bool,

    /// Print the final cursor and focus ranges to stderr
    #[arg(long)]
    report: bool,

    /// Columns per tab stop
    #[arg(long, value_name = "N")]
    tab_width: Option<usize>,

    /// Indent with spaces instead of tab characters
    #[arg(long)]
    insert_spaces: bool,

    /// Keep bullet markers unchanged on indent/unindent
    #[arg(long)]
    no_bullet_cycling: bool,

    /// Disable automatic closing of paired delimiters
    #[arg(long)]
    no_auto_match: bool,

    /// Disable automatic closing for these openers only
    #[arg(long, value_name = "CHARS")]
    no_auto_match_for: Option<String>,

    /// Add or change a delimiter pair, given as two characters (e.g. «»)
    #[arg(long, value_name = "OC")]
    pair: Vec<String>,

    /// Focus mode used for --report
    #[arg(long, value_enum)]
    focus: Option<FocusMode>,

    /// Ignore Backspace and Delete
    #[arg(long)]
    hemingway: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn parse_position(s: &str) -> Result<Position, String> {
    let (line, col) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LINE:COL, got '{s}'"))?;
    let parse = |part: &str| {
        part.parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("'{part}' is not a positive number"))
    };
    Ok(Position::new(parse(line)? - 1, parse(col)? - 1))
}

fn format_position(pos: Position) -> String {
    format!("{}:{}", pos.line + 1, pos.col + 1)
}

fn format_span(span: Option<&Range<Position>>) -> String {
    span.map_or_else(
        || "none".to_string(),
        |span| format!("{}-{}", format_position(span.start), format_position(span.end)),
    )
}

fn report(session: &EditorSession) -> String {
    let cursor = session.cursor();
    let mut out = format!("cursor {}\n", format_position(cursor.position()));
    if let Some((start, end)) = cursor.selection_range() {
        let _ = writeln!(out, "selection {}-{}", format_position(start), format_position(end));
    }
    let mode = session.config().focus_mode();
    if mode == FocusMode::Disabled {
        out.push_str("focus disabled\n");
    } else {
        let focus = session.focus_ranges();
        let _ = writeln!(
            out,
            "focus {} before {} after {}",
            mode.as_str(),
            format_span(focus.before.as_ref()),
            format_span(focus.after.as_ref())
        );
    }
    out
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args).context("Invalid command-line flags")?;

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let text = fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;

    let mut config = EditorConfig::default();
    let mut pairs = PairedDelimiters::default();
    effective.apply(&mut config, &mut pairs);
    let mut session = EditorSession::new(&text).with_config(config).with_pairs(pairs);

    let head = cli.at.unwrap_or_default();
    session.set_cursor(match cli.select_from {
        Some(anchor) => Cursor::selecting(anchor, head),
        None => Cursor::from(head),
    });

    for command in &cli.commands {
        debug!(%command, "running command");
        session.execute(command);
    }

    let edited = session.text();
    if cli.in_place {
        if edited == text {
            debug!(file = %cli.file.display(), "no changes, leaving file untouched");
        } else {
            fs::write(&cli.file, &edited)
                .with_context(|| format!("Failed to write {}", cli.file.display()))?;
        }
    } else {
        print!("{edited}");
    }
    if cli.report {
        eprint!("{}", report(&session));
    }
    Ok(())
}
