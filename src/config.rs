use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use thiserror::Error;
use tracing::warn;

use crate::editor::{FocusMode, PairedDelimiters};

/// Settings the structural editing engines consult.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    tab_width: usize,
    insert_spaces_for_tabs: bool,
    bullet_cycling: bool,
    hemingway_mode: bool,
    focus_mode: FocusMode,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            insert_spaces_for_tabs: false,
            bullet_cycling: true,
            hemingway_mode: false,
            focus_mode: FocusMode::Disabled,
        }
    }
}

impl EditorConfig {
    pub const fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// Set the tab width. Widths below 1 are raised to 1.
    pub fn set_tab_width(&mut self, width: usize) {
        self.tab_width = width.max(1);
    }

    pub const fn insert_spaces_for_tabs(&self) -> bool {
        self.insert_spaces_for_tabs
    }

    pub const fn set_insert_spaces_for_tabs(&mut self, enabled: bool) {
        self.insert_spaces_for_tabs = enabled;
    }

    pub const fn bullet_cycling(&self) -> bool {
        self.bullet_cycling
    }

    pub const fn set_bullet_cycling(&mut self, enabled: bool) {
        self.bullet_cycling = enabled;
    }

    /// Whether Backspace and Delete are disabled.
    pub const fn hemingway_mode(&self) -> bool {
        self.hemingway_mode
    }

    pub const fn set_hemingway_mode(&mut self, enabled: bool) {
        self.hemingway_mode = enabled;
    }

    pub const fn focus_mode(&self) -> FocusMode {
        self.focus_mode
    }

    pub const fn set_focus_mode(&mut self, mode: FocusMode) {
        self.focus_mode = mode;
    }

    /// One full level of indentation.
    pub fn indent_unit(&self) -> String {
        if self.insert_spaces_for_tabs {
            " ".repeat(self.tab_width)
        } else {
            "\t".to_string()
        }
    }

    /// Indentation that moves character column `column` to the next tab stop.
    pub fn indent_to_next_stop(&self, column: usize) -> String {
        if self.insert_spaces_for_tabs {
            " ".repeat(self.tab_width - column % self.tab_width)
        } else {
            "\t".to_string()
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid tab width '{0}' (expected a positive integer)")]
    InvalidTabWidth(String),
    #[error("invalid pair '{0}' (expected an opening and a closing character)")]
    InvalidPair(String),
    #[error("invalid focus mode '{0}' (expected disabled, line, three-lines, paragraph or sentence)")]
    InvalidFocusMode(String),
    #[error("missing value for {0}")]
    MissingValue(&'static str),
}

/// Editor flags as given on the command line or in an rc file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub tab_width: Option<usize>,
    pub insert_spaces: bool,
    pub no_bullet_cycling: bool,
    pub no_auto_match: bool,
    /// Openers whose auto-matching is switched off.
    pub no_auto_match_for: Vec<char>,
    /// Extra or replacement delimiter pairs.
    pub pairs: Vec<(char, char)>,
    pub focus: Option<FocusMode>,
    pub hemingway: bool,
}

impl ConfigFlags {
    /// Merge `other` over `self`: options from `other` win, switches and
    /// lists accumulate.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            tab_width: other.tab_width.or(self.tab_width),
            insert_spaces: self.insert_spaces || other.insert_spaces,
            no_bullet_cycling: self.no_bullet_cycling || other.no_bullet_cycling,
            no_auto_match: self.no_auto_match || other.no_auto_match,
            no_auto_match_for: self
                .no_auto_match_for
                .iter()
                .chain(&other.no_auto_match_for)
                .copied()
                .collect(),
            pairs: self.pairs.iter().chain(&other.pairs).copied().collect(),
            focus: other.focus.or(self.focus),
            hemingway: self.hemingway || other.hemingway,
        }
    }

    /// Write these flags onto a session's configuration and delimiter table.
    pub fn apply(&self, config: &mut EditorConfig, pairs: &mut PairedDelimiters) {
        if let Some(width) = self.tab_width {
            config.set_tab_width(width);
        }
        if self.insert_spaces {
            config.set_insert_spaces_for_tabs(true);
        }
        if self.no_bullet_cycling {
            config.set_bullet_cycling(false);
        }
        if self.hemingway {
            config.set_hemingway_mode(true);
        }
        if let Some(mode) = self.focus {
            config.set_focus_mode(mode);
        }
        for &(open, close) in &self.pairs {
            pairs.set_pair(open, close);
        }
        for &open in &self.no_auto_match_for {
            if !pairs.set_auto_match_enabled(open, false) {
                warn!(%open, "ignoring --no-auto-match-for: no pair opens with this character");
            }
        }
        if self.no_auto_match {
            pairs.set_enabled(false);
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("mdcraft").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("mdcraft")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("mdcraft").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("mdcraft").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".mdcraftrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    parse_flag_tokens(&tokens).with_context(|| format!("Invalid config {}", path.display()))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# mdcraft defaults (saved with --save)".to_string()];
    if let Some(width) = flags.tab_width {
        lines.push(format!("--tab-width {width}"));
    }
    if flags.insert_spaces {
        lines.push("--insert-spaces".to_string());
    }
    if flags.no_bullet_cycling {
        lines.push("--no-bullet-cycling".to_string());
    }
    if flags.no_auto_match {
        lines.push("--no-auto-match".to_string());
    }
    if !flags.no_auto_match_for.is_empty() {
        let openers = flags.no_auto_match_for.iter().collect::<String>();
        lines.push(format!("--no-auto-match-for {openers}"));
    }
    for (open, close) in &flags.pairs {
        lines.push(format!("--pair {open}{close}"));
    }
    if let Some(mode) = flags.focus {
        lines.push(format!("--focus {}", mode.as_str()));
    }
    if flags.hemingway {
        lines.push("--hemingway".to_string());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the editor flags out of a token list, skipping anything unknown.
///
/// Value flags accept both `--flag value` and `--flag=value`.
pub fn parse_flag_tokens(tokens: &[String]) -> Result<ConfigFlags, ConfigError> {
    let mut flags = ConfigFlags::default();
    let mut rest = tokens.iter();
    while let Some(token) = rest.next() {
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token.as_str(), None),
        };
        match name {
            "--insert-spaces" => flags.insert_spaces = true,
            "--no-bullet-cycling" => flags.no_bullet_cycling = true,
            "--no-auto-match" => flags.no_auto_match = true,
            "--hemingway" => flags.hemingway = true,
            "--tab-width" => {
                let value = flag_value("--tab-width", inline, &mut rest)?;
                flags.tab_width = Some(parse_tab_width(value)?);
            }
            "--no-auto-match-for" => {
                let value = flag_value("--no-auto-match-for", inline, &mut rest)?;
                flags.no_auto_match_for.extend(value.chars());
            }
            "--pair" => {
                let value = flag_value("--pair", inline, &mut rest)?;
                flags.pairs.push(parse_pair(value)?);
            }
            "--focus" => {
                let value = flag_value("--focus", inline, &mut rest)?;
                flags.focus = Some(parse_focus(value)?);
            }
            _ => {}
        }
    }
    Ok(flags)
}

fn flag_value<'a>(
    flag: &'static str,
    inline: Option<&'a str>,
    rest: &mut std::slice::Iter<'a, String>,
) -> Result<&'a str, ConfigError> {
    inline
        .or_else(|| rest.next().map(String::as_str))
        .ok_or(ConfigError::MissingValue(flag))
}

fn parse_tab_width(s: &str) -> Result<usize, ConfigError> {
    match s.parse::<usize>() {
        Ok(width) if width > 0 => Ok(width),
        _ => Err(ConfigError::InvalidTabWidth(s.to_string())),
    }
}

fn parse_pair(s: &str) -> Result<(char, char), ConfigError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(open), Some(close), None) => Ok((open, close)),
        _ => Err(ConfigError::InvalidPair(s.to_string())),
    }
}

fn parse_focus(s: &str) -> Result<FocusMode, ConfigError> {
    FocusMode::from_str(s, true).map_err(|_| ConfigError::InvalidFocusMode(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "mdcraft",
            "--tab-width",
            "2",
            "--insert-spaces",
            "--no-auto-match-for",
            "*_",
            "--pair=«»",
            "--focus",
            "sentence",
            "--at",
            "3:1",
            "notes.md",
        ]);
        let flags = parse_flag_tokens(&args).unwrap();
        assert_eq!(flags.tab_width, Some(2));
        assert!(flags.insert_spaces);
        assert!(!flags.hemingway);
        assert_eq!(flags.no_auto_match_for, vec!['*', '_']);
        assert_eq!(flags.pairs, vec![('«', '»')]);
        assert_eq!(flags.focus, Some(FocusMode::Sentence));
    }

    #[test]
    fn test_parse_flag_tokens_rejects_bad_values() {
        assert_eq!(
            parse_flag_tokens(&tokens(&["--tab-width", "0"])),
            Err(ConfigError::InvalidTabWidth("0".to_string()))
        );
        assert_eq!(
            parse_flag_tokens(&tokens(&["--tab-width=wide"])),
            Err(ConfigError::InvalidTabWidth("wide".to_string()))
        );
        assert_eq!(
            parse_flag_tokens(&tokens(&["--pair", "(]x"])),
            Err(ConfigError::InvalidPair("(]x".to_string()))
        );
        assert_eq!(
            parse_flag_tokens(&tokens(&["--focus=word"])),
            Err(ConfigError::InvalidFocusMode("word".to_string()))
        );
        assert_eq!(
            parse_flag_tokens(&tokens(&["--focus"])),
            Err(ConfigError::MissingValue("--focus"))
        );
    }

    #[test]
    fn test_pair_value_may_be_an_equals_sign() {
        let flags = parse_flag_tokens(&tokens(&["--pair==="])).unwrap();
        assert_eq!(flags.pairs, vec![('=', '=')]);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            tab_width: Some(8),
            hemingway: true,
            pairs: vec![('|', '|')],
            focus: Some(FocusMode::Paragraph),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            tab_width: Some(2),
            insert_spaces: true,
            pairs: vec![('«', '»')],
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert_eq!(merged.tab_width, Some(2));
        assert!(merged.hemingway);
        assert!(merged.insert_spaces);
        assert_eq!(merged.pairs, vec![('|', '|'), ('«', '»')]);
        assert_eq!(merged.focus, Some(FocusMode::Paragraph));
    }

    #[test]
    fn test_apply_sets_config_and_pairs() {
        let flags = ConfigFlags {
            tab_width: Some(2),
            insert_spaces: true,
            no_bullet_cycling: true,
            no_auto_match_for: vec!['*', '#'],
            pairs: vec![('<', ']')],
            focus: Some(FocusMode::ThreeLines),
            hemingway: true,
            ..ConfigFlags::default()
        };
        let mut config = EditorConfig::default();
        let mut pairs = PairedDelimiters::default();
        flags.apply(&mut config, &mut pairs);

        assert_eq!(config.tab_width(), 2);
        assert!(config.insert_spaces_for_tabs());
        assert!(!config.bullet_cycling());
        assert!(config.hemingway_mode());
        assert_eq!(config.focus_mode(), FocusMode::ThreeLines);
        assert!(!pairs.auto_matches('*'));
        assert!(pairs.auto_matches('_'));
        assert_eq!(pairs.closer_for('<'), Some(']'));
        assert!(pairs.is_enabled());
    }

    #[test]
    fn test_apply_no_auto_match_disables_all() {
        let flags = ConfigFlags {
            no_auto_match: true,
            ..ConfigFlags::default()
        };
        let mut pairs = PairedDelimiters::default();
        flags.apply(&mut EditorConfig::default(), &mut pairs);
        assert!(!pairs.auto_matches('('));
    }

    #[test]
    fn test_editor_config_indentation() {
        let mut config = EditorConfig::default();
        assert_eq!(config.indent_unit(), "\t");
        assert_eq!(config.indent_to_next_stop(3), "\t");
        config.set_insert_spaces_for_tabs(true);
        config.set_tab_width(0);
        assert_eq!(config.tab_width(), 1);
        config.set_tab_width(4);
        assert_eq!(config.indent_unit(), "    ");
        assert_eq!(config.indent_to_next_stop(0), "    ");
        assert_eq!(config.indent_to_next_stop(5), "   ");
        assert_eq!(config.indent_to_next_stop(7), " ");
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".mdcraftrc");
        let flags = ConfigFlags {
            tab_width: Some(3),
            insert_spaces: true,
            no_bullet_cycling: true,
            no_auto_match: true,
            no_auto_match_for: vec!['`'],
            pairs: vec![('«', '»'), ('|', '|')],
            focus: Some(FocusMode::CurrentLine),
            hemingway: true,
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }

    #[test]
    fn test_load_reports_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".mdcraftrc");
        fs::write(&path, "--tab-width none\n").unwrap();
        let err = load_config_flags(&path).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config"));
    }
}
