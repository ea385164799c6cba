// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for notegrep
//!
//! Loads configuration from .notegreprc.toml in current directory or
//! ~/.config/notegrep/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TITLE_MATCH_CHAR: char = '!';
pub const DEFAULT_START_SEARCH_LENGTH: usize = 3;
pub const DEFAULT_KEYSTROKE_DELAY_MS: u64 = 150;
pub const DEFAULT_REDRAW_INTERVAL_MS: u64 = 200;
pub const DEFAULT_FILE_EXTENSION: &str = "txt";
pub const DEFAULT_PREVIEW_MAX_LINES: usize = 200;
pub const DEFAULT_PREVIEW_LONG_LINE: usize = 100;
pub const DEFAULT_PREVIEW_CONTEXT_CHARS: usize = 80;
pub const DEFAULT_SHORT_PAGE_LINES: usize = 50;

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutputFormat {
    #[default]
    Text,
    Json,
}

/// How a selected page is shown while browsing results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewMode {
    /// Snippet first; short pages go straight to the full view
    #[default]
    PreviewThenFull,
    PreviewOnly,
    FullOnly,
}

/// Configuration loaded from .notegreprc.toml or ~/.config/notegrep/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notebook folder used when --notebook is not given
    pub notebook: Option<PathBuf>,
    /// Default output format (text or json)
    pub default_format: Option<String>,
    pub search: SearchConfig,
    pub preview: PreviewConfig,
}

/// `[search]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Queries starting with this character match page titles only
    pub title_match_char: Option<String>,
    /// Full-text search starts once the query has this many characters
    pub start_search_length: Option<usize>,
    /// Debounce before the full-text scan starts
    pub keystroke_delay_ms: Option<u64>,
    /// Minimum interval between redraws while a scan streams results
    pub redraw_interval_ms: Option<u64>,
    /// Subpages matching only by their ancestor's name need a content hit
    pub ignore_subpages: Option<bool>,
    /// Report a unique result as ready to be opened
    pub open_when_unique: Option<bool>,
    /// Extension of page files inside the notebook folder
    pub file_extension: Option<String>,
}

/// `[preview]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub max_lines: Option<usize>,
    pub long_line: Option<usize>,
    pub context_chars: Option<usize>,
    /// Show only matching lines even for short pages
    pub short: Option<bool>,
    pub mode: Option<PreviewMode>,
    pub short_page_lines: Option<usize>,
}

/// Resolved search tunables consumed by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub title_match_char: char,
    pub start_search_length: usize,
    pub keystroke_delay: Duration,
    pub redraw_interval: Duration,
    pub ignore_subpages: bool,
    pub open_when_unique: bool,
    pub file_extension: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            title_match_char: DEFAULT_TITLE_MATCH_CHAR,
            start_search_length: DEFAULT_START_SEARCH_LENGTH,
            keystroke_delay: Duration::from_millis(DEFAULT_KEYSTROKE_DELAY_MS),
            redraw_interval: Duration::from_millis(DEFAULT_REDRAW_INTERVAL_MS),
            ignore_subpages: false,
            open_when_unique: true,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }
}

/// Resolved snippet tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSettings {
    pub max_lines: usize,
    pub long_line: usize,
    pub context_chars: usize,
    pub short: bool,
    pub mode: PreviewMode,
    pub short_page_lines: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_PREVIEW_MAX_LINES,
            long_line: DEFAULT_PREVIEW_LONG_LINE,
            context_chars: DEFAULT_PREVIEW_CONTEXT_CHARS,
            short: false,
            mode: PreviewMode::default(),
            short_page_lines: DEFAULT_SHORT_PAGE_LINES,
        }
    }
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .notegreprc.toml in current directory
    /// 2. ~/.config/notegrep/config.toml
    pub fn load() -> Self {
        if let Some(config) = Self::load_from_path(Path::new(".notegreprc.toml")) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("notegrep").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match Self::parse(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get output format from config, parsing the string to ConfigOutputFormat
    pub fn output_format(&self) -> Option<ConfigOutputFormat> {
        self.default_format
            .as_ref()
            .and_then(|s| match s.to_lowercase().as_str() {
                "json" => Some(ConfigOutputFormat::Json),
                "text" => Some(ConfigOutputFormat::Text),
                _ => None,
            })
    }

    /// Merge CLI notebook path with config (CLI wins)
    pub fn merge_notebook(&self, cli_value: Option<&Path>) -> PathBuf {
        cli_value
            .map(Path::to_path_buf)
            .or_else(|| self.notebook.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn search_settings(&self) -> SearchSettings {
        let defaults = SearchSettings::default();
        let search = &self.search;
        SearchSettings {
            title_match_char: search
                .title_match_char
                .as_deref()
                .and_then(|s| s.chars().next())
                .unwrap_or(defaults.title_match_char),
            start_search_length: search
                .start_search_length
                .unwrap_or(defaults.start_search_length),
            keystroke_delay: search
                .keystroke_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.keystroke_delay),
            redraw_interval: search
                .redraw_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.redraw_interval),
            ignore_subpages: search.ignore_subpages.unwrap_or(defaults.ignore_subpages),
            open_when_unique: search.open_when_unique.unwrap_or(defaults.open_when_unique),
            file_extension: search
                .file_extension
                .as_deref()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or(defaults.file_extension),
        }
    }

    pub fn preview_settings(&self) -> PreviewSettings {
        let defaults = PreviewSettings::default();
        let preview = &self.preview;
        PreviewSettings {
            max_lines: preview.max_lines.unwrap_or(defaults.max_lines).max(1),
            long_line: preview.long_line.unwrap_or(defaults.long_line),
            context_chars: preview.context_chars.unwrap_or(defaults.context_chars),
            short: preview.short.unwrap_or(defaults.short),
            mode: preview.mode.unwrap_or(defaults.mode),
            short_page_lines: preview
                .short_page_lines
                .unwrap_or(defaults.short_page_lines),
        }
    }
}
