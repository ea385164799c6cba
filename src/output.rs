// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output formatting for search results and previews
//!
//! Views and previews carry markup (`<b>` tags, escaped entities). Text
//! output turns that into terminal styling; JSON output keeps the markup.

use colored::Colorize;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::notebook::PAGE_SEPARATOR;
use crate::query::{Preview, RankedView, ScanStats};

static BOLD_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<b>(.*?)</b>").expect("valid bold span pattern"));

/// Whether stdout should get ANSI colors (`NO_COLOR` turns them off)
pub fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// Serialize a payload, pretty-printed unless `compact`
pub fn to_json<T: Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

/// JSON payload of the `search` command
#[derive(Debug, Serialize)]
pub struct SearchPayload<'a> {
    #[serde(flatten)]
    pub view: &'a RankedView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanSummary>,
    /// Intermediate views, one per keystroke or redraw
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<RankedView>,
    /// Excerpt of the selected page, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScanSummary {
    pub scanned: usize,
    pub matched: usize,
    pub completed: bool,
    pub elapsed_ms: f64,
}

impl From<ScanStats> for ScanSummary {
    fn from(stats: ScanStats) -> Self {
        Self {
            scanned: stats.scanned,
            matched: stats.matched,
            completed: stats.completed,
            elapsed_ms: millis(stats.elapsed),
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// JSON payload of the `preview` command
#[derive(Debug, Serialize)]
pub struct PreviewPayload<'a> {
    pub page: &'a str,
    pub query: &'a str,
    #[serde(flatten)]
    pub preview: &'a Preview,
}

/// Result list for the terminal, one page per line
pub fn render_view(view: &RankedView, use_color: bool) -> String {
    if view.items.is_empty() {
        let message = if view.finished { "No result" } else { "" };
        return if use_color {
            message.red().to_string()
        } else {
            message.to_string()
        };
    }

    let mut lines = Vec::with_capacity(view.items.len());
    for (idx, item) in view.items.iter().enumerate() {
        let selected = Some(idx) == view.caret;
        let marker = match (selected, use_color) {
            (true, true) => "→ ".green().to_string(),
            (true, false) => "→ ".to_string(),
            (false, _) => "  ".to_string(),
        };
        let score = format!("({})", item.score);
        let score = if use_color {
            score.dimmed().to_string()
        } else {
            score
        };
        lines.push(format!("{}{} {}", marker, render_page(&item.page, use_color), score));
    }
    lines.join("\n")
}

/// Page path with its leaf emphasized
pub fn render_page(page: &str, use_color: bool) -> String {
    if !use_color {
        return page.to_string();
    }
    match page.rsplit_once(PAGE_SEPARATOR) {
        Some((parents, leaf)) => format!(
            "{}{}{}",
            parents.blue(),
            PAGE_SEPARATOR.to_string().blue(),
            leaf.bold()
        ),
        None => page.bold().to_string(),
    }
}

/// Preview markup for the terminal: highlights in color, entities decoded
pub fn render_preview(preview: &Preview, use_color: bool) -> String {
    let text = BOLD_SPAN.replace_all(&preview.text, |caps: &Captures| {
        let inner = &caps[1];
        if use_color {
            format!("{}", inner.yellow().bold())
        } else {
            inner.to_string()
        }
    });
    unescape_markup(&text)
}

/// Inverse of the escaping applied to previews
pub fn unescape_markup(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
