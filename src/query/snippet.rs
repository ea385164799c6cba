// SPDX-License-Identifier: MIT OR Apache-2.0

//! Highlighted page excerpts for the preview pane
//!
//! Output is markup: the page text is escaped first, then query terms are
//! wrapped in `<b>` tags.

use once_cell::sync::Lazy;
use regex::{Captures, Regex, RegexBuilder};
use serde::Serialize;

use crate::config::{PreviewMode, PreviewSettings};

/// Never highlighted on its own: it would match inside the `<b>` tags
pub const RESERVED_TERM: &str = "b";
pub const ELLIPSIS: &str = "...";

const ENTITY_PATTERN: &str = r"&[a-zA-Z#0-9]+;";

/// An entity with a highlight tag injected somewhere inside it
static BROKEN_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&[a-z]*<b[^;]*;").expect("valid broken entity pattern"));
static BOLD_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?b>").expect("valid bold tag pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    /// Escaped and highlighted excerpt
    pub text: String,
    /// Lines in the page
    pub line_count: usize,
    /// The page has fewer lines than the short-page threshold
    pub short_page: bool,
    /// The caller should open the whole page rather than this excerpt
    pub prefers_full_view: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SnippetExtractor {
    settings: PreviewSettings,
}

impl SnippetExtractor {
    pub fn new(settings: PreviewSettings) -> Self {
        Self { settings }
    }

    /// Excerpt of `content` for `query`, along with the page-size hints.
    pub fn preview(&self, content: &str, query: &str) -> Preview {
        let lines: Vec<&str> = content.lines().collect();
        let short_page = lines.len() < self.settings.short_page_lines;
        let prefers_full_view = match self.settings.mode {
            PreviewMode::FullOnly => true,
            PreviewMode::PreviewOnly => false,
            PreviewMode::PreviewThenFull => short_page,
        };
        Preview {
            text: self.snippet(&lines, query),
            line_count: lines.len(),
            short_page,
            prefers_full_view,
        }
    }

    /// Escaped excerpt of `lines` with every query term in bold.
    pub fn snippet(&self, lines: &[&str], query: &str) -> String {
        let max_lines = self.settings.max_lines;
        let query = query.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();
        if terms.is_empty() {
            let head: Vec<&str> = lines.iter().take(max_lines).copied().collect();
            return escape_markup(&head.join("\n"));
        }
        let Some((first, rest)) = lines.split_first() else {
            return String::new();
        };

        let highlighted: Vec<&str> = terms
            .iter()
            .copied()
            .filter(|term| *term != RESERVED_TERM)
            .collect();
        let keep_all = !self.settings.short && lines.len() < max_lines;

        // the first line is the page heading, kept whether it matches or not
        let mut chosen = vec![first.to_string()];
        let mut capped = false;
        for line in rest {
            if chosen.len() >= max_lines {
                capped = true;
                break;
            }
            let lower = line.to_lowercase();
            if !keep_all && !terms.iter().any(|term| lower.contains(term)) {
                continue;
            }
            if line.chars().count() > self.settings.long_line {
                chosen.push(self.extract_long_line(line, &highlighted));
            } else {
                chosen.push(line.to_string());
            }
        }
        if !keep_all || capped {
            chosen.push(ELLIPSIS.to_string());
        }

        let escaped = escape_markup(&chosen.join("\n"));
        repair_broken_entities(&highlight(&escaped, &highlighted))
    }

    /// Context windows around the terms of a long line, or its truncated
    /// start when no window could be cut.
    fn extract_long_line(&self, line: &str, terms: &[&str]) -> String {
        let windows: Vec<String> = terms
            .iter()
            .map(|term| context_windows(line, term, self.settings.context_chars).join(ELLIPSIS))
            .filter(|joined| !joined.is_empty())
            .collect();
        if windows.is_empty() {
            let prefix: String = line.chars().take(self.settings.long_line).collect();
            format!("{prefix}{ELLIPSIS}")
        } else {
            format!("{ELLIPSIS}{}{ELLIPSIS}", windows.join(ELLIPSIS))
        }
    }
}

/// Up to `radius` characters around each occurrence of `term` in `line`.
/// A window never runs into the next occurrence, so two hits on one line
/// yield two windows instead of one oversized span.
pub fn context_windows(line: &str, term: &str, radius: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let folded: Vec<char> = chars.iter().map(|c| fold_char(*c)).collect();
    let needle: Vec<char> = term.chars().map(fold_char).collect();
    if needle.is_empty() || needle.len() > folded.len() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    let mut idx = 0;
    while idx + needle.len() <= folded.len() {
        if folded[idx..idx + needle.len()] == needle[..] {
            hits.push(idx);
            idx += needle.len();
        } else {
            idx += 1;
        }
    }

    let mut windows = Vec::with_capacity(hits.len());
    let mut prev_end = 0;
    for (n, &hit) in hits.iter().enumerate() {
        let start = hit.saturating_sub(radius).max(prev_end);
        let next_hit = hits.get(n + 1).copied().unwrap_or(chars.len());
        let end = (hit + needle.len() + radius).min(next_hit).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        prev_end = end;
    }
    windows
}

fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Escape text for markup output
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap every term occurrence of already escaped text in `<b>` tags.
///
/// Terms are escaped the same way as the text, longest first. Entities are
/// matched as a whole so a term cannot land inside one.
pub fn highlight(escaped: &str, terms: &[&str]) -> String {
    let mut alternatives: Vec<String> = terms
        .iter()
        .filter(|term| !term.is_empty())
        .map(|term| regex::escape(&escape_markup(term)))
        .collect();
    if alternatives.is_empty() {
        return escaped.to_string();
    }
    alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    alternatives.dedup();

    let pattern = format!(
        "(?P<term>{})|(?P<entity>{})",
        alternatives.join("|"),
        ENTITY_PATTERN
    );
    let Ok(regex) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return escaped.to_string();
    };
    regex
        .replace_all(escaped, |caps: &Captures| match caps.name("term") {
            Some(term) => format!("<b>{}</b>", term.as_str()),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Strip highlight tags that ended up inside an entity (`&a<b>m</b>p;`).
pub fn repair_broken_entities(text: &str) -> String {
    BROKEN_ENTITY
        .replace_all(text, |caps: &Captures| BOLD_TAG.replace_all(&caps[0], "").into_owned())
        .into_owned()
}
