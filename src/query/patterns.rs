// SPDX-License-Identifier: MIT OR Apache-2.0

//! Regex builders for query terms and a cache of compiled patterns
//!
//! Page text may carry inline markup between the letters of a word
//! (`f**o**o`, `//foo//`), so content patterns allow markup delimiters
//! between every pair of literal characters.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::errors::{NotegrepError, Result};

/// Characters used by inline markup: bold, italic, verbatim, underline, strike
const MARKUP_DELIMITERS: &str = r"[*/'_~]*";

/// `[[target]]` or `[[target|label]]`
pub static LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("valid link pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// Term tolerant of inline markup
    Markup,
    /// Markup-tolerant term, capturing the heading markers of its line
    Heading,
    /// Whole query as one contiguous markup-tolerant phrase
    Phrase,
    /// Term at the start of a path segment or word
    TitleBoundary,
}

impl PatternKind {
    fn source(self, term: &str) -> String {
        match self {
            PatternKind::Markup | PatternKind::Phrase => markup_tolerant(term),
            PatternKind::Heading => heading_aware(term),
            PatternKind::TitleBoundary => title_boundary(term),
        }
    }
}

/// Compiled patterns keyed by kind and term, kept for the whole session
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: HashMap<(PatternKind, String), Regex>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive pattern for `term`, compiled on first use.
    pub fn get(&mut self, kind: PatternKind, term: &str) -> Result<&Regex> {
        match self.patterns.entry((kind, term.to_string())) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let regex = RegexBuilder::new(&kind.source(term))
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .map_err(|source| NotegrepError::InvalidPattern {
                        term: term.to_string(),
                        source,
                    })?;
                Ok(entry.insert(regex))
            }
        }
    }

    /// Compile (or fetch) the patterns of `kind` for every term.
    pub fn all(&mut self, kind: PatternKind, terms: &[&str]) -> Result<Vec<Regex>> {
        terms
            .iter()
            .map(|term| self.get(kind, term).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }
}

/// Literal `term` where markup delimiters may sit between any two characters
pub fn markup_tolerant(term: &str) -> String {
    let mut buf = [0u8; 4];
    term.chars()
        .map(|c| regex::escape(c.encode_utf8(&mut buf)))
        .collect::<Vec<_>>()
        .join(MARKUP_DELIMITERS)
}

/// Markup-tolerant `term`, optionally preceded by the start of a heading line.
/// Group 1 holds the heading markers when the term sits on a heading.
pub fn heading_aware(term: &str) -> String {
    format!(r"(?:^(=+) [^\n]*?)?{}", markup_tolerant(term))
}

/// `term` right after the start of the path, a `:`, whitespace or `(`
pub fn title_boundary(term: &str) -> String {
    format!(r"(?:^|[:\s(]){}", regex::escape(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_between_letters_still_matches() {
        let mut cache = PatternCache::new();
        let re = cache.get(PatternKind::Markup, "foo").expect("pattern");
        assert!(re.is_match("f**o**o"));
        assert!(re.is_match("//FOO//"));
        assert!(!re.is_match("f o o"));
    }

    #[test]
    fn special_characters_are_literal() {
        let mut cache = PatternCache::new();
        let re = cache.get(PatternKind::Markup, "a.b(").expect("pattern");
        assert!(re.is_match("x a.b( y"));
        assert!(!re.is_match("axb("));
    }

    #[test]
    fn heading_markers_are_captured() {
        let mut cache = PatternCache::new();
        let re = cache.get(PatternKind::Heading, "foo").expect("pattern");
        let text = "intro\n==== About foo ====\nplain foo";
        let markers: Vec<Option<usize>> = re
            .captures_iter(text)
            .map(|caps| caps.get(1).map(|m| m.as_str().len()))
            .collect();
        assert_eq!(markers, vec![Some(4), None]);
    }

    #[test]
    fn title_boundary_requires_segment_start() {
        let mut cache = PatternCache::new();
        let re = cache.get(PatternKind::TitleBoundary, "tes").expect("pattern");
        assert!(re.is_match("journal:test"));
        assert!(re.is_match("foo (test)"));
        assert!(!re.is_match("latest"));
    }

    #[test]
    fn patterns_are_compiled_once() {
        let mut cache = PatternCache::new();
        cache.get(PatternKind::Markup, "foo").expect("pattern");
        cache.get(PatternKind::Markup, "foo").expect("pattern");
        cache.get(PatternKind::Heading, "foo").expect("pattern");
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn link_targets_are_captured() {
        let links: Vec<&str> = LINK_PATTERN
            .captures_iter("economi[[inserted link]]cal and [[a|b]]")
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        assert_eq!(links, vec!["inserted link", "a|b"]);
    }
}
