// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page path matching
//!
//! Short queries (up to three characters) are noisy as substrings, so every
//! term must hit a segment or word start. Longer queries also accept plain
//! substring hits, for a lower score.

use tracing::debug;

use super::patterns::{PatternCache, PatternKind};
use super::state::{Menu, QueryState};
use crate::errors::Result;
use crate::notebook::leaf_name;

/// Score of a term found at a segment or word start
pub const BOUNDARY_SCORE: u32 = 10;
/// Score of a term found elsewhere in the path
pub const SUBSTRING_SCORE: u32 = 1;
/// Queries up to this many characters need boundary hits for every term
pub const STRICT_QUERY_LEN: usize = 3;

/// Score `page` against `terms`, or `None` when a term does not match.
pub fn score_title(
    page: &str,
    query: &str,
    terms: &[&str],
    patterns: &mut PatternCache,
) -> Result<Option<u32>> {
    let path = page.to_lowercase();
    let strict = query.chars().count() <= STRICT_QUERY_LEN;
    let mut score = 0;
    for term in terms {
        if patterns.get(PatternKind::TitleBoundary, term)?.is_match(&path) {
            score += BOUNDARY_SCORE;
        } else if !strict && path.contains(term) {
            score += SUBSTRING_SCORE;
        } else {
            return Ok(None);
        }
    }
    Ok(Some(score))
}

/// Rebuild the title fields of `state`'s menu.
///
/// Candidates are the pages already in the menu when it was inherited from a
/// shorter query, and every page of the notebook otherwise. Title fields are
/// assigned, never added, so running the pass twice gives the same menu.
/// Pages without a title hit are dropped unless a content scan scored them.
pub fn match_titles(
    state: &mut QueryState,
    pages: &[String],
    patterns: &mut PatternCache,
) -> Result<()> {
    let query = state.query.clone();
    let terms: Vec<&str> = query.split_whitespace().collect();
    let inherited = state.scores_inherited;

    let candidates: Vec<&str> = if state.menu.is_empty() {
        pages.iter().map(String::as_str).collect()
    } else {
        state.menu.keys().map(String::as_str).collect()
    };

    let mut menu = Menu::new();
    for page in candidates {
        let mut entry = state.menu.get(page).cloned().unwrap_or_default();
        if inherited {
            entry.reset_score();
        }

        match score_title(page, &query, &terms, patterns)? {
            Some(score) if score > 0 => {
                let leaf = leaf_name(page).to_lowercase();
                entry.title_score = score;
                entry.title_highlight = score >= BOUNDARY_SCORE;
                entry.insufficient_title_match = !terms.iter().any(|term| leaf.contains(term));
            }
            _ => {
                if entry.content_score == 0 {
                    continue;
                }
                entry.title_score = 0;
                entry.title_highlight = false;
                entry.insufficient_title_match = false;
            }
        }
        menu.insert(page.to_string(), entry);
    }

    debug!(
        "Title pass for '{}': {} of {} candidates",
        query,
        menu.len(),
        if inherited { state.menu.len() } else { pages.len() }
    );
    state.menu = menu.into();
    state.scores_inherited = false;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::state::QueryStateStore;

    fn titles() -> Vec<String> {
        [
            "Journal",
            "Journal:2021",
            "Journal:foo",
            "Journal:foo:bar",
            "test",
            "Journal:test",
            "foo test",
            "foo (test)",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn run(store: &mut QueryStateStore, query: &str, patterns: &mut PatternCache) -> Menu {
        store.set_current(query);
        let state = store.current_mut().expect("current");
        match_titles(state, &titles(), patterns).expect("title pass");
        (*state.menu).clone()
    }

    fn visible(menu: &Menu) -> Vec<&str> {
        menu.iter()
            .filter(|(_, entry)| entry.is_visible())
            .map(|(page, _)| page.as_str())
            .collect()
    }

    #[test]
    fn short_query_needs_boundary_hits() {
        let mut store = QueryStateStore::new('!', 3);
        let mut patterns = PatternCache::new();
        let menu = run(&mut store, "foo", &mut patterns);

        let matched: Vec<&str> = menu.keys().map(String::as_str).collect();
        assert_eq!(
            matched,
            vec!["Journal:foo", "Journal:foo:bar", "foo (test)", "foo test"]
        );
        assert!(menu["Journal:foo:bar"].insufficient_title_match);
        assert_eq!(
            visible(&menu),
            vec!["Journal:foo", "foo (test)", "foo test"]
        );
        assert!(menu.values().all(|entry| entry.title_score == BOUNDARY_SCORE));
    }

    #[test]
    fn tes_matches_word_starts_only() {
        let mut store = QueryStateStore::new('!', 3);
        let mut patterns = PatternCache::new();
        let menu = run(&mut store, "tes", &mut patterns);
        assert_eq!(
            visible(&menu),
            vec!["Journal:test", "foo (test)", "foo test", "test"]
        );
        assert!(!menu.contains_key("Journal:foo"));
    }

    #[test]
    fn long_query_accepts_substrings() {
        let mut patterns = PatternCache::new();
        assert_eq!(
            score_title("latest", "test", &["test"], &mut patterns).expect("score"),
            Some(SUBSTRING_SCORE)
        );
        assert_eq!(
            score_title("latest", "tes", &["tes"], &mut patterns).expect("score"),
            None
        );
        assert_eq!(
            score_title("Foo (Test)", "foo test", &["foo", "test"], &mut patterns)
                .expect("score"),
            Some(2 * BOUNDARY_SCORE)
        );
    }

    #[test]
    fn substring_hits_are_not_highlighted() {
        let mut store = QueryStateStore::new('!', 3);
        let mut patterns = PatternCache::new();
        let menu = run(&mut store, "ournal", &mut patterns);
        let entry = &menu["Journal"];
        assert_eq!(entry.title_score, SUBSTRING_SCORE);
        assert!(!entry.title_highlight);
    }

    #[test]
    fn rerunning_from_zero_is_idempotent() {
        let mut store = QueryStateStore::new('!', 3);
        let mut patterns = PatternCache::new();
        let first = run(&mut store, "journal", &mut patterns);

        let state = store.current_mut().expect("current");
        match_titles(state, &titles(), &mut patterns).expect("title pass");
        assert_eq!(*state.menu, first);
    }

    #[test]
    fn narrowing_reuses_inherited_candidates() {
        let mut store = QueryStateStore::new('!', 3);
        let mut patterns = PatternCache::new();
        run(&mut store, "foo", &mut patterns);
        let menu = run(&mut store, "foo t", &mut patterns);

        let matched: Vec<&str> = menu.keys().map(String::as_str).collect();
        assert_eq!(matched, vec!["foo (test)", "foo test"]);
        assert!(menu
            .values()
            .all(|entry| entry.title_score == 2 * BOUNDARY_SCORE));
    }
}
