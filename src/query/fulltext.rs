// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-text scan of page contents
//!
//! A page qualifies when every query term is found either in its path or in
//! its content. Link targets (`[[...]]`) are pulled out of the body and
//! searched separately, so `economi[[inserted link]]cal` still matches
//! `economical`. Matches on heading lines weigh more than plain ones and,
//! for multi-term queries, every occurrence of the whole phrase earns a bonus.

use regex::Regex;
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::patterns::{PatternCache, PatternKind, LINK_PATTERN};
use super::state::QueryState;
use crate::errors::Result;
use crate::notebook::{ContentCache, Notebook};

/// Points per heading marker on a heading line that contains a term
pub const HEADING_WEIGHT: u32 = 3;
/// Points per occurrence of the whole multi-term query
pub const PHRASE_BONUS: u32 = 100;
/// Score of a qualifying page whose matches earned nothing
pub const MIN_CONTENT_SCORE: u32 = 1;
/// Files scanned between two progress callbacks
pub const BATCH_SIZE: usize = 64;

/// Outcome of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub scanned: usize,
    pub matched: usize,
    pub completed: bool,
    pub elapsed: Duration,
}

/// How a single file relates to the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileVerdict {
    /// Qualifies and adds this much to the page's content score
    Scored(u32),
    /// Qualifies through its path alone; kept for narrowing, not scored
    PathOnly,
    Rejected,
}

/// Patterns of one query, compiled once per scan
struct CompiledQuery {
    terms: Vec<(String, Regex)>,
    headings: Vec<Regex>,
    phrase: Option<Regex>,
}

impl CompiledQuery {
    fn new(query: &str, patterns: &mut PatternCache) -> Result<Self> {
        let words: Vec<&str> = query.split_whitespace().collect();
        let markup = patterns.all(PatternKind::Markup, &words)?;
        let headings = patterns.all(PatternKind::Heading, &words)?;
        let phrase = if words.len() > 1 {
            Some(patterns.get(PatternKind::Phrase, &words.join(" "))?.clone())
        } else {
            None
        };
        Ok(Self {
            terms: words.iter().map(|w| w.to_string()).zip(markup).collect(),
            headings,
            phrase,
        })
    }
}

/// Body with links removed, and the link targets joined line by line
fn split_links(contents: &str) -> (String, String) {
    let mut links = Vec::new();
    let body = LINK_PATTERN.replace_all(contents, |caps: &regex::Captures| {
        if let Some(target) = caps.get(1) {
            links.push(target.as_str().to_string());
        }
        ""
    });
    (body.into_owned(), links.join("\n"))
}

pub struct FullTextScanner<'a> {
    notebook: &'a dyn Notebook,
    cache: &'a mut ContentCache,
    patterns: &'a mut PatternCache,
    ignore_subpages: bool,
}

impl<'a> FullTextScanner<'a> {
    pub fn new(
        notebook: &'a dyn Notebook,
        cache: &'a mut ContentCache,
        patterns: &'a mut PatternCache,
    ) -> Self {
        Self {
            notebook,
            cache,
            patterns,
            ignore_subpages: false,
        }
    }

    /// Pages matched by path alone gain no content score unless a term also
    /// occurs in their content.
    pub fn ignore_subpages(mut self, ignore: bool) -> Self {
        self.ignore_subpages = ignore;
        self
    }

    /// Scan `candidates` and merge content scores into `state`'s menu.
    ///
    /// `on_batch` sees the state after every [`BATCH_SIZE`] files; breaking
    /// abandons the scan. Only a scan that ran to the end marks the state
    /// finished and publishes its matching files for narrower queries.
    pub fn scan<F>(
        &mut self,
        state: &mut QueryState,
        candidates: &[PathBuf],
        mut on_batch: F,
    ) -> Result<ScanStats>
    where
        F: FnMut(&mut QueryState) -> ControlFlow<()>,
    {
        let start = Instant::now();
        let compiled = CompiledQuery::new(&state.query, self.patterns)?;

        // Content scores are recomputed from zero by every scan.
        for entry in state.menu_mut().values_mut() {
            entry.content_score = 0;
        }

        let mut matching = BTreeSet::new();
        let mut scanned = 0;
        for (idx, file) in candidates.iter().enumerate() {
            if idx > 0 && idx % BATCH_SIZE == 0 && on_batch(state).is_break() {
                debug!(
                    "Full-text scan for '{}' abandoned after {} files",
                    state.query, scanned
                );
                return Ok(ScanStats {
                    scanned,
                    matched: matching.len(),
                    completed: false,
                    elapsed: start.elapsed(),
                });
            }

            let Some(page) = self.cache.get_or_load(self.notebook, file) else {
                continue;
            };
            scanned += 1;

            match judge(&compiled, &page.page, &page.contents, self.ignore_subpages) {
                FileVerdict::Scored(score) => {
                    let page = page.page.clone();
                    state.menu_mut().entry(page).or_default().content_score += score;
                    matching.insert(file.clone());
                }
                FileVerdict::PathOnly => {
                    matching.insert(file.clone());
                }
                FileVerdict::Rejected => {}
            }
        }

        let stats = ScanStats {
            scanned,
            matched: matching.len(),
            completed: true,
            elapsed: start.elapsed(),
        };
        info!(
            "Full-text scan for '{}': {} of {} files matched in {:?}",
            state.query, stats.matched, stats.scanned, stats.elapsed
        );
        state.matching_files = Some(Rc::new(matching));
        state.finished = true;
        Ok(stats)
    }
}

/// Decide whether a page qualifies and what it scores
fn judge(query: &CompiledQuery, page: &str, contents: &str, ignore_subpages: bool) -> FileVerdict {
    let (body, links) = split_links(contents);
    let path = page.to_lowercase();
    let found = |re: &Regex| re.is_match(&body) || re.is_match(&links);

    let wanted: Vec<&Regex> = query
        .terms
        .iter()
        .filter(|(term, _)| !path.contains(term.as_str()))
        .map(|(_, re)| re)
        .collect();

    if !wanted.is_empty() {
        if !wanted.into_iter().all(found) {
            return FileVerdict::Rejected;
        }
    } else if ignore_subpages && !query.terms.iter().any(|(_, re)| found(re)) {
        return FileVerdict::PathOnly;
    }

    FileVerdict::Scored(content_score(query, &body).max(MIN_CONTENT_SCORE))
}

fn content_score(query: &CompiledQuery, body: &str) -> u32 {
    let mut score: u32 = query
        .headings
        .iter()
        .flat_map(|re| re.captures_iter(body))
        .map(|caps| match caps.get(1) {
            Some(markers) => HEADING_WEIGHT * markers.as_str().len() as u32,
            None => 1,
        })
        .sum();
    if let Some(phrase) = &query.phrase {
        score += PHRASE_BONUS * phrase.find_iter(body).count() as u32;
    }
    score
}

/// Files to scan for `state`: the matching files of the state it narrows when
/// that state finished its scan, otherwise every page file of the notebook.
pub fn candidate_files(
    previous: Option<&QueryState>,
    notebook: &dyn Notebook,
) -> Result<Vec<PathBuf>> {
    match previous {
        Some(prev) if prev.finished => match &prev.matching_files {
            Some(files) => Ok(files.iter().cloned().collect()),
            None => notebook.files(),
        },
        _ => notebook.files(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::MemoryNotebook;
    use crate::query::state::QueryStateStore;

    fn compiled(query: &str) -> CompiledQuery {
        CompiledQuery::new(query, &mut PatternCache::new()).expect("compile")
    }

    #[test]
    fn links_are_searched_separately() {
        let (body, links) = split_links("economi[[inserted link]]cal");
        assert_eq!(body, "economical");
        assert_eq!(links, "inserted link");

        let query = compiled("economical");
        assert_eq!(
            judge(&query, "Notes", "economi[[inserted link]]cal", false),
            FileVerdict::Scored(1)
        );
        let query = compiled("inserted");
        assert_eq!(
            judge(&query, "Notes", "see [[inserted link]]", false),
            FileVerdict::Scored(MIN_CONTENT_SCORE)
        );
    }

    #[test]
    fn every_wanted_term_must_match() {
        let query = compiled("linux kernel");
        assert_eq!(
            judge(&query, "Notes", "linux only", false),
            FileVerdict::Rejected
        );
        assert_eq!(
            judge(&query, "Linux", "the kernel", false),
            FileVerdict::Scored(1)
        );
    }

    #[test]
    fn headings_weigh_by_marker_count() {
        let query = compiled("foo");
        let body = "====== foo ======\nfoo again\n== a foo ==";
        assert_eq!(
            judge(&query, "Notes", body, false),
            FileVerdict::Scored(6 * HEADING_WEIGHT + 1 + 2 * HEADING_WEIGHT)
        );
    }

    #[test]
    fn full_phrase_earns_bonus() {
        let query = compiled("foo bar");
        // foo + bar + phrase
        assert_eq!(
            judge(&query, "Notes", "foo bar", false),
            FileVerdict::Scored(2 + PHRASE_BONUS)
        );
        assert_eq!(
            judge(&query, "Notes", "bar foo", false),
            FileVerdict::Scored(2)
        );
    }

    #[test]
    fn path_only_pages_follow_ignore_subpages() {
        let query = compiled("foo");
        assert_eq!(
            judge(&query, "Journal:foo:bar", "nothing here", false),
            FileVerdict::Scored(MIN_CONTENT_SCORE)
        );
        assert_eq!(
            judge(&query, "Journal:foo:bar", "nothing here", true),
            FileVerdict::PathOnly
        );
        assert_eq!(
            judge(&query, "Journal:foo:bar", "more foo", true),
            FileVerdict::Scored(1)
        );
    }

    fn notebook() -> MemoryNotebook {
        MemoryNotebook::new()
            .with_page("Journal:foo", "Content-Type: text/x-zim-wiki\n\ndiary")
            .with_page("Journal:foo:bar", "bar content")
            .with_page("Recipes", "===== Food =====\nfood and more food")
            .with_page("Shopping", "buy bread")
            .with_page("foo test", "test page")
    }

    #[test]
    fn scan_publishes_matching_files_on_completion() {
        let notebook = notebook();
        let mut cache = ContentCache::new();
        let mut patterns = PatternCache::new();
        let mut store = QueryStateStore::new('!', 3);
        store.set_current("foo");
        let state = store.current_mut().expect("current");

        let files = notebook.files().expect("files");
        let stats = FullTextScanner::new(&notebook, &mut cache, &mut patterns)
            .scan(state, &files, |_| ControlFlow::Continue(()))
            .expect("scan");

        assert!(stats.completed);
        assert!(state.finished);
        let pages: Vec<&str> = state.menu.keys().map(String::as_str).collect();
        assert_eq!(
            pages,
            vec!["Journal:foo", "Journal:foo:bar", "Recipes", "foo test"]
        );
        assert_eq!(state.menu["Recipes"].content_score, 5 * HEADING_WEIGHT + 2);
        assert_eq!(state.matching_files.as_ref().map(|f| f.len()), Some(4));
    }

    #[test]
    fn narrower_query_scans_a_subset() {
        let notebook = notebook();
        let mut cache = ContentCache::new();
        let mut patterns = PatternCache::new();
        let mut store = QueryStateStore::new('!', 3);

        for query in ["foo", "food"] {
            store.set_current(query);
            let files = {
                let state = store.current().expect("current");
                candidate_files(store.previous_of(state), &notebook).expect("candidates")
            };
            let state = store.current_mut().expect("current");
            FullTextScanner::new(&notebook, &mut cache, &mut patterns)
                .scan(state, &files, |_| ControlFlow::Continue(()))
                .expect("scan");
        }

        let wide = store.get("foo").expect("foo").matching_files.clone();
        let narrow = store.get("food").expect("food").matching_files.clone();
        let (wide, narrow) = (wide.expect("wide"), narrow.expect("narrow"));
        assert!(narrow.is_subset(&wide));
        assert_eq!(narrow.len(), 1);
    }

    #[test]
    fn abandoned_scan_publishes_nothing() {
        let mut notebook = MemoryNotebook::new();
        for idx in 0..(BATCH_SIZE * 2) {
            notebook.insert(&format!("Page{idx:03}"), b"foo".to_vec());
        }
        let mut cache = ContentCache::new();
        let mut patterns = PatternCache::new();
        let mut store = QueryStateStore::new('!', 3);
        store.set_current("foo");
        let state = store.current_mut().expect("current");

        let files = notebook.files().expect("files");
        let stats = FullTextScanner::new(&notebook, &mut cache, &mut patterns)
            .scan(state, &files, |_| ControlFlow::Break(()))
            .expect("scan");

        assert!(!stats.completed);
        assert_eq!(stats.scanned, BATCH_SIZE);
        assert!(!state.finished);
        assert!(state.matching_files.is_none());
    }

    #[test]
    fn undecodable_files_are_skipped() {
        let mut notebook = MemoryNotebook::new().with_page("good", "foo");
        notebook.insert("bad", vec![b'f', b'o', b'o', 0xff]);
        let mut cache = ContentCache::new();
        let mut patterns = PatternCache::new();
        let mut store = QueryStateStore::new('!', 3);
        store.set_current("foo");
        let state = store.current_mut().expect("current");

        let files = notebook.files().expect("files");
        let stats = FullTextScanner::new(&notebook, &mut cache, &mut patterns)
            .scan(state, &files, |_| ControlFlow::Continue(()))
            .expect("scan");

        assert!(stats.completed);
        assert_eq!(stats.scanned, 1);
        assert!(state.menu.contains_key("good"));
        assert!(!state.menu.contains_key("bad"));
    }
}
