// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search session: one search-as-you-type dialog from open to close
//!
//! Every keystroke goes through [`SearchSession::input`], which runs the title
//! pass at once and returns the full-text scan it wants scheduled. The caller
//! owns the timer: when it fires, it hands the scan's generation back to
//! [`SearchSession::run_full_text`], which drops it if a later keystroke
//! superseded it.

use std::ops::ControlFlow;
use std::time::Duration;
use tracing::debug;

use crate::config::{PreviewSettings, SearchSettings};
use crate::errors::{NotegrepError, Result};
use crate::notebook::{ContentCache, Notebook};
use crate::query::{
    candidate_files, match_titles, Clock, FullTextScanner, PatternCache, Preview,
    QueryStateStore, RankedView, ResultRanker, ScanStats, SnippetExtractor, SortMode,
    SystemClock,
};

/// Full-text scan to run once the keystroke delay has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledScan {
    pub generation: u64,
    pub delay: Duration,
}

/// Result of a keystroke: the immediate view and the pending scan, if any
#[derive(Debug, Clone)]
pub struct InputOutcome {
    pub view: RankedView,
    pub scheduled: Option<ScheduledScan>,
}

/// Result of a scheduled scan that was still current
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub view: RankedView,
    pub stats: Option<ScanStats>,
}

pub struct SearchSession<N: Notebook> {
    notebook: N,
    settings: SearchSettings,
    extractor: SnippetExtractor,
    store: QueryStateStore,
    cache: ContentCache,
    patterns: PatternCache,
    ranker: ResultRanker,
    titles: Vec<String>,
    is_open: bool,
}

impl<N: Notebook> SearchSession<N> {
    pub fn new(notebook: N, settings: SearchSettings, preview: PreviewSettings) -> Self {
        Self::with_clock(notebook, settings, preview, Box::new(SystemClock))
    }

    pub fn with_clock(
        notebook: N,
        settings: SearchSettings,
        preview: PreviewSettings,
        clock: Box<dyn Clock>,
    ) -> Self {
        let ranker = ResultRanker::new(clock, settings.redraw_interval, settings.open_when_unique);
        Self {
            notebook,
            store: QueryStateStore::from_settings(&settings),
            extractor: SnippetExtractor::new(preview),
            settings,
            cache: ContentCache::new(),
            patterns: PatternCache::new(),
            ranker,
            titles: Vec::new(),
            is_open: false,
        }
    }

    /// Load the page list. Called implicitly by the first keystroke.
    pub fn open(&mut self) -> Result<()> {
        self.titles = self.notebook.pages()?;
        self.is_open = true;
        debug!("Search session opened over {} pages", self.titles.len());
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Handle the query text after a keystroke.
    pub fn input(&mut self, raw_query: &str) -> Result<InputOutcome> {
        if !self.is_open {
            self.open()?;
        }

        let generation = {
            self.store.set_current(raw_query);
            self.store.generation()
        };
        self.ranker.begin();

        let Self {
            store,
            patterns,
            ranker,
            titles,
            settings,
            ..
        } = self;
        let state = store
            .current_mut()
            .ok_or_else(|| NotegrepError::StateNotFound {
                query: raw_query.to_string(),
            })?;

        if state.first_seen {
            match_titles(state, titles, patterns)?;
            if state.title_only {
                state.finished = true;
            }
        }

        let view = ranker.render(state, SortMode::Primary);
        let scheduled = state.needs_full_text().then_some(ScheduledScan {
            generation,
            delay: settings.keystroke_delay,
        });
        debug!(
            "Query '{}': {} visible, full text {}",
            state.raw_query,
            view.items.len(),
            if scheduled.is_some() { "scheduled" } else { "skipped" }
        );
        Ok(InputOutcome { view, scheduled })
    }

    /// Run the scan scheduled for `generation`.
    pub fn run_full_text(&mut self, generation: u64) -> Result<Option<ScanOutcome>> {
        self.run_full_text_with(generation, |_| {})
    }

    /// Run the scan scheduled for `generation`, reporting throttled partial
    /// views to `on_view` while it streams. Returns `None` when the scan
    /// belongs to a superseded keystroke.
    pub fn run_full_text_with<F>(
        &mut self,
        generation: u64,
        mut on_view: F,
    ) -> Result<Option<ScanOutcome>>
    where
        F: FnMut(&RankedView),
    {
        if !self.store.is_current(generation) {
            debug!("Dropping stale full-text scan (generation {})", generation);
            return Ok(None);
        }
        let Some(key) = self.store.current_key().map(str::to_string) else {
            return Ok(None);
        };

        let candidates = {
            let state = self.store.get(&key)?;
            if !state.needs_full_text() {
                let state = self.store.get_mut(&key)?;
                let view = self.ranker.render(state, SortMode::Primary);
                return Ok(Some(ScanOutcome { view, stats: None }));
            }
            candidate_files(self.store.previous_of(state), &self.notebook)?
        };

        let Self {
            notebook,
            store,
            cache,
            patterns,
            ranker,
            settings,
            ..
        } = self;
        let state = store.get_mut(&key)?;
        let stats = FullTextScanner::new(&*notebook, cache, patterns)
            .ignore_subpages(settings.ignore_subpages)
            .scan(state, &candidates, |state| {
                if let Some(view) = ranker.render_batch(state) {
                    on_view(&view);
                }
                ControlFlow::Continue(())
            })?;

        let mode = if stats.completed {
            SortMode::Primary
        } else {
            SortMode::Stable
        };
        let view = ranker.render(state, mode);
        Ok(Some(ScanOutcome {
            view,
            stats: Some(stats),
        }))
    }

    /// Last rendered view
    pub fn view(&self) -> Option<&RankedView> {
        self.ranker.view()
    }

    pub fn move_caret(&mut self, delta: isize) -> Option<RankedView> {
        self.ranker.move_caret(delta)
    }

    pub fn jump_to_start(&mut self) -> Option<RankedView> {
        self.ranker.jump_to_start()
    }

    pub fn jump_to_end(&mut self) -> Option<RankedView> {
        self.ranker.jump_to_end()
    }

    /// Highlighted excerpt of `page` for `query`.
    pub fn snippet_for(&mut self, page: &str, query: &str) -> Result<Preview> {
        if !self.is_open {
            self.open()?;
        }
        if !self.titles.iter().any(|title| title == page) {
            return Err(NotegrepError::PageNotFound {
                page: page.to_string(),
            });
        }

        let file = self.notebook.file_for_page(page);
        let preview = match self.cache.get_or_load(&self.notebook, &file) {
            Some(cached) => self.extractor.preview(&cached.contents, query),
            None => self
                .extractor
                .preview(&format!("page {page} has no content"), query),
        };
        Ok(preview)
    }

    /// Excerpt of the selected page for the active query.
    pub fn selected_preview(&mut self) -> Result<Option<Preview>> {
        let Some(page) = self
            .view()
            .and_then(|view| view.selected())
            .map(|item| item.page.clone())
        else {
            return Ok(None);
        };
        let query = self
            .store
            .current()
            .map(|state| state.query.clone())
            .unwrap_or_default();
        self.snippet_for(&page, &query).map(Some)
    }

    pub fn store(&self) -> &QueryStateStore {
        &self.store
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn notebook(&self) -> &N {
        &self.notebook
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Forget every query state; page contents stay cached.
    pub fn reset(&mut self) {
        self.store.reset();
        self.ranker.reset();
    }

    /// End the session. Page contents may change before the next one, so the
    /// content cache goes too.
    pub fn close(&mut self) {
        debug!(
            "Closing search session ({} states, {} cached pages)",
            self.store.len(),
            self.cache.len()
        );
        self.reset();
        self.cache.clear();
        self.patterns.clear();
        self.titles.clear();
        self.is_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::MemoryNotebook;
    use crate::query::fulltext::BATCH_SIZE;
    use crate::query::ManualClock;

    fn notebook() -> MemoryNotebook {
        MemoryNotebook::new()
            .with_empty_page("Journal")
            .with_page("Journal:2021", "a year in review")
            .with_page("Journal:foo", "====== foo ======\nfirst entry")
            .with_page("Journal:foo:bar", "nested page")
            .with_page("test", "testing page")
            .with_page("Journal:test", "another one")
            .with_page("foo test", "both words")
            .with_page("foo (test)", "in brackets")
    }

    fn session() -> SearchSession<MemoryNotebook> {
        SearchSession::with_clock(
            notebook(),
            SearchSettings::default(),
            PreviewSettings::default(),
            Box::new(ManualClock::new()),
        )
    }

    fn search(session: &mut SearchSession<MemoryNotebook>, query: &str) -> RankedView {
        let outcome = session.input(query).expect("input");
        match outcome.scheduled {
            Some(scan) => {
                session
                    .run_full_text(scan.generation)
                    .expect("scan")
                    .expect("current")
                    .view
            }
            None => outcome.view,
        }
    }

    fn sorted_pages(view: &RankedView) -> Vec<String> {
        let mut pages = view.pages();
        pages.sort();
        pages
    }

    #[test]
    fn foo_shows_subpages_once_content_is_scanned() {
        let mut session = session();
        let outcome = session.input("foo").expect("input");
        assert!(!outcome.view.pages().contains(&"Journal:foo:bar".to_string()));
        assert!(outcome.scheduled.is_some());

        let view = search(&mut session, "foo");
        assert_eq!(
            sorted_pages(&view),
            vec!["Journal:foo", "Journal:foo:bar", "foo (test)", "foo test"]
        );
        assert!(view.finished);
        // the heading hit ranks Journal:foo above the other title hits
        assert_eq!(view.items[0].page, "Journal:foo");
    }

    #[test]
    fn tes_matches_word_starts() {
        let mut session = session();
        let view = search(&mut session, "tes");
        assert_eq!(
            sorted_pages(&view),
            vec!["Journal:test", "foo (test)", "foo test", "test"]
        );
    }

    #[test]
    fn ignore_subpages_keeps_path_only_pages_hidden() {
        let settings = SearchSettings {
            ignore_subpages: true,
            ..SearchSettings::default()
        };
        let mut session = SearchSession::with_clock(
            notebook(),
            settings,
            PreviewSettings::default(),
            Box::new(ManualClock::new()),
        );
        let view = search(&mut session, "foo");
        assert!(!view.pages().contains(&"Journal:foo:bar".to_string()));

        let state = session.store().get("foo").expect("state");
        let files = state.matching_files.as_ref().expect("published");
        assert!(files.contains(&session.notebook().file_for_page("Journal:foo:bar")));
    }

    #[test]
    fn title_only_queries_finish_without_scan() {
        let mut session = session();
        let outcome = session.input("!foo").expect("input");
        assert!(outcome.scheduled.is_none());
        assert!(outcome.view.finished);
        assert!(outcome.view.title_only);

        let outcome = session.input("fo").expect("input");
        assert!(outcome.scheduled.is_none());
    }

    #[test]
    fn blank_queries_never_scan_contents() {
        let mut session = session();
        let outcome = session.input("   ").expect("input");
        assert!(outcome.scheduled.is_none());
        assert!(outcome.view.title_only);
        assert!(outcome.view.is_empty());

        let outcome = session.input(" fo ").expect("input");
        assert!(outcome.scheduled.is_none());
    }

    #[test]
    fn stale_scan_is_dropped() {
        let mut session = session();
        let first = session.input("foo").expect("input").scheduled.expect("scan");
        let second = session.input("foo ").expect("input").scheduled.expect("scan");

        assert!(session.run_full_text(first.generation).expect("run").is_none());
        assert!(!session.store().get("foo").expect("state").finished);
        assert!(session.run_full_text(second.generation).expect("run").is_some());
    }

    #[test]
    fn narrower_queries_scan_subsets() {
        let mut session = session();
        for query in ["tes", "test", "testi"] {
            search(&mut session, query);
        }
        let files = |query: &str| {
            session
                .store()
                .get(query)
                .expect("state")
                .matching_files
                .clone()
                .expect("published")
        };
        assert!(files("test").is_subset(&files("tes")));
        assert!(files("testi").is_subset(&files("test")));
        assert_eq!(files("testi").len(), 1);
    }

    #[test]
    fn caret_follows_selected_page_while_typing() {
        let mut session = session();
        let view = search(&mut session, "tes");
        let target = view.items[2].page.clone();
        let view = session.move_caret(2).expect("view");
        assert_eq!(view.selected().map(|item| item.page.clone()), Some(target.clone()));

        let view = search(&mut session, "test");
        assert_eq!(view.selected().map(|item| item.page.clone()), Some(target));
    }

    #[test]
    fn unique_result_is_ready_to_open() {
        let mut session = session();
        let view = search(&mut session, "brackets");
        assert_eq!(view.pages(), vec!["foo (test)"]);
        assert!(view.is_unique());
        assert!(view.auto_open);
    }

    #[test]
    fn long_scans_stream_a_partial_view() {
        let mut notebook = MemoryNotebook::new();
        for idx in 0..(BATCH_SIZE * 2 + 2) {
            notebook.insert(&format!("Page{idx:03}"), b"a needle here".to_vec());
        }
        let mut session = SearchSession::with_clock(
            notebook,
            SearchSettings::default(),
            PreviewSettings::default(),
            Box::new(ManualClock::new()),
        );

        let scan = session.input("needle").expect("input").scheduled.expect("scan");
        let mut partial = Vec::new();
        let outcome = session
            .run_full_text_with(scan.generation, |view| partial.push(view.clone()))
            .expect("scan")
            .expect("current");

        // the clock never moves, so only the first batch gets past the throttle
        assert_eq!(partial.len(), 1);
        assert!(!partial[0].finished);
        assert!(!partial[0].is_empty());
        assert_eq!(outcome.view.items.len(), BATCH_SIZE * 2 + 2);
    }

    #[test]
    fn revisiting_a_query_reuses_its_results() {
        let mut session = session();
        search(&mut session, "foo");
        search(&mut session, "foo t");
        let outcome = session.input("foo").expect("input");
        assert!(outcome.scheduled.is_none());
        assert!(outcome.view.finished);
        assert_eq!(outcome.view.items.len(), 4);
    }

    #[test]
    fn snippets_come_from_cached_content() {
        let mut session = session();
        search(&mut session, "foo");
        let preview = session.snippet_for("Journal:foo", "foo").expect("preview");
        assert!(preview.text.contains("<b>foo</b>"));
        assert!(preview.prefers_full_view);

        let empty = session.snippet_for("Journal", "foo").expect("preview");
        assert_eq!(empty.text, "page Journal has no content");

        let err = session.snippet_for("Nowhere", "foo").unwrap_err();
        assert!(matches!(err, NotegrepError::PageNotFound { .. }));
    }

    #[test]
    fn close_drops_cached_content() {
        let mut session = session();
        search(&mut session, "foo");
        assert!(!session.cache().is_empty());
        session.close();
        assert!(session.cache().is_empty());
        assert!(session.store().is_empty());
        assert!(!session.is_open());
    }
}
