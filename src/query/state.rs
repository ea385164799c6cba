// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-query search state and the store that memoizes it
//!
//! Every distinct (lowercased) query typed during a session gets exactly one
//! [`QueryState`]. A state derived from a shorter, already-known query shares
//! that query's menu instead of copying it; the title pass then rebuilds the
//! menu from the shared keys with fresh scores.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::debug;

use crate::config::SearchSettings;
use crate::errors::{NotegrepError, Result};

/// Results of one query, keyed by page path
pub type Menu = BTreeMap<String, ResultEntry>;

/// Scores and ranking hints of one page inside a query's menu
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultEntry {
    /// Score from the full-text scan
    pub content_score: u32,
    /// Score from matching the page path
    pub title_score: u32,
    /// The title hit started at a word boundary
    pub title_highlight: bool,
    /// No query term occurs in the leaf segment of the page path
    pub insufficient_title_match: bool,
    /// Rank at the last render, used to keep positions stable while streaming
    pub display_order: Option<usize>,
}

impl ResultEntry {
    pub fn score(&self) -> u32 {
        self.title_score + self.content_score
    }

    /// A title hit coming only from an ancestor segment needs content backing.
    pub fn is_visible(&self) -> bool {
        self.content_score != 0 || (self.title_score != 0 && !self.insufficient_title_match)
    }

    /// Clear the scores of an entry inherited from a shorter query.
    /// `display_order` survives so streaming re-sorts stay stable.
    pub fn reset_score(&mut self) {
        self.content_score = 0;
        self.title_score = 0;
        self.title_highlight = false;
        self.insufficient_title_match = false;
    }
}

#[derive(Debug, Clone)]
pub struct QueryState {
    /// Query as typed (lowercased), including a title-only marker
    pub raw_query: String,
    /// Query without the marker
    pub query: String,
    /// Only page paths are matched, the content scan is skipped
    pub title_only: bool,
    pub finished: bool,
    /// False once the same query has been requested again
    pub first_seen: bool,
    pub menu: Rc<Menu>,
    /// Files that qualified in a completed content scan
    pub matching_files: Option<Rc<BTreeSet<PathBuf>>>,
    /// Key of the state this one narrows
    pub previous: Option<String>,
    /// Menu entries still carry the scores of `previous`
    pub(crate) scores_inherited: bool,
}

impl QueryState {
    /// Whether the content scan still has to run for this state.
    pub fn needs_full_text(&self) -> bool {
        !self.title_only && !self.finished
    }

    /// Mutable menu, copied first if a derived state still shares it.
    pub fn menu_mut(&mut self) -> &mut Menu {
        Rc::make_mut(&mut self.menu)
    }

    pub fn terms(&self) -> Vec<&str> {
        self.query.split_whitespace().collect()
    }
}

/// Session-scoped cache of query states
#[derive(Debug)]
pub struct QueryStateStore {
    states: HashMap<String, QueryState>,
    current: Option<String>,
    generation: u64,
    title_match_char: char,
    start_search_length: usize,
}

impl QueryStateStore {
    pub fn new(title_match_char: char, start_search_length: usize) -> Self {
        Self {
            states: HashMap::new(),
            current: None,
            generation: 0,
            title_match_char,
            start_search_length,
        }
    }

    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(settings.title_match_char, settings.start_search_length)
    }

    /// Make `raw_query` the active query, creating its state on first use.
    ///
    /// Every call advances the generation, so work scheduled for an earlier
    /// keystroke can tell it has been superseded.
    pub fn set_current(&mut self, raw_query: &str) -> &QueryState {
        let key = raw_query.to_lowercase();
        self.generation += 1;

        if let Some(state) = self.states.get_mut(&key) {
            state.first_seen = false;
            debug!("Reusing search state for '{}'", key);
        } else {
            let state = self.create_state(&key);
            self.states.insert(key.clone(), state);
        }

        self.current = Some(key.clone());
        &self.states[&key]
    }

    fn create_state(&self, key: &str) -> QueryState {
        let previous = self
            .longest_known_prefix(key)
            .filter(|prev| !prev.title_only);

        let (marked, query) = match key.strip_prefix(self.title_match_char) {
            Some(rest) => (true, rest.to_string()),
            None => (false, key.to_string()),
        };
        let title_only = marked || query.trim().chars().count() < self.start_search_length;

        debug!(
            "New search state for '{}' (title only: {}, narrows: {:?})",
            key,
            title_only,
            previous.map(|prev| prev.raw_query.as_str())
        );

        QueryState {
            raw_query: key.to_string(),
            query,
            title_only,
            finished: false,
            first_seen: true,
            menu: previous
                .map(|prev| Rc::clone(&prev.menu))
                .unwrap_or_default(),
            matching_files: None,
            previous: previous.map(|prev| prev.raw_query.clone()),
            scores_inherited: previous.is_some(),
        }
    }

    /// Longest proper prefix of `key` that already has a state.
    fn longest_known_prefix(&self, key: &str) -> Option<&QueryState> {
        key.char_indices()
            .rev()
            .filter(|(idx, _)| *idx > 0)
            .find_map(|(idx, _)| self.states.get(&key[..idx]))
    }

    /// Exact lookup of a state created earlier by `set_current`.
    pub fn get(&self, query: &str) -> Result<&QueryState> {
        self.states
            .get(&query.to_lowercase())
            .ok_or_else(|| NotegrepError::StateNotFound {
                query: query.to_string(),
            })
    }

    pub fn get_mut(&mut self, query: &str) -> Result<&mut QueryState> {
        self.states
            .get_mut(&query.to_lowercase())
            .ok_or_else(|| NotegrepError::StateNotFound {
                query: query.to_string(),
            })
    }

    /// State this one narrows, if any.
    pub fn previous_of(&self, state: &QueryState) -> Option<&QueryState> {
        state
            .previous
            .as_deref()
            .and_then(|key| self.states.get(key))
    }

    pub fn current(&self) -> Option<&QueryState> {
        self.current.as_deref().and_then(|key| self.states.get(key))
    }

    pub fn current_mut(&mut self) -> Option<&mut QueryState> {
        let key = self.current.as_deref()?;
        self.states.get_mut(key)
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while no later keystroke has replaced the one that produced `generation`.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget every state. The generation keeps counting so that work
    /// scheduled before the reset stays stale.
    pub fn reset(&mut self) {
        debug!("Dropping {} search states", self.states.len());
        self.states.clear();
        self.current = None;
        self.generation += 1;
    }
}
