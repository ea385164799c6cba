// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result ranking, visibility, redraw throttling and caret tracking

use serde::Serialize;
use std::cell::Cell;
use std::cmp::{Ordering, Reverse};
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::snippet::escape_markup;
use super::state::{Menu, QueryState, ResultEntry};
use crate::notebook::{page_depth, PAGE_SEPARATOR};

/// Source of the current time for redraw throttling
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Skips redraws that come sooner than `interval` after the previous one
#[derive(Debug, Clone)]
pub struct RedrawThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl RedrawThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// The first redraw and forced redraws always pass.
    pub fn should_redraw(&mut self, now: Instant, force: bool) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => force || now.duration_since(last) >= self.interval,
        };
        if due {
            self.last = Some(now);
        }
        due
    }

    /// Start a new lifecycle; the next redraw is a first one again.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Highlight, score, shallow paths first, then path
    Primary,
    /// Highlight, then the rank each page had at the previous render
    Stable,
}

fn primary_order(a: (&String, &ResultEntry), b: (&String, &ResultEntry)) -> Ordering {
    let key = |(page, entry): (&String, &ResultEntry)| {
        (
            Reverse(entry.title_highlight),
            Reverse(entry.score()),
            page_depth(page),
        )
    };
    key(a).cmp(&key(b)).then_with(|| a.0.cmp(b.0))
}

fn stable_order(a: (&String, &ResultEntry), b: (&String, &ResultEntry)) -> Ordering {
    // pages never shown yet go after the ones already on screen
    let key = |(_, entry): (&String, &ResultEntry)| {
        (
            Reverse(entry.title_highlight),
            entry.display_order.is_none(),
            entry.display_order,
        )
    };
    key(a)
        .cmp(&key(b))
        .then_with(|| primary_order(a, b))
}

/// Visible pages of `menu`, in display order
pub fn rank(menu: &Menu, mode: SortMode) -> Vec<String> {
    let mut visible: Vec<(&String, &ResultEntry)> = menu
        .iter()
        .filter(|(_, entry)| entry.is_visible())
        .collect();
    match mode {
        SortMode::Primary => visible.sort_by(|a, b| primary_order(*a, *b)),
        SortMode::Stable => visible.sort_by(|a, b| stable_order(*a, *b)),
    }
    visible.into_iter().map(|(page, _)| page.clone()).collect()
}

/// Selection inside the visible list.
///
/// A sticky caret follows its page across re-sorts; a caret that was never
/// moved (or was sent back to the top) stays on the first row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caret {
    position: usize,
    sticky: bool,
    page: Option<String>,
}

impl Caret {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    /// Move by `delta` rows. Stepping one row past the end wraps to the top;
    /// any other overshoot stops at the first or last row.
    pub fn move_by(&mut self, delta: isize, pages: &[String]) {
        let target = self.position as isize + delta;
        self.sticky = true;
        self.position = clamp(target, pages.len(), delta == 1);
        self.remember(pages);
    }

    pub fn jump_to_start(&mut self, pages: &[String]) {
        self.position = 0;
        self.sticky = false;
        self.remember(pages);
    }

    pub fn jump_to_end(&mut self, pages: &[String]) {
        self.position = pages.len().saturating_sub(1);
        self.sticky = true;
        self.remember(pages);
    }

    /// Re-find the selected page after the list was re-ranked.
    pub fn relocate(&mut self, pages: &[String]) {
        if self.sticky && !pages.is_empty() {
            self.position = self
                .page
                .as_deref()
                .and_then(|selected| pages.iter().position(|page| page == selected))
                .unwrap_or(0);
        }
        self.position = clamp(self.position as isize, pages.len(), false);
        self.remember(pages);
    }

    fn remember(&mut self, pages: &[String]) {
        if let Some(page) = pages.get(self.position) {
            self.page = Some(page.clone());
        }
    }
}

fn clamp(target: isize, len: usize, wrap_forward: bool) -> usize {
    if target <= 0 || len == 0 {
        0
    } else if target as usize >= len {
        if wrap_forward {
            0
        } else {
            len - 1
        }
    } else {
        target as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    pub page: String,
    pub score: u32,
    pub title_highlight: bool,
}

/// What the result list shows for the active query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedView {
    pub query: String,
    pub items: Vec<RankedItem>,
    /// Index of the selected item, when there is one
    pub caret: Option<usize>,
    pub finished: bool,
    pub title_only: bool,
    /// The list holds a single page and the session is set to open it
    pub auto_open: bool,
}

impl RankedView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_unique(&self) -> bool {
        self.items.len() == 1
    }

    pub fn selected(&self) -> Option<&RankedItem> {
        self.caret.and_then(|idx| self.items.get(idx))
    }

    pub fn pages(&self) -> Vec<String> {
        self.items.iter().map(|item| item.page.clone()).collect()
    }

    /// One line per item, `Journal:<b>foo</b> (12)`, the selected one marked
    /// with an arrow. A finished empty list reads "No result".
    pub fn to_markup(&self) -> String {
        if self.items.is_empty() {
            return if self.finished {
                "No result".to_string()
            } else {
                String::new()
            };
        }
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let line = format!("{} ({})", page_markup(&item.page), item.score);
                if Some(idx) == self.caret {
                    format!("→ {line}")
                } else {
                    line
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Page path with its leaf segment in bold
fn page_markup(page: &str) -> String {
    match page.rsplit_once(PAGE_SEPARATOR) {
        Some((parents, leaf)) => format!(
            "{}{}<b>{}</b>",
            escape_markup(parents),
            PAGE_SEPARATOR,
            escape_markup(leaf)
        ),
        None => format!("<b>{}</b>", escape_markup(page)),
    }
}

/// Turns query states into views, keeping the caret and throttling redraws
pub struct ResultRanker {
    clock: Box<dyn Clock>,
    throttle: RedrawThrottle,
    caret: Caret,
    open_when_unique: bool,
    /// The next streamed batch is the first of its scan
    first_batch: bool,
    last: Option<RankedView>,
}

impl ResultRanker {
    pub fn new(clock: Box<dyn Clock>, redraw_interval: Duration, open_when_unique: bool) -> Self {
        Self {
            clock,
            throttle: RedrawThrottle::new(redraw_interval),
            caret: Caret::default(),
            open_when_unique,
            first_batch: true,
            last: None,
        }
    }

    /// A new query state starts its lifecycle; its first redraw is immediate.
    pub fn begin(&mut self) {
        self.throttle.reset();
        self.first_batch = true;
    }

    /// Rank and render `state` unconditionally.
    pub fn render(&mut self, state: &mut QueryState, mode: SortMode) -> RankedView {
        self.throttle.should_redraw(self.clock.now(), true);
        self.build(state, mode)
    }

    /// Stable render of a partial scan, skipped when the last redraw is too
    /// recent. The first batch of a scan is always drawn.
    pub fn render_batch(&mut self, state: &mut QueryState) -> Option<RankedView> {
        let force = std::mem::take(&mut self.first_batch);
        if !self.throttle.should_redraw(self.clock.now(), force) {
            return None;
        }
        Some(self.build(state, SortMode::Stable))
    }

    fn build(&mut self, state: &mut QueryState, mode: SortMode) -> RankedView {
        let pages = rank(&state.menu, mode);
        let menu = state.menu_mut();
        for entry in menu.values_mut() {
            entry.display_order = None;
        }
        for (idx, page) in pages.iter().enumerate() {
            if let Some(entry) = menu.get_mut(page) {
                entry.display_order = Some(idx);
            }
        }
        self.caret.relocate(&pages);

        let items: Vec<RankedItem> = pages
            .iter()
            .filter_map(|page| {
                state.menu.get(page).map(|entry| RankedItem {
                    page: page.clone(),
                    score: entry.score(),
                    title_highlight: entry.title_highlight,
                })
            })
            .collect();
        let view = RankedView {
            query: state.query.clone(),
            caret: (!items.is_empty()).then_some(self.caret.position()),
            auto_open: self.open_when_unique && state.finished && items.len() == 1,
            finished: state.finished,
            title_only: state.title_only,
            items,
        };
        self.last = Some(view.clone());
        view
    }

    pub fn caret(&self) -> &Caret {
        &self.caret
    }

    /// Last rendered view
    pub fn view(&self) -> Option<&RankedView> {
        self.last.as_ref()
    }

    pub fn move_caret(&mut self, delta: isize) -> Option<RankedView> {
        self.with_caret(|caret, pages| caret.move_by(delta, pages))
    }

    pub fn jump_to_start(&mut self) -> Option<RankedView> {
        self.with_caret(Caret::jump_to_start)
    }

    pub fn jump_to_end(&mut self) -> Option<RankedView> {
        self.with_caret(Caret::jump_to_end)
    }

    fn with_caret<F>(&mut self, op: F) -> Option<RankedView>
    where
        F: FnOnce(&mut Caret, &[String]),
    {
        let view = self.last.as_mut()?;
        let pages = view.pages();
        op(&mut self.caret, &pages);
        view.caret = (!pages.is_empty()).then_some(self.caret.position());
        Some(view.clone())
    }

    /// Forget the caret and the last view, as when the search is reopened.
    pub fn reset(&mut self) {
        self.caret = Caret::default();
        self.throttle.reset();
        self.first_batch = true;
        self.last = None;
    }
}
