// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query module - incremental search states, matching, ranking and snippets

pub mod fulltext;
pub mod patterns;
pub mod ranker;
pub mod snippet;
pub mod state;
pub mod title;

pub use fulltext::{candidate_files, FileVerdict, FullTextScanner, ScanStats};
pub use patterns::{PatternCache, PatternKind};
pub use ranker::{
    Caret, Clock, ManualClock, RankedItem, RankedView, RedrawThrottle, ResultRanker, SortMode,
    SystemClock,
};
pub use snippet::{Preview, SnippetExtractor};
pub use state::{Menu, QueryState, QueryStateStore, ResultEntry};
pub use title::match_titles;
