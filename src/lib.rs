// SPDX-License-Identifier: MIT OR Apache-2.0

//! notegrep - incremental search over hierarchical plain-text notebooks
//!
//! Each keystroke refines a cached query state: page titles are matched at
//! once, page contents are scanned after a short pause, and narrower queries
//! only rescan the files their shorter prefix matched.

pub mod config;
pub mod errors;
pub mod notebook;
pub mod output;
pub mod query;
pub mod session;

pub use errors::{NotegrepError, Result};
pub use notebook::{FsNotebook, MemoryNotebook, Notebook};
pub use session::SearchSession;
