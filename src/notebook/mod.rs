// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notebook module - page enumeration, page file reading and the content cache

pub mod content;
pub mod memory;
pub mod scanner;

use std::io;
use std::path::{Path, PathBuf};

use crate::errors::Result;

pub use content::{strip_metadata_header, CachedPage, ContentCache};
pub use memory::MemoryNotebook;
pub use scanner::FsNotebook;

/// Separator between the segments of a page path
pub const PAGE_SEPARATOR: char = ':';

/// Source of pages and their raw content.
///
/// The search core only talks to a notebook through this trait, so it can run
/// over a folder on disk as well as over pages held in memory.
pub trait Notebook {
    /// Every page path of the notebook, sorted.
    fn pages(&self) -> Result<Vec<String>>;

    /// Every page file of the notebook, sorted.
    fn files(&self) -> Result<Vec<PathBuf>>;

    /// Page path stored in `file`, if the file belongs to this notebook.
    fn page_for_file(&self, file: &Path) -> Option<String>;

    /// File that stores `page`. The file may not exist yet.
    fn file_for_page(&self, page: &str) -> PathBuf;

    /// Raw bytes of a page file.
    fn read(&self, file: &Path) -> io::Result<Vec<u8>>;
}

/// Final segment of a page path
pub fn leaf_name(page: &str) -> &str {
    page.rsplit(PAGE_SEPARATOR).next().unwrap_or(page)
}

/// Number of separators in a page path (0 for top-level pages)
pub fn page_depth(page: &str) -> usize {
    page.matches(PAGE_SEPARATOR).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_name_is_last_segment() {
        assert_eq!(leaf_name("Journal:foo:bar"), "bar");
        assert_eq!(leaf_name("Journal"), "Journal");
        assert_eq!(leaf_name("Journal:"), "");
    }

    #[test]
    fn depth_counts_separators() {
        assert_eq!(page_depth("test"), 0);
        assert_eq!(page_depth("Journal:2021:12"), 2);
    }
}
