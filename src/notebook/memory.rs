// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory notebook, used by embedders that already hold their pages and by tests

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use super::{Notebook, PAGE_SEPARATOR};
use crate::errors::Result;

const MEMORY_EXTENSION: &str = "txt";

/// Pages kept in a map; a page without content is listed but has no file.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotebook {
    pages: BTreeMap<String, Option<Vec<u8>>>,
}

impl MemoryNotebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page with text content
    pub fn with_page(mut self, page: &str, content: &str) -> Self {
        self.insert(page, content.as_bytes().to_vec());
        self
    }

    /// Add a page listed in the hierarchy without any stored content
    pub fn with_empty_page(mut self, page: &str) -> Self {
        self.pages.entry(page.to_string()).or_insert(None);
        self
    }

    /// Store raw bytes for a page, replacing previous content
    pub fn insert(&mut self, page: &str, bytes: Vec<u8>) {
        self.pages.insert(page.to_string(), Some(bytes));
    }
}

impl Notebook for MemoryNotebook {
    fn pages(&self) -> Result<Vec<String>> {
        Ok(self.pages.keys().cloned().collect())
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .pages
            .iter()
            .filter(|(_, content)| content.is_some())
            .map(|(page, _)| self.file_for_page(page))
            .collect())
    }

    fn page_for_file(&self, file: &Path) -> Option<String> {
        let stem = file.to_str()?.strip_suffix(".txt")?;
        let page = stem.replace('/', &PAGE_SEPARATOR.to_string());
        self.pages.contains_key(&page).then_some(page)
    }

    fn file_for_page(&self, page: &str) -> PathBuf {
        PathBuf::from(format!(
            "{}.{}",
            page.replace(PAGE_SEPARATOR, "/"),
            MEMORY_EXTENSION
        ))
    }

    fn read(&self, file: &Path) -> io::Result<Vec<u8>> {
        self.page_for_file(file)
            .and_then(|page| self.pages.get(&page).cloned().flatten())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, file.display().to_string()))
    }
}
