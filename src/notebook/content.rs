// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-scoped cache of page contents
//!
//! Files are read lazily the first time a scan or a preview needs them. Nothing
//! watches the notebook folder, so the owner must clear the cache whenever the
//! pages may have changed (the session does it on close).

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::Notebook;

/// First line of a page file that carries a metadata header
const METADATA_HEADER_PREFIX: &str = "Content-Type:";

/// Page content with its metadata header already removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub page: String,
    pub contents: String,
}

#[derive(Debug, Default)]
pub struct ContentCache {
    pages: HashMap<PathBuf, CachedPage>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached page for `file`, reading it through `notebook` on first use.
    ///
    /// Unreadable files and files that are not valid UTF-8 are skipped with a
    /// warning; they are retried on the next call.
    pub fn get_or_load(&mut self, notebook: &dyn Notebook, file: &Path) -> Option<&CachedPage> {
        if self.pages.contains_key(file) {
            return self.pages.get(file);
        }

        let page = notebook.page_for_file(file)?;
        let bytes = match notebook.read(file) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No file for page {}", page);
                return None;
            }
            Err(err) => {
                warn!("Skipping {}: {}", file.display(), err);
                return None;
            }
        };
        let contents = match String::from_utf8(bytes) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(
                    "Skipping {} due to invalid character encoding: {}",
                    file.display(),
                    err
                );
                return None;
            }
        };

        let cached = CachedPage {
            page,
            contents: strip_metadata_header(&contents).to_string(),
        };
        Some(self.pages.entry(file.to_path_buf()).or_insert(cached))
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.pages.contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

/// Body of a page file without its leading metadata header.
///
/// The header runs up to the first blank line. A file whose header never ends
/// has an empty body.
pub fn strip_metadata_header(contents: &str) -> &str {
    if !contents.starts_with(METADATA_HEADER_PREFIX) {
        return contents;
    }
    let mut offset = 0;
    for line in contents.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end_matches(['\r', '\n']).is_empty() {
            return &contents[offset..];
        }
    }
    ""
}
