// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notebook folder scanner using walkdir
//!
//! Pages are stored one per file: `Journal/2021.txt` holds `Journal:2021`.
//! A folder holds the subpages of the page with the same name, and underscores
//! in file names stand for spaces in page names.

use std::collections::BTreeSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{Notebook, PAGE_SEPARATOR};
use crate::errors::{NotegrepError, Result};

const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn", ".zim", ".notegrep"];

/// Notebook stored as a folder of text files
#[derive(Debug, Clone)]
pub struct FsNotebook {
    root: PathBuf,
    extension: String,
}

impl FsNotebook {
    /// Open the notebook rooted at `root`; page files end with `.{extension}`.
    pub fn open(root: impl AsRef<Path>, extension: &str) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(NotegrepError::NotebookNotFound {
                path: root.to_path_buf(),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walker(&self) -> impl Iterator<Item = DirEntry> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry))
            .filter_map(|entry| entry.ok())
    }

    fn is_page_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// Page path for a notebook-relative path with the extension already removed
    fn page_from_relative(relative: &Path) -> Option<String> {
        let segments: Vec<String> = relative
            .components()
            .map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy().replace('_', " ")),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        if segments.is_empty() {
            return None;
        }
        Some(segments.join(&PAGE_SEPARATOR.to_string()))
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}

impl Notebook for FsNotebook {
    fn pages(&self) -> Result<Vec<String>> {
        let mut pages = BTreeSet::new();
        for entry in self.walker() {
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            if entry.file_type().is_dir() {
                // A folder only becomes a page when it holds at least one page file.
                let has_pages = WalkDir::new(path)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .any(|e| e.file_type().is_file() && self.is_page_file(e.path()));
                if has_pages {
                    if let Some(page) = Self::page_from_relative(relative) {
                        pages.insert(page);
                    }
                }
            } else if self.is_page_file(path) {
                if let Some(page) = Self::page_from_relative(&relative.with_extension("")) {
                    pages.insert(page);
                }
            }
        }
        Ok(pages.into_iter().collect())
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self
            .walker()
            .filter(|entry| entry.file_type().is_file() && self.is_page_file(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        files.sort();
        Ok(files)
    }

    fn page_for_file(&self, file: &Path) -> Option<String> {
        if !self.is_page_file(file) {
            return None;
        }
        let relative = file.strip_prefix(&self.root).ok()?;
        Self::page_from_relative(&relative.with_extension(""))
    }

    fn file_for_page(&self, page: &str) -> PathBuf {
        let segments: Vec<String> = page
            .split(PAGE_SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(|s| s.replace(' ', "_"))
            .collect();
        let mut path = self.root.clone();
        if let Some((leaf, parents)) = segments.split_last() {
            path.extend(parents);
            // dots in page names are part of the name, not an extension
            path.push(format!("{leaf}.{}", self.extension));
        }
        path
    }

    fn read(&self, file: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(file)
    }
}
