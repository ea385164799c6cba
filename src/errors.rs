// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types with helpful suggestions
//!
//! Provides user-friendly error messages with actionable suggestions.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotegrepError>;

#[derive(Error, Debug)]
pub enum NotegrepError {
    /// A query state was looked up that was never registered with `set_current`.
    #[error(
        "No search state registered for query '{query}'\n\n\
         Suggestion: states are created by typing; call set_current(\"{query}\") first."
    )]
    StateNotFound { query: String },

    #[error(
        "Page not found: '{page}'\n\n\
         Suggestion: run 'notegrep pages' to list the pages of the notebook."
    )]
    PageNotFound { page: String },

    #[error(
        "Notebook not found at '{}'\n\n\
         Suggestion: pass the notebook folder explicitly.\n\
         Example: notegrep --notebook ~/Notebooks/Notes search \"query\"",
        .path.display()
    )]
    NotebookNotFound { path: PathBuf },

    #[error("Invalid search pattern for term '{term}': {source}")]
    InvalidPattern {
        term: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to parse config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Helper functions for creating helpful error messages
pub mod suggestions {
    /// Get suggestion for a query that produced nothing
    pub fn no_results_suggestion(query: &str) -> String {
        format!(
            "No results found for '{}'\n\n\
             Try:\n\
             - A shorter or different query\n\
             - Dropping the title-only marker to search page contents too",
            query
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_not_found_mentions_query() {
        let err = NotegrepError::StateNotFound {
            query: "journ".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'journ'"));
        assert!(message.contains("set_current"));
    }

    #[test]
    fn notebook_not_found_shows_path() {
        let err = NotegrepError::NotebookNotFound {
            path: PathBuf::from("/nowhere/notes"),
        };
        assert!(err.to_string().contains("/nowhere/notes"));
    }
}
