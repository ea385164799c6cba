// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations

pub mod pages;
pub mod preview;
pub mod search;

use anyhow::Result;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use notegrep::config::{Config, ConfigOutputFormat, PreviewSettings};
use notegrep::notebook::FsNotebook;
use notegrep::output::use_colors;
use notegrep::session::SearchSession;

/// Settings shared by every subcommand
pub struct CommandContext {
    pub config: Config,
    pub notebook: Option<PathBuf>,
    pub format: OutputFormat,
    pub compact: bool,
}

impl CommandContext {
    pub fn new(
        config: Config,
        notebook: Option<PathBuf>,
        format: Option<OutputFormat>,
        compact: bool,
    ) -> Self {
        let format = format
            .or_else(|| {
                config.output_format().map(|f| match f {
                    ConfigOutputFormat::Text => OutputFormat::Text,
                    ConfigOutputFormat::Json => OutputFormat::Json,
                })
            })
            .unwrap_or(OutputFormat::Text);
        Self {
            config,
            notebook,
            format,
            compact,
        }
    }

    pub fn use_color(&self) -> bool {
        self.format == OutputFormat::Text && use_colors()
    }

    pub fn open_session(&self) -> Result<SearchSession<FsNotebook>> {
        self.open_session_with(self.config.preview_settings())
    }

    pub fn open_session_with(&self, preview: PreviewSettings) -> Result<SearchSession<FsNotebook>> {
        let root = self.config.merge_notebook(self.notebook.as_deref());
        let settings = self.config.search_settings();
        let notebook = FsNotebook::open(&root, &settings.file_extension)?;
        let mut session = SearchSession::new(notebook, settings, preview);
        session.open()?;
        Ok(session)
    }
}
