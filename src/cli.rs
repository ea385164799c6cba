// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// notegrep - search-as-you-type over a notebook of text pages
///
/// Replays a query keystroke by keystroke the way the instant search dialog
/// sees it, and prints the ranked pages or a highlighted page preview.
#[derive(Parser, Debug)]
#[command(name = "notegrep")]
#[command(
    author,
    version,
    about,
    long_about = None,
    override_usage = "notegrep [OPTIONS] <COMMAND>",
    after_help = "Quickstart:\n  notegrep --notebook ~/Notebooks/Notes search \"journal foo\"\n  notegrep search '!todo'          (page titles only)\n  notegrep preview Journal:2021 \"foo\""
)]
pub struct Cli {
    /// Notebook folder (defaults to the config value, then the current directory)
    #[arg(short = 'n', long, global = true)]
    pub notebook: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Log search internals to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Type a query and print the ranked pages
    #[command(
        visible_aliases = ["s"],
        after_help = "Examples:\n  notegrep s \"foo\"\n  notegrep search --trace \"journal foo\"\n  notegrep search --no-pause \"economical\""
    )]
    Search {
        /// Query text; a leading title marker (default '!') matches page titles only
        query: String,

        /// Print the view after every keystroke and redraw
        #[arg(long)]
        trace: bool,

        /// Only the last keystroke gets its full-text scan, as with fast typing
        #[arg(long)]
        no_pause: bool,

        /// Move the caret by this many rows before printing
        #[arg(long, allow_hyphen_values = true)]
        caret: Option<isize>,

        /// Also print the preview of the selected page
        #[arg(short, long)]
        preview: bool,
    },

    /// Print the highlighted preview of a page
    #[command(visible_aliases = ["p"])]
    Preview {
        /// Page path, e.g. Journal:2021
        page: String,

        /// Terms to highlight
        #[arg(default_value = "")]
        query: String,

        /// Show only matching lines even for short pages
        #[arg(long)]
        short: bool,
    },

    /// List every page of the notebook
    Pages,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_alias_and_flags_parse() {
        let cli = Cli::try_parse_from([
            "notegrep",
            "--notebook",
            "/tmp/notes",
            "s",
            "journal foo",
            "--trace",
            "--caret",
            "-1",
        ])
        .expect("parse search alias");

        assert_eq!(cli.notebook, Some(PathBuf::from("/tmp/notes")));
        match cli.command {
            Commands::Search {
                query,
                trace,
                no_pause,
                caret,
                preview,
            } => {
                assert_eq!(query, "journal foo");
                assert!(trace);
                assert!(!no_pause);
                assert_eq!(caret, Some(-1));
                assert!(!preview);
            }
            other => panic!("expected search command, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["notegrep", "pages", "--format", "json", "-vv"])
            .expect("parse pages");
        assert!(matches!(cli.command, Commands::Pages));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn preview_query_defaults_to_empty() {
        let cli = Cli::try_parse_from(["notegrep", "preview", "Journal:2021"]).expect("parse");
        match cli.command {
            Commands::Preview { page, query, short } => {
                assert_eq!(page, "Journal:2021");
                assert_eq!(query, "");
                assert!(!short);
            }
            other => panic!("expected preview command, got {other:?}"),
        }
    }
}
