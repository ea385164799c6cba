// SPDX-License-Identifier: MIT OR Apache-2.0

//! notegrep - search-as-you-type filter for plain-text notebooks
//!
//! Replays queries through the same incremental search session an
//! interactive dialog would drive, and prints ranked pages and previews.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::search::SearchOptions;
use commands::CommandContext;
use notegrep::config::Config;
use tracing_subscriber::EnvFilter;

/// Log filter env var; overrides the `-v` levels
const LOG_ENV: &str = "NOTEGREP_LOG";

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "notegrep=debug",
        _ => "notegrep=trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = CommandContext::new(Config::load(), cli.notebook, cli.format, cli.compact);

    match cli.command {
        Commands::Search {
            query,
            trace,
            no_pause,
            caret,
            preview,
        } => {
            let options = SearchOptions {
                trace,
                no_pause,
                caret,
                preview,
            };
            commands::search::run(&ctx, &query, &options)?;
        }
        Commands::Preview { page, query, short } => {
            commands::preview::run(&ctx, &page, &query, short)?;
        }
        Commands::Pages => {
            commands::pages::run(&ctx)?;
        }
    }

    Ok(())
}
