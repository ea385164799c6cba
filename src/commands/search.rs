// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search command: replays a query one keystroke at a time

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::debug;

use super::CommandContext;
use crate::cli::OutputFormat;
use notegrep::errors::suggestions::no_results_suggestion;
use notegrep::notebook::Notebook;
use notegrep::output::{render_preview, render_view, to_json, ScanSummary, SearchPayload};
use notegrep::query::{RankedView, ScanStats};
use notegrep::session::{ScheduledScan, SearchSession};

/// Options of the `search` subcommand
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub trace: bool,
    pub no_pause: bool,
    pub caret: Option<isize>,
    pub preview: bool,
}

/// Every prefix of `query`, as typed one character at a time
fn keystrokes(query: &str) -> Vec<&str> {
    if query.is_empty() {
        return vec![""];
    }
    query
        .char_indices()
        .map(|(idx, ch)| &query[..idx + ch.len_utf8()])
        .collect()
}

/// Final view of a replayed query and what led to it
struct Replay {
    view: RankedView,
    stats: Option<ScanStats>,
    trace: Vec<RankedView>,
}

fn replay<N: Notebook>(
    session: &mut SearchSession<N>,
    query: &str,
    options: &SearchOptions,
) -> Result<Replay> {
    let mut trace = Vec::new();
    let mut pending: Vec<ScheduledScan> = Vec::new();
    let mut stats = None;
    let mut view = None;

    for typed in keystrokes(query) {
        let outcome = session.input(typed)?;
        if options.trace {
            trace.push(outcome.view.clone());
        }
        view = Some(outcome.view);

        let Some(scan) = outcome.scheduled else {
            continue;
        };
        if options.no_pause {
            pending.push(scan);
            continue;
        }
        if let Some(done) = run_scan(session, scan, options.trace, &mut trace)? {
            stats = done.1.or(stats);
            view = Some(done.0);
        }
    }

    // Timers of superseded keystrokes still fire; the session drops them.
    for scan in pending {
        if let Some(done) = run_scan(session, scan, options.trace, &mut trace)? {
            stats = done.1.or(stats);
            view = Some(done.0);
        }
    }

    if let Some(delta) = options.caret.filter(|delta| *delta != 0) {
        if let Some(moved) = session.move_caret(delta) {
            view = Some(moved);
        }
    }

    let view = view.context("Search produced no view")?;
    Ok(Replay { view, stats, trace })
}

fn run_scan<N: Notebook>(
    session: &mut SearchSession<N>,
    scan: ScheduledScan,
    keep_trace: bool,
    trace: &mut Vec<RankedView>,
) -> Result<Option<(RankedView, Option<ScanStats>)>> {
    debug!(
        "Running full-text scan {} after {:?}",
        scan.generation, scan.delay
    );
    let outcome = session.run_full_text_with(scan.generation, |partial| {
        if keep_trace {
            trace.push(partial.clone());
        }
    })?;
    Ok(outcome.map(|outcome| {
        if keep_trace {
            trace.push(outcome.view.clone());
        }
        (outcome.view, outcome.stats)
    }))
}

pub fn run(ctx: &CommandContext, query: &str, options: &SearchOptions) -> Result<()> {
    let mut session = ctx.open_session()?;
    let Replay { view, stats, trace } = replay(&mut session, query, options)?;
    let preview = if options.preview {
        session.selected_preview()?
    } else {
        None
    };

    match ctx.format {
        OutputFormat::Text => {
            let use_color = ctx.use_color();
            for step in &trace {
                let header = format!("» {}", step.query);
                if use_color {
                    println!("{}", header.cyan());
                } else {
                    println!("{header}");
                }
                let body = render_view(step, use_color);
                if !body.is_empty() {
                    println!("{body}");
                }
            }
            if !trace.is_empty() {
                println!();
            }

            println!("{}", render_view(&view, use_color));
            if view.auto_open {
                if let Some(item) = view.selected() {
                    let mark = if use_color {
                        "✓".green().to_string()
                    } else {
                        "✓".to_string()
                    };
                    println!("{} Unique result: {}", mark, item.page);
                }
            }
            if let Some(preview) = &preview {
                println!();
                println!("{}", render_preview(preview, use_color));
            }
        }
        OutputFormat::Json => {
            let payload = SearchPayload {
                view: &view,
                scan: stats.map(ScanSummary::from),
                trace,
                preview,
            };
            println!("{}", to_json(&payload, ctx.compact)?);
        }
    }

    if view.finished && view.is_empty() {
        eprintln!("{}", no_results_suggestion(query));
    }
    Ok(())
}
