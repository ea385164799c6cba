// SPDX-License-Identifier: MIT OR Apache-2.0

//! Preview command: highlighted excerpt of one page

use anyhow::Result;

use super::CommandContext;
use crate::cli::OutputFormat;
use notegrep::output::{render_preview, to_json, PreviewPayload};

pub fn run(ctx: &CommandContext, page: &str, query: &str, short: bool) -> Result<()> {
    let mut settings = ctx.config.preview_settings();
    settings.short |= short;

    let mut session = ctx.open_session_with(settings)?;
    let preview = session.snippet_for(page, query)?;

    match ctx.format {
        OutputFormat::Text => {
            println!("{}", render_preview(&preview, ctx.use_color()));
        }
        OutputFormat::Json => {
            let payload = PreviewPayload {
                page,
                query,
                preview: &preview,
            };
            println!("{}", to_json(&payload, ctx.compact)?);
        }
    }
    Ok(())
}
