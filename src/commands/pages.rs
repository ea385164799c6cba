// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pages command: list the notebook's pages

use anyhow::Result;
use serde::Serialize;

use super::CommandContext;
use crate::cli::OutputFormat;
use notegrep::output::{render_page, to_json};

#[derive(Debug, Serialize)]
struct PagesPayload<'a> {
    total: usize,
    pages: &'a [String],
}

pub fn run(ctx: &CommandContext) -> Result<()> {
    let session = ctx.open_session()?;
    let pages = session.titles();

    match ctx.format {
        OutputFormat::Text => {
            let use_color = ctx.use_color();
            for page in pages {
                println!("{}", render_page(page, use_color));
            }
        }
        OutputFormat::Json => {
            let payload = PagesPayload {
                total: pages.len(),
                pages,
            };
            println!("{}", to_json(&payload, ctx.compact)?);
        }
    }
    Ok(())
}
