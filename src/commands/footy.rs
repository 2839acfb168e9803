//! Footy command handler: collect links, confirm them, then synthesize.

use std::io;

use anyhow::Result;
use image_downloader_core::{BatchRequest, Source, StartOutcome};
use tracing::info;

use crate::ProcessExit;
use crate::app::context::RunContext;
use crate::app::session::{LinkDecision, run_link_selector};
use crate::cli::FootyArgs;

use super::{finish_results, stdin_is_interactive};

pub async fn run_footy_command(ctx: &mut RunContext, args: &FootyArgs) -> Result<ProcessExit> {
    let max_pages = args.max_pages.unwrap_or(ctx.max_pages);
    let request = BatchRequest::new(Source::Footy, args.team.as_str(), max_pages);
    info!(team = %args.team, max_pages, "Collecting player links");

    if ctx.workspace.start(&request).await? == StartOutcome::AwaitingLinks {
        let decision = choose_links(ctx, args)?;
        match decision {
            LinkDecision::Confirm => ctx.workspace.confirm_links().await?,
            LinkDecision::Cancel => ctx.workspace.cancel_links().await?,
        };
    }

    finish_results(ctx, &args.results).await
}

/// Applies `--exclude` patterns, then asks the user when the session is
/// interactive. Without `-i` (or with `--yes`) the remaining links are
/// confirmed as they stand.
fn choose_links(ctx: &mut RunContext, args: &FootyArgs) -> Result<LinkDecision> {
    let Some(selector) = ctx.workspace.links_mut() else {
        return Ok(LinkDecision::Cancel);
    };

    for pattern in &args.exclude {
        let removed = selector.deselect_matching(pattern);
        info!(pattern = %pattern, removed, "Excluded links");
    }

    if args.yes || !args.results.interactive || !stdin_is_interactive() {
        return Ok(LinkDecision::Confirm);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_link_selector(selector, &mut input, &mut out)
}
