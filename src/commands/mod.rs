//! CLI command handlers.

mod fetch;
mod footy;
mod history;

use std::io::{self, IsTerminal};

use anyhow::Result;
use image_downloader_core::ExportOutcome;
use tracing::debug;

use crate::ProcessExit;
use crate::app::context::RunContext;
use crate::app::exit_handler::determine_exit_outcome;
use crate::app::session::run_curation_session;
use crate::cli::ResultArgs;
use crate::output;

pub use fetch::run_fetch_command;
pub use footy::run_footy_command;
pub use history::run_history_command;

/// Whether an interactive session can read from the user.
pub(crate) fn stdin_is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Shared tail of every result-producing command: order, print, export,
/// then optionally hand the results to an interactive session.
pub(crate) async fn finish_results(ctx: &mut RunContext, args: &ResultArgs) -> Result<ProcessExit> {
    if args.sort_by_size && !ctx.workspace.sort_by_size() {
        ctx.workspace.toggle_sort_by_size();
    }

    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        output::write_results(&mut out, &ctx.workspace.displayed(), args.json)?;
    }

    let mut export_failed = false;
    if args.zip {
        match ctx.workspace.export_archive().await {
            Ok(ExportOutcome::Delivered { path, .. }) => {
                debug!(path = %path.display(), "archive delivered");
            }
            Ok(ExportOutcome::Skipped) => {}
            Err(error) => {
                debug!(error = %error, "archive export failed");
                export_failed = true;
            }
        }
    }

    if args.interactive {
        if stdin_is_interactive() {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let output_dir = ctx.output_dir.clone();
            let summary =
                run_curation_session(&mut ctx.workspace, &output_dir, &mut input, &mut out)
                    .await?;
            export_failed |= summary.export_failed;
        } else {
            debug!("stdin is not a terminal, skipping interactive session");
        }
    }

    Ok(determine_exit_outcome(
        ctx.workspace.curation().len(),
        export_failed,
    ))
}
