use std::io::{self, IsTerminal};

use anyhow::Result;
use image_downloader_core::BatchError;
use tracing::{debug, info};

use crate::app::{config_manager, config_runtime, context, progress_manager, terminal};
use crate::cli::Command;
use crate::{ProcessExit, commands};

pub(crate) async fn run_image_downloader() -> Result<ProcessExit> {
    let (cli, cli_sources) = config_runtime::parse_cli_with_sources();

    let settings = config_manager::resolve_config(&cli, &cli_sources)?;

    let default_level = config_runtime::resolve_default_log_level(settings.verbose, settings.quiet);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    let no_color = terminal::is_no_color_requested(&cli);
    terminal::init_tracing(default_level, force_cli_log_level, no_color);

    debug!(
        output_dir = %settings.output_dir.display(),
        history_db = %settings.history_db.display(),
        "Settings resolved"
    );
    info!("Image downloader starting");

    if let Command::History(history_args) = &cli.command {
        commands::run_history_command(&settings.history_db, history_args).await?;
        return Ok(ProcessExit::Success);
    }

    let mut ctx = context::build_context(&settings).await?;

    let use_bar = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        ctx.quiet,
        terminal::is_dumb_terminal(),
    );
    let events = ctx.workspace.subscribe();
    let ui_handle = progress_manager::spawn_activity_ui(use_bar, ctx.quiet, events);

    let result = match &cli.command {
        Command::Fetch(fetch_args) => commands::run_fetch_command(&mut ctx, fetch_args).await,
        Command::Footy(footy_args) => commands::run_footy_command(&mut ctx, footy_args).await,
        Command::History(_) => Ok(ProcessExit::Success),
    };

    ctx.workspace.unsubscribe();
    if let Err(error) = ui_handle.await {
        debug!(error = %error, "activity renderer stopped abnormally");
    }

    match result {
        Ok(exit) => Ok(exit),
        Err(error) => match error.downcast_ref::<BatchError>() {
            // Already reported through the activity log.
            Some(BatchError::Validation(_) | BatchError::SourceUnavailable { .. }) => {
                Ok(ProcessExit::Usage)
            }
            _ => Err(error),
        },
    }
}
