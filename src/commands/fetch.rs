//! Fetch command handler: one keyword batch.

use anyhow::Result;
use image_downloader_core::{BatchRequest, Source};
use tracing::info;

use crate::ProcessExit;
use crate::app::context::RunContext;
use crate::cli::FetchArgs;

use super::finish_results;

pub async fn run_fetch_command(ctx: &mut RunContext, args: &FetchArgs) -> Result<ProcessExit> {
    let source = Source::from(args.source);
    let count = args.count.unwrap_or(ctx.images_per_keyword);
    let request = BatchRequest::new(source, args.keyword_input(), count);
    info!(source = %source, count, "Starting keyword batch");

    ctx.workspace.start(&request).await?;
    finish_results(ctx, &args.results).await
}
