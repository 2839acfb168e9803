//! Builds the runtime workspace from resolved settings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use image_downloader_core::{
    ArchiveExporter, BatchOrchestrator, DirectorySink, FootySource, GeminiClient,
    GoogleImageSource, HistoryStore, HttpPayloadFetcher, MemoryHistoryStore, PixabaySource,
    Source, SourceRegistry, SqliteHistoryStore, Workspace,
};
use tracing::{debug, warn};

use crate::app::config_runtime::RunSettings;

/// Shared state built during startup so command handlers can use
/// `ctx.workspace`, `ctx.output_dir`, etc.
pub(crate) struct RunContext {
    pub(crate) workspace: Workspace,
    pub(crate) output_dir: PathBuf,
    pub(crate) images_per_keyword: u32,
    pub(crate) max_pages: u32,
    pub(crate) quiet: bool,
}

/// Registers every source whose API key is configured. Sources without a
/// key stay unregistered and report as unavailable when requested.
pub(crate) fn build_registry(settings: &RunSettings) -> Result<SourceRegistry> {
    let mut registry = SourceRegistry::new();

    if let Some(key) = settings.pixabay_api_key.as_deref() {
        let pixabay = PixabaySource::new(key, settings.timeouts)
            .context("Failed to set up the Pixabay source")?;
        registry.register_image_source(Source::Pixabay, Arc::new(pixabay));
    } else {
        debug!("no Pixabay API key configured");
    }

    if let Some(key) = settings.gemini_api_key.as_deref() {
        let gemini = GeminiClient::new(key, settings.timeouts)
            .context("Failed to set up the Gemini client")?;
        registry.register_image_source(
            Source::Google,
            Arc::new(GoogleImageSource::new(gemini.clone())),
        );
        registry.register_link_source(Arc::new(FootySource::new(gemini)));
    } else {
        debug!("no Gemini API key configured");
    }

    Ok(registry)
}

/// Opens the history database, falling back to an in-memory log when the
/// file cannot be opened.
pub(crate) async fn open_history(settings: &RunSettings) -> Arc<dyn HistoryStore> {
    match SqliteHistoryStore::open(&settings.history_db).await {
        Ok(store) => Arc::new(store),
        Err(error) => {
            warn!(
                path = %settings.history_db.display(),
                error = %error,
                "History database unavailable, history will not persist"
            );
            Arc::new(MemoryHistoryStore::new())
        }
    }
}

pub(crate) async fn build_context(settings: &RunSettings) -> Result<RunContext> {
    let registry = build_registry(settings)?;
    let history = open_history(settings).await;
    let orchestrator = BatchOrchestrator::new(registry, history);

    let fetcher = HttpPayloadFetcher::new(settings.timeouts)
        .context("Failed to build the HTTP client for image downloads")?;
    let exporter = ArchiveExporter::new(
        Arc::new(fetcher),
        Arc::new(DirectorySink::new(settings.output_dir.clone())),
    )
    .with_concurrency(settings.archive_concurrency);

    Ok(RunContext {
        workspace: Workspace::new(orchestrator, exporter),
        output_dir: settings.output_dir.clone(),
        images_per_keyword: settings.images_per_keyword,
        max_pages: settings.max_pages,
        quiet: settings.quiet,
    })
}
