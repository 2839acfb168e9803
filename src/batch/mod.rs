//! Batch acquisition: validation, the per-item fetch loop, the two-phase
//! link flow, progress reporting and history writes.
//!
//! # Architecture
//!
//! - [`BatchRequest`] - Raw user input (source, keywords/team, count)
//! - [`BatchOrchestrator`] - Runs one batch at a time against a [`SourceRegistry`]
//! - [`BatchOutcome`] - Finished report, or a [`LinkSelection`] awaiting the user
//! - [`BatchRun`] - Bookkeeping of the most recent run
//!
//! Work items are processed strictly in order. A failing item is logged
//! and skipped; it never aborts the batch.

mod error;
mod request;

pub use error::{BatchError, ValidationError};
pub use request::{
    BatchRequest, DEFAULT_IMAGES_PER_ITEM, DEFAULT_PAGES, MAX_IMAGES_PER_ITEM, MAX_PAGES,
    MIN_IMAGES_PER_ITEM, MIN_PAGES, split_work_items,
};

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::activity::ActivityLog;
use crate::history::{HistoryStore, NewHistoryRecord};
use crate::image::{IdAllocator, ImageDescriptor};
use crate::link_selector::{LinkSelection, LinkSelectionError};
use crate::source::{Source, SourceRegistry, player_name_from_link};

use request::ValidatedRequest;

/// Bookkeeping for one acquisition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRun {
    pub source: Source,
    /// Keyword or team input as entered (trimmed).
    pub input: String,
    /// Keywords, or confirmed links for the two-phase source.
    pub work_items: Vec<String>,
    /// Work items processed so far, failed ones included.
    pub completed_items: usize,
    /// Work items that produced an error or no image.
    pub failed_items: usize,
    /// Progress denominator fixed before the first request.
    pub expected_total: usize,
}

impl BatchRun {
    fn new(source: Source, input: &str, work_items: Vec<String>, expected_total: usize) -> Self {
        Self {
            source,
            input: input.trim().to_string(),
            work_items,
            completed_items: 0,
            failed_items: 0,
            expected_total,
        }
    }
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run: BatchRun,
    /// Images in acquisition order.
    pub images: Vec<ImageDescriptor>,
    /// Whether a history record was written.
    pub history_recorded: bool,
}

impl BatchReport {
    fn empty(run: BatchRun) -> Self {
        Self {
            run,
            images: Vec::new(),
            history_recorded: false,
        }
    }
}

/// What [`BatchOrchestrator::run_batch`] produced.
#[derive(Debug)]
pub enum BatchOutcome {
    /// The batch finished; images may be empty.
    Completed(BatchReport),
    /// Links were collected and wait for confirmation; pass the resolved
    /// selection to [`BatchOrchestrator::synthesize_selected`].
    AwaitingSelection(LinkSelection),
}

/// Drives acquisition runs against the registered sources.
pub struct BatchOrchestrator {
    sources: SourceRegistry,
    history: Arc<dyn HistoryStore>,
    ids: IdAllocator,
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new(sources: SourceRegistry, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            sources,
            history,
            ids: IdAllocator::new(),
        }
    }

    #[must_use]
    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// The history store batches are recorded into.
    #[must_use]
    pub fn history(&self) -> Arc<dyn HistoryStore> {
        Arc::clone(&self.history)
    }

    /// Starts a batch.
    ///
    /// Keyword sources run to completion. The two-phase source stops after
    /// link collection and returns [`BatchOutcome::AwaitingSelection`] when
    /// links were found.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Validation`] (after logging a warning, before
    /// any network call) for bad input, and [`BatchError::SourceUnavailable`]
    /// when the source has no adapter. Per-item failures are logged, not
    /// returned.
    #[instrument(skip(self, log), fields(source = %request.source))]
    pub async fn run_batch(
        &mut self,
        request: &BatchRequest,
        log: &mut ActivityLog,
    ) -> Result<BatchOutcome, BatchError> {
        let validated = match request.validate() {
            Ok(validated) => validated,
            Err(error) => {
                log.warn(error.to_string());
                return Err(error.into());
            }
        };

        if !self.sources.is_available(request.source) {
            let error = BatchError::source_unavailable(request.source);
            log.error(error.to_string());
            return Err(error);
        }

        match validated {
            ValidatedRequest::Keywords {
                source,
                work_items,
                per_item_count,
            } => Ok(BatchOutcome::Completed(
                self.run_keywords(source, &request.input, work_items, per_item_count, log)
                    .await,
            )),
            ValidatedRequest::Team { team, max_pages } => {
                self.collect_links(team, max_pages, log).await
            }
        }
    }

    async fn run_keywords(
        &mut self,
        source: Source,
        input: &str,
        work_items: Vec<String>,
        per_item_count: u32,
        log: &mut ActivityLog,
    ) -> BatchReport {
        let Some(adapter) = self.sources.image_source(source) else {
            // Checked by run_batch.
            return BatchReport::empty(BatchRun::new(source, input, work_items, 0));
        };

        let per_item = usize::try_from(per_item_count).unwrap_or(usize::MAX);
        let total = work_items.len().saturating_mul(per_item);
        let mut run = BatchRun::new(source, input, work_items, total);
        let mut images: Vec<ImageDescriptor> = Vec::new();

        self.ids.next_batch();
        log.reset(Some("Starting download..."));
        log.set_progress(0, total);
        log.info(format!("Fetching {total} images from {}...", source.label()));

        for item in run.work_items.clone() {
            match adapter.fetch(&item, per_item_count).await {
                Ok(candidates) => {
                    let before = images.len();
                    images.extend(
                        candidates
                            .into_iter()
                            .take(per_item)
                            .map(|c| ImageDescriptor::from_candidate(self.ids.allocate(), c)),
                    );
                    let fetched = images.len() - before;
                    debug!(item = %item, fetched, "work item done");
                    log.success(format!("Fetched {fetched} images for '{item}'"));
                }
                Err(error) => {
                    warn!(item = %item, error = %error, "work item failed");
                    run.failed_items += 1;
                    log.error(format!("Error fetching '{item}': {error}"));
                }
            }
            run.completed_items += 1;
            log.set_progress(images.len(), total);
        }

        let history_recorded = if images.is_empty() {
            false
        } else {
            self.record_history(source, &run.input, images.len(), log)
                .await
        };

        if images.is_empty() {
            log.warn("Download finished without any images.");
        } else {
            log.info(format!("Download complete! {} images ready.", images.len()));
        }
        info!(
            images = images.len(),
            failed_items = run.failed_items,
            "batch complete"
        );

        BatchReport {
            run,
            images,
            history_recorded,
        }
    }

    async fn collect_links(
        &mut self,
        team: String,
        max_pages: u32,
        log: &mut ActivityLog,
    ) -> Result<BatchOutcome, BatchError> {
        let Some(adapter) = self.sources.link_source() else {
            return Err(BatchError::source_unavailable(Source::Footy));
        };

        log.reset(Some("Starting download..."));
        log.info(format!("Collecting player links for '{team}'..."));
        let state = LinkSelection::collecting(team.clone());

        let links = match adapter.collect_links(&team, max_pages).await {
            Ok(links) => links,
            Err(error) => {
                warn!(team = %team, error = %error, "link collection failed");
                log.error(format!("Error: {error}"));
                let mut run = BatchRun::new(Source::Footy, &team, Vec::new(), 0);
                run.failed_items = 1;
                return Ok(BatchOutcome::Completed(BatchReport::empty(run)));
            }
        };

        log.success(format!("Collected {} potential player links.", links.len()));
        if links.is_empty() {
            log.info("No links found.");
            return Ok(BatchOutcome::Completed(BatchReport::empty(BatchRun::new(
                Source::Footy,
                &team,
                Vec::new(),
                0,
            ))));
        }

        Ok(BatchOutcome::AwaitingSelection(state.begin_selection(links)?))
    }

    /// Second phase of the two-phase source: one synthesis per confirmed link.
    ///
    /// A cancelled selection or an empty confirmed subset ends the flow with
    /// a log line and no synthesis. Otherwise a history record is written
    /// with the number of images actually produced, zero included.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Selection`] if `selection` is still collecting
    /// or awaiting the user, and [`BatchError::SourceUnavailable`] if the
    /// link source is gone.
    #[instrument(skip(self, selection, log), fields(state = selection.state_name()))]
    pub async fn synthesize_selected(
        &mut self,
        selection: LinkSelection,
        log: &mut ActivityLog,
    ) -> Result<BatchReport, BatchError> {
        let (team, links) = match selection {
            LinkSelection::Confirmed { team, links } => (team, links),
            LinkSelection::Cancelled => {
                log.info("No links selected. Aborting download.");
                return Ok(BatchReport::empty(BatchRun::new(
                    Source::Footy,
                    "",
                    Vec::new(),
                    0,
                )));
            }
            other => {
                return Err(LinkSelectionError {
                    action: "synthesize images",
                    state: other.state_name(),
                }
                .into());
            }
        };

        if links.is_empty() {
            log.info("No links selected. Aborting download.");
            return Ok(BatchReport::empty(BatchRun::new(
                Source::Footy,
                &team,
                Vec::new(),
                0,
            )));
        }

        let Some(adapter) = self.sources.link_source() else {
            let error = BatchError::source_unavailable(Source::Footy);
            log.error(error.to_string());
            return Err(error);
        };

        let total = links.len();
        let mut run = BatchRun::new(Source::Footy, &team, links, total);
        let mut images: Vec<ImageDescriptor> = Vec::new();

        self.ids.next_batch();
        log.info(format!("Generating {total} player images..."));
        log.set_progress(0, total);

        for (index, link) in run.work_items.clone().iter().enumerate() {
            let player = player_name_from_link(link);
            log.info(format!(
                "[{}/{total}] Generating render for {player}...",
                index + 1
            ));
            match adapter.synthesize_one(link, &team).await {
                Ok(Some(candidate)) => {
                    images.push(ImageDescriptor::from_candidate(self.ids.allocate(), candidate));
                }
                Ok(None) => {
                    run.failed_items += 1;
                    log.warn(format!("No image generated for {player}."));
                }
                Err(error) => {
                    warn!(link = %link, error = %error, "synthesis failed");
                    run.failed_items += 1;
                    log.error(format!("Error processing link for {player}: {error}"));
                }
            }
            run.completed_items += 1;
            log.set_progress(index + 1, total);
        }

        let history_recorded = self
            .record_history(Source::Footy, &team, images.len(), log)
            .await;

        if images.is_empty() {
            log.warn("Process complete, but no images could be generated from the selected links.");
        } else {
            log.success(format!(
                "Process complete! Generated {} of {total} player images.",
                images.len()
            ));
        }
        info!(images = images.len(), links = total, "synthesis complete");

        Ok(BatchReport {
            run,
            images,
            history_recorded,
        })
    }

    /// Appends a history record; a storage failure is logged, never fatal.
    async fn record_history(
        &self,
        source: Source,
        input: &str,
        image_count: usize,
        log: &mut ActivityLog,
    ) -> bool {
        match self
            .history
            .append(NewHistoryRecord::new(source.label(), input, image_count))
            .await
        {
            Ok(record) => {
                debug!(id = record.id, "history recorded");
                true
            }
            Err(error) => {
                warn!(error = %error, "history write failed");
                log.warn(format!("Could not save this batch to history: {error}"));
                false
            }
        }
    }
}
