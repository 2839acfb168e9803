//! Session state tying the orchestrator, curation and exporter together.
//!
//! A [`Workspace`] is the single owner of the result set, the selection,
//! the pending link selection and the activity log. Every user action is a
//! `&mut self` method, so there is exactly one writer at a time.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::debug;

use crate::activity::{ActivityEvent, ActivityLog};
use crate::batch::{BatchError, BatchOrchestrator, BatchOutcome, BatchReport, BatchRequest, BatchRun};
use crate::curation::Curation;
use crate::export::{
    ArchiveExporter, DEFAULT_ARCHIVE_BASE, DownloadError, ExportError, ExportOutcome, save_image,
};
use crate::image::{ImageDescriptor, ImageId};
use crate::link_selector::{LinkSelection, LinkSelectionError, LinkSelector};

/// Message left in the log by [`Workspace::clear_all`].
pub const CLEARED_MESSAGE: &str = "Log and images cleared.";

/// What a started batch is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The batch finished and the result set holds its images.
    Completed,
    /// Links were collected; resolve them with [`Workspace::confirm_links`]
    /// or [`Workspace::cancel_links`].
    AwaitingLinks,
}

/// One interactive session.
#[derive(Debug)]
pub struct Workspace {
    orchestrator: BatchOrchestrator,
    exporter: ArchiveExporter,
    log: ActivityLog,
    curation: Curation,
    pending: Option<LinkSelection>,
    last_run: Option<BatchRun>,
    last_input: String,
    sort_by_size: bool,
}

impl Workspace {
    #[must_use]
    pub fn new(orchestrator: BatchOrchestrator, exporter: ArchiveExporter) -> Self {
        Self {
            orchestrator,
            exporter,
            log: ActivityLog::new(),
            curation: Curation::new(),
            pending: None,
            last_run: None,
            last_input: String::new(),
            sort_by_size: false,
        }
    }

    /// Subscribes to log and progress events.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ActivityEvent> {
        self.log.subscribe()
    }

    /// Closes the event channel so the subscriber can finish.
    pub fn unsubscribe(&mut self) {
        self.log.unsubscribe();
    }

    #[must_use]
    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    #[must_use]
    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    /// Starts a batch. A rejected request leaves the previous results alone;
    /// an accepted one replaces them.
    ///
    /// # Errors
    ///
    /// Returns the [`BatchError`] that kept the batch from starting. The
    /// error has already been written to the activity log.
    pub async fn start(&mut self, request: &BatchRequest) -> Result<StartOutcome, BatchError> {
        let outcome = self.orchestrator.run_batch(request, &mut self.log).await?;
        self.pending = None;
        self.last_input = request.input.trim().to_string();
        match outcome {
            BatchOutcome::Completed(report) => {
                self.apply_report(report);
                Ok(StartOutcome::Completed)
            }
            BatchOutcome::AwaitingSelection(selection) => {
                self.curation.clear();
                self.pending = Some(selection);
                Ok(StartOutcome::AwaitingLinks)
            }
        }
    }

    /// The link selector while links await confirmation.
    #[must_use]
    pub fn links(&self) -> Option<&LinkSelector> {
        self.pending.as_ref().and_then(LinkSelection::selector)
    }

    pub fn links_mut(&mut self) -> Option<&mut LinkSelector> {
        self.pending.as_mut().and_then(LinkSelection::selector_mut)
    }

    /// Confirms the selected links and synthesizes their images.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Selection`] when no selection is pending.
    pub async fn confirm_links(&mut self) -> Result<usize, BatchError> {
        let selection = self.take_pending("confirm")?.confirm()?;
        self.resolve(selection).await
    }

    /// Cancels the pending link selection.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Selection`] when no selection is pending.
    pub async fn cancel_links(&mut self) -> Result<usize, BatchError> {
        let selection = self.take_pending("cancel")?.cancel()?;
        self.resolve(selection).await
    }

    fn take_pending(&mut self, action: &'static str) -> Result<LinkSelection, LinkSelectionError> {
        self.pending.take().ok_or(LinkSelectionError {
            action,
            state: "idle",
        })
    }

    async fn resolve(&mut self, selection: LinkSelection) -> Result<usize, BatchError> {
        let report = self
            .orchestrator
            .synthesize_selected(selection, &mut self.log)
            .await?;
        let count = report.images.len();
        self.apply_report(report);
        Ok(count)
    }

    fn apply_report(&mut self, report: BatchReport) {
        debug!(images = report.images.len(), "result set replaced");
        self.curation.replace(report.images);
        self.last_run = Some(report.run);
    }

    /// Drops results, selection, pending links and the remembered input,
    /// then leaves a single reset line with zero progress.
    pub fn clear_all(&mut self) {
        self.curation.clear();
        self.pending = None;
        self.last_run = None;
        self.last_input.clear();
        self.log.reset(Some(CLEARED_MESSAGE));
    }

    /// Flips sort-by-size and returns the new setting.
    pub fn toggle_sort_by_size(&mut self) -> bool {
        self.sort_by_size = !self.sort_by_size;
        self.sort_by_size
    }

    #[must_use]
    pub fn sort_by_size(&self) -> bool {
        self.sort_by_size
    }

    /// Results in display order.
    #[must_use]
    pub fn displayed(&self) -> Vec<&ImageDescriptor> {
        self.curation.display_order(self.sort_by_size)
    }

    #[must_use]
    pub fn curation(&self) -> &Curation {
        &self.curation
    }

    pub fn curation_mut(&mut self) -> &mut Curation {
        &mut self.curation
    }

    #[must_use]
    pub fn last_run(&self) -> Option<&BatchRun> {
        self.last_run.as_ref()
    }

    /// Base name for the next archive.
    #[must_use]
    pub fn archive_base(&self) -> &str {
        if self.last_input.is_empty() {
            DEFAULT_ARCHIVE_BASE
        } else {
            &self.last_input
        }
    }

    /// Exports the whole result set, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the [`ExportError`] that ended the export.
    pub async fn export_archive(&mut self) -> Result<ExportOutcome, ExportError> {
        let base = self.archive_base().to_string();
        self.exporter
            .export_archive(self.curation.items(), &base, &mut self.log)
            .await
    }

    /// Saves one result into `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the id is unknown or the save failed;
    /// failures are logged with the image URL.
    pub async fn save_one(&mut self, id: &ImageId, dir: &Path) -> Result<PathBuf, DownloadError> {
        let Some(image) = self.curation.get(id).cloned() else {
            return Err(DownloadError::UnknownImage {
                id: id.to_string(),
            });
        };
        let fetcher = self.exporter.fetcher();
        match save_image(fetcher.as_ref(), &image, dir).await {
            Ok(path) => {
                self.log
                    .success(format!("Saved {} to {}", image.name, path.display()));
                Ok(path)
            }
            Err(error) => {
                self.log.warn(format!(
                    "Failed to download {}: {error}. Open {} to save it manually.",
                    image.name, image.url
                ));
                Err(error)
            }
        }
    }
}
