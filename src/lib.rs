//! Image Downloader Core Library
//!
//! This library acquires images from keyword or team input, lets the user
//! curate the results and exports them as a single ZIP archive.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`batch`] - Batch orchestration: validation, per-item fetch loop, progress
//! - [`source`] - Source adapters (Pixabay, Imagen, footy renders) and registry
//! - [`link_selector`] - Link confirmation state machine for the two-phase source
//! - [`curation`] - Result set, sort-by-size view, selection and deletion
//! - [`export`] - Payload fetching, archive assembly and delivery
//! - [`history`] - Capped history of completed batches
//! - [`activity`] - User-facing activity log and progress events
//! - [`workspace`] - Session state tying the pieces together
//! - [`db`] - Database connection and schema management

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod activity;
pub mod batch;
pub mod curation;
pub mod db;
pub mod export;
pub mod history;
pub mod http;
pub mod image;
pub mod link_selector;
pub mod source;
pub mod workspace;

mod user_agent;

// Re-export commonly used types
pub use activity::{ActivityEvent, ActivityLog, LogLine, Progress, Severity};
pub use batch::{
    BatchError, BatchOrchestrator, BatchOutcome, BatchReport, BatchRequest, BatchRun,
    DEFAULT_IMAGES_PER_ITEM, DEFAULT_PAGES, ValidationError,
};
pub use curation::{Curation, CurationError, DeleteOutcome};
pub use db::{Database, DbError};
pub use export::{
    ArchiveExporter, ArchiveSink, DirectorySink, DownloadError, ExportError, ExportOutcome,
    HttpPayloadFetcher, PayloadFetcher, archive_file_name,
};
pub use history::{
    HISTORY_CAPACITY, HistoryError, HistoryRecord, HistoryStore, MemoryHistoryStore,
    NewHistoryRecord, SqliteHistoryStore,
};
pub use http::HttpTimeouts;
pub use image::{ImageCandidate, ImageDescriptor, ImageId};
pub use link_selector::{LinkSelection, LinkSelectionError, LinkSelector};
pub use source::{
    AdapterError, FootySource, GeminiClient, GoogleImageSource, ImageSource, LinkSource,
    PixabaySource, Source, SourceRegistry,
};
pub use workspace::{StartOutcome, Workspace};
