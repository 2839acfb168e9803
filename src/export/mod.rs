//! Archive export and single-image saves.
//!
//! The [`ArchiveExporter`] re-fetches the full-resolution payload of each
//! result, packs every payload that arrived into one deflated ZIP, and
//! hands the archive to an [`ArchiveSink`]. Per-item failures are logged
//! as warnings and skipped; only an archive with zero entries is an error.
//!
//! Fetches run through an ordered, bounded stream so archive entries
//! always follow the order of the input items, whatever the concurrency.

mod archive;
mod error;
mod filename;
mod payload;
mod sink;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{info, warn};

use crate::activity::ActivityLog;
use crate::image::ImageDescriptor;

use archive::ArchiveBuilder;

pub use error::{DownloadError, ExportError};
pub use filename::{DEFAULT_ARCHIVE_BASE, archive_file_name, resolve_unique_path, sanitize_filename};
pub use payload::{DEFAULT_MAX_PAYLOAD_BYTES, HttpPayloadFetcher, PayloadFetcher, decode_data_url};
pub use sink::{ArchiveSink, DirectorySink};

/// Default number of payload fetches in flight.
pub const DEFAULT_ARCHIVE_CONCURRENCY: usize = 1;

/// Upper bound accepted for payload fetch concurrency.
pub const MAX_ARCHIVE_CONCURRENCY: usize = 16;

/// Result of one export call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// There was nothing to export; no fetch and no delivery happened.
    Skipped,
    /// The archive was delivered.
    Delivered {
        path: PathBuf,
        packed: usize,
        skipped: usize,
    },
}

/// Builds and delivers ZIP archives of a result set.
#[derive(Clone)]
pub struct ArchiveExporter {
    fetcher: Arc<dyn PayloadFetcher>,
    sink: Arc<dyn ArchiveSink>,
    concurrency: usize,
}

impl std::fmt::Debug for ArchiveExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveExporter")
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl ArchiveExporter {
    /// Creates an exporter that fetches one payload at a time.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PayloadFetcher>, sink: Arc<dyn ArchiveSink>) -> Self {
        Self {
            fetcher,
            sink,
            concurrency: DEFAULT_ARCHIVE_CONCURRENCY,
        }
    }

    /// Sets how many payload fetches may be in flight, clamped to
    /// `1..=MAX_ARCHIVE_CONCURRENCY`.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_ARCHIVE_CONCURRENCY);
        self
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub fn fetcher(&self) -> Arc<dyn PayloadFetcher> {
        Arc::clone(&self.fetcher)
    }

    /// Packs `items` into `<sanitized base>.zip` and delivers it.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NothingPacked`] when no payload could be
    /// fetched, or an assembly/delivery error. Individual fetch failures
    /// are logged and never returned.
    pub async fn export_archive(
        &self,
        items: &[ImageDescriptor],
        base_name: &str,
        log: &mut ActivityLog,
    ) -> Result<ExportOutcome, ExportError> {
        if items.is_empty() {
            return Ok(ExportOutcome::Skipped);
        }

        let total = items.len();
        log.info(format!("Creating ZIP file with {total} images..."));
        info!(total, concurrency = self.concurrency, "archive export started");

        let mut fetches = stream::iter(items)
            .map(|item| {
                let fetcher = Arc::clone(&self.fetcher);
                async move { (item, fetcher.fetch(&item.url).await) }
            })
            .buffered(self.concurrency);

        let mut builder = ArchiveBuilder::new();
        let mut skipped = 0usize;
        let mut position = 0usize;
        while let Some((item, result)) = fetches.next().await {
            position += 1;
            match result {
                Ok(bytes) => {
                    builder
                        .add(&item.name, &bytes)
                        .map_err(|e| assembly_failed(log, e))?;
                    log.info(format!("Zipping {position}/{total}: {}", item.name));
                }
                Err(error) => {
                    skipped += 1;
                    warn!(image = %item.id, error = %error, "payload fetch failed");
                    log.warn(format!("Skipping {} due to network error: {error}", item.name));
                }
            }
        }

        let packed = builder.len();
        if packed == 0 {
            let error = ExportError::NothingPacked;
            log.error(error.to_string());
            return Err(error);
        }

        let bytes = builder.finish().map_err(|e| assembly_failed(log, e))?;
        let file_name = archive_file_name(base_name);
        let path = match self.sink.deliver(&file_name, bytes).await {
            Ok(path) => path,
            Err(error) => {
                log.error(error.to_string());
                return Err(error);
            }
        };

        log.success(format!("ZIP file saved to {}", path.display()));
        info!(packed, skipped, path = %path.display(), "archive export complete");
        Ok(ExportOutcome::Delivered {
            path,
            packed,
            skipped,
        })
    }
}

fn assembly_failed(log: &mut ActivityLog, error: zip::result::ZipError) -> ExportError {
    let error = ExportError::from(error);
    log.error(error.to_string());
    error
}

/// Downloads one image into `dir` under its display name.
///
/// # Errors
///
/// Returns [`DownloadError`] if the payload cannot be fetched or written.
pub async fn save_image(
    fetcher: &dyn PayloadFetcher,
    image: &ImageDescriptor,
    dir: &Path,
) -> Result<PathBuf, DownloadError> {
    let bytes = fetcher.fetch(&image.url).await?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DownloadError::io(dir, e))?;
    let path = resolve_unique_path(dir, &image.name);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| DownloadError::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::activity::Severity;
    use crate::image::ImageId;

    #[derive(Default)]
    struct MapFetcher {
        failing: Vec<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PayloadFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|f| f == url) {
                return Err(DownloadError::http_status(url, 404));
            }
            Ok(url.as_bytes().to_vec())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        delivered: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl ArchiveSink for MemorySink {
        async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError> {
            self.delivered
                .lock()
                .unwrap()
                .push((file_name.to_string(), bytes));
            Ok(PathBuf::from(file_name))
        }
    }

    fn image(n: usize) -> ImageDescriptor {
        ImageDescriptor {
            id: ImageId::new(format!("1-{n}")),
            name: format!("img_{n}.jpg"),
            url: format!("https://img.example/{n}.jpg"),
            thumb_url: format!("https://img.example/{n}_t.jpg"),
            width: 10,
            height: 10,
        }
    }

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_empty_export_is_noop() {
        let fetcher = Arc::new(MapFetcher::default());
        let sink = Arc::new(MemorySink::default());
        let exporter = ArchiveExporter::new(fetcher.clone(), sink.clone());
        let mut log = ActivityLog::new();

        let outcome = exporter.export_archive(&[], "cats", &mut log).await.unwrap();

        assert_eq!(outcome, ExportOutcome::Skipped);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(sink.delivered.lock().unwrap().is_empty());
        assert!(log.lines().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_skips_item() {
        let fetcher = Arc::new(MapFetcher {
            failing: vec!["https://img.example/2.jpg".to_string()],
            ..MapFetcher::default()
        });
        let sink = Arc::new(MemorySink::default());
        let exporter = ArchiveExporter::new(fetcher, sink.clone());
        let mut log = ActivityLog::new();
        let items = vec![image(1), image(2), image(3)];

        let outcome = exporter
            .export_archive(&items, "Cats, Dogs", &mut log)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ExportOutcome::Delivered {
                path: PathBuf::from("cats__dogs.zip"),
                packed: 2,
                skipped: 1,
            }
        );
        assert_eq!(log.count(Severity::Warning), 1);

        let (name, bytes) = sink.delivered.lock().unwrap().pop().unwrap();
        assert_eq!(name, "cats__dogs.zip");
        assert_eq!(entry_names(bytes), vec!["img_1.jpg", "img_3.jpg"]);
    }

    #[tokio::test]
    async fn test_all_failures_deliver_nothing() {
        let fetcher = Arc::new(MapFetcher {
            failing: vec!["https://img.example/1.jpg".to_string()],
            ..MapFetcher::default()
        });
        let sink = Arc::new(MemorySink::default());
        let exporter = ArchiveExporter::new(fetcher, sink.clone());
        let mut log = ActivityLog::new();

        let err = exporter
            .export_archive(&[image(1)], "cats", &mut log)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::NothingPacked));
        assert!(sink.delivered.lock().unwrap().is_empty());
        assert_eq!(log.count(Severity::Error), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetch_preserves_order() {
        let fetcher = Arc::new(MapFetcher::default());
        let sink = Arc::new(MemorySink::default());
        let exporter = ArchiveExporter::new(fetcher, sink.clone()).with_concurrency(4);
        let mut log = ActivityLog::new();
        let items: Vec<_> = (1..=6).map(image).collect();

        exporter.export_archive(&items, "", &mut log).await.unwrap();

        let (name, bytes) = sink.delivered.lock().unwrap().pop().unwrap();
        assert_eq!(name, "images.zip");
        let expected: Vec<String> = (1..=6).map(|n| format!("img_{n}.jpg")).collect();
        assert_eq!(entry_names(bytes), expected);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_suffixed() {
        let fetcher = Arc::new(MapFetcher::default());
        let sink = Arc::new(MemorySink::default());
        let exporter = ArchiveExporter::new(fetcher, sink.clone());
        let mut log = ActivityLog::new();
        let mut second = image(2);
        second.name = "img_1.jpg".to_string();

        exporter
            .export_archive(&[image(1), second], "x", &mut log)
            .await
            .unwrap();

        let (_, bytes) = sink.delivered.lock().unwrap().pop().unwrap();
        assert_eq!(entry_names(bytes), vec!["img_1.jpg", "img_1_2.jpg"]);
    }

    #[test]
    fn test_assembly_failure_is_logged() {
        let mut log = ActivityLog::new();

        let err = assembly_failed(&mut log, zip::result::ZipError::FileNotFound);

        assert!(matches!(err, ExportError::Archive(_)));
        assert_eq!(log.count(Severity::Error), 1);
        assert!(log.lines()[0].message.starts_with("failed to assemble archive"));
    }

    #[test]
    fn test_concurrency_is_clamped() {
        let exporter = ArchiveExporter::new(
            Arc::new(MapFetcher::default()),
            Arc::new(MemorySink::default()),
        );
        assert_eq!(exporter.concurrency(), 1);
        assert_eq!(exporter.clone().with_concurrency(0).concurrency(), 1);
        assert_eq!(exporter.with_concurrency(99).concurrency(), MAX_ARCHIVE_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_save_image_writes_unique_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let fetcher = MapFetcher::default();

        let first = save_image(&fetcher, &image(1), dir.path()).await.unwrap();
        let second = save_image(&fetcher, &image(1), dir.path()).await.unwrap();

        assert_eq!(first, dir.path().join("img_1.jpg"));
        assert_eq!(second, dir.path().join("img_1_2.jpg"));
        assert_eq!(std::fs::read(first).unwrap(), b"https://img.example/1.jpg");
    }
}
