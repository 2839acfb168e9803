//! History command handler: show recent batches.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use image_downloader_core::{HistoryStore, SqliteHistoryStore};

use crate::cli::HistoryArgs;
use crate::output;

pub async fn run_history_command(history_db: &Path, args: &HistoryArgs) -> Result<()> {
    let mut records = if history_db.exists() {
        let store = SqliteHistoryStore::open(history_db)
            .await
            .with_context(|| format!("Failed to open history at {}", history_db.display()))?;
        store.read_all().await?
    } else {
        Vec::new()
    };
    records.truncate(usize::from(args.limit));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::write_history(&mut out, &records, args.json)
}
