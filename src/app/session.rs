//! Line-oriented interactive sessions over stdin.
//!
//! Both sessions are generic over `BufRead`/`Write` so they can be driven
//! by scripted input in tests. Positions typed by the user are 1-based and
//! refer to the list as last displayed.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Result;
use image_downloader_core::{
    DeleteOutcome, ExportOutcome, HistoryStore, ImageId, LinkSelector, Workspace,
};

use crate::output::{render_image_row, terminal_width, truncate_to_width, write_history};

/// How the user left the link selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkDecision {
    Confirm,
    Cancel,
}

/// How a curation session ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SessionSummary {
    /// The last archive export attempted in the session failed.
    pub(crate) export_failed: bool,
}

const LINK_HELP: &str = "Commands: list, toggle N, all, none, ok, cancel";

const SESSION_HELP: &str = "\
Commands:
  list             show results
  sort             toggle sort by size
  select           toggle selection mode
  toggle N         select/unselect result N (selection mode)
  delete-selected  delete every selected result
  cancel           leave selection mode
  delete N         delete result N (asks for confirmation)
  save N           download result N into the output directory
  zip              export all results as a ZIP archive
  clear            clear results and log
  history          show recent batches
  quit             leave the session";

fn read_command<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    prompt: &str,
) -> Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn parse_position(arg: Option<&str>, len: usize) -> Result<usize, String> {
    let Some(arg) = arg else {
        return Err("Missing number.".to_string());
    };
    match arg.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Ok(n - 1),
        _ => Err(format!("'{arg}' is not a number between 1 and {len}.")),
    }
}

fn write_links<W: Write>(out: &mut W, selector: &LinkSelector) -> Result<()> {
    let width = terminal_width();
    for (index, link) in selector.links().iter().enumerate() {
        let marker = if selector.is_selected(index) { "x" } else { " " };
        let row = format!("{:>3}. [{marker}] {link}", index + 1);
        writeln!(out, "{}", truncate_to_width(&row, width))?;
    }
    writeln!(
        out,
        "{} of {} link(s) selected.",
        selector.selected_count(),
        selector.links().len()
    )?;
    Ok(())
}

/// Lets the user adjust the link selection. End of input cancels.
pub(crate) fn run_link_selector<R: BufRead, W: Write>(
    selector: &mut LinkSelector,
    input: &mut R,
    out: &mut W,
) -> Result<LinkDecision> {
    write_links(out, selector)?;
    writeln!(out, "{LINK_HELP}")?;
    loop {
        let Some(line) = read_command(input, out, "links> ")? else {
            return Ok(LinkDecision::Cancel);
        };
        let mut parts = line.split_whitespace();
        match parts.next() {
            None => {}
            Some("list" | "l") => write_links(out, selector)?,
            Some("toggle" | "t") => match parse_position(parts.next(), selector.links().len()) {
                Ok(index) => {
                    selector.toggle_index(index);
                    write_links(out, selector)?;
                }
                Err(message) => writeln!(out, "{message}")?,
            },
            Some("all") => {
                selector.select_all();
                write_links(out, selector)?;
            }
            Some("none") => {
                selector.deselect_all();
                write_links(out, selector)?;
            }
            Some("ok" | "done" | "confirm") => return Ok(LinkDecision::Confirm),
            Some("cancel" | "quit" | "q") => return Ok(LinkDecision::Cancel),
            Some("help" | "?") => writeln!(out, "{LINK_HELP}")?,
            Some(other) => writeln!(out, "Unknown command '{other}'. {LINK_HELP}")?,
        }
    }
}

fn write_session_results<W: Write>(out: &mut W, ws: &Workspace) -> Result<()> {
    let displayed = ws.displayed();
    if displayed.is_empty() {
        writeln!(out, "No images.")?;
        return Ok(());
    }
    let width = terminal_width();
    let selection_mode = ws.curation().is_selection_mode();
    for (index, image) in displayed.iter().enumerate() {
        let selected = selection_mode.then(|| ws.curation().is_selected(&image.id));
        writeln!(out, "{}", render_image_row(index + 1, image, selected, width))?;
    }
    if selection_mode {
        writeln!(out, "{} selected.", ws.curation().selected_count())?;
    }
    Ok(())
}

fn id_at(ws: &Workspace, arg: Option<&str>) -> Result<ImageId, String> {
    let displayed = ws.displayed();
    let index = parse_position(arg, displayed.len())?;
    Ok(displayed[index].id.clone())
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> bool {
    match read_command(input, out, &format!("{question} [y/N] ")) {
        Ok(Some(answer)) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
        _ => false,
    }
}

/// Interactive curation over the workspace results. End of input quits.
pub(crate) async fn run_curation_session<R: BufRead, W: Write>(
    ws: &mut Workspace,
    output_dir: &Path,
    input: &mut R,
    out: &mut W,
) -> Result<SessionSummary> {
    let mut summary = SessionSummary::default();
    write_session_results(out, ws)?;
    writeln!(out, "Type 'help' for commands.")?;

    loop {
        let Some(line) = read_command(input, out, "> ")? else {
            return Ok(summary);
        };
        let mut parts = line.split_whitespace();
        match parts.next() {
            None => {}
            Some("list" | "ls") => write_session_results(out, ws)?,
            Some("sort") => {
                let on = ws.toggle_sort_by_size();
                writeln!(out, "Sort by size: {}", if on { "on" } else { "off" })?;
                write_session_results(out, ws)?;
            }
            Some("select") => {
                ws.curation_mut().toggle_selection_mode();
                let on = ws.curation().is_selection_mode();
                writeln!(out, "Selection mode: {}", if on { "on" } else { "off" })?;
            }
            Some("toggle") => match id_at(ws, parts.next()) {
                Ok(id) => match ws.curation_mut().toggle_select(&id) {
                    Ok(_) => write_session_results(out, ws)?,
                    Err(error) => writeln!(out, "{error}")?,
                },
                Err(message) => writeln!(out, "{message}")?,
            },
            Some("delete-selected") => {
                if ws.curation().is_selection_mode() {
                    let removed = ws.curation_mut().delete_selected();
                    writeln!(out, "Deleted {removed} image(s).")?;
                } else {
                    writeln!(out, "Selection mode is off. Use 'select' first.")?;
                }
            }
            Some("cancel") => {
                ws.curation_mut().exit_selection_mode();
                writeln!(out, "Selection mode: off")?;
            }
            Some("delete") => match id_at(ws, parts.next()) {
                Ok(id) => {
                    let outcome = ws.curation_mut().delete_one(&id, |image| {
                        confirm(input, out, &format!("Delete {}?", image.name))
                    });
                    match outcome {
                        Ok(DeleteOutcome::Deleted) => writeln!(out, "Deleted.")?,
                        Ok(DeleteOutcome::Declined) => writeln!(out, "Kept.")?,
                        Err(error) => writeln!(out, "{error}")?,
                    }
                }
                Err(message) => writeln!(out, "{message}")?,
            },
            Some("save") => match id_at(ws, parts.next()) {
                Ok(id) => match ws.save_one(&id, output_dir).await {
                    Ok(path) => writeln!(out, "Saved to {}", path.display())?,
                    Err(error) => writeln!(out, "Save failed: {error}")?,
                },
                Err(message) => writeln!(out, "{message}")?,
            },
            Some("zip") => match ws.export_archive().await {
                Ok(ExportOutcome::Delivered { path, .. }) => {
                    summary.export_failed = false;
                    writeln!(out, "Archive written to {}", path.display())?;
                }
                Ok(ExportOutcome::Skipped) => writeln!(out, "Nothing to export.")?,
                Err(error) => {
                    summary.export_failed = true;
                    writeln!(out, "Export failed: {error}")?;
                }
            },
            Some("clear") => {
                ws.clear_all();
                writeln!(out, "Cleared.")?;
            }
            Some("history") => {
                let records = ws.orchestrator().history().read_all().await?;
                write_history(out, &records, false)?;
            }
            Some("help" | "?") => writeln!(out, "{SESSION_HELP}")?,
            Some("quit" | "exit" | "q") => return Ok(summary),
            Some(other) => writeln!(out, "Unknown command '{other}'. Type 'help' for commands.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::Arc;

    use async_trait::async_trait;
    use image_downloader_core::{
        AdapterError, ArchiveExporter, ArchiveSink, BatchOrchestrator, BatchRequest,
        DownloadError, ExportError, ImageCandidate, ImageSource, MemoryHistoryStore,
        PayloadFetcher, Source, SourceRegistry,
    };

    struct Sized;

    #[async_trait]
    impl ImageSource for Sized {
        fn name(&self) -> &str {
            "sized"
        }

        async fn fetch(&self, query: &str, count: u32) -> Result<Vec<ImageCandidate>, AdapterError> {
            Ok((1..=count)
                .map(|i| ImageCandidate {
                    name: format!("{query}_{i}.jpg"),
                    url: format!("https://img.example/{query}/{i}.jpg"),
                    thumb_url: format!("https://img.example/{query}/{i}_t.jpg"),
                    width: i * 100,
                    height: 100,
                })
                .collect())
        }
    }

    struct Bytes;

    #[async_trait]
    impl PayloadFetcher for Bytes {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
            Ok(url.as_bytes().to_vec())
        }
    }

    struct Discard;

    #[async_trait]
    impl ArchiveSink for Discard {
        async fn deliver(&self, file_name: &str, _bytes: Vec<u8>) -> Result<PathBuf, ExportError> {
            Ok(PathBuf::from(file_name))
        }
    }

    async fn workspace_with(count: u32) -> Workspace {
        let sources = SourceRegistry::new().with_image_source(Source::Pixabay, Arc::new(Sized));
        let orchestrator = BatchOrchestrator::new(sources, Arc::new(MemoryHistoryStore::new()));
        let exporter = ArchiveExporter::new(Arc::new(Bytes), Arc::new(Discard));
        let mut ws = Workspace::new(orchestrator, exporter);
        ws.start(&BatchRequest::new(Source::Pixabay, "cats", count))
            .await
            .unwrap();
        ws
    }

    async fn run_script(ws: &mut Workspace, script: &str) -> (SessionSummary, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let summary = run_curation_session(ws, Path::new("."), &mut input, &mut out)
            .await
            .unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_link_selector_toggle_and_confirm() {
        let mut selector = LinkSelector::new(
            "arsenal",
            vec!["https://a/render-x".to_string(), "https://a/render-y".to_string()],
        );
        let mut input = Cursor::new(b"toggle 1\nok\n".to_vec());
        let mut out = Vec::new();

        let decision = run_link_selector(&mut selector, &mut input, &mut out).unwrap();

        assert_eq!(decision, LinkDecision::Confirm);
        assert_eq!(selector.selected_links(), vec!["https://a/render-y"]);
    }

    #[test]
    fn test_link_selector_eof_cancels() {
        let mut selector = LinkSelector::new("arsenal", vec!["https://a/render-x".to_string()]);
        let mut input = Cursor::new(b"none\n".to_vec());
        let mut out = Vec::new();

        let decision = run_link_selector(&mut selector, &mut input, &mut out).unwrap();

        assert_eq!(decision, LinkDecision::Cancel);
        assert_eq!(selector.selected_count(), 0);
    }

    #[test]
    fn test_link_selector_rejects_bad_position() {
        let mut selector = LinkSelector::new("arsenal", vec!["https://a/render-x".to_string()]);
        let mut input = Cursor::new(b"toggle 5\ncancel\n".to_vec());
        let mut out = Vec::new();

        run_link_selector(&mut selector, &mut input, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("'5' is not a number between 1 and 1."));
        assert_eq!(selector.selected_count(), 1);
    }

    #[tokio::test]
    async fn test_session_select_and_delete_selected() {
        let mut ws = workspace_with(3).await;

        let (_, text) = run_script(&mut ws, "select\ntoggle 1\ntoggle 3\ndelete-selected\nquit\n").await;

        assert!(text.contains("Deleted 2 image(s)."));
        assert_eq!(ws.curation().len(), 1);
        assert_eq!(ws.curation().items()[0].name, "cats_2.jpg");
        assert!(!ws.curation().is_selection_mode());
    }

    #[tokio::test]
    async fn test_session_delete_requires_confirmation() {
        let mut ws = workspace_with(2).await;

        let (_, text) = run_script(&mut ws, "delete 1\nn\ndelete 1\ny\n").await;

        assert!(text.contains("Kept."));
        assert!(text.contains("Deleted."));
        assert_eq!(ws.curation().len(), 1);
    }

    #[tokio::test]
    async fn test_session_toggle_outside_selection_mode_is_refused() {
        let mut ws = workspace_with(2).await;

        let (_, text) = run_script(&mut ws, "toggle 1\n").await;

        assert!(text.contains("selection mode is off"));
        assert_eq!(ws.curation().selected_count(), 0);
    }

    #[tokio::test]
    async fn test_session_sort_uses_display_positions() {
        let mut ws = workspace_with(3).await;

        // Sorted by size the first row is the widest image.
        let (_, text) = run_script(&mut ws, "sort\ndelete 1\ny\n").await;

        assert!(text.contains("Sort by size: on"));
        let names: Vec<_> = ws.curation().items().iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["cats_1.jpg", "cats_2.jpg"]);
    }

    #[tokio::test]
    async fn test_session_zip_and_clear() {
        let mut ws = workspace_with(2).await;

        let (summary, text) = run_script(&mut ws, "zip\nclear\nzip\n").await;

        assert!(!summary.export_failed);
        assert!(text.contains("Archive written to cats.zip"));
        assert!(text.contains("Nothing to export."));
        assert!(ws.curation().is_empty());
    }
}
