//! Renders activity events: log lines plus a progress bar on terminals.

use image_downloader_core::{ActivityEvent, LogLine, Severity};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Spawns the activity renderer. It runs until the event channel closes.
///
/// With `use_bar`, lines are printed above an indicatif bar that tracks
/// progress; otherwise lines go straight to stderr. `quiet` hides info and
/// success lines.
pub(crate) fn spawn_activity_ui(
    use_bar: bool,
    quiet: bool,
    mut events: UnboundedReceiver<ActivityEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bar = use_bar.then(new_bar);
        while let Some(event) = events.recv().await {
            match event {
                ActivityEvent::Reset => {
                    if let Some(bar) = &bar {
                        bar.reset();
                    }
                }
                ActivityEvent::Line(line) => {
                    if quiet && !is_problem(line.severity) {
                        continue;
                    }
                    let text = render_line(&line);
                    match &bar {
                        Some(bar) => bar.println(text),
                        None => eprintln!("{text}"),
                    }
                }
                ActivityEvent::Progress(progress) => {
                    if let Some(bar) = &bar {
                        bar.set_length(progress.total as u64);
                        bar.set_position(progress.current as u64);
                    }
                }
            }
        }
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    })
}

fn new_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn is_problem(severity: Severity) -> bool {
    matches!(severity, Severity::Warning | Severity::Error)
}

/// Formats one log line with a severity marker.
pub(crate) fn render_line(line: &LogLine) -> String {
    let marker = match line.severity {
        Severity::Info => "",
        Severity::Success => "ok: ",
        Severity::Warning => "warning: ",
        Severity::Error => "error: ",
    };
    format!(
        "[{}] {marker}{}",
        line.timestamp.format("%H:%M:%S"),
        line.message
    )
}
