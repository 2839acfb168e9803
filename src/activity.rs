//! User-facing activity log and progress reporting.
//!
//! Every batch and export step appends a timestamped [`LogLine`] to the
//! [`ActivityLog`] and may update its [`Progress`]. A presentation layer
//! observes both through an unbounded [`ActivityEvent`] channel obtained
//! from [`ActivityLog::subscribe`]; the log itself stays the single writer.

use std::fmt;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

/// Severity tag carried by each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Returns the stable label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped line in the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Progress of the current run as `current / total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    /// Creates a progress value.
    #[must_use]
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }

    /// Completion percentage, 0 when the total is unknown.
    #[must_use]
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.current.min(self.total) * 100 / self.total;
        u8::try_from(pct).unwrap_or(100)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

/// Change notification pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    /// The log was cleared; subscribers should drop what they rendered.
    Reset,
    /// A line was appended.
    Line(LogLine),
    /// Progress changed.
    Progress(Progress),
}

/// Append-only activity log with progress state.
#[derive(Debug, Default)]
pub struct ActivityLog {
    lines: Vec<LogLine>,
    progress: Progress,
    observer: Option<mpsc::UnboundedSender<ActivityEvent>>,
}

impl ActivityLog {
    /// Creates an empty log with no subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber, replacing any previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ActivityEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observer = Some(tx);
        rx
    }

    /// Drops the subscriber so its receiver observes a closed channel.
    pub fn unsubscribe(&mut self) {
        self.observer = None;
    }

    /// Appends a line with the given severity.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let line = LogLine {
            timestamp: Local::now(),
            severity,
            message: message.into(),
        };
        self.notify(ActivityEvent::Line(line.clone()));
        self.lines.push(line);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Severity::Success, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    /// Publishes new progress.
    pub fn set_progress(&mut self, current: usize, total: usize) {
        self.progress = Progress::new(current, total);
        self.notify(ActivityEvent::Progress(self.progress));
    }

    /// Clears every line and zeroes progress, then appends `message` as the
    /// single remaining line when one is given.
    pub fn reset(&mut self, message: Option<&str>) {
        self.lines.clear();
        self.notify(ActivityEvent::Reset);
        self.set_progress(0, 0);
        if let Some(message) = message {
            self.info(message);
        }
    }

    /// Returns every line in append order.
    #[must_use]
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Returns the current progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Counts lines with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.lines.iter().filter(|l| l.severity == severity).count()
    }

    fn notify(&mut self, event: ActivityEvent) {
        if let Some(tx) = &self.observer
            && tx.send(event).is_err()
        {
            // Receiver went away; stop producing events for it.
            self.observer = None;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_push_records_severity_and_order() {
        let mut log = ActivityLog::new();
        log.info("one");
        log.success("two");
        log.warn("three");
        log.error("four");

        let severities: Vec<_> = log.lines().iter().map(|l| l.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Info,
                Severity::Success,
                Severity::Warning,
                Severity::Error
            ]
        );
        assert_eq!(log.count(Severity::Error), 1);
    }

    #[test]
    fn test_reset_leaves_single_line_and_zero_progress() {
        let mut log = ActivityLog::new();
        log.info("before");
        log.set_progress(3, 4);

        log.reset(Some("Log and images cleared."));

        assert_eq!(log.lines().len(), 1);
        assert_eq!(log.lines()[0].message, "Log and images cleared.");
        assert_eq!(log.progress(), Progress::new(0, 0));
    }

    #[test]
    fn test_log_line_display_has_timestamp_prefix() {
        let mut log = ActivityLog::new();
        log.info("hello");
        let rendered = log.lines()[0].to_string();
        assert!(rendered.starts_with('['), "got: {rendered}");
        assert!(rendered.ends_with("] hello"), "got: {rendered}");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress::new(0, 0).percent(), 0);
        assert_eq!(Progress::new(2, 4).percent(), 50);
        assert_eq!(Progress::new(9, 4).percent(), 100);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let mut log = ActivityLog::new();
        let mut rx = log.subscribe();

        log.info("start");
        log.set_progress(1, 2);
        log.unsubscribe();

        match rx.recv().await.unwrap() {
            ActivityEvent::Line(line) => assert_eq!(line.message, "start"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(
            rx.recv().await.unwrap(),
            ActivityEvent::Progress(Progress::new(1, 2))
        );
        assert!(rx.recv().await.is_none(), "channel closes on unsubscribe");
    }

    #[test]
    fn test_dropped_receiver_does_not_break_logging() {
        let mut log = ActivityLog::new();
        drop(log.subscribe());
        log.info("still works");
        assert_eq!(log.lines().len(), 1);
    }
}
