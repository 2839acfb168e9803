//! CLI output formatting and display helpers.

use std::io::Write;

use anyhow::Result;
use image_downloader_core::{HistoryRecord, ImageDescriptor};

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

/// One result row: position, selection marker, name and dimensions.
///
/// `selected` is `None` outside selection mode.
pub fn render_image_row(
    position: usize,
    image: &ImageDescriptor,
    selected: Option<bool>,
    width: usize,
) -> String {
    let marker = match selected {
        Some(true) => "[x] ",
        Some(false) => "[ ] ",
        None => "",
    };
    let row = format!(
        "{position:>3}. {marker}{} ({})",
        image.name,
        image.dimensions()
    );
    truncate_to_width(&row, width)
}

/// Writes results in display order, as rows or as a JSON array.
pub fn write_results<W: Write>(out: &mut W, images: &[&ImageDescriptor], json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(images)?)?;
        return Ok(());
    }
    if images.is_empty() {
        writeln!(out, "No images.")?;
        return Ok(());
    }
    let width = terminal_width();
    for (index, image) in images.iter().enumerate() {
        writeln!(out, "{}", render_image_row(index + 1, image, None, width))?;
    }
    Ok(())
}

/// One history row: timestamp, source, image count and keywords.
pub fn render_history_row(record: &HistoryRecord, width: usize) -> String {
    let row = format!(
        "{}  {:<13} {:>4} images  {}",
        record.timestamp, record.source, record.image_count, record.keywords
    );
    truncate_to_width(&row, width)
}

/// Writes history records most recent first, as rows or as JSON.
pub fn write_history<W: Write>(out: &mut W, records: &[HistoryRecord], json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(records)?)?;
        return Ok(());
    }
    if records.is_empty() {
        writeln!(out, "No download history yet.")?;
        return Ok(());
    }
    let width = terminal_width();
    for record in records {
        writeln!(out, "{}", render_history_row(record, width))?;
    }
    writeln!(out, "{} record(s).", records.len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_downloader_core::ImageId;

    fn image() -> ImageDescriptor {
        ImageDescriptor {
            id: ImageId::new("1-1"),
            name: "cats_42.jpg".to_string(),
            url: "https://img.example/42.jpg".to_string(),
            thumb_url: "https://img.example/42_t.jpg".to_string(),
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("abcdef", 10), "abcdef");
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abcdef", 1), "…");
        assert_eq!(truncate_to_width("abcdef", 0), "");
    }

    #[test]
    fn test_render_image_row_with_selection_marker() {
        let image = image();
        assert_eq!(
            render_image_row(2, &image, None, 80),
            "  2. cats_42.jpg (640x480)"
        );
        assert_eq!(
            render_image_row(2, &image, Some(true), 80),
            "  2. [x] cats_42.jpg (640x480)"
        );
    }

    #[test]
    fn test_write_results_json() {
        let image = image();
        let mut out = Vec::new();
        write_results(&mut out, &[&image], true).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["name"], "cats_42.jpg");
        assert_eq!(parsed[0]["width"], 640);
    }

    #[test]
    fn test_write_history_empty() {
        let mut out = Vec::new();
        write_history(&mut out, &[], false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No download history yet.\n");
    }

    #[test]
    fn test_render_history_row() {
        let record = HistoryRecord {
            id: 1,
            timestamp: "2026-01-02 03:04:05".to_string(),
            source: "Pixabay".to_string(),
            keywords: "cats, dogs".to_string(),
            image_count: 2,
        };
        let row = render_history_row(&record, 120);
        assert!(row.starts_with("2026-01-02 03:04:05  Pixabay"));
        assert!(row.contains("2 images"));
        assert!(row.ends_with("cats, dogs"));
    }
}
