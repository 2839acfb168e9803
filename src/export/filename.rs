//! File and archive naming.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Base name used when the run had no keyword/team input.
pub const DEFAULT_ARCHIVE_BASE: &str = "images";

static NON_ALPHANUMERIC: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9]").ok());

/// Builds the archive file name: every non-alphanumeric character of the
/// base becomes `_`, the result is lowercased and suffixed with `.zip`.
///
/// A blank base falls back to [`DEFAULT_ARCHIVE_BASE`].
#[must_use]
pub fn archive_file_name(base: &str) -> String {
    let base = if base.trim().is_empty() {
        DEFAULT_ARCHIVE_BASE
    } else {
        base
    };
    let replaced = match NON_ALPHANUMERIC.as_ref() {
        Some(re) => re.replace_all(base, "_").into_owned(),
        None => base
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect(),
    };
    format!("{}.zip", replaced.to_lowercase())
}

/// Sanitizes a display name for use as a file or archive entry name.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "image".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    }
}

/// Resolves a path in `dir` that does not exist yet.
///
/// `file.jpg`, then `file_2.jpg`, `file_3.jpg`, ...
#[must_use]
pub fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let filename = sanitize_filename(filename);
    let base_path = dir.join(&filename);
    if !base_path.exists() {
        return base_path;
    }

    let (stem, ext) = split_extension(&filename);
    for i in 2..10_000 {
        let candidate = dir.join(format!("{stem}_{i}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
    }

    let timestamp = chrono::Local::now().timestamp();
    dir.join(format!("{stem}_{timestamp}{ext}"))
}

/// Hands out archive entry names that never collide within one archive.
#[derive(Debug, Default)]
pub(crate) struct EntryNames {
    used: HashSet<String>,
}

impl EntryNames {
    /// Returns `name` sanitized, or with a `_2`, `_3`, ... suffix if taken.
    pub(crate) fn claim(&mut self, name: &str) -> String {
        let name = sanitize_filename(name);
        if self.used.insert(name.clone()) {
            return name;
        }
        let (stem, ext) = split_extension(&name);
        let mut i = 2;
        loop {
            let candidate = format!("{stem}_{i}{ext}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            i += 1;
        }
    }
}
