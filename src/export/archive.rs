//! In-memory ZIP assembly.

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipResult;
use zip::write::FileOptions;

use super::filename::EntryNames;

/// Accumulates payloads into a deflated ZIP held in memory.
pub(crate) struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: EntryNames,
    entries: Vec<String>,
}

impl ArchiveBuilder {
    pub(crate) fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: EntryNames::default(),
            entries: Vec::new(),
        }
    }

    /// Adds one entry and returns the name it was stored under.
    pub(crate) fn add(&mut self, name: &str, bytes: &[u8]) -> ZipResult<String> {
        let entry = self.names.claim(name);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer.start_file(entry.as_str(), options)?;
        self.writer.write_all(bytes)?;
        self.entries.push(entry.clone());
        Ok(entry)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Finalizes the archive and returns its bytes.
    pub(crate) fn finish(mut self) -> ZipResult<Vec<u8>> {
        Ok(self.writer.finish()?.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_builder_round_trips_entries() {
        let mut builder = ArchiveBuilder::new();
        builder.add("a.jpg", b"first").unwrap();
        builder.add("a.jpg", b"second").unwrap();
        assert_eq!(builder.len(), 2);

        let bytes = builder.finish().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("a_2.jpg")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "second");
    }
}
