use std::collections::HashMap;
use std::io::{Cursor, Write};

use tracing::warn;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

const FILE_SUFFIX: &str = "_certificate.png";

/// Replace every UTF-16 code unit outside `[A-Za-z0-9]` with `_`.
///
/// Characters outside the BMP therefore become two underscores.
pub fn sanitize_file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.extend(std::iter::repeat_n('_', ch.len_utf16()));
        }
    }
    out
}

/// Archive entry name for a recipient.
pub fn certificate_file_name(name: &str) -> String {
    format!("{}{}", sanitize_file_stem(name), FILE_SUFFIX)
}

/// In-memory entry list with last-write-wins semantics per file name.
#[derive(Default)]
pub(crate) struct ArchiveBuilder {
    entries: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
}

impl ArchiveBuilder {
    /// Add an entry. A repeated name overwrites the earlier content in
    /// place and returns `true`.
    pub(crate) fn insert(&mut self, name: String, data: Vec<u8>) -> bool {
        match self.index.get(&name) {
            Some(&slot) => {
                warn!(file = %name, "archive entry name collision; later certificate overwrites earlier one");
                self.entries[slot].1 = data;
                true
            }
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, data));
                false
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Write a zip with stored (uncompressed) entries and a fixed timestamp.
    pub(crate) fn finish(self) -> Result<Vec<u8>, ZipError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in &self.entries {
            writer.start_file(name.as_str(), entry_options())?;
            writer.write_all(data)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default())
}
