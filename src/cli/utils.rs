//! Convenience helpers shared across command handlers.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use certmint::{ParsedTable, Record, TemplateImage, map_records, parse_table};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::cli::common::ColumnArgs;

/// Font files probed when no `--font` is given, as
/// `[regular, bold, italic, bold italic]`.
pub const SYSTEM_FONT_SETS: &[[&str; 4]] = &[
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
    ],
    [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
    ],
    [
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
    ],
    [
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
        "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
    ],
    [
        "C:\\Windows\\Fonts\\arial.ttf",
        "C:\\Windows\\Fonts\\arialbd.ttf",
        "C:\\Windows\\Fonts\\ariali.ttf",
        "C:\\Windows\\Fonts\\arialbi.ttf",
    ],
];

/// Read a whole file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("failed to read from stdin")?;
        return Ok(buffer);
    }
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Persist bytes either to a file or stdout when `-` is provided.
pub fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    if path.as_os_str() == "-" {
        io::stdout().write_all(content)?;
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory {}", parent.display())
            })?;
        }
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Deserialize a JSON configuration file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = read_input(path)?;
    serde_json::from_slice(&bytes).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Decode a spreadsheet file, attaching path context to any error.
pub fn load_table(path: &Path) -> Result<ParsedTable> {
    let bytes = read_input(path)?;
    parse_table(&bytes).with_context(|| format!("failed to parse spreadsheet {}", path.display()))
}

pub fn load_template(path: &Path) -> Result<TemplateImage> {
    let bytes = read_input(path)?;
    TemplateImage::decode(&bytes)
        .with_context(|| format!("failed to load template {}", path.display()))
}

/// Parse a spreadsheet and map it to records with the requested columns.
pub fn load_records(path: &Path, columns: &ColumnArgs) -> Result<Vec<Record>> {
    let table = load_table(path)?;
    let (name, email) = columns.resolve(&table)?;
    let records = map_records(&table, name, email);
    info!(
        records = records.len(),
        rows = table.rows.len(),
        name = %name,
        email = %email,
        "loaded roster"
    );
    Ok(records)
}
