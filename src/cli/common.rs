//! Shared clap argument groups for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use certmint::{ColumnKey, FaceStyle, FontBook, ParsedTable, StyleConfig, suggest_columns};
use clap::{Args, ValueEnum};
use tracing::info;

use crate::cli::utils::{SYSTEM_FONT_SETS, load_json};

/// Output encodings for listing commands.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Text placement and typography. Flags override fields of `--style`.
#[derive(Args, Debug, Clone, Default)]
pub struct StyleArgs {
    /// JSON file holding a full or partial style.
    #[arg(long = "style")]
    pub style: Option<PathBuf>,
    /// Horizontal anchor, percent of template width.
    #[arg(long)]
    pub x: Option<f32>,
    /// Vertical anchor, percent of template height.
    #[arg(long)]
    pub y: Option<f32>,
    /// Font size in pixels.
    #[arg(long = "size")]
    pub size: Option<f32>,
    /// Font family list, most preferred first (e.g. "Georgia, serif").
    #[arg(long)]
    pub family: Option<String>,
    /// Text color (#rrggbb, rgb(), rgba() or a basic color name).
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub bold: Option<bool>,
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub italic: Option<bool>,
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub underline: Option<bool>,
}

impl StyleArgs {
    /// Build the style: defaults, then the style file, then flags.
    pub fn resolve(&self) -> Result<StyleConfig> {
        let mut style = match &self.style {
            Some(path) => load_json::<StyleConfig>(path)?,
            None => StyleConfig::default(),
        };
        if let Some(x) = self.x {
            style.position.x = x;
        }
        if let Some(y) = self.y {
            style.position.y = y;
        }
        if let Some(size) = self.size {
            style.font_size_px = size;
        }
        if let Some(family) = &self.family {
            style.font_family = family.clone();
        }
        if let Some(color) = &self.color {
            style.font_color = color.clone();
        }
        if let Some(bold) = self.bold {
            style.bold = bold;
        }
        if let Some(italic) = self.italic {
            style.italic = italic;
        }
        if let Some(underline) = self.underline {
            style.underline = underline;
        }
        Ok(style)
    }
}

/// Font faces to render with.
#[derive(Args, Debug, Clone, Default)]
pub struct FontArgs {
    /// Regular face (TTF/OTF). Common system fonts are probed when no face is given.
    #[arg(long = "font")]
    pub font: Option<PathBuf>,
    /// Bold face.
    #[arg(long = "bold-font")]
    pub bold_font: Option<PathBuf>,
    /// Italic face.
    #[arg(long = "italic-font")]
    pub italic_font: Option<PathBuf>,
    /// Bold italic face.
    #[arg(long = "bold-italic-font")]
    pub bold_italic_font: Option<PathBuf>,
}

impl FontArgs {
    /// Load the faces under the first family named by `style`.
    pub fn load(&self, style: &StyleConfig) -> Result<FontBook> {
        let descriptor = style.font_descriptor();
        let family = descriptor.families().next().unwrap_or("sans-serif");
        let faces = [
            (FaceStyle::REGULAR, self.font.as_deref()),
            (FaceStyle::BOLD, self.bold_font.as_deref()),
            (FaceStyle::ITALIC, self.italic_font.as_deref()),
            (FaceStyle::BOLD_ITALIC, self.bold_italic_font.as_deref()),
        ];

        let mut book = FontBook::new();
        if faces.iter().any(|(_, path)| path.is_some()) {
            for (face_style, path) in faces {
                if let Some(path) = path {
                    register(&mut book, family, face_style, path)?;
                }
            }
        } else if let Some(set) = SYSTEM_FONT_SETS
            .iter()
            .find(|set| Path::new(set[0]).is_file())
        {
            info!(font = set[0], "using system font");
            let styles = [
                FaceStyle::REGULAR,
                FaceStyle::BOLD,
                FaceStyle::ITALIC,
                FaceStyle::BOLD_ITALIC,
            ];
            for (face_style, path) in styles.into_iter().zip(set.iter().map(Path::new)) {
                if path.is_file() {
                    register(&mut book, family, face_style, path)?;
                }
            }
        }

        let Some(face) = book.resolve(&descriptor) else {
            bail!("no usable font found; pass --font PATH");
        };
        info!(
            font = %descriptor,
            face = face.family,
            synthetic_bold = face.synthetic_bold,
            synthetic_italic = face.synthetic_italic,
            "text font"
        );
        Ok(book)
    }
}

fn register(book: &mut FontBook, family: &str, style: FaceStyle, path: &Path) -> Result<()> {
    book.register_file(family, style, path)
        .with_context(|| format!("failed to load font {}", path.display()))
}

/// Which spreadsheet columns hold names and emails.
#[derive(Args, Debug, Clone, Default)]
pub struct ColumnArgs {
    /// Name column key (col_<index>); detected from header labels when omitted.
    #[arg(long = "name-col")]
    pub name_col: Option<ColumnKey>,
    /// Email column key (col_<index>); detected from header labels when omitted.
    #[arg(long = "email-col")]
    pub email_col: Option<ColumnKey>,
}

impl ColumnArgs {
    /// Explicit keys first, header-label suggestions otherwise.
    pub fn resolve(&self, table: &ParsedTable) -> Result<(ColumnKey, ColumnKey)> {
        let suggestion = suggest_columns(table);
        let name = self
            .name_col
            .or(suggestion.name)
            .ok_or_else(|| anyhow!("could not detect a name column; pass --name-col col_<index>"))?;
        let email = self.email_col.or(suggestion.email).ok_or_else(|| {
            anyhow!("could not detect an email column; pass --email-col col_<index>")
        })?;
        for key in [name, email] {
            if table.column(key).is_none() {
                bail!(
                    "column {} does not exist (sheet has {} columns)",
                    key,
                    table.columns.len()
                );
            }
        }
        Ok((name, email))
    }
}
