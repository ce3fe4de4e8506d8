//! Compositing recipient names onto a template and packaging the results.
//!
//! All three entry points share one code path: the style is validated and
//! bound to a font once, then each text is painted onto a surface that is
//! repainted from the template every time. The first failure aborts the
//! whole call.

mod archive;
mod fonts;
mod paint;
mod style;

pub use archive::{certificate_file_name, sanitize_file_stem};
pub use fonts::{FaceStyle, FontBook, FontError, ResolvedFace};
pub use paint::TemplateImage;
pub use style::{FontDescriptor, Position, StyleConfig, StyleError, parse_css_color};

use image::ImageError;
use thiserror::Error;
use tracing::{debug, info};

use crate::roster::Record;
use archive::ArchiveBuilder;
use paint::{Compositor, TextPen};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to decode template image: {0}")]
    TemplateDecode(ImageError),
    #[error("template image has no drawable area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error(transparent)]
    Style(#[from] StyleError),
    #[error("no fonts are available for rendering")]
    NoFonts,
    #[error("no registered font has a glyph for '{ch}' (U+{code:04X}) in \"{text}\" (primary font '{family}')")]
    MissingGlyph {
        family: String,
        ch: char,
        code: u32,
        text: String,
    },
    #[error("failed to encode PNG: {0}")]
    Encode(ImageError),
    #[error("failed to build certificate archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// A generated certificate and the record it was made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCertificate {
    pub record: Record,
    pub png: Vec<u8>,
}

/// Render `text` onto `template` and return PNG bytes.
pub fn render_one(
    template: &TemplateImage,
    text: &str,
    style: &StyleConfig,
    fonts: &FontBook,
) -> Result<Vec<u8>, RenderError> {
    let pen = TextPen::new(style, fonts)?;
    let mut compositor = Compositor::new(template);
    compositor.paint(text, &pen)?;
    compositor.encode_png()
}

/// Render one certificate per record, in order.
pub fn render_batch(
    template: &TemplateImage,
    records: &[Record],
    style: &StyleConfig,
    fonts: &FontBook,
) -> Result<Vec<RenderedCertificate>, RenderError> {
    let mut rendered = Vec::with_capacity(records.len());
    render_each(template, records, style, fonts, |record, png| {
        rendered.push(RenderedCertificate {
            record: record.clone(),
            png,
        });
    })?;
    info!(count = rendered.len(), "rendered certificates");
    Ok(rendered)
}

/// Render every record and bundle the PNGs into a zip archive.
///
/// Entries are named with [`certificate_file_name`]. When two records map
/// to the same entry name the later certificate replaces the earlier one.
pub fn package_archive(
    template: &TemplateImage,
    records: &[Record],
    style: &StyleConfig,
    fonts: &FontBook,
) -> Result<Vec<u8>, RenderError> {
    let mut builder = ArchiveBuilder::default();
    let mut collisions = 0usize;
    render_each(template, records, style, fonts, |record, png| {
        if builder.insert(certificate_file_name(&record.name), png) {
            collisions += 1;
        }
    })?;
    info!(
        records = records.len(),
        entries = builder.len(),
        collisions,
        "packaged certificate archive"
    );
    Ok(builder.finish()?)
}

fn render_each<F>(
    template: &TemplateImage,
    records: &[Record],
    style: &StyleConfig,
    fonts: &FontBook,
    mut sink: F,
) -> Result<(), RenderError>
where
    F: FnMut(&Record, Vec<u8>),
{
    let pen = TextPen::new(style, fonts)?;
    let mut compositor = Compositor::new(template);
    for (idx, record) in records.iter().enumerate() {
        compositor.paint(&record.name, &pen)?;
        let png = compositor.encode_png()?;
        debug!(index = idx, name = %record.name, bytes = png.len(), "rendered certificate");
        sink(record, png);
    }
    Ok(())
}
