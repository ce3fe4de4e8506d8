//! Core library for generating certificates from a spreadsheet roster.
//!
//! The pipeline is: [`parse_table`] a workbook, pick columns (optionally via
//! [`suggest_columns`]), [`map_records`], then render with
//! [`render_batch`] or [`package_archive`] and optionally hand the results
//! to [`dispatch_certificates`].

mod certificate;
mod mail;
mod roster;
mod sheet;

pub use certificate::{
    FaceStyle, FontBook, FontDescriptor, FontError, Position, RenderError, RenderedCertificate,
    ResolvedFace, StyleConfig, StyleError, TemplateImage, certificate_file_name, package_archive,
    parse_css_color, render_batch, render_one, sanitize_file_stem,
};
pub use mail::{
    Attachment, DispatchError, DispatchSummary, EmailSettings, Mailbox, Mailer, OutgoingMessage,
    SpoolMailer, dispatch_certificates, personalize,
};
pub use roster::{ColumnSuggestion, Record, map_records, suggest_columns};
pub use sheet::{Column, ColumnKey, ParseError, ParsedTable, cell_to_string, parse_table};

/// Raw cell type of [`ParsedTable::rows`].
pub use calamine::Data as Cell;
