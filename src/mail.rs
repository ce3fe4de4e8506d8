//! Delivery of rendered certificates through a pluggable mail transport.
//!
//! Dispatch is sequential. A failure for one recipient is recorded in the
//! [`DispatchSummary`] and the remaining recipients are still attempted;
//! only invalid sender settings abort the run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::certificate::{RenderedCertificate, certificate_file_name, sanitize_file_stem};

const PNG_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid email settings: {0}")]
    Settings(String),
    #[error("'{0}' is not a valid recipient address")]
    InvalidRecipient(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to write {path}: {source}")]
    Spool {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize message envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}

/// Sender identity and message templates. `{name}` and `{senderName}` are
/// substituted in both subject and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub sender_email: String,
    pub sender_name: String,
    pub subject: String,
    pub message: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            sender_email: String::new(),
            sender_name: "Certificate Generator".to_string(),
            subject: "Your Certificate is Ready! 🎉".to_string(),
            message: "Dear {name},\n\n\
                      Congratulations! 🎊 We are pleased to present you with your certificate.\n\n\
                      Please find your certificate attached to this email.\n\n\
                      Best regards,\n{senderName}"
                .to_string(),
        }
    }
}

impl EmailSettings {
    pub fn validate(&self) -> Result<(), DispatchError> {
        let sender = self.sender_email.trim();
        if sender.is_empty() {
            return Err(DispatchError::Settings(
                "sender email address is required".to_string(),
            ));
        }
        if !looks_like_address(sender) {
            return Err(DispatchError::Settings(format!(
                "sender address '{sender}' is not valid"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

/// A fully personalized message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub body: String,
    pub attachment: Attachment,
}

/// Mail transport used by [`dispatch_certificates`].
pub trait Mailer {
    fn send(&mut self, message: &OutgoingMessage) -> Result<(), DispatchError>;
}

/// Aggregate outcome of a dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Replace every `{name}` and `{senderName}` placeholder.
pub fn personalize(template: &str, name: &str, sender_name: &str) -> String {
    template
        .replace("{name}", name)
        .replace("{senderName}", sender_name)
}

/// Send one message per certificate through `mailer`.
pub fn dispatch_certificates<M: Mailer + ?Sized>(
    mailer: &mut M,
    settings: &EmailSettings,
    certificates: &[RenderedCertificate],
) -> Result<DispatchSummary, DispatchError> {
    settings.validate()?;

    let mut summary = DispatchSummary::default();
    for certificate in certificates {
        let to = certificate.record.email.as_str();
        match deliver(mailer, settings, certificate) {
            Ok(()) => {
                debug!(to, "certificate sent");
                summary.success += 1;
            }
            Err(err) => {
                warn!(to, error = %err, "certificate delivery failed");
                summary.failed += 1;
                summary.errors.push(format!("Failed to send to {to}: {err}"));
            }
        }
    }
    info!(
        success = summary.success,
        failed = summary.failed,
        "dispatch finished"
    );
    Ok(summary)
}

fn deliver<M: Mailer + ?Sized>(
    mailer: &mut M,
    settings: &EmailSettings,
    certificate: &RenderedCertificate,
) -> Result<(), DispatchError> {
    let record = &certificate.record;
    if !looks_like_address(&record.email) {
        return Err(DispatchError::InvalidRecipient(record.email.clone()));
    }
    let message = OutgoingMessage {
        from: Mailbox {
            email: settings.sender_email.trim().to_string(),
            name: settings.sender_name.clone(),
        },
        to: Mailbox {
            email: record.email.clone(),
            name: record.name.clone(),
        },
        subject: personalize(&settings.subject, &record.name, &settings.sender_name),
        body: personalize(&settings.message, &record.name, &settings.sender_name),
        attachment: Attachment {
            filename: certificate_file_name(&record.name),
            content_type: PNG_CONTENT_TYPE,
            data: certificate.png.clone(),
        },
    };
    mailer.send(&message)
}

/// Cheap shape check: one `@`, non-empty local part, dotted domain, no spaces.
fn looks_like_address(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !address.chars().any(char::is_whitespace)
}

/// Transport that writes each message into a directory instead of the network:
/// a JSON envelope plus the attachment file, both prefixed with a sequence number.
#[derive(Debug)]
pub struct SpoolMailer {
    dir: PathBuf,
    sequence: usize,
}

#[derive(Serialize)]
struct Envelope<'a> {
    from: &'a Mailbox,
    to: &'a Mailbox,
    subject: &'a str,
    body: &'a str,
    attachment: AttachmentRecord<'a>,
    queued_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AttachmentRecord<'a> {
    filename: &'a str,
    content_type: &'a str,
    file: String,
    bytes: usize,
    sha256: String,
}

impl SpoolMailer {
    /// Create the spool directory if needed.
    pub fn create<P: Into<PathBuf>>(dir: P) -> Result<Self, DispatchError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| DispatchError::Spool {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, sequence: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Mailer for SpoolMailer {
    fn send(&mut self, message: &OutgoingMessage) -> Result<(), DispatchError> {
        self.sequence += 1;
        let stem = format!(
            "{:04}_{}",
            self.sequence,
            sanitize_file_stem(&message.to.email)
        );
        let attachment_file = format!("{stem}_{}", message.attachment.filename);
        let attachment_path = self.dir.join(&attachment_file);
        write_file(&attachment_path, &message.attachment.data)?;

        let envelope = Envelope {
            from: &message.from,
            to: &message.to,
            subject: &message.subject,
            body: &message.body,
            attachment: AttachmentRecord {
                filename: &message.attachment.filename,
                content_type: message.attachment.content_type,
                file: attachment_file.clone(),
                bytes: message.attachment.data.len(),
                sha256: format!("{:x}", Sha256::digest(&message.attachment.data)),
            },
            queued_at: Utc::now(),
        };
        let envelope_path = self.dir.join(format!("{stem}.json"));
        let json = serde_json::to_vec_pretty(&envelope)?;
        write_file(&envelope_path, &json)?;
        debug!(path = %envelope_path.display(), "spooled message");
        Ok(())
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), DispatchError> {
    fs::write(path, data).map_err(|source| DispatchError::Spool {
        path: path.to_path_buf(),
        source,
    })
}
