//! Delivery command (`certmint send`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use certmint::{EmailSettings, SpoolMailer, dispatch_certificates, render_batch};
use clap::Args;

use crate::cli::common::{ColumnArgs, FontArgs, StyleArgs};
use crate::cli::utils::{load_json, load_records, load_template};

/// Arguments for `certmint send`.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Template image (PNG/JPEG).
    #[arg(long)]
    pub template: PathBuf,
    /// Spreadsheet with recipients.
    #[arg(long)]
    pub sheet: PathBuf,
    /// Directory receiving one envelope and one attachment per message.
    #[arg(long)]
    pub spool: PathBuf,
    /// JSON file with sender_email, sender_name, subject and message.
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Sender address (overrides the settings file).
    #[arg(long)]
    pub sender: Option<String>,
    /// Sender display name (overrides the settings file).
    #[arg(long = "sender-name")]
    pub sender_name: Option<String>,
    /// Subject line; `{name}` and `{senderName}` are substituted.
    #[arg(long)]
    pub subject: Option<String>,
    #[command(flatten)]
    pub columns: ColumnArgs,
    #[command(flatten)]
    pub style: StyleArgs,
    #[command(flatten)]
    pub fonts: FontArgs,
}

/// Execute the send command.
pub fn handle(args: SendArgs) -> Result<()> {
    let mut settings = match &args.settings {
        Some(path) => load_json::<EmailSettings>(path)?,
        None => EmailSettings::default(),
    };
    if let Some(sender) = args.sender {
        settings.sender_email = sender;
    }
    if let Some(name) = args.sender_name {
        settings.sender_name = name;
    }
    if let Some(subject) = args.subject {
        settings.subject = subject;
    }
    settings.validate()?;

    let style = args.style.resolve()?;
    let fonts = args.fonts.load(&style)?;
    let template = load_template(&args.template)?;
    let records = load_records(&args.sheet, &args.columns)?;
    let certificates = render_batch(&template, &records, &style, &fonts)
        .context("failed to render certificates")?;

    let mut mailer = SpoolMailer::create(&args.spool)?;
    let summary = dispatch_certificates(&mut mailer, &settings, &certificates)?;

    println!(
        "Spooled {} message(s) to {} ({} failed)",
        summary.success,
        mailer.dir().display(),
        summary.failed
    );
    for error in &summary.errors {
        println!("  {}", error);
    }
    Ok(())
}
