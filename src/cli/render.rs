//! Rendering commands (`certmint render ...`).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use certmint::{certificate_file_name, package_archive, render_batch, render_one};
use clap::{Args, Subcommand};

use crate::cli::common::{ColumnArgs, FontArgs, StyleArgs};
use crate::cli::utils::{load_records, load_template, write_output};

/// Available render subcommands.
#[derive(Subcommand, Debug)]
pub enum RenderCommand {
    /// Render a single PNG for an arbitrary name.
    Preview(RenderPreviewArgs),
    /// Render every recipient into one zip archive.
    Bundle(RenderBundleArgs),
    /// Render every recipient into a directory of PNGs.
    Images(RenderImagesArgs),
}

/// Args for `certmint render preview`.
#[derive(Args, Debug)]
pub struct RenderPreviewArgs {
    /// Template image (PNG/JPEG).
    #[arg(long)]
    pub template: PathBuf,
    /// Text to draw.
    #[arg(long, default_value = "Jane Doe")]
    pub text: String,
    /// Output PNG (`-` for stdout).
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    #[command(flatten)]
    pub style: StyleArgs,
    #[command(flatten)]
    pub fonts: FontArgs,
}

/// Args for `certmint render bundle`.
#[derive(Args, Debug)]
pub struct RenderBundleArgs {
    /// Template image (PNG/JPEG).
    #[arg(long)]
    pub template: PathBuf,
    /// Spreadsheet with recipients.
    #[arg(long)]
    pub sheet: PathBuf,
    /// Output zip (`-` for stdout).
    #[arg(short = 'o', long = "output", default_value = "certificates.zip")]
    pub output: PathBuf,
    #[command(flatten)]
    pub columns: ColumnArgs,
    #[command(flatten)]
    pub style: StyleArgs,
    #[command(flatten)]
    pub fonts: FontArgs,
}

/// Args for `certmint render images`.
#[derive(Args, Debug)]
pub struct RenderImagesArgs {
    /// Template image (PNG/JPEG).
    #[arg(long)]
    pub template: PathBuf,
    /// Spreadsheet with recipients.
    #[arg(long)]
    pub sheet: PathBuf,
    /// Output directory for generated PNGs.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    #[command(flatten)]
    pub columns: ColumnArgs,
    #[command(flatten)]
    pub style: StyleArgs,
    #[command(flatten)]
    pub fonts: FontArgs,
}

/// Execute a render command.
pub fn handle(command: RenderCommand) -> Result<()> {
    match command {
        RenderCommand::Preview(args) => preview(args),
        RenderCommand::Bundle(args) => bundle(args),
        RenderCommand::Images(args) => images(args),
    }
}

fn preview(args: RenderPreviewArgs) -> Result<()> {
    let style = args.style.resolve()?;
    let fonts = args.fonts.load(&style)?;
    let template = load_template(&args.template)?;
    let png = render_one(&template, &args.text, &style, &fonts)
        .with_context(|| format!("failed to render '{}'", args.text))?;
    write_output(&args.output, &png)?;
    eprintln!(
        "Rendered preview {}x{} to {}",
        template.width(),
        template.height(),
        args.output.display()
    );
    Ok(())
}

fn bundle(args: RenderBundleArgs) -> Result<()> {
    let style = args.style.resolve()?;
    let fonts = args.fonts.load(&style)?;
    let template = load_template(&args.template)?;
    let records = load_records(&args.sheet, &args.columns)?;
    let archive = package_archive(&template, &records, &style, &fonts)
        .context("failed to render certificate archive")?;
    write_output(&args.output, &archive)?;
    eprintln!(
        "Packaged {} certificate(s) into {}",
        records.len(),
        args.output.display()
    );
    Ok(())
}

fn images(args: RenderImagesArgs) -> Result<()> {
    let style = args.style.resolve()?;
    let fonts = args.fonts.load(&style)?;
    let template = load_template(&args.template)?;
    let records = load_records(&args.sheet, &args.columns)?;
    let rendered = render_batch(&template, &records, &style, &fonts)
        .context("failed to render certificates")?;

    fs::create_dir_all(&args.output).with_context(|| {
        format!("failed to create output directory {}", args.output.display())
    })?;
    for certificate in &rendered {
        let target = args
            .output
            .join(certificate_file_name(&certificate.record.name));
        fs::write(&target, &certificate.png)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }
    eprintln!(
        "Rendered {} certificate image(s) to {}",
        rendered.len(),
        args.output.display()
    );
    Ok(())
}
