//! Command-line interface wiring for the `certmint` binary.
//!
//! This module owns the clap definitions and delegates execution to
//! specialized submodules that encapsulate each command family.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

pub mod common;
pub mod render;
pub mod send;
pub mod sheet;
pub mod utils;

/// Parsed CLI entrypoint for the `certmint` binary.
#[derive(Parser, Debug)]
#[command(
    name = "certmint",
    version,
    about = "Stamp names from a spreadsheet onto certificate templates"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Top-level command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// High-level command families made available to end users.
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    Sheet(sheet::SheetCommand),
    #[command(subcommand)]
    Render(render::RenderCommand),
    /// Render certificates and deliver them to a spool directory.
    Send(send::SendArgs),
}

/// Install the stderr log subscriber.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Execute the requested command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sheet(cmd) => sheet::handle(cmd),
        Command::Render(cmd) => render::handle(cmd),
        Command::Send(args) => send::handle(args),
    }
}
