//! Spreadsheet inspection commands (`certmint sheet ...`).

use std::path::PathBuf;

use anyhow::Result;
use certmint::{ColumnKey, ParsedTable, suggest_columns};
use clap::{Args, Subcommand};

use crate::cli::common::{ColumnArgs, OutputFormat};
use crate::cli::utils::{load_records, load_table};

/// Sheet subcommands.
#[derive(Subcommand, Debug)]
pub enum SheetCommand {
    /// List columns with value counts and the detected name/email columns.
    Columns(SheetColumnsArgs),
    /// Print the recipients mapped from two columns.
    Records(SheetRecordsArgs),
}

/// Arguments for `certmint sheet columns`.
#[derive(Args, Debug)]
pub struct SheetColumnsArgs {
    /// Spreadsheet file (`-` for stdin).
    pub sheet: PathBuf,
}

/// Arguments for `certmint sheet records`.
#[derive(Args, Debug)]
pub struct SheetRecordsArgs {
    /// Spreadsheet file (`-` for stdin).
    pub sheet: PathBuf,
    #[command(flatten)]
    pub columns: ColumnArgs,
    /// Output format.
    #[arg(long, default_value_t = OutputFormat::Text, value_enum)]
    pub format: OutputFormat,
}

/// Execute a sheet command.
pub fn handle(command: SheetCommand) -> Result<()> {
    match command {
        SheetCommand::Columns(args) => columns(args),
        SheetCommand::Records(args) => records(args),
    }
}

fn columns(args: SheetColumnsArgs) -> Result<()> {
    let table = load_table(&args.sheet)?;
    println!(
        "{}: {} column(s), {} data row(s)",
        args.sheet.display(),
        table.columns.len(),
        table.rows.len()
    );
    for column in &table.columns {
        println!(
            "  {:<8} {:<30} {} value(s)",
            column.key.to_string(),
            column.label,
            column.values.len()
        );
    }
    let suggestion = suggest_columns(&table);
    println!("Detected name column:  {}", describe(&table, suggestion.name));
    println!("Detected email column: {}", describe(&table, suggestion.email));
    Ok(())
}

fn describe(table: &ParsedTable, key: Option<ColumnKey>) -> String {
    match key.and_then(|key| table.column(key)) {
        Some(column) => format!("{} ({})", column.key, column.label),
        None => "(none)".to_string(),
    }
}

fn records(args: SheetRecordsArgs) -> Result<()> {
    let records = load_records(&args.sheet, &args.columns)?;
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            for record in &records {
                println!("{} <{}>", record.name, record.email);
            }
            println!("{} record(s)", records.len());
        }
    }
    Ok(())
}
