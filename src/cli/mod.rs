pub mod check;
pub mod init;
pub mod ledger;
pub mod load;
pub mod stage;
pub mod staging;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::models::ExtractionError;

#[derive(Parser)]
#[command(name = "movimientos", about = "Load bank statement exports into a deduplicated ledger.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create the database.
    Init {
        /// Path for data (default: ~/Documents/movimientos)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Parse an export and report bad rows without touching the database.
    Check {
        /// Path to the CSV export
        file: String,
    },
    /// Load an export into the ledger, skipping movements already there.
    Load {
        /// Path to the CSV export
        file: String,
    },
    /// Append an export to the staging table as one batch.
    Stage {
        /// Path to the CSV export
        file: String,
    },
    /// Inspect or clear the staging table.
    Staging {
        #[command(subcommand)]
        command: StagingCommands,
    },
    /// List ledger movements, newest first.
    List {
        /// First date, inclusive (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Last date, inclusive (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Show one ledger movement.
    Show {
        /// Movement ID (shown in `movimientos list`)
        id: i64,
    },
    /// Delete one ledger movement.
    Delete {
        /// Movement ID (shown in `movimientos list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum StagingCommands {
    /// List staged rows by value date.
    List,
    /// Remove every staged row.
    Clear,
}

pub(crate) fn print_extraction_errors(errors: &[ExtractionError]) {
    if errors.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Row", "Reason", "Content"]);
    for err in errors {
        table.add_row(vec![
            Cell::new(err.row_index),
            Cell::new(&err.reason),
            Cell::new(err.raw_row.to_string()),
        ]);
    }
    println!("{}\n{table}", format!("{} rows skipped", errors.len()).yellow());
}
