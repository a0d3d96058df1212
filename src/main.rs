mod cli;
mod db;
mod error;
mod extractor;
mod fmt;
mod ledger;
mod loader;
mod models;
mod normalize;
mod settings;
mod staging;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, StagingCommands};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movimientos=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Check { file } => cli::check::run(&file),
        Commands::Load { file } => cli::load::run(&file),
        Commands::Stage { file } => cli::stage::run(&file),
        Commands::Staging { command } => match command {
            StagingCommands::List => cli::staging::list(),
            StagingCommands::Clear => cli::staging::clear(),
        },
        Commands::List { from, to } => cli::ledger::list(from, to),
        Commands::Show { id } => cli::ledger::show(id),
        Commands::Delete { id } => cli::ledger::delete(id),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
