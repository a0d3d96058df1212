use std::path::PathBuf;

use crate::cli::print_extraction_errors;
use crate::db::ConnectionProvider;
use crate::error::Result;
use crate::ledger::LedgerRepository;
use crate::loader::Loader;
use crate::settings::get_database_path;

pub fn run(file: &str) -> Result<()> {
    let file_path = PathBuf::from(file);
    let provider = ConnectionProvider::new(get_database_path());
    let repo = LedgerRepository::new(&provider);
    let loader = Loader::new(&repo);

    let (result, errors) = loader.run_full(&file_path)?;
    let total = repo.count()?;
    provider.release()?;

    println!(
        "{} movements read: {} inserted, {} skipped (duplicates)",
        result.records.len(),
        result.inserted,
        result.duplicates
    );
    println!("Ledger now holds {total} movements");
    print_extraction_errors(&errors);
    Ok(())
}
