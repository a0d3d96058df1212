use std::path::PathBuf;

use chrono::Utc;

use crate::cli::print_extraction_errors;
use crate::db::ConnectionProvider;
use crate::error::Result;
use crate::extractor::extract_staging;
use crate::settings::get_database_path;
use crate::staging::StagingRepository;

pub fn run(file: &str) -> Result<()> {
    let (records, errors) = extract_staging(&PathBuf::from(file))?;

    let provider = ConnectionProvider::new(get_database_path());
    let staged = StagingRepository::new(&provider).insert_bulk(&records, Utc::now())?;
    provider.release()?;

    println!("{staged} rows staged");
    print_extraction_errors(&errors);
    Ok(())
}
