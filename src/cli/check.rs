use std::path::PathBuf;

use crate::cli::print_extraction_errors;
use crate::error::Result;
use crate::extractor::extract;

pub fn run(file: &str) -> Result<()> {
    let (records, errors) = extract(&PathBuf::from(file))?;
    println!("{} valid movements, {} rows skipped", records.len(), errors.len());
    print_extraction_errors(&errors);
    Ok(())
}
