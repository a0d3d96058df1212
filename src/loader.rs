use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::extractor::extract;
use crate::ledger::LedgerRepository;
use crate::models::{ExtractionError, LedgerRecord};

#[derive(Debug)]
pub struct LoadResult {
    /// Input records in input order, each carrying its ledger id.
    pub records: Vec<LedgerRecord>,
    pub inserted: usize,
    pub duplicates: usize,
}

/// Loads movements into the ledger, skipping any whose (date, amount, balance)
/// is already stored.
///
/// Each record is looked up and then inserted on its own, so a failure part way
/// leaves the earlier inserts committed. Two loaders racing on the same store
/// can both miss the lookup and insert the same movement twice.
pub struct Loader<'a> {
    repo: &'a LedgerRepository<'a>,
}

impl<'a> Loader<'a> {
    pub fn new(repo: &'a LedgerRepository<'a>) -> Self {
        Self { repo }
    }

    pub fn load(&self, records: Vec<LedgerRecord>) -> Result<LoadResult> {
        let mut loaded = Vec::with_capacity(records.len());
        let mut inserted = 0usize;
        let mut duplicates = 0usize;

        for mut record in records {
            let existing =
                self.repo
                    .find_matching(record.date, &record.amount, record.balance.as_ref())?;
            if let Some(id) = existing {
                record.id = Some(id);
                duplicates += 1;
                debug!(id, date = %record.date, amount = %record.amount, "duplicate skipped");
            } else {
                record = self.repo.save(record)?;
                inserted += 1;
                debug!(id = ?record.id, date = %record.date, amount = %record.amount, "movement inserted");
            }
            loaded.push(record);
        }

        info!(inserted, duplicates, "ledger load finished");
        Ok(LoadResult {
            records: loaded,
            inserted,
            duplicates,
        })
    }

    /// Extract `path` and load the valid rows. Extraction errors are returned
    /// alongside, not raised.
    pub fn run_full(&self, path: &Path) -> Result<(LoadResult, Vec<ExtractionError>)> {
        let (records, errors) = extract(path)?;
        let result = self.load(records)?;
        Ok((result, errors))
    }
}
