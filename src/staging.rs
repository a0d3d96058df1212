use chrono::{DateTime, Utc};
use rusqlite::Row;
use tracing::{debug, info};

use crate::db::{decimal_from_row, decimal_to_sql, ConnectionProvider};
use crate::error::Result;
use crate::models::StagingRecord;

/// Append-only loader for the `movimientos_staging` landing table.
pub struct StagingRepository<'a> {
    provider: &'a ConnectionProvider,
}

impl<'a> StagingRepository<'a> {
    pub fn new(provider: &'a ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Stream every record into staging inside one transaction, all stamped with
    /// `batch_timestamp`. Nothing is visible unless every row was written.
    pub fn insert_bulk(
        &self,
        records: &[StagingRecord],
        batch_timestamp: DateTime<Utc>,
    ) -> Result<usize> {
        let mut conn = self.provider.acquire()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO movimientos_staging \
                 (fecha_valor, importe, saldo, categoria, subcategoria, descripcion, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in records {
                stmt.execute(rusqlite::params![
                    record.value_date,
                    decimal_to_sql(&record.amount),
                    decimal_to_sql(&record.balance),
                    record.category,
                    record.subcategory,
                    record.description,
                    batch_timestamp,
                ])?;
            }
        }
        tx.commit()?;
        info!(rows = records.len(), batch = %batch_timestamp, "staging batch committed");
        Ok(records.len())
    }

    /// All staged rows by value date, then id.
    pub fn fetch_all(&self) -> Result<Vec<StagingRecord>> {
        let conn = self.provider.acquire()?;
        let mut stmt = conn.prepare(
            "SELECT id, strftime('%d/%m/%Y', fecha_valor), importe, saldo, categoria, subcategoria, descripcion \
             FROM movimientos_staging ORDER BY fecha_valor ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([], staged_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().collect()
    }

    /// Truncate staging between batch runs. Returns the number of rows removed.
    pub fn clear(&self) -> Result<usize> {
        let conn = self.provider.acquire()?;
        let removed = conn.execute("DELETE FROM movimientos_staging", [])?;
        debug!(removed, "staging cleared");
        Ok(removed)
    }
}

fn staged_from_row(row: &Row<'_>) -> rusqlite::Result<Result<StagingRecord>> {
    let id: i64 = row.get(0)?;
    let value_date: String = row.get(1)?;
    let amount = decimal_from_row(row, 2)?;
    let balance = decimal_from_row(row, 3)?;
    let category: Option<String> = row.get(4)?;
    let subcategory: Option<String> = row.get(5)?;
    let description: Option<String> = row.get(6)?;

    Ok(StagingRecord::new(id, &value_date, amount, balance).map(|mut record| {
        record.category = category;
        record.subcategory = subcategory;
        record.description = description;
        record
    }))
}
