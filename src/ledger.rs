use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::db::{decimal_to_sql, opt_decimal_from_row, ConnectionProvider};
use crate::error::{EtlError, Result};
use crate::models::LedgerRecord;

const SELECT_COLUMNS: &str = "SELECT id, fecha_movimiento, comentario, importe, categoria, \
     subcategoria, descripcion, saldo FROM movimientos";

/// Repository over the `movimientos` ledger table.
pub struct LedgerRepository<'a> {
    provider: &'a ConnectionProvider,
}

impl<'a> LedgerRepository<'a> {
    pub fn new(provider: &'a ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Insert and return the record carrying its new id.
    pub fn save(&self, mut record: LedgerRecord) -> Result<LedgerRecord> {
        let conn = self.provider.acquire()?;
        conn.execute(
            "INSERT INTO movimientos (fecha_movimiento, comentario, importe, categoria, subcategoria, descripcion, saldo) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                record.date,
                record.comment,
                decimal_to_sql(&record.amount),
                record.category,
                record.subcategory,
                record.description,
                record.balance.as_ref().map(decimal_to_sql),
            ],
        )?;
        record.id = Some(conn.last_insert_rowid());
        Ok(record)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<LedgerRecord>> {
        let conn = self.provider.acquire()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
        let row = stmt.query_row([id], record_from_row).optional()?;
        row.transpose()
    }

    pub fn find_all(&self) -> Result<Vec<LedgerRecord>> {
        let conn = self.provider.acquire()?;
        let mut stmt =
            conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY fecha_movimiento DESC, id DESC"))?;
        let rows = stmt
            .query_map([], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().collect()
    }

    /// Both ends inclusive.
    pub fn find_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<LedgerRecord>> {
        let conn = self.provider.acquire()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE fecha_movimiento BETWEEN ?1 AND ?2 \
             ORDER BY fecha_movimiento DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(rusqlite::params![start, end], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().collect()
    }

    /// Returns true once the statement ran, whether or not a row matched.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.provider.acquire()?;
        conn.execute("DELETE FROM movimientos WHERE id = ?1", [id])?;
        Ok(true)
    }

    /// Id of a stored movement with the same date, amount and balance.
    pub fn find_matching(
        &self,
        date: NaiveDate,
        amount: &Decimal,
        balance: Option<&Decimal>,
    ) -> Result<Option<i64>> {
        let conn = self.provider.acquire()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id FROM movimientos \
             WHERE fecha_movimiento = ?1 AND importe = ?2 AND saldo IS ?3 \
             ORDER BY id LIMIT 1",
        )?;
        let id = stmt
            .query_row(
                rusqlite::params![date, decimal_to_sql(amount), balance.map(decimal_to_sql)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.provider.acquire()?;
        Ok(conn.query_row("SELECT count(*) FROM movimientos", [], |r| r.get(0))?)
    }
}

// Column decoding errors surface as rusqlite errors; the comment invariant is
// checked afterwards through the record constructor.
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Result<LedgerRecord>> {
    let id: i64 = row.get(0)?;
    let date: NaiveDate = row.get(1)?;
    let comment: String = row.get(2)?;
    let amount = opt_decimal_from_row(row, 3)?;
    let category: Option<String> = row.get(4)?;
    let subcategory: Option<String> = row.get(5)?;
    let description: Option<String> = row.get(6)?;
    let balance = opt_decimal_from_row(row, 7)?;

    let Some(amount) = amount else {
        return Ok(Err(EtlError::Validation(format!("movement {id} has no amount"))));
    };
    Ok(LedgerRecord::new(date, comment, amount).map(|mut record| {
        record.id = Some(id);
        record.balance = balance;
        record.category = category;
        record.subcategory = subcategory;
        record.description = description;
        record
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_provider;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(d: NaiveDate, comment: &str, amount: Decimal, balance: Decimal) -> LedgerRecord {
        let mut rec = LedgerRecord::new(d, comment, amount).unwrap();
        rec.balance = Some(balance);
        rec
    }

    #[test]
    fn test_save_assigns_id() {
        let (_dir, provider) = test_provider();
        let repo = LedgerRepository::new(&provider);
        let saved = repo
            .save(record(date(2025, 11, 13), "Pago de factura", dec!(100.50), dec!(1000.00)))
            .unwrap();
        assert!(saved.id.is_some());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_find_by_id_returns_all_columns() {
        let (_dir, provider) = test_provider();
        let repo = LedgerRepository::new(&provider);
        let mut rec = record(date(2025, 11, 13), "Supermercado", dec!(-45.20), dec!(954.80));
        rec.category = Some("Alimentación".to_string());
        rec.subcategory = Some("Supermercados".to_string());
        rec.description = Some("Compra semanal".to_string());
        let saved = repo.save(rec.clone()).unwrap();

        let found = repo.find_by_id(saved.id.unwrap()).unwrap().unwrap();
        assert_eq!(found.id, saved.id);
        assert_eq!(found.date, rec.date);
        assert_eq!(found.comment, "Supermercado");
        assert_eq!(found.amount, dec!(-45.20));
        assert_eq!(found.balance, Some(dec!(954.80)));
        assert_eq!(found.category.as_deref(), Some("Alimentación"));
        assert_eq!(found.subcategory.as_deref(), Some("Supermercados"));
        assert_eq!(found.description.as_deref(), Some("Compra semanal"));
    }

    #[test]
    fn test_find_by_id_missing() {
        let (_dir, provider) = test_provider();
        let repo = LedgerRepository::new(&provider);
        assert!(repo.find_by_id(42).unwrap().is_none());
    }

    #[test]
    fn test_find_all_orders_by_date_descending() {
        let (_dir, provider) = test_provider();
        let repo = LedgerRepository::new(&provider);
        repo.save(record(date(2025, 1, 15), "Enero", dec!(1), dec!(1))).unwrap();
        repo.save(record(date(2025, 3, 15), "Marzo", dec!(2), dec!(3))).unwrap();
        repo.save(record(date(2025, 2, 15), "Febrero", dec!(3), dec!(6))).unwrap();

        let comments: Vec<String> = repo.find_all().unwrap().into_iter().map(|r| r.comment).collect();
        assert_eq!(comments, vec!["Marzo", "Febrero", "Enero"]);
    }

    #[test]
    fn test_find_by_date_range_is_inclusive() {
        let (_dir, provider) = test_provider();
        let repo = LedgerRepository::new(&provider);
        for (day, comment) in [(1, "a"), (10, "b"), (20, "c"), (31, "d")] {
            repo.save(record(date(2025, 1, day), comment, dec!(1), dec!(1))).unwrap();
        }
        let found = repo.find_by_date_range(date(2025, 1, 10), date(2025, 1, 20)).unwrap();
        let comments: Vec<&str> = found.iter().map(|r| r.comment.as_str()).collect();
        assert_eq!(comments, vec!["c", "b"]);
    }

    #[test]
    fn test_delete_removes_row() {
        let (_dir, provider) = test_provider();
        let repo = LedgerRepository::new(&provider);
        let saved = repo.save(record(date(2025, 1, 1), "x", dec!(1), dec!(1))).unwrap();
        assert!(repo.delete(saved.id.unwrap()).unwrap());
        assert!(repo.find_by_id(saved.id.unwrap()).unwrap().is_none());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_find_matching_compares_exact_values() {
        let (_dir, provider) = test_provider();
        let repo = LedgerRepository::new(&provider);
        let saved = repo
            .save(record(date(2025, 11, 13), "Pago", dec!(100.50), dec!(1000.00)))
            .unwrap();

        let hit = repo
            .find_matching(date(2025, 11, 13), &dec!(100.5), Some(&dec!(1000)))
            .unwrap();
        assert_eq!(hit, saved.id);

        assert!(repo
            .find_matching(date(2025, 11, 13), &dec!(100.51), Some(&dec!(1000)))
            .unwrap()
            .is_none());
        assert!(repo
            .find_matching(date(2025, 11, 14), &dec!(100.50), Some(&dec!(1000)))
            .unwrap()
            .is_none());
        assert!(repo
            .find_matching(date(2025, 11, 13), &dec!(100.50), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_find_matching_without_balance() {
        let (_dir, provider) = test_provider();
        let repo = LedgerRepository::new(&provider);
        let saved = repo
            .save(LedgerRecord::new(date(2025, 5, 5), "Sin saldo", dec!(9.99)).unwrap())
            .unwrap();
        let hit = repo.find_matching(date(2025, 5, 5), &dec!(9.99), None).unwrap();
        assert_eq!(hit, saved.id);
    }

    #[test]
    fn test_save_propagates_store_failure() {
        let (_dir, provider) = test_provider();
        provider
            .acquire()
            .unwrap()
            .execute_batch("DROP TABLE movimientos")
            .unwrap();
        let repo = LedgerRepository::new(&provider);
        let err = repo
            .save(record(date(2025, 1, 1), "x", dec!(1), dec!(1)))
            .unwrap_err();
        assert!(matches!(err, EtlError::Persistence(_)));
    }
}
