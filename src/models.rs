use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{EtlError, Result};
use crate::normalize::parse_dmy;

/// Id carried by a staging record that has not been written yet.
pub const UNSAVED_ID: i64 = -1;

/// One data line of an export, as header/value pairs in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub fields: Vec<(String, String)>,
}

impl RawRow {
    /// Value of the column at `idx`, if the row reached that far.
    pub fn cell(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for RawRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<&str> = self.fields.iter().map(|(_, v)| v.as_str()).collect();
        write!(f, "{}", cells.join(","))
    }
}

/// A movement in the final ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRecord {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub comment: String,
    pub amount: Decimal,
    pub balance: Option<Decimal>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
}

impl LedgerRecord {
    /// Build an unsaved record. The comment must contain something besides whitespace.
    pub fn new(date: NaiveDate, comment: impl Into<String>, amount: Decimal) -> Result<Self> {
        let comment = comment.into();
        if comment.trim().is_empty() {
            return Err(EtlError::Validation(
                "comment is required and cannot be blank".to_string(),
            ));
        }
        Ok(Self {
            id: None,
            date,
            comment,
            amount,
            balance: None,
            category: None,
            subcategory: None,
            description: None,
        })
    }
}

impl fmt::Display for LedgerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}: {}", self.date, self.comment, self.amount)
    }
}

/// A freshly ingested row headed for the staging table.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingRecord {
    pub id: i64,
    pub value_date: NaiveDate,
    pub amount: Decimal,
    pub balance: Decimal,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
}

impl StagingRecord {
    /// `value_date` is `dd/mm/yyyy` text, as exported and as read back from staging.
    pub fn new(id: i64, value_date: &str, amount: Decimal, balance: Decimal) -> Result<Self> {
        Ok(Self {
            id,
            value_date: parse_dmy(value_date)?,
            amount,
            balance,
            category: None,
            subcategory: None,
            description: None,
        })
    }
}

/// A row the extractor skipped, kept so the caller can report it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionError {
    pub row_index: usize,
    pub raw_row: RawRow,
    pub reason: String,
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {} [{}]", self.row_index, self.reason, self.raw_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ledger_record_requires_comment() {
        assert!(matches!(
            LedgerRecord::new(date(2025, 11, 13), "", dec!(1)),
            Err(EtlError::Validation(_))
        ));
        assert!(matches!(
            LedgerRecord::new(date(2025, 11, 13), "  \t ", dec!(1)),
            Err(EtlError::Validation(_))
        ));
    }

    #[test]
    fn test_ledger_record_starts_unsaved() {
        let rec = LedgerRecord::new(date(2025, 11, 13), "Pago", dec!(100.00)).unwrap();
        assert_eq!(rec.id, None);
        assert_eq!(rec.balance, None);
        assert_eq!(rec.to_string(), "2025-11-13 - Pago: 100.00");
    }

    #[test]
    fn test_staging_record_parses_value_date() {
        let rec = StagingRecord::new(UNSAVED_ID, "31/12/2025", dec!(1000), dec!(1000)).unwrap();
        assert_eq!(rec.value_date, date(2025, 12, 31));
        assert_eq!(rec.id, UNSAVED_ID);
    }

    #[test]
    fn test_staging_record_rejects_other_date_formats() {
        assert!(matches!(
            StagingRecord::new(UNSAVED_ID, "2025-12-31", dec!(1), dec!(1)),
            Err(EtlError::Format(_))
        ));
    }

    #[test]
    fn test_raw_row_lookup_and_display() {
        let row = RawRow {
            fields: vec![
                ("F. VALOR".to_string(), "13/11/2025".to_string()),
                ("IMPORTE".to_string(), "100.50".to_string()),
            ],
        };
        assert_eq!(row.cell(1), Some("100.50"));
        assert_eq!(row.cell(2), None);
        assert_eq!(row.to_string(), "13/11/2025,100.50");
    }
}
