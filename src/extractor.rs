use std::path::Path;

use tracing::{info, warn};

use crate::db::non_blank;
use crate::error::{EtlError, Result};
use crate::models::{ExtractionError, LedgerRecord, RawRow, StagingRecord, UNSAVED_ID};
use crate::normalize::{normalize_number, parse_date};

/// Exports open with free-form preamble; the table starts at the line beginning with this.
pub const HEADER_TOKEN: &str = "F. VALOR";

// Candidate header fragments per field, matched case-insensitively; first hit wins.
const DATE_KEYS: &[&str] = &["F. VALOR", "FECHA"];
const COMMENT_KEYS: &[&str] = &["COMENTARIO"];
const DESCRIPTION_KEYS: &[&str] = &["DESCRIPC"];
const AMOUNT_KEYS: &[&str] = &["IMPORTE"];
const BALANCE_KEYS: &[&str] = &["SALDO"];
const CATEGORY_KEYS: &[&str] = &["CATEGOR"];
const SUBCATEGORY_KEYS: &[&str] = &["SUBCATEG"];

/// Column positions of the logical fields within one export's header.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub comment: Option<usize>,
    pub description: Option<usize>,
    pub amount: Option<usize>,
    pub balance: Option<usize>,
    pub category: Option<usize>,
    pub subcategory: Option<usize>,
}

impl ColumnMap {
    pub fn from_headers(headers: &[String]) -> Self {
        Self {
            // Without a recognizable date header the first column is assumed.
            date: find_column(headers, DATE_KEYS).or((!headers.is_empty()).then_some(0)),
            comment: find_column(headers, COMMENT_KEYS),
            description: find_column(headers, DESCRIPTION_KEYS),
            amount: find_column(headers, AMOUNT_KEYS),
            balance: find_column(headers, BALANCE_KEYS),
            category: find_column(headers, CATEGORY_KEYS),
            subcategory: find_column(headers, SUBCATEGORY_KEYS),
        }
    }
}

fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        let candidate = candidate.to_lowercase();
        headers
            .iter()
            .position(|h| h.to_lowercase().contains(&candidate))
    })
}

fn cell<'r>(row: &'r RawRow, column: Option<usize>) -> Option<&'r str> {
    column.and_then(|idx| row.cell(idx))
}

fn required<'r>(value: Option<&'r str>, field: &str) -> Result<&'r str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(EtlError::Validation(format!("{field} is empty"))),
    }
}

/// Header row plus every data row of the table, in file order.
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<csv::Result<RawRow>>,
}

impl RawTable {
    /// Skip the preamble and read the table below the header line.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let table = locate_table(content)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(table.as_bytes());

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let rows = rdr
            .records()
            .map(|result| {
                result.map(|record| RawRow {
                    fields: headers
                        .iter()
                        .enumerate()
                        .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
                        .collect(),
                })
            })
            .collect();
        Ok(Self { headers, rows })
    }
}

fn locate_table(content: &str) -> Result<&str> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let line_start = line.trim_start_matches('\u{feff}');
        if line_start.trim().starts_with(HEADER_TOKEN) {
            let skipped_bom = line.len() - line_start.len();
            return Ok(&content[offset + skipped_bom..]);
        }
        offset += line.len();
    }
    Err(EtlError::Format(format!(
        "no header line starting with '{HEADER_TOKEN}'"
    )))
}

/// Convert one export row into a ledger movement.
///
/// The comment falls back to the description when blank. Comment, amount and
/// balance must be present, checked in that order.
pub fn row_to_record(row: &RawRow, columns: &ColumnMap) -> Result<LedgerRecord> {
    let comment = cell(row, columns.comment)
        .filter(|c| !c.trim().is_empty())
        .or_else(|| cell(row, columns.description));

    let comment = required(comment, "comment")?;
    let amount_raw = required(cell(row, columns.amount), "amount")?;
    let balance_raw = required(cell(row, columns.balance), "balance")?;

    let date = parse_date(cell(row, columns.date))?;
    let amount = normalize_number(Some(amount_raw))?
        .ok_or_else(|| EtlError::Validation("amount is not a number".to_string()))?;
    let balance = normalize_number(Some(balance_raw))?
        .ok_or_else(|| EtlError::Validation("balance is not a number".to_string()))?;

    let mut record = LedgerRecord::new(date, comment, amount)?;
    record.balance = Some(balance);
    record.category = non_blank(cell(row, columns.category));
    record.subcategory = non_blank(cell(row, columns.subcategory));
    record.description = non_blank(cell(row, columns.description));
    Ok(record)
}

/// Convert one export row into an unsaved staging record.
pub fn row_to_staging(row: &RawRow, columns: &ColumnMap) -> Result<StagingRecord> {
    let amount_raw = required(cell(row, columns.amount), "amount")?;
    let balance_raw = required(cell(row, columns.balance), "balance")?;
    let value_date = required(cell(row, columns.date), "value date")?;

    let amount = normalize_number(Some(amount_raw))?
        .ok_or_else(|| EtlError::Validation("amount is not a number".to_string()))?;
    let balance = normalize_number(Some(balance_raw))?
        .ok_or_else(|| EtlError::Validation("balance is not a number".to_string()))?;

    let mut record = StagingRecord::new(UNSAVED_ID, value_date, amount, balance)?;
    record.category = non_blank(cell(row, columns.category));
    record.subcategory = non_blank(cell(row, columns.subcategory));
    record.description = non_blank(cell(row, columns.description));
    Ok(record)
}

/// Extract ledger movements. Only a missing header aborts; bad rows are reported
/// in the error list and the rest keep their file order.
pub fn extract(path: &Path) -> Result<(Vec<LedgerRecord>, Vec<ExtractionError>)> {
    extract_with(path, row_to_record)
}

/// Same as [`extract`], producing staging records.
pub fn extract_staging(path: &Path) -> Result<(Vec<StagingRecord>, Vec<ExtractionError>)> {
    extract_with(path, row_to_staging)
}

fn extract_with<T>(
    path: &Path,
    convert: fn(&RawRow, &ColumnMap) -> Result<T>,
) -> Result<(Vec<T>, Vec<ExtractionError>)> {
    let table = RawTable::read(path)?;
    let columns = ColumnMap::from_headers(&table.headers);

    let mut valid = Vec::new();
    let mut errors = Vec::new();
    for (row_index, row) in table.rows.into_iter().enumerate() {
        let (raw_row, outcome) = match row {
            Ok(raw) => {
                let outcome = convert(&raw, &columns);
                (raw, outcome)
            }
            Err(e) => (RawRow::default(), Err(EtlError::Csv(e))),
        };
        match outcome {
            Ok(record) => valid.push(record),
            Err(e) => {
                let reason = e.to_string();
                warn!(row = row_index, %reason, "skipped row");
                errors.push(ExtractionError {
                    row_index,
                    raw_row,
                    reason,
                });
            }
        }
    }

    info!(
        file = %path.display(),
        valid = valid.len(),
        errors = errors.len(),
        "extraction finished"
    );
    Ok((valid, errors))
}
