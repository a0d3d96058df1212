use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{EtlError, Result};

// Money columns are TEXT holding the canonical decimal rendering, so `=` compares
// exact values and nothing goes through REAL.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS movimientos (
    id INTEGER PRIMARY KEY,
    fecha_movimiento TEXT NOT NULL,
    comentario TEXT NOT NULL,
    importe TEXT,
    categoria TEXT,
    subcategoria TEXT,
    descripcion TEXT,
    saldo TEXT
);

CREATE INDEX IF NOT EXISTS idx_movimientos_dedup
    ON movimientos (fecha_movimiento, importe, saldo);

CREATE TABLE IF NOT EXISTS movimientos_staging (
    id INTEGER PRIMARY KEY,
    fecha_valor TEXT NOT NULL,
    importe TEXT NOT NULL,
    saldo TEXT NOT NULL,
    categoria TEXT,
    subcategoria TEXT,
    descripcion TEXT,
    created_at TEXT NOT NULL
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Owns the single store handle for one thread of work.
///
/// The connection is opened on the first [`acquire`](Self::acquire) and reused
/// until [`release`](Self::release). Borrows are exclusive: holding two at once
/// panics, the same as any `RefCell`.
pub struct ConnectionProvider {
    db_path: PathBuf,
    conn: RefCell<Option<Connection>>,
}

impl ConnectionProvider {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            conn: RefCell::new(None),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn acquire(&self) -> Result<RefMut<'_, Connection>> {
        let mut slot = self
            .conn
            .try_borrow_mut()
            .map_err(|_| EtlError::ConnectionBusy)?;
        if slot.is_none() {
            debug!(path = %self.db_path.display(), "opening database");
            *slot = Some(get_connection(&self.db_path)?);
        }
        RefMut::filter_map(slot, Option::as_mut)
            .map_err(|_| EtlError::Settings("database connection unavailable".to_string()))
    }

    pub fn release(&self) -> Result<()> {
        let taken = self
            .conn
            .try_borrow_mut()
            .map_err(|_| EtlError::ConnectionBusy)?
            .take();
        if let Some(conn) = taken {
            debug!(path = %self.db_path.display(), "closing database");
            conn.close().map_err(|(_, e)| EtlError::Persistence(e))?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.conn.borrow().is_some()
    }
}

pub fn decimal_to_sql(value: &Decimal) -> String {
    value.normalize().to_string()
}

pub fn decimal_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    parse_decimal_column(idx, &text)
}

pub fn opt_decimal_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| parse_decimal_column(idx, &t)).transpose()
}

fn parse_decimal_column(idx: usize, text: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Empty cells are stored as NULL.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn test_provider() -> (tempfile::TempDir, ConnectionProvider) {
        let dir = tempfile::tempdir().unwrap();
        let provider = ConnectionProvider::new(dir.path().join("test.db"));
        init_db(&provider.acquire().unwrap()).unwrap();
        (dir, provider)
    }
}
