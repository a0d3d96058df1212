use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database connection is already in use")]
    ConnectionBusy,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("No movement with id {0}")]
    NotFound(i64),
}

pub type Result<T> = std::result::Result<T, EtlError>;
