use diesel::result::Error as DieselError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::errors::DatabaseError;

/// Custom error type for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Insufficient balance: cannot dispose {requested} with only {available} held")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },
}

impl From<DieselError> for LedgerError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => LedgerError::NotFound("Record not found".to_string()),
            _ => LedgerError::DatabaseError(err.to_string()),
        }
    }
}

impl From<DatabaseError> for LedgerError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::QueryFailed(DieselError::NotFound) => {
                LedgerError::NotFound("Record not found".to_string())
            }
            _ => LedgerError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;
