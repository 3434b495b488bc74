use diesel::result::Error as DieselError;
use thiserror::Error;

use crate::errors::DatabaseError;

/// Custom error type for catalog-related operations
#[derive(Debug, Error)]
pub enum CoinError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for CoinError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => CoinError::NotFound("Record not found".to_string()),
            _ => CoinError::DatabaseError(err.to_string()),
        }
    }
}

impl From<DatabaseError> for CoinError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::QueryFailed(DieselError::NotFound) => {
                CoinError::NotFound("Record not found".to_string())
            }
            _ => CoinError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CoinError>;
