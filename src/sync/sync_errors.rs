use diesel::result::Error as DieselError;
use thiserror::Error;

use crate::coins::CoinError;
use crate::errors::DatabaseError;

/// Custom error type for catalog synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for SyncError {
    fn from(err: DieselError) -> Self {
        SyncError::Database(err.to_string())
    }
}

impl From<DatabaseError> for SyncError {
    fn from(err: DatabaseError) -> Self {
        SyncError::Database(err.to_string())
    }
}

impl From<CoinError> for SyncError {
    fn from(err: CoinError) -> Self {
        match err {
            CoinError::InvalidData(msg) => SyncError::InvalidData(msg),
            other => SyncError::Database(other.to_string()),
        }
    }
}

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
