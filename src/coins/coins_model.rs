use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::providers::models::RemoteCoin;

use super::coins_errors::{CoinError, Result};

/// Domain model for one catalog entry sourced from the remote provider
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating or refreshing a catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
}

impl NewCoin {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CoinError::InvalidData(
                "Coin id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<RemoteCoin> for NewCoin {
    fn from(remote: RemoteCoin) -> Self {
        Self {
            id: remote.id,
            symbol: remote.symbol,
            name: remote.name,
            image: remote.image,
        }
    }
}

/// Database model for catalog entries
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Default,
)]
#[diesel(table_name = crate::schema::coins)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CoinDB {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<CoinDB> for Coin {
    fn from(db: CoinDB) -> Self {
        Self {
            id: db.id,
            symbol: db.symbol,
            name: db.name,
            image: db.image,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewCoin> for CoinDB {
    fn from(domain: NewCoin) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: domain.id,
            symbol: domain.symbol,
            name: domain.name,
            image: domain.image,
            created_at: now,
            updated_at: now,
        }
    }
}
