use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::holdings_errors::{LedgerError, Result};

/// Informational tag recording where a transaction settled; not part of the
/// ledger math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Wallet {
    Exchange,
    Hot,
    Cold,
    #[default]
    Other,
}

impl Wallet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Wallet::Exchange => "EXCHANGE",
            Wallet::Hot => "HOT",
            Wallet::Cold => "COLD",
            Wallet::Other => "OTHER",
        }
    }
}

impl From<&str> for Wallet {
    fn from(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "EXCHANGE" => Wallet::Exchange,
            "HOT" => Wallet::Hot,
            "COLD" => Wallet::Cold,
            _ => Wallet::Other,
        }
    }
}

/// A user's aggregate position in one coin. The quantity/cost/average fields
/// are derived state owned by the reconciler; `desired_sell_price` is the
/// only user-owned field.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub user_id: String,
    pub coin_id: String,
    pub total_quantity: Decimal,
    pub total_cost: Decimal,
    pub average_price: Decimal,
    pub desired_sell_price: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// One signed ledger entry. Positive quantity acquires, negative disposes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub holding_id: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub tx_date: NaiveDateTime,
    pub wallet: Wallet,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for recording a trade
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub user_id: String,
    pub coin_id: String,
    pub quantity: Decimal,
    /// Unit price at execution; zero is valid for non-trade inflows such as
    /// airdrops.
    pub price: Decimal,
    pub tx_date: Option<NaiveDateTime>,
    pub wallet: Wallet,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(LedgerError::InvalidData(
                "User id cannot be empty".to_string(),
            ));
        }
        if self.coin_id.trim().is_empty() {
            return Err(LedgerError::InvalidData(
                "Coin id cannot be empty".to_string(),
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(LedgerError::InvalidData(
                "Price cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input model for editing an existing transaction
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub tx_date: NaiveDateTime,
    pub wallet: Wallet,
}

impl TransactionUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(LedgerError::InvalidData(
                "Transaction id cannot be empty".to_string(),
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(LedgerError::InvalidData(
                "Price cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Aggregates recomputed by the reconciler
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub total_quantity: Decimal,
    pub total_cost: Decimal,
    pub average_price: Decimal,
}

/// Database model for holdings, decimals stored as text
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HoldingDB {
    pub id: String,
    pub user_id: String,
    pub coin_id: String,
    pub total_quantity: String,
    pub total_cost: String,
    pub average_price: String,
    pub desired_sell_price: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<HoldingDB> for Holding {
    fn from(db: HoldingDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            coin_id: db.coin_id,
            total_quantity: Decimal::from_str(&db.total_quantity).unwrap_or_default(),
            total_cost: Decimal::from_str(&db.total_cost).unwrap_or_default(),
            average_price: Decimal::from_str(&db.average_price).unwrap_or_default(),
            desired_sell_price: db
                .desired_sell_price
                .as_deref()
                .and_then(|value| Decimal::from_str(value).ok()),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Database model for transactions, decimals stored as text
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub holding_id: String,
    pub quantity: String,
    pub price: String,
    pub tx_date: NaiveDateTime,
    pub wallet: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        Self {
            id: db.id,
            holding_id: db.holding_id,
            quantity: Decimal::from_str(&db.quantity).unwrap_or_default(),
            price: Decimal::from_str(&db.price).unwrap_or_default(),
            tx_date: db.tx_date,
            wallet: Wallet::from(db.wallet.as_str()),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn wallet_tags_round_trip() {
        for wallet in [Wallet::Exchange, Wallet::Hot, Wallet::Cold, Wallet::Other] {
            assert_eq!(Wallet::from(wallet.as_str()), wallet);
        }
        assert_eq!(Wallet::from("ledger nano"), Wallet::Other);
    }

    #[test]
    fn new_transaction_rejects_negative_price() {
        let tx = NewTransaction {
            user_id: "u1".to_string(),
            coin_id: "bitcoin".to_string(),
            quantity: dec!(1),
            price: dec!(-10),
            tx_date: None,
            wallet: Wallet::Exchange,
        };
        assert!(matches!(tx.validate(), Err(LedgerError::InvalidData(_))));
    }
}
