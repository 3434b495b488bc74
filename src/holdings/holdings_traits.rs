use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;

use super::holdings_errors::Result;
use super::holdings_model::{
    Holding, LedgerTotals, NewTransaction, Transaction, TransactionUpdate,
};

/// Trait defining the contract for ledger repository operations.
///
/// Mutation primitives take an explicit connection so callers can compose
/// them inside one transaction; reads go through the pool.
pub trait LedgerRepositoryTrait: Send + Sync {
    fn find_holding(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        coin_id: &str,
    ) -> Result<Holding>;
    fn get_or_create_holding(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        coin_id: &str,
    ) -> Result<Holding>;
    fn insert_transaction(
        &self,
        conn: &mut SqliteConnection,
        holding_id: &str,
        new_transaction: &NewTransaction,
    ) -> Result<Transaction>;
    fn update_transaction(
        &self,
        conn: &mut SqliteConnection,
        update: &TransactionUpdate,
    ) -> Result<Transaction>;
    fn delete_transaction(
        &self,
        conn: &mut SqliteConnection,
        transaction_id: &str,
    ) -> Result<Transaction>;
    fn transactions_for_holding(
        &self,
        conn: &mut SqliteConnection,
        holding_id: &str,
    ) -> Result<Vec<Transaction>>;
    fn save_totals(
        &self,
        conn: &mut SqliteConnection,
        holding_id: &str,
        totals: &LedgerTotals,
    ) -> Result<Holding>;
    fn set_desired_sell_price(
        &self,
        conn: &mut SqliteConnection,
        holding_id: &str,
        price: Option<Decimal>,
    ) -> Result<Holding>;
    fn delete_holding(&self, conn: &mut SqliteConnection, holding_id: &str) -> Result<usize>;

    fn get_holding(&self, user_id: &str, coin_id: &str) -> Result<Holding>;
    fn holdings_for_user(&self, user_id: &str) -> Result<Vec<Holding>>;
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;
    fn list_transactions(&self, holding_id: &str) -> Result<Vec<Transaction>>;
}

/// Trait defining the contract for position mutations exposed to request
/// handlers. Callers are expected to have authenticated `user_id` already.
pub trait HoldingServiceTrait: Send + Sync {
    fn record_trade(&self, new_transaction: NewTransaction) -> Result<Holding>;
    fn add_empty_transaction(&self, user_id: &str, coin_id: &str) -> Result<Transaction>;
    fn replace_transactions(
        &self,
        user_id: &str,
        coin_id: &str,
        edits: Vec<TransactionUpdate>,
    ) -> Result<Holding>;
    fn remove_transaction(&self, transaction_id: &str) -> Result<Holding>;
    fn remove_holding(&self, user_id: &str, coin_id: &str) -> Result<()>;
    fn set_desired_sell_price(
        &self,
        user_id: &str,
        coin_id: &str,
        price: Option<Decimal>,
    ) -> Result<Holding>;

    fn get_holding(&self, user_id: &str, coin_id: &str) -> Result<Holding>;
    fn get_holdings_for_user(&self, user_id: &str) -> Result<Vec<Holding>>;
    fn get_transactions(&self, user_id: &str, coin_id: &str) -> Result<Vec<Transaction>>;
}
