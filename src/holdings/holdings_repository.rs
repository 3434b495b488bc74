use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{get_connection, DbPool};
use crate::schema::{holdings, transactions};

use super::holdings_errors::{LedgerError, Result};
use super::holdings_model::{
    Holding, HoldingDB, LedgerTotals, NewTransaction, Transaction, TransactionDB,
    TransactionUpdate,
};
use super::holdings_traits::LedgerRepositoryTrait;

/// Repository for holdings and their transactions.
///
/// Mutation primitives take an explicit connection so the service layer can
/// compose a whole mutation plus its reconciliation pass into one
/// transaction; plain reads go through the pool.
pub struct LedgerRepository {
    pool: Arc<DbPool>,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl LedgerRepositoryTrait for LedgerRepository {
    fn find_holding(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        coin_id: &str,
    ) -> Result<Holding> {
        let result = holdings::table
            .filter(holdings::user_id.eq(user_id))
            .filter(holdings::coin_id.eq(coin_id))
            .first::<HoldingDB>(conn)?;

        Ok(result.into())
    }

    /// Resolves the (user, coin) holding, creating an empty one on first use.
    fn get_or_create_holding(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        coin_id: &str,
    ) -> Result<Holding> {
        match self.find_holding(conn, user_id, coin_id) {
            Ok(existing) => Ok(existing),
            Err(LedgerError::NotFound(_)) => {
                let now = Utc::now().naive_utc();
                let holding_db = HoldingDB {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    coin_id: coin_id.to_string(),
                    total_quantity: Decimal::ZERO.to_string(),
                    total_cost: Decimal::ZERO.to_string(),
                    average_price: Decimal::ZERO.to_string(),
                    desired_sell_price: None,
                    created_at: now,
                    updated_at: now,
                };

                let result = diesel::insert_into(holdings::table)
                    .values(&holding_db)
                    .get_result::<HoldingDB>(conn)?;

                Ok(result.into())
            }
            Err(e) => Err(e),
        }
    }

    fn insert_transaction(
        &self,
        conn: &mut SqliteConnection,
        holding_id: &str,
        new_transaction: &NewTransaction,
    ) -> Result<Transaction> {
        let now = Utc::now().naive_utc();
        let transaction_db = TransactionDB {
            id: Uuid::new_v4().to_string(),
            holding_id: holding_id.to_string(),
            quantity: new_transaction.quantity.to_string(),
            price: new_transaction.price.to_string(),
            tx_date: new_transaction.tx_date.unwrap_or(now),
            wallet: new_transaction.wallet.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        let result = diesel::insert_into(transactions::table)
            .values(&transaction_db)
            .get_result::<TransactionDB>(conn)?;

        Ok(result.into())
    }

    fn update_transaction(
        &self,
        conn: &mut SqliteConnection,
        update: &TransactionUpdate,
    ) -> Result<Transaction> {
        let existing = transactions::table
            .find(&update.id)
            .first::<TransactionDB>(conn)?;

        let result = diesel::update(transactions::table.find(&existing.id))
            .set((
                transactions::quantity.eq(update.quantity.to_string()),
                transactions::price.eq(update.price.to_string()),
                transactions::tx_date.eq(update.tx_date),
                transactions::wallet.eq(update.wallet.as_str()),
                transactions::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<TransactionDB>(conn)?;

        Ok(result.into())
    }

    fn delete_transaction(
        &self,
        conn: &mut SqliteConnection,
        transaction_id: &str,
    ) -> Result<Transaction> {
        let existing = transactions::table
            .find(transaction_id)
            .first::<TransactionDB>(conn)?;

        diesel::delete(transactions::table.find(transaction_id)).execute(conn)?;

        Ok(existing.into())
    }

    /// Full transaction history for a holding in replay order: by execution
    /// date, ties broken by insertion order.
    fn transactions_for_holding(
        &self,
        conn: &mut SqliteConnection,
        holding_id: &str,
    ) -> Result<Vec<Transaction>> {
        let results = transactions::table
            .filter(transactions::holding_id.eq(holding_id))
            .order((
                transactions::tx_date.asc(),
                transactions::created_at.asc(),
                transactions::id.asc(),
            ))
            .load::<TransactionDB>(conn)?;

        Ok(results.into_iter().map(Transaction::from).collect())
    }

    fn save_totals(
        &self,
        conn: &mut SqliteConnection,
        holding_id: &str,
        totals: &LedgerTotals,
    ) -> Result<Holding> {
        let result = diesel::update(holdings::table.find(holding_id))
            .set((
                holdings::total_quantity.eq(totals.total_quantity.to_string()),
                holdings::total_cost.eq(totals.total_cost.to_string()),
                holdings::average_price.eq(totals.average_price.to_string()),
                holdings::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<HoldingDB>(conn)?;

        Ok(result.into())
    }

    fn set_desired_sell_price(
        &self,
        conn: &mut SqliteConnection,
        holding_id: &str,
        price: Option<Decimal>,
    ) -> Result<Holding> {
        let result = diesel::update(holdings::table.find(holding_id))
            .set((
                holdings::desired_sell_price.eq(price.map(|value| value.to_string())),
                holdings::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<HoldingDB>(conn)?;

        Ok(result.into())
    }

    /// Deletes a holding; its transactions cascade at the storage layer.
    fn delete_holding(&self, conn: &mut SqliteConnection, holding_id: &str) -> Result<usize> {
        diesel::delete(holdings::table.find(holding_id))
            .execute(conn)
            .map_err(LedgerError::from)
    }

    fn get_holding(&self, user_id: &str, coin_id: &str) -> Result<Holding> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        let result = holdings::table
            .filter(holdings::user_id.eq(user_id))
            .filter(holdings::coin_id.eq(coin_id))
            .first::<HoldingDB>(&mut conn)?;

        Ok(result.into())
    }

    fn holdings_for_user(&self, user_id: &str) -> Result<Vec<Holding>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        let results = holdings::table
            .filter(holdings::user_id.eq(user_id))
            .order(holdings::coin_id.asc())
            .load::<HoldingDB>(&mut conn)?;

        Ok(results.into_iter().map(Holding::from).collect())
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        let result = transactions::table
            .find(transaction_id)
            .first::<TransactionDB>(&mut conn)?;

        Ok(result.into())
    }

    fn list_transactions(&self, holding_id: &str) -> Result<Vec<Transaction>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        let results = transactions::table
            .filter(transactions::holding_id.eq(holding_id))
            .order((
                transactions::tx_date.asc(),
                transactions::created_at.asc(),
                transactions::id.asc(),
            ))
            .load::<TransactionDB>(&mut conn)?;

        Ok(results.into_iter().map(Transaction::from).collect())
    }
}
