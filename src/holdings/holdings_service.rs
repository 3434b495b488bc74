use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::coins::{CoinError, CoinRepositoryTrait};
use crate::db::{DbPool, DbTransactionExecutor};

use super::holdings_errors::{LedgerError, Result};
use super::holdings_model::{Holding, NewTransaction, Transaction, TransactionUpdate, Wallet};
use super::holdings_traits::{HoldingServiceTrait, LedgerRepositoryTrait};
use super::ledger_calculator::reconcile;

/// Service for recording trades and keeping holdings consistent with their
/// transaction history.
///
/// Every mutation runs inside one database transaction: the write, the
/// full-history replay and the totals update commit together or not at all.
pub struct HoldingService {
    pool: Arc<DbPool>,
    repository: Arc<dyn LedgerRepositoryTrait>,
    coin_repository: Arc<dyn CoinRepositoryTrait>,
}

impl HoldingService {
    pub fn new(
        pool: Arc<DbPool>,
        repository: Arc<dyn LedgerRepositoryTrait>,
        coin_repository: Arc<dyn CoinRepositoryTrait>,
    ) -> Self {
        Self {
            pool,
            repository,
            coin_repository,
        }
    }

    fn ensure_coin_exists(&self, coin_id: &str) -> Result<()> {
        match self.coin_repository.get_by_id(coin_id) {
            Ok(_) => Ok(()),
            Err(CoinError::NotFound(_)) => Err(LedgerError::NotFound(format!(
                "Coin not found in catalog: {}",
                coin_id
            ))),
            Err(e) => Err(LedgerError::DatabaseError(e.to_string())),
        }
    }

    /// Replays the holding's history and persists the recomputed totals.
    /// Must run on the same connection as the mutation that preceded it.
    fn reconcile_holding(
        &self,
        conn: &mut diesel::sqlite::SqliteConnection,
        holding_id: &str,
    ) -> Result<Holding> {
        let history = self.repository.transactions_for_holding(conn, holding_id)?;
        let totals = reconcile(&history)?;
        self.repository.save_totals(conn, holding_id, &totals)
    }
}

impl HoldingServiceTrait for HoldingService {
    fn record_trade(&self, new_transaction: NewTransaction) -> Result<Holding> {
        new_transaction.validate()?;
        if new_transaction.quantity == Decimal::ZERO {
            return Err(LedgerError::InvalidData(
                "Quantity cannot be zero".to_string(),
            ));
        }
        self.ensure_coin_exists(&new_transaction.coin_id)?;

        debug!(
            "Recording trade of {} {} for user {}",
            new_transaction.quantity, new_transaction.coin_id, new_transaction.user_id
        );

        self.pool.execute(|conn| {
            let holding = self.repository.get_or_create_holding(
                conn,
                &new_transaction.user_id,
                &new_transaction.coin_id,
            )?;
            self.repository
                .insert_transaction(conn, &holding.id, &new_transaction)?;
            self.reconcile_holding(conn, &holding.id)
        })
    }

    /// Inserts a zero-quantity draft entry the user can fill in afterwards
    /// via `replace_transactions`.
    fn add_empty_transaction(&self, user_id: &str, coin_id: &str) -> Result<Transaction> {
        self.ensure_coin_exists(coin_id)?;

        let draft = NewTransaction {
            user_id: user_id.to_string(),
            coin_id: coin_id.to_string(),
            quantity: Decimal::ZERO,
            price: Decimal::ZERO,
            tx_date: None,
            wallet: Wallet::Other,
        };

        self.pool.execute(|conn| {
            let holding = self
                .repository
                .get_or_create_holding(conn, user_id, coin_id)?;
            let transaction = self
                .repository
                .insert_transaction(conn, &holding.id, &draft)?;
            self.reconcile_holding(conn, &holding.id)?;
            Ok(transaction)
        })
    }

    /// Applies a batch of edits to a holding's transactions and reconciles
    /// once. An edit touching a transaction that belongs to a different
    /// holding rejects the whole batch.
    fn replace_transactions(
        &self,
        user_id: &str,
        coin_id: &str,
        edits: Vec<TransactionUpdate>,
    ) -> Result<Holding> {
        for edit in &edits {
            edit.validate()?;
        }

        self.pool.execute(|conn| {
            let holding = self.repository.find_holding(conn, user_id, coin_id)?;
            for edit in &edits {
                let updated = self.repository.update_transaction(conn, edit)?;
                if updated.holding_id != holding.id {
                    return Err(LedgerError::NotFound(format!(
                        "Transaction not found for this holding: {}",
                        edit.id
                    )));
                }
            }
            self.reconcile_holding(conn, &holding.id)
        })
    }

    fn remove_transaction(&self, transaction_id: &str) -> Result<Holding> {
        self.pool.execute(|conn| {
            let deleted = self.repository.delete_transaction(conn, transaction_id)?;
            self.reconcile_holding(conn, &deleted.holding_id)
        })
    }

    /// Removes a holding and its entire transaction history.
    fn remove_holding(&self, user_id: &str, coin_id: &str) -> Result<()> {
        self.pool.execute(|conn| {
            let holding = self.repository.find_holding(conn, user_id, coin_id)?;
            self.repository.delete_holding(conn, &holding.id)?;
            Ok(())
        })
    }

    /// Stores or clears the user's target sell price. Independent of the
    /// ledger math, so no reconciliation pass runs here.
    fn set_desired_sell_price(
        &self,
        user_id: &str,
        coin_id: &str,
        price: Option<Decimal>,
    ) -> Result<Holding> {
        if let Some(value) = price {
            if value < Decimal::ZERO {
                return Err(LedgerError::InvalidData(
                    "Desired sell price cannot be negative".to_string(),
                ));
            }
        }

        self.pool.execute(|conn| {
            let holding = self.repository.find_holding(conn, user_id, coin_id)?;
            self.repository
                .set_desired_sell_price(conn, &holding.id, price)
        })
    }

    fn get_holding(&self, user_id: &str, coin_id: &str) -> Result<Holding> {
        self.repository.get_holding(user_id, coin_id)
    }

    fn get_holdings_for_user(&self, user_id: &str) -> Result<Vec<Holding>> {
        self.repository.holdings_for_user(user_id)
    }

    fn get_transactions(&self, user_id: &str, coin_id: &str) -> Result<Vec<Transaction>> {
        let holding = self.repository.get_holding(user_id, coin_id)?;
        self.repository.list_transactions(&holding.id)
    }
}
