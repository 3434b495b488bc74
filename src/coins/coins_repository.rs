use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::schema::{coins, holdings};

use super::coins_errors::{CoinError, Result};
use super::coins_model::{Coin, CoinDB, NewCoin};
use super::coins_traits::CoinRepositoryTrait;

/// Repository for managing catalog entries in the database
pub struct CoinRepository {
    pool: Arc<DbPool>,
}

impl CoinRepository {
    /// Creates a new CoinRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl CoinRepositoryTrait for CoinRepository {
    /// Upserts identity fields (symbol, name) for a batch of coins.
    ///
    /// Leaves any previously synced image untouched so an identity pass never
    /// undoes an image pass. Runs on the caller's connection so a whole batch
    /// commits or rolls back as one unit.
    fn upsert_identity_batch(
        &self,
        conn: &mut SqliteConnection,
        new_coins: &[NewCoin],
    ) -> Result<usize> {
        let mut upserted = 0;
        for new_coin in new_coins {
            new_coin.validate()?;
            let coin_db: CoinDB = new_coin.clone().into();

            upserted += diesel::insert_into(coins::table)
                .values(&coin_db)
                .on_conflict(coins::id)
                .do_update()
                .set((
                    coins::symbol.eq(&coin_db.symbol),
                    coins::name.eq(&coin_db.name),
                    coins::updated_at.eq(coin_db.updated_at),
                ))
                .execute(conn)?;
        }
        Ok(upserted)
    }

    /// Upserts a batch of coins including their image URL.
    fn upsert_image_batch(
        &self,
        conn: &mut SqliteConnection,
        new_coins: &[NewCoin],
    ) -> Result<usize> {
        let mut upserted = 0;
        for new_coin in new_coins {
            new_coin.validate()?;
            let coin_db: CoinDB = new_coin.clone().into();

            upserted += diesel::insert_into(coins::table)
                .values(&coin_db)
                .on_conflict(coins::id)
                .do_update()
                .set((
                    coins::symbol.eq(&coin_db.symbol),
                    coins::name.eq(&coin_db.name),
                    coins::image.eq(&coin_db.image),
                    coins::updated_at.eq(coin_db.updated_at),
                ))
                .execute(conn)?;
        }
        Ok(upserted)
    }

    /// Retrieves a catalog entry by its ID
    fn get_by_id(&self, coin_id: &str) -> Result<Coin> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CoinError::DatabaseError(e.to_string()))?;

        let result = coins::table.find(coin_id).first::<CoinDB>(&mut conn)?;

        Ok(result.into())
    }

    /// Lists all catalog entries
    fn list(&self) -> Result<Vec<Coin>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CoinError::DatabaseError(e.to_string()))?;

        let results = coins::table
            .order(coins::name.asc())
            .load::<CoinDB>(&mut conn)?;

        Ok(results.into_iter().map(Coin::from).collect())
    }

    /// Lists the ids of all catalog entries
    fn list_ids(&self) -> Result<Vec<String>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CoinError::DatabaseError(e.to_string()))?;

        coins::table
            .select(coins::id)
            .load::<String>(&mut conn)
            .map_err(CoinError::from)
    }

    /// Searches catalog entries by symbol or name
    fn search(&self, query: &str) -> Result<Vec<Coin>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CoinError::DatabaseError(e.to_string()))?;

        let pattern = format!("%{}%", query);
        let results = coins::table
            .filter(
                coins::symbol
                    .like(&pattern)
                    .or(coins::name.like(&pattern)),
            )
            .order(coins::name.asc())
            .load::<CoinDB>(&mut conn)?;

        Ok(results.into_iter().map(Coin::from).collect())
    }

    /// Counts catalog entries
    fn count(&self) -> Result<i64> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CoinError::DatabaseError(e.to_string()))?;

        coins::table
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(CoinError::from)
    }

    /// Deletes a batch of catalog entries by id
    fn delete_batch(&self, coin_ids: &[String]) -> Result<usize> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CoinError::DatabaseError(e.to_string()))?;

        diesel::delete(coins::table.filter(coins::id.eq_any(coin_ids)))
            .execute(&mut conn)
            .map_err(CoinError::from)
    }

    /// Deletes a single catalog entry by id
    fn delete(&self, coin_id: &str) -> Result<()> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CoinError::DatabaseError(e.to_string()))?;

        diesel::delete(coins::table.filter(coins::id.eq(coin_id))).execute(&mut conn)?;

        Ok(())
    }

    /// Returns the subset of the candidate ids referenced by at least one
    /// holding. Read-only look across the ledger boundary, used by the prune
    /// pass to protect coins users still hold.
    fn referenced_coin_ids(&self, candidate_ids: &[String]) -> Result<HashSet<String>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| CoinError::DatabaseError(e.to_string()))?;

        let referenced = holdings::table
            .filter(holdings::coin_id.eq_any(candidate_ids))
            .select(holdings::coin_id)
            .distinct()
            .load::<String>(&mut conn)?;

        Ok(referenced.into_iter().collect())
    }
}
