use diesel::sqlite::SqliteConnection;
use std::collections::HashSet;

use super::coins_errors::Result;
use super::coins_model::{Coin, NewCoin};

/// Trait defining the contract for catalog repository operations.
///
/// The upsert methods take an explicit connection so the sync engine can run
/// a whole flush inside one transaction.
pub trait CoinRepositoryTrait: Send + Sync {
    fn upsert_identity_batch(
        &self,
        conn: &mut SqliteConnection,
        new_coins: &[NewCoin],
    ) -> Result<usize>;
    fn upsert_image_batch(
        &self,
        conn: &mut SqliteConnection,
        new_coins: &[NewCoin],
    ) -> Result<usize>;
    fn get_by_id(&self, coin_id: &str) -> Result<Coin>;
    fn list(&self) -> Result<Vec<Coin>>;
    fn list_ids(&self) -> Result<Vec<String>>;
    fn search(&self, query: &str) -> Result<Vec<Coin>>;
    fn count(&self) -> Result<i64>;
    fn delete_batch(&self, coin_ids: &[String]) -> Result<usize>;
    fn delete(&self, coin_id: &str) -> Result<()>;
    fn referenced_coin_ids(&self, candidate_ids: &[String]) -> Result<HashSet<String>>;
}
