use std::sync::Arc;

use tempfile::TempDir;

use coinfolio_core::coins::{CoinError, CoinRepository, CoinRepositoryTrait, NewCoin};
use coinfolio_core::db::{self, DbPool, DbTransactionExecutor};

/// Fresh sqlite database in a temp dir, migrations applied. Keep the
/// returned TempDir alive for the duration of the test.
pub fn setup_test_db() -> (TempDir, Arc<DbPool>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir
        .path()
        .join("app.db")
        .to_string_lossy()
        .into_owned();

    let db_path = db::init(&db_path).expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");
    db::run_migrations(&pool).expect("Failed to run migrations");

    (dir, pool)
}

/// Seeds catalog entries the way an identity sync would, without images.
#[allow(dead_code)]
pub fn seed_coins(pool: &Arc<DbPool>, ids: &[&str]) {
    let repository = CoinRepository::new(pool.clone());
    let new_coins: Vec<NewCoin> = ids
        .iter()
        .map(|id| NewCoin {
            id: id.to_string(),
            symbol: id.to_uppercase(),
            name: format!("{} coin", id),
            image: None,
        })
        .collect();

    pool.execute(|conn| -> Result<(), CoinError> {
        repository.upsert_identity_batch(conn, &new_coins)?;
        Ok(())
    })
    .expect("Failed to seed coins");
}
