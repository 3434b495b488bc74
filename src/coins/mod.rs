pub(crate) mod coins_errors;
pub(crate) mod coins_model;
pub(crate) mod coins_repository;
pub(crate) mod coins_traits;

// Re-export the public interface
pub use coins_model::{Coin, CoinDB, NewCoin};
pub use coins_repository::CoinRepository;
pub use coins_traits::CoinRepositoryTrait;

// Re-export error types for convenience
pub use coins_errors::{CoinError, Result};
