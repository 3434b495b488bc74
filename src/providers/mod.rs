pub(crate) mod catalog_provider;
pub(crate) mod coingecko_provider;
pub mod models;

// Re-export the public interface
pub use catalog_provider::RemoteCatalogProvider;
pub use coingecko_provider::CoinGeckoProvider;
pub use models::RemoteCoin;
