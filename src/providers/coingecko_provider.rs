use async_trait::async_trait;
use log::warn;
use reqwest::Client;

use crate::sync::SyncError;

use super::catalog_provider::RemoteCatalogProvider;
use super::models::RemoteCoin;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Points the provider at a different host, used against API proxies.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn fetch_coin_array(&self, url: &str) -> Result<Vec<RemoteCoin>, SyncError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Provider(format!(
                "request to {} failed with status {}",
                url, status
            )));
        }

        let payload: serde_json::Value = response.json().await?;

        // The API occasionally returns an error object instead of an array.
        // Treat anything that is not a coin array as "no data yet".
        match serde_json::from_value::<Vec<RemoteCoin>>(payload) {
            Ok(coin_list) => Ok(coin_list),
            Err(e) => {
                warn!("Unexpected catalog payload from {}: {}", url, e);
                Ok(Vec::new())
            }
        }
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteCatalogProvider for CoinGeckoProvider {
    fn name(&self) -> &'static str {
        "COINGECKO"
    }

    async fn fetch_identity_list(&self) -> Result<Vec<RemoteCoin>, SyncError> {
        let url = format!("{}/coins/list", self.base_url);
        self.fetch_coin_array(&url).await
    }

    async fn fetch_image_page(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<RemoteCoin>, SyncError> {
        let url = format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page={}&sparkline=false",
            self.base_url, per_page, page
        );
        self.fetch_coin_array(&url).await
    }
}
