use async_trait::async_trait;

use crate::sync::SyncError;

use super::models::RemoteCoin;

/// Contract for the remote market-data catalog.
///
/// Both calls may legitimately return an empty list ("no data yet"); callers
/// must never treat that as a request to delete local data.
#[async_trait]
pub trait RemoteCatalogProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetches the full identity listing (id, symbol, name) in one call.
    async fn fetch_identity_list(&self) -> Result<Vec<RemoteCoin>, SyncError>;

    /// Fetches one page of the image-bearing listing.
    async fn fetch_image_page(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<RemoteCoin>, SyncError>;
}
