use async_trait::async_trait;

use super::sync_errors::Result;
use super::sync_model::{IdentitySyncSummary, ImageSyncReport, PruneReport};

/// Trait defining the contract for catalog synchronization operations.
#[async_trait]
pub trait CatalogSyncServiceTrait: Send + Sync {
    async fn sync_catalog_identity(&self) -> Result<IdentitySyncSummary>;
    async fn sync_catalog_images(&self, start_page: i64) -> Result<ImageSyncReport>;
    async fn prune_orphaned_catalog_entries(&self) -> Result<PruneReport>;
}
