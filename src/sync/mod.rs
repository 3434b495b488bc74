pub(crate) mod sync_errors;
pub(crate) mod sync_model;
pub(crate) mod sync_service;
pub(crate) mod sync_traits;

// Re-export the public interface
pub use sync_model::{
    IdentitySyncSummary, ImageSyncReport, PageBuffer, PruneReport, SyncConfig,
};
pub use sync_service::CatalogSyncService;
pub use sync_traits::CatalogSyncServiceTrait;

// Re-export error types for convenience
pub use sync_errors::{Result, SyncError};
