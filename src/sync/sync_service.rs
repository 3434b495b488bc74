use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::coins::{CoinRepositoryTrait, NewCoin};
use crate::db::{DbPool, DbTransactionExecutor};
use crate::providers::{RemoteCatalogProvider, RemoteCoin};

use super::sync_errors::{Result, SyncError};
use super::sync_model::{
    IdentitySyncSummary, ImageSyncReport, PageBuffer, PruneReport, SyncConfig,
};
use super::sync_traits::CatalogSyncServiceTrait;

/// Engine keeping the local catalog consistent with the remote provider.
///
/// Designed to run as a long background job: every remote page fetch is
/// retried with backoff, partially applied runs are safe to repeat because
/// all writes are idempotent upserts, and failures are reported with enough
/// position information to resume instead of restarting.
pub struct CatalogSyncService {
    provider: Arc<dyn RemoteCatalogProvider>,
    coin_repository: Arc<dyn CoinRepositoryTrait>,
    pool: Arc<DbPool>,
    config: SyncConfig,
}

impl CatalogSyncService {
    pub fn new(
        provider: Arc<dyn RemoteCatalogProvider>,
        coin_repository: Arc<dyn CoinRepositoryTrait>,
        pool: Arc<DbPool>,
        config: SyncConfig,
    ) -> Self {
        config.validate();
        Self {
            provider,
            coin_repository,
            pool,
            config,
        }
    }

    async fn fetch_identity_with_retry(&self) -> Result<Vec<RemoteCoin>> {
        let mut last_error = None;
        for attempt in 1..=self.config.max_fetch_attempts {
            match self.provider.fetch_identity_list().await {
                Ok(listing) => return Ok(listing),
                Err(e) => {
                    warn!(
                        "Identity listing fetch attempt {}/{} failed: {}",
                        attempt, self.config.max_fetch_attempts, e
                    );
                    if attempt < self.config.max_fetch_attempts {
                        tokio::time::sleep(self.config.retry_base_delay * attempt).await;
                    }
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| SyncError::Provider("identity listing unavailable".to_string())))
    }

    async fn fetch_image_page_with_retry(&self, page: i64) -> Result<Vec<RemoteCoin>> {
        let mut last_error = None;
        for attempt in 1..=self.config.max_fetch_attempts {
            match self
                .provider
                .fetch_image_page(page, self.config.image_page_size)
                .await
            {
                Ok(records) => return Ok(records),
                Err(e) => {
                    warn!(
                        "Image page {} fetch attempt {}/{} failed: {}",
                        page, attempt, self.config.max_fetch_attempts, e
                    );
                    if attempt < self.config.max_fetch_attempts {
                        tokio::time::sleep(self.config.retry_base_delay * attempt).await;
                    }
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            SyncError::Provider(format!("image page {} unavailable", page))
        }))
    }

    /// Persists the buffered pages inside one encompassing transaction,
    /// chunked into upsert batches. The pooled connections carry an extended
    /// busy timeout, so large flushes wait out interactive writers instead of
    /// failing fast.
    fn flush_buffer(&self, buffer: &PageBuffer) -> Result<usize> {
        let repository = self.coin_repository.clone();
        let batch_size = self.config.upsert_batch_size;
        let records = buffer.records();

        self.pool.execute(|conn| {
            let mut upserted = 0;
            for chunk in records.chunks(batch_size) {
                upserted += repository
                    .upsert_image_batch(conn, chunk)
                    .map_err(SyncError::from)?;
            }
            Ok::<usize, SyncError>(upserted)
        })
    }
}

#[async_trait]
impl CatalogSyncServiceTrait for CatalogSyncService {
    /// Pulls the full identity listing and upserts it in fixed-size batches.
    ///
    /// One failed batch aborts that batch only; the run continues and reports
    /// the failure count. Re-running is safe because upserts are idempotent.
    async fn sync_catalog_identity(&self) -> Result<IdentitySyncSummary> {
        let listing = self.fetch_identity_with_retry().await?;

        if listing.is_empty() {
            info!("Identity listing is empty, leaving catalog untouched");
            return Ok(IdentitySyncSummary::default());
        }

        let total_remote = listing.len();
        let new_coins: Vec<NewCoin> = listing.into_iter().map(NewCoin::from).collect();

        let mut upserted = 0;
        let mut failed_batches = 0;
        for (batch_index, batch) in new_coins.chunks(self.config.upsert_batch_size).enumerate() {
            let repository = self.coin_repository.clone();
            let result = self.pool.execute(|conn| {
                repository
                    .upsert_identity_batch(conn, batch)
                    .map_err(SyncError::from)
            });
            match result {
                Ok(count) => upserted += count,
                Err(e) => {
                    error!("Identity batch {} failed: {}", batch_index, e);
                    failed_batches += 1;
                }
            }
        }

        info!(
            "Identity sync done: {} remote, {} upserted, {} failed batches",
            total_remote, upserted, failed_batches
        );
        Ok(IdentitySyncSummary {
            total_remote,
            upserted,
            failed_batches,
        })
    }

    /// Walks the paginated image listing from `start_page`, accumulating
    /// pages in a buffer flushed every `flush_every_pages` pages or on the
    /// last page. A page that still fails after the retry budget is skipped;
    /// a failed flush keeps its pages buffered. Either way the report carries
    /// the earliest page to resume from.
    async fn sync_catalog_images(&self, start_page: i64) -> Result<ImageSyncReport> {
        let listing = self.fetch_identity_with_retry().await?;
        if listing.is_empty() {
            info!("Identity listing is empty, skipping image sync");
            return Ok(ImageSyncReport::default());
        }

        let page_size = self.config.image_page_size;
        let total_pages = (listing.len() as i64 + page_size - 1) / page_size;
        let start_page = start_page.max(1);

        let mut buffer = PageBuffer::new();
        let mut skipped_pages: Vec<i64> = Vec::new();
        let mut pages_flushed = 0;

        for page in start_page..=total_pages {
            match self.fetch_image_page_with_retry(page).await {
                Ok(records) => {
                    if records.is_empty() {
                        debug!("Image page {} returned no records", page);
                    } else {
                        buffer.push(page, records.into_iter().map(NewCoin::from).collect());
                    }
                }
                Err(e) => {
                    warn!(
                        "Skipping image page {} after {} attempts: {}",
                        page, self.config.max_fetch_attempts, e
                    );
                    skipped_pages.push(page);
                }
            }

            let is_last_page = page == total_pages;
            if buffer.should_flush(is_last_page, self.config.flush_every_pages) {
                let held = buffer.pages_held();
                match self.flush_buffer(&buffer) {
                    Ok(upserted) => {
                        debug!(
                            "Flushed {} pages ({} coins) up to page {}",
                            held, upserted, page
                        );
                        pages_flushed += held;
                        buffer.take();
                    }
                    Err(e) => {
                        // Keep the batch; it gets another chance at the next
                        // trigger, and first_page stays the resume cursor.
                        error!(
                            "Flush up to page {} failed, retaining {} buffered pages: {}",
                            page, held, e
                        );
                    }
                }
            }
        }

        let resume_page = skipped_pages
            .first()
            .copied()
            .into_iter()
            .chain(buffer.first_page())
            .min();

        if let Some(resume) = resume_page {
            warn!(
                "Image sync incomplete, resume from page {} of {}",
                resume, total_pages
            );
        } else {
            info!("Image sync done: {} of {} pages flushed", pages_flushed, total_pages);
        }

        Ok(ImageSyncReport {
            total_pages,
            pages_flushed,
            skipped_pages,
            resume_page,
        })
    }

    /// Deletes catalog entries that disappeared upstream, unless a holding
    /// still references them. Batch deletes fall back to per-item deletes so
    /// one bad row cannot block the rest of the batch.
    async fn prune_orphaned_catalog_entries(&self) -> Result<PruneReport> {
        let listing = self.fetch_identity_with_retry().await?;
        if listing.is_empty() {
            info!("Identity listing is empty, skipping orphan prune");
            return Ok(PruneReport::default());
        }

        let remote_ids: std::collections::HashSet<String> =
            listing.into_iter().map(|coin| coin.id).collect();
        let local_ids = self.coin_repository.list_ids()?;

        let missing: Vec<String> = local_ids
            .into_iter()
            .filter(|id| !remote_ids.contains(id))
            .collect();
        if missing.is_empty() {
            debug!("No orphaned catalog entries");
            return Ok(PruneReport::default());
        }

        let referenced = self.coin_repository.referenced_coin_ids(&missing)?;
        let (kept_referenced, deletable): (Vec<String>, Vec<String>) = missing
            .iter()
            .cloned()
            .partition(|id| referenced.contains(id));

        for coin_id in &kept_referenced {
            info!(
                "Keeping remote-absent coin '{}': still referenced by a holding",
                coin_id
            );
        }

        let mut deleted = 0;
        let mut failed_ids: Vec<String> = Vec::new();
        for batch in deletable.chunks(self.config.upsert_batch_size) {
            match self.coin_repository.delete_batch(batch) {
                Ok(count) => deleted += count,
                Err(e) => {
                    warn!(
                        "Batch delete of {} orphans failed ({}), falling back to per-item deletes",
                        batch.len(),
                        e
                    );
                    for coin_id in batch {
                        match self.coin_repository.delete(coin_id) {
                            Ok(()) => deleted += 1,
                            Err(e) => {
                                error!("Failed to delete orphaned coin '{}': {}", coin_id, e);
                                failed_ids.push(coin_id.clone());
                            }
                        }
                    }
                }
            }
        }

        info!(
            "Orphan prune done: {} missing upstream, {} kept, {} deleted, {} failed",
            missing.len(),
            kept_referenced.len(),
            deleted,
            failed_ids.len()
        );
        Ok(PruneReport {
            remote_missing: missing.len(),
            kept_referenced,
            deleted,
            failed_ids,
        })
    }
}
