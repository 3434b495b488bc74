use serde::Serialize;
use std::time::Duration;

use crate::coins::NewCoin;

/// Tuning knobs for the catalog sync engine.
///
/// Injected through the constructor so tests can shrink batches and pages;
/// `Default` carries the production values.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Rows per catalog upsert batch
    pub upsert_batch_size: usize,
    /// Page size of the remote image endpoint
    pub image_page_size: i64,
    /// Fetch attempts per page before it is skipped
    pub max_fetch_attempts: u32,
    /// Base delay for the linear backoff (attempt * delay)
    pub retry_base_delay: Duration,
    /// Pages accumulated before a flush
    pub flush_every_pages: i64,
}

impl SyncConfig {
    /// Every knob is a divisor or loop bound in the engine; zero values are
    /// construction bugs, caught in debug builds.
    pub fn validate(&self) {
        debug_assert!(self.upsert_batch_size > 0, "upsert_batch_size must be positive");
        debug_assert!(self.image_page_size > 0, "image_page_size must be positive");
        debug_assert!(self.max_fetch_attempts > 0, "max_fetch_attempts must be positive");
        debug_assert!(self.flush_every_pages > 0, "flush_every_pages must be positive");
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upsert_batch_size: 50,
            image_page_size: 250,
            max_fetch_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            flush_every_pages: 10,
        }
    }
}

/// Outcome of one identity sync run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySyncSummary {
    pub total_remote: usize,
    pub upserted: usize,
    pub failed_batches: usize,
}

/// Outcome of one image sync run.
///
/// `resume_page` is the earliest page whose data did not make it to storage;
/// passing it back as `start_page` continues the run without losing work.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSyncReport {
    pub total_pages: i64,
    pub pages_flushed: i64,
    pub skipped_pages: Vec<i64>,
    pub resume_page: Option<i64>,
}

/// Outcome of one orphan prune run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub remote_missing: usize,
    pub kept_referenced: Vec<String>,
    pub deleted: usize,
    pub failed_ids: Vec<String>,
}

/// Bounded accumulator for fetched image pages.
///
/// Whether a flush happens is a pure function of the buffer state and the
/// position in the page walk; on a failed flush the caller simply does not
/// call `take`, so the records stay queued for the next trigger.
#[derive(Debug, Default)]
pub struct PageBuffer {
    records: Vec<NewCoin>,
    first_page: Option<i64>,
    pages_held: i64,
}

impl PageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, page: i64, mut page_records: Vec<NewCoin>) {
        if self.first_page.is_none() {
            self.first_page = Some(page);
        }
        self.pages_held += 1;
        self.records.append(&mut page_records);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pages_held(&self) -> i64 {
        self.pages_held
    }

    /// Earliest page still held, i.e. the resume cursor if a flush fails.
    pub fn first_page(&self) -> Option<i64> {
        self.first_page
    }

    pub fn records(&self) -> &[NewCoin] {
        &self.records
    }

    pub fn should_flush(&self, is_last_page: bool, flush_every_pages: i64) -> bool {
        !self.is_empty() && (is_last_page || self.pages_held >= flush_every_pages)
    }

    /// Drains the buffer after a successful flush.
    pub fn take(&mut self) -> Vec<NewCoin> {
        self.first_page = None;
        self.pages_held = 0;
        std::mem::take(&mut self.records)
    }
}
