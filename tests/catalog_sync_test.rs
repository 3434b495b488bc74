mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use diesel::sqlite::SqliteConnection;
use rust_decimal_macros::dec;

use coinfolio_core::coins::{Coin, CoinError, CoinRepository, CoinRepositoryTrait, NewCoin};
use coinfolio_core::db::DbPool;
use coinfolio_core::holdings::{
    HoldingService, HoldingServiceTrait, LedgerRepository, NewTransaction, Wallet,
};
use coinfolio_core::providers::{RemoteCatalogProvider, RemoteCoin};
use coinfolio_core::sync::{CatalogSyncService, CatalogSyncServiceTrait, SyncConfig, SyncError};

fn remote(id: &str) -> RemoteCoin {
    RemoteCoin {
        id: id.to_string(),
        symbol: id.to_uppercase(),
        name: format!("{} coin", id),
        image: None,
    }
}

/// In-memory provider with per-page failure injection.
struct MockProvider {
    identity: Vec<RemoteCoin>,
    /// Pages whose fetch always fails
    failing_pages: HashSet<i64>,
    /// Identity fetches that fail before the first success
    identity_failures: AtomicU32,
}

impl MockProvider {
    fn new(ids: &[&str]) -> Self {
        Self {
            identity: ids.iter().map(|id| remote(id)).collect(),
            failing_pages: HashSet::new(),
            identity_failures: AtomicU32::new(0),
        }
    }

    fn with_failing_page(mut self, page: i64) -> Self {
        self.failing_pages.insert(page);
        self
    }

    fn with_identity_failures(self, count: u32) -> Self {
        self.identity_failures.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl RemoteCatalogProvider for MockProvider {
    fn name(&self) -> &'static str {
        "MOCK"
    }

    async fn fetch_identity_list(&self) -> Result<Vec<RemoteCoin>, SyncError> {
        let remaining = self.identity_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.identity_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SyncError::Provider("identity endpoint down".to_string()));
        }
        Ok(self.identity.clone())
    }

    async fn fetch_image_page(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<RemoteCoin>, SyncError> {
        if self.failing_pages.contains(&page) {
            return Err(SyncError::Provider(format!("page {} unavailable", page)));
        }

        let start = ((page - 1) * per_page) as usize;
        let records = self
            .identity
            .iter()
            .skip(start)
            .take(per_page as usize)
            .map(|coin| RemoteCoin {
                image: Some(format!("https://img.test/{}.png", coin.id)),
                ..coin.clone()
            })
            .collect();
        Ok(records)
    }
}

/// Wraps the real repository and fails selected writes on demand.
struct FaultyRepository {
    inner: CoinRepository,
    fail_image_upserts: AtomicBool,
    fail_batch_deletes: AtomicBool,
    undeletable: Mutex<Option<String>>,
}

impl FaultyRepository {
    fn new(pool: &Arc<DbPool>) -> Self {
        Self {
            inner: CoinRepository::new(pool.clone()),
            fail_image_upserts: AtomicBool::new(false),
            fail_batch_deletes: AtomicBool::new(false),
            undeletable: Mutex::new(None),
        }
    }

    fn break_image_upserts(&self, broken: bool) {
        self.fail_image_upserts.store(broken, Ordering::SeqCst);
    }

    fn break_batch_deletes(&self, broken: bool) {
        self.fail_batch_deletes.store(broken, Ordering::SeqCst);
    }

    fn break_delete_of(&self, coin_id: &str) {
        *self.undeletable.lock().unwrap() = Some(coin_id.to_string());
    }
}

impl CoinRepositoryTrait for FaultyRepository {
    fn upsert_identity_batch(
        &self,
        conn: &mut SqliteConnection,
        new_coins: &[NewCoin],
    ) -> Result<usize, CoinError> {
        self.inner.upsert_identity_batch(conn, new_coins)
    }

    fn upsert_image_batch(
        &self,
        conn: &mut SqliteConnection,
        new_coins: &[NewCoin],
    ) -> Result<usize, CoinError> {
        if self.fail_image_upserts.load(Ordering::SeqCst) {
            return Err(CoinError::DatabaseError("disk I/O error".to_string()));
        }
        self.inner.upsert_image_batch(conn, new_coins)
    }

    fn get_by_id(&self, coin_id: &str) -> Result<Coin, CoinError> {
        self.inner.get_by_id(coin_id)
    }

    fn list(&self) -> Result<Vec<Coin>, CoinError> {
        self.inner.list()
    }

    fn list_ids(&self) -> Result<Vec<String>, CoinError> {
        self.inner.list_ids()
    }

    fn search(&self, query: &str) -> Result<Vec<Coin>, CoinError> {
        self.inner.search(query)
    }

    fn count(&self) -> Result<i64, CoinError> {
        self.inner.count()
    }

    fn delete_batch(&self, coin_ids: &[String]) -> Result<usize, CoinError> {
        if self.fail_batch_deletes.load(Ordering::SeqCst) {
            return Err(CoinError::DatabaseError("disk I/O error".to_string()));
        }
        self.inner.delete_batch(coin_ids)
    }

    fn delete(&self, coin_id: &str) -> Result<(), CoinError> {
        if self.undeletable.lock().unwrap().as_deref() == Some(coin_id) {
            return Err(CoinError::DatabaseError("disk I/O error".to_string()));
        }
        self.inner.delete(coin_id)
    }

    fn referenced_coin_ids(&self, candidate_ids: &[String]) -> Result<HashSet<String>, CoinError> {
        self.inner.referenced_coin_ids(candidate_ids)
    }
}

fn test_config() -> SyncConfig {
    SyncConfig {
        upsert_batch_size: 2,
        image_page_size: 2,
        max_fetch_attempts: 2,
        retry_base_delay: Duration::from_millis(1),
        flush_every_pages: 2,
    }
}

fn sync_service(provider: MockProvider, pool: &Arc<DbPool>) -> CatalogSyncService {
    CatalogSyncService::new(
        Arc::new(provider),
        Arc::new(CoinRepository::new(pool.clone())),
        pool.clone(),
        test_config(),
    )
}

fn faulty_sync_service(
    provider: MockProvider,
    pool: &Arc<DbPool>,
) -> (CatalogSyncService, Arc<FaultyRepository>) {
    let repository = Arc::new(FaultyRepository::new(pool));
    let service = CatalogSyncService::new(
        Arc::new(provider),
        repository.clone(),
        pool.clone(),
        test_config(),
    );
    (service, repository)
}

#[tokio::test]
async fn identity_sync_upserts_and_is_idempotent() {
    let (_dir, pool) = common::setup_test_db();
    let repository = CoinRepository::new(pool.clone());

    let service = sync_service(MockProvider::new(&["btc", "eth", "sol", "ada", "dot"]), &pool);

    let first = service.sync_catalog_identity().await.unwrap();
    assert_eq!(first.total_remote, 5);
    assert_eq!(first.upserted, 5);
    assert_eq!(first.failed_batches, 0);
    assert_eq!(repository.count().unwrap(), 5);

    let second = service.sync_catalog_identity().await.unwrap();
    assert_eq!(second.upserted, 5);
    assert_eq!(repository.count().unwrap(), 5);
}

#[tokio::test]
async fn identity_sync_empty_upstream_leaves_catalog_untouched() {
    let (_dir, pool) = common::setup_test_db();
    common::seed_coins(&pool, &["btc", "eth"]);
    let repository = CoinRepository::new(pool.clone());

    let service = sync_service(MockProvider::new(&[]), &pool);
    let summary = service.sync_catalog_identity().await.unwrap();

    assert_eq!(summary.total_remote, 0);
    assert_eq!(summary.upserted, 0);
    assert_eq!(repository.count().unwrap(), 2);
}

#[tokio::test]
async fn transient_identity_failure_is_retried() {
    let (_dir, pool) = common::setup_test_db();
    let repository = CoinRepository::new(pool.clone());

    let provider = MockProvider::new(&["btc"]).with_identity_failures(1);
    let service = sync_service(provider, &pool);

    let summary = service.sync_catalog_identity().await.unwrap();
    assert_eq!(summary.upserted, 1);
    assert_eq!(repository.count().unwrap(), 1);
}

#[tokio::test]
async fn image_sync_fills_images_without_touching_identity() {
    let (_dir, pool) = common::setup_test_db();
    let repository = CoinRepository::new(pool.clone());

    let service = sync_service(MockProvider::new(&["btc", "eth", "sol", "ada", "dot"]), &pool);
    service.sync_catalog_identity().await.unwrap();

    let report = service.sync_catalog_images(1).await.unwrap();
    assert_eq!(report.total_pages, 3);
    assert_eq!(report.pages_flushed, 3);
    assert!(report.skipped_pages.is_empty());
    assert_eq!(report.resume_page, None);

    let coin = repository.get_by_id("sol").unwrap();
    assert_eq!(coin.image.as_deref(), Some("https://img.test/sol.png"));
    assert_eq!(coin.symbol, "SOL");
    assert_eq!(coin.name, "sol coin");
}

#[tokio::test]
async fn image_sync_skips_failing_page_and_reports_resume_cursor() {
    let (_dir, pool) = common::setup_test_db();
    let repository = CoinRepository::new(pool.clone());

    let provider =
        MockProvider::new(&["btc", "eth", "sol", "ada", "dot"]).with_failing_page(2);
    let service = sync_service(provider, &pool);
    service.sync_catalog_identity().await.unwrap();

    let report = service.sync_catalog_images(1).await.unwrap();
    assert_eq!(report.total_pages, 3);
    assert_eq!(report.pages_flushed, 2);
    assert_eq!(report.skipped_pages, vec![2]);
    assert_eq!(report.resume_page, Some(2));

    // Pages 1 and 3 made it, the skipped page did not
    assert!(repository.get_by_id("btc").unwrap().image.is_some());
    assert!(repository.get_by_id("dot").unwrap().image.is_some());
    assert!(repository.get_by_id("sol").unwrap().image.is_none());
}

#[tokio::test]
async fn image_sync_resumes_from_given_page() {
    let (_dir, pool) = common::setup_test_db();
    let repository = CoinRepository::new(pool.clone());

    let service = sync_service(MockProvider::new(&["btc", "eth", "sol", "ada", "dot"]), &pool);
    service.sync_catalog_identity().await.unwrap();

    let report = service.sync_catalog_images(3).await.unwrap();
    assert_eq!(report.pages_flushed, 1);
    assert_eq!(report.resume_page, None);

    // Only the last page got images
    assert!(repository.get_by_id("btc").unwrap().image.is_none());
    assert!(repository.get_by_id("dot").unwrap().image.is_some());
}

#[tokio::test]
async fn failed_flush_retains_buffer_and_reports_resume_point() {
    let (_dir, pool) = common::setup_test_db();
    let repository = CoinRepository::new(pool.clone());

    let (service, faulty) = faulty_sync_service(
        MockProvider::new(&["btc", "eth", "sol", "ada", "dot"]),
        &pool,
    );
    service.sync_catalog_identity().await.unwrap();

    faulty.break_image_upserts(true);
    let report = service.sync_catalog_images(1).await.unwrap();

    // Every flush failed: nothing durable, earliest buffered page reported
    assert_eq!(report.total_pages, 3);
    assert_eq!(report.pages_flushed, 0);
    assert!(report.skipped_pages.is_empty());
    assert_eq!(report.resume_page, Some(1));
    assert!(repository.get_by_id("btc").unwrap().image.is_none());

    // Resuming from the reported cursor after the fault clears loses nothing
    faulty.break_image_upserts(false);
    let resumed = service
        .sync_catalog_images(report.resume_page.unwrap())
        .await
        .unwrap();
    assert_eq!(resumed.pages_flushed, 3);
    assert_eq!(resumed.resume_page, None);
    assert!(repository.get_by_id("btc").unwrap().image.is_some());
    assert!(repository.get_by_id("dot").unwrap().image.is_some());
}

#[tokio::test]
async fn prune_deletes_orphans_but_keeps_referenced_coins() {
    let (_dir, pool) = common::setup_test_db();
    common::seed_coins(&pool, &["btc", "eth", "sol"]);
    let repository = CoinRepository::new(pool.clone());

    // A holding still references eth
    let holdings = HoldingService::new(
        pool.clone(),
        Arc::new(LedgerRepository::new(pool.clone())),
        Arc::new(CoinRepository::new(pool.clone())),
    );
    holdings
        .record_trade(NewTransaction {
            user_id: "u1".to_string(),
            coin_id: "eth".to_string(),
            quantity: dec!(2),
            price: dec!(1800),
            tx_date: None,
            wallet: Wallet::Exchange,
        })
        .unwrap();

    // Upstream now only knows btc
    let service = sync_service(MockProvider::new(&["btc"]), &pool);
    let report = service.prune_orphaned_catalog_entries().await.unwrap();

    assert_eq!(report.remote_missing, 2);
    assert_eq!(report.kept_referenced, vec!["eth".to_string()]);
    assert_eq!(report.deleted, 1);
    assert!(report.failed_ids.is_empty());

    assert!(repository.get_by_id("btc").is_ok());
    assert!(repository.get_by_id("eth").is_ok());
    assert!(matches!(
        repository.get_by_id("sol"),
        Err(CoinError::NotFound(_))
    ));
}

#[tokio::test]
async fn prune_falls_back_to_per_item_deletes_when_a_batch_fails() {
    let (_dir, pool) = common::setup_test_db();
    common::seed_coins(&pool, &["btc", "eth", "sol", "ada"]);
    let repository = CoinRepository::new(pool.clone());

    // Upstream only knows btc; batch deletes are down and sol refuses to die
    let (service, faulty) = faulty_sync_service(MockProvider::new(&["btc"]), &pool);
    faulty.break_batch_deletes(true);
    faulty.break_delete_of("sol");

    let report = service.prune_orphaned_catalog_entries().await.unwrap();

    assert_eq!(report.remote_missing, 3);
    assert!(report.kept_referenced.is_empty());
    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed_ids, vec!["sol".to_string()]);

    assert!(repository.get_by_id("btc").is_ok());
    assert!(repository.get_by_id("sol").is_ok());
    assert!(matches!(
        repository.get_by_id("eth"),
        Err(CoinError::NotFound(_))
    ));
    assert!(matches!(
        repository.get_by_id("ada"),
        Err(CoinError::NotFound(_))
    ));
}

#[tokio::test]
async fn prune_with_empty_upstream_is_a_no_op() {
    let (_dir, pool) = common::setup_test_db();
    common::seed_coins(&pool, &["btc", "eth"]);
    let repository = CoinRepository::new(pool.clone());

    let service = sync_service(MockProvider::new(&[]), &pool);
    let report = service.prune_orphaned_catalog_entries().await.unwrap();

    assert_eq!(report.remote_missing, 0);
    assert_eq!(report.deleted, 0);
    assert_eq!(repository.count().unwrap(), 2);
}
