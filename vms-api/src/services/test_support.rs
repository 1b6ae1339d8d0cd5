//! Repository wrapper that counts calls, for service tests

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use vms_common::db::create_vouchers_table;
use vms_common::pagination::ListQuery;
use vms_common::{Error, NewVoucher, Result, SqliteVoucherRepository, Voucher, VoucherRepository};

#[derive(Default)]
pub struct CallCounts {
    pub find_paged: AtomicUsize,
    pub find_by_id: AtomicUsize,
    pub find_by_id_with_deleted: AtomicUsize,
    pub find_by_code: AtomicUsize,
    pub existing_codes_among: AtomicUsize,
    pub insert_one: AtomicUsize,
    pub insert_many: AtomicUsize,
    pub update_one: AtomicUsize,
    pub soft_delete_by_id: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Delegates to an in-memory SQLite repository and records every call
pub struct CountingRepository {
    inner: SqliteVoucherRepository,
    pub calls: CallCounts,
    /// Make `insert_many` fail with a database error
    pub fail_insert_many: AtomicBool,
}

impl CountingRepository {
    pub async fn new() -> Arc<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_vouchers_table(&pool).await.unwrap();

        Arc::new(Self {
            inner: SqliteVoucherRepository::new(pool),
            calls: CallCounts::default(),
            fail_insert_many: AtomicBool::new(false),
        })
    }

    /// Insert directly, bypassing the counters
    pub async fn seed(&self, code: &str) -> Voucher {
        self.inner
            .insert_one(&NewVoucher {
                voucher_code: code.to_string(),
                discount_percent: 10.0,
                expiry_date: chrono::NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
            })
            .await
            .unwrap()
    }

    pub async fn active_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM vouchers WHERE deleted_at IS NULL")
            .fetch_one(self.inner.pool())
            .await
            .unwrap()
    }
}

#[async_trait]
impl VoucherRepository for CountingRepository {
    async fn find_paged(&self, query: &ListQuery) -> Result<(Vec<Voucher>, i64)> {
        bump(&self.calls.find_paged);
        self.inner.find_paged(query).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Voucher>> {
        bump(&self.calls.find_by_id);
        self.inner.find_by_id(id).await
    }

    async fn find_by_id_with_deleted(&self, id: i64) -> Result<Option<Voucher>> {
        bump(&self.calls.find_by_id_with_deleted);
        self.inner.find_by_id_with_deleted(id).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        bump(&self.calls.find_by_code);
        self.inner.find_by_code(code).await
    }

    async fn existing_codes_among(&self, codes: &[String]) -> Result<Vec<String>> {
        bump(&self.calls.existing_codes_among);
        self.inner.existing_codes_among(codes).await
    }

    async fn insert_one(&self, voucher: &NewVoucher) -> Result<Voucher> {
        bump(&self.calls.insert_one);
        self.inner.insert_one(voucher).await
    }

    async fn insert_many(&self, vouchers: &[NewVoucher]) -> Result<u64> {
        bump(&self.calls.insert_many);
        if self.fail_insert_many.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }
        self.inner.insert_many(vouchers).await
    }

    async fn update_one(&self, voucher: &Voucher) -> Result<Voucher> {
        bump(&self.calls.update_one);
        self.inner.update_one(voucher).await
    }

    async fn soft_delete_by_id(&self, id: i64) -> Result<()> {
        bump(&self.calls.soft_delete_by_id);
        self.inner.soft_delete_by_id(id).await
    }
}
