//! Voucher persistence contract and its SQLite implementation
//!
//! Services only talk to [`VoucherRepository`]; `SqliteVoucherRepository` is
//! the production backend. Default queries see active vouchers only.
//!
//! **Note:** `update_one` is an upsert keyed by id. Calling it with an id
//! that has no row creates one, so callers must check existence first.

use crate::pagination::ListQuery;
use crate::voucher::{NewVoucher, Voucher, DATE_FORMAT};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

/// Rows per multi-row INSERT statement
const INSERT_CHUNK_SIZE: usize = 200;

/// Codes per `IN (...)` list
const LOOKUP_CHUNK_SIZE: usize = 500;

const SELECT_COLUMNS: &str =
    "SELECT id, voucher_code, discount_percent, expiry_date, created_at, updated_at, deleted_at FROM vouchers";

/// Storage operations the voucher services depend on
#[async_trait]
pub trait VoucherRepository: Send + Sync {
    /// One page of active vouchers plus the total number of matches
    async fn find_paged(&self, query: &ListQuery) -> Result<(Vec<Voucher>, i64)>;

    /// Active voucher by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Voucher>>;

    /// Voucher by id, soft-deleted or not
    async fn find_by_id_with_deleted(&self, id: i64) -> Result<Option<Voucher>>;

    /// Active voucher by exact (case-sensitive) code
    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>>;

    /// Which of `codes` are already used by active vouchers
    async fn existing_codes_among(&self, codes: &[String]) -> Result<Vec<String>>;

    async fn insert_one(&self, voucher: &NewVoucher) -> Result<Voucher>;

    /// Insert all vouchers or none of them
    async fn insert_many(&self, vouchers: &[NewVoucher]) -> Result<u64>;

    /// Write every field of `voucher` by id (upsert)
    async fn update_one(&self, voucher: &Voucher) -> Result<Voucher>;

    async fn soft_delete_by_id(&self, id: i64) -> Result<()>;
}

/// SQLite-backed voucher repository
#[derive(Clone)]
pub struct SqliteVoucherRepository {
    pool: SqlitePool,
}

impl SqliteVoucherRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Current time at the precision we store
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so text order matches time order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database '{}': {}", raw, e)))
}

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn voucher_from_row(row: &SqliteRow) -> Result<Voucher> {
    let expiry_raw: String = row.try_get("expiry_date")?;
    let expiry_date = NaiveDate::parse_from_str(&expiry_raw, DATE_FORMAT)
        .map_err(|e| Error::Internal(format!("Invalid expiry date in database '{}': {}", expiry_raw, e)))?;

    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let deleted_at: Option<String> = row.try_get("deleted_at")?;

    Ok(Voucher {
        id: row.try_get("id")?,
        voucher_code: row.try_get("voucher_code")?,
        discount_percent: row.try_get("discount_percent")?,
        expiry_date,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        deleted_at: deleted_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

/// Escape LIKE wildcards so the search text matches literally
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &ListQuery) {
    qb.push(" WHERE deleted_at IS NULL");
    if let Some(search) = &query.search {
        qb.push(" AND LOWER(voucher_code) LIKE LOWER(")
            .push_bind(like_pattern(search))
            .push(") ESCAPE '\\'");
    }
}

#[async_trait]
impl VoucherRepository for SqliteVoucherRepository {
    async fn find_paged(&self, query: &ListQuery) -> Result<(Vec<Voucher>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM vouchers");
        push_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        push_filters(&mut qb, query);
        let direction = query.order.keyword();
        qb.push(format!(
            " ORDER BY {} {}, id {}",
            query.sort.column(),
            direction,
            direction
        ));
        qb.push(" LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rows = qb.build().fetch_all(&self.pool).await?;
        let vouchers = rows
            .iter()
            .map(voucher_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok((vouchers, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Voucher>> {
        let row = sqlx::query(&format!("{} WHERE id = ? AND deleted_at IS NULL", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(voucher_from_row).transpose()
    }

    async fn find_by_id_with_deleted(&self, id: i64) -> Result<Option<Voucher>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(voucher_from_row).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        let row = sqlx::query(&format!(
            "{} WHERE voucher_code = ? AND deleted_at IS NULL LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(voucher_from_row).transpose()
    }

    async fn existing_codes_among(&self, codes: &[String]) -> Result<Vec<String>> {
        let mut existing = Vec::new();

        for chunk in codes.chunks(LOOKUP_CHUNK_SIZE) {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "SELECT voucher_code FROM vouchers WHERE deleted_at IS NULL AND voucher_code IN (",
            );
            let mut separated = qb.separated(", ");
            for code in chunk {
                separated.push_bind(code.clone());
            }
            separated.push_unseparated(")");

            let found: Vec<String> = qb.build_query_scalar().fetch_all(&self.pool).await?;
            existing.extend(found);
        }

        Ok(existing)
    }

    async fn insert_one(&self, voucher: &NewVoucher) -> Result<Voucher> {
        let ts = now();
        let result = sqlx::query(
            r#"
            INSERT INTO vouchers (voucher_code, discount_percent, expiry_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&voucher.voucher_code)
        .bind(voucher.discount_percent)
        .bind(format_date(&voucher.expiry_date))
        .bind(format_timestamp(&ts))
        .bind(format_timestamp(&ts))
        .execute(&self.pool)
        .await?;

        Ok(Voucher {
            id: result.last_insert_rowid(),
            voucher_code: voucher.voucher_code.clone(),
            discount_percent: voucher.discount_percent,
            expiry_date: voucher.expiry_date,
            created_at: ts,
            updated_at: ts,
            deleted_at: None,
        })
    }

    async fn insert_many(&self, vouchers: &[NewVoucher]) -> Result<u64> {
        if vouchers.is_empty() {
            return Ok(0);
        }

        let ts = format_timestamp(&now());
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for chunk in vouchers.chunks(INSERT_CHUNK_SIZE) {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "INSERT INTO vouchers (voucher_code, discount_percent, expiry_date, created_at, updated_at) ",
            );
            qb.push_values(chunk, |mut row, voucher| {
                row.push_bind(voucher.voucher_code.clone())
                    .push_bind(voucher.discount_percent)
                    .push_bind(format_date(&voucher.expiry_date))
                    .push_bind(ts.clone())
                    .push_bind(ts.clone());
            });

            inserted += qb.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn update_one(&self, voucher: &Voucher) -> Result<Voucher> {
        let updated_at = now();
        sqlx::query(
            r#"
            INSERT INTO vouchers (id, voucher_code, discount_percent, expiry_date, created_at, updated_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                voucher_code = excluded.voucher_code,
                discount_percent = excluded.discount_percent,
                expiry_date = excluded.expiry_date,
                updated_at = excluded.updated_at,
                deleted_at = excluded.deleted_at
            "#,
        )
        .bind(voucher.id)
        .bind(&voucher.voucher_code)
        .bind(voucher.discount_percent)
        .bind(format_date(&voucher.expiry_date))
        .bind(format_timestamp(&voucher.created_at))
        .bind(format_timestamp(&updated_at))
        .bind(voucher.deleted_at.as_ref().map(format_timestamp))
        .execute(&self.pool)
        .await?;

        Ok(Voucher {
            updated_at,
            ..voucher.clone()
        })
    }

    async fn soft_delete_by_id(&self, id: i64) -> Result<()> {
        let ts = format_timestamp(&now());
        let result = sqlx::query(
            "UPDATE vouchers SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&ts)
        .bind(&ts)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("voucher {}", id)));
        }
        Ok(())
    }
}
