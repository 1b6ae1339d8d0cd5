//! Database initialization
//!
//! Opens (creating if needed) the SQLite database and installs the voucher
//! schema. Every statement is idempotent, so running it against an existing
//! database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers alongside the single writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_vouchers_table(&pool).await?;

    Ok(pool)
}

/// Create the vouchers table and its indexes
///
/// Code uniqueness only applies to active rows: a soft-deleted voucher does
/// not block reuse of its code. `discount_percent` carries its own range
/// check as a storage-level backstop.
pub async fn create_vouchers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vouchers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            voucher_code TEXT NOT NULL CHECK (length(voucher_code) BETWEEN 1 AND 50),
            discount_percent REAL NOT NULL CHECK (discount_percent >= 1 AND discount_percent <= 100),
            expiry_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_vouchers_active_code
            ON vouchers (voucher_code)
            WHERE deleted_at IS NULL
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_vouchers_deleted_at ON vouchers (deleted_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_vouchers_created_at ON vouchers (created_at)")
        .execute(pool)
        .await?;

    Ok(())
}
