//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently. Every pooled connection carries foreign-key enforcement,
//! WAL journaling, and a busy timeout; the busy timeout is what lets two
//! finalize transactions on the same batch serialize instead of erroring.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize the database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_batches_table(&pool).await?;
    create_batch_items_table(&pool).await?;

    Ok(pool)
}

/// One row per scanning batch.
///
/// `end_time` and `total_items` stay NULL until the finalize transaction
/// flips `status` to 'Completed'; both are written together with it.
async fn create_batches_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS batches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_code TEXT UNIQUE,
            scanners_configured TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Running',
            start_time TEXT NOT NULL,
            end_time TEXT,
            total_items INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// One row per scanned item, owned by its batch.
///
/// Rows are only ever written by the finalize transaction; `id` preserves
/// submission order for reads and export.
async fn create_batch_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS batch_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL,
            record_id INTEGER NOT NULL,

            scanner_1 TEXT,
            scanner_1_valid INTEGER,

            scanner_2 TEXT,
            scanner_2_valid INTEGER,

            scanner_3 TEXT,
            scanner_3_valid INTEGER,

            result TEXT NOT NULL DEFAULT 'Unknown',
            fallback INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,

            UNIQUE (record_id, item_id),
            FOREIGN KEY (record_id) REFERENCES batches(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_batch_items_record_id ON batch_items(record_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
