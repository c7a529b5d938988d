//! Batch repository over SQLite
//!
//! All reads and writes for the `batches` and `batch_items` tables go
//! through here. Finalize is the only item-writing path and runs as one
//! transaction: the status claim and the item inserts commit together or
//! not at all.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use escan_common::db::models::{
    decode_scanners, encode_scanners, Batch, BatchItem, BatchStatus, BatchSummary, ItemVerdict,
};

use crate::lifecycle::BatchError;
use crate::verdict::NormalizedItem;

/// Repository handle; cheap to clone, owns nothing beyond the pool.
#[derive(Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new Running batch and return its id.
    pub async fn insert_batch(
        &self,
        scanners_configured: &[u8],
        batch_code: Option<&str>,
        start_time: DateTime<Utc>,
    ) -> Result<i64, BatchError> {
        let scanners_json = encode_scanners(scanners_configured);

        let result = sqlx::query(
            r#"
            INSERT INTO batches (batch_code, scanners_configured, status, start_time, created_at)
            VALUES (?, ?, 'Running', ?, ?)
            "#,
        )
        .bind(batch_code)
        .bind(&scanners_json)
        .bind(start_time)
        .bind(start_time)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(BatchError::DuplicateBatchCode(
                batch_code.unwrap_or_default().to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch one batch by id.
    pub async fn get_batch(&self, batch_id: i64) -> Result<Option<Batch>, BatchError> {
        let row = sqlx::query(
            r#"
            SELECT id, batch_code, scanners_configured, status,
                   start_time, end_time, total_items, created_at
            FROM batches
            WHERE id = ?
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_batch(&row)).transpose()
    }

    /// Fetch a batch's items in the order they were submitted to finish.
    pub async fn get_items(&self, batch_id: i64) -> Result<Vec<BatchItem>, BatchError> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, record_id,
                   scanner_1, scanner_1_valid,
                   scanner_2, scanner_2_valid,
                   scanner_3, scanner_3_valid,
                   result, fallback, created_at
            FROM batch_items
            WHERE record_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_item).collect()
    }

    /// Atomically persist a batch's item set and close the batch.
    ///
    /// The UPDATE claims the batch only while it is still Running; zero
    /// affected rows means another finalize already won, and dropping the
    /// transaction rolls everything back. Item inserts happen inside the
    /// same transaction, so readers either see the Completed batch with
    /// its full item set or the untouched Running batch.
    pub async fn finalize_batch(
        &self,
        batch_id: i64,
        items: &[NormalizedItem],
        end_time: DateTime<Utc>,
    ) -> Result<(), BatchError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            r#"
            UPDATE batches
            SET status = 'Completed', end_time = ?, total_items = ?
            WHERE id = ? AND status = 'Running'
            "#,
        )
        .bind(end_time)
        .bind(items.len() as i64)
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(BatchError::AlreadyFinished(batch_id));
        }

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO batch_items (
                    item_id, record_id,
                    scanner_1, scanner_1_valid,
                    scanner_2, scanner_2_valid,
                    scanner_3, scanner_3_valid,
                    result, fallback, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(item.item_id)
            .bind(batch_id)
            .bind(item.reading(1).value())
            .bind(item.reading(1).validity_flag())
            .bind(item.reading(2).value())
            .bind(item.reading(2).validity_flag())
            .bind(item.reading(3).value())
            .bind(item.reading(3).validity_flag())
            .bind(item.result.as_str())
            .bind(item.fallback)
            .bind(end_time)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// List batches, newest first, with read-time pass/fail aggregation.
    ///
    /// Items with an Unknown result count in neither column. A batch row
    /// that fails to decode is logged and skipped rather than failing the
    /// whole listing; the stored row is untouched.
    pub async fn list_batches(
        &self,
        status_filter: Option<BatchStatus>,
    ) -> Result<Vec<BatchSummary>, BatchError> {
        let base = r#"
            SELECT b.id, b.batch_code, b.scanners_configured, b.status,
                   b.start_time, b.end_time, b.total_items,
                   COALESCE(SUM(CASE WHEN i.result = 'Pass' THEN 1 ELSE 0 END), 0) AS pass_count,
                   COALESCE(SUM(CASE WHEN i.result = 'Fail' THEN 1 ELSE 0 END), 0) AS fail_count
            FROM batches b
            LEFT JOIN batch_items i ON i.record_id = b.id
        "#;

        let rows = match status_filter {
            Some(status) => {
                let sql = format!("{} WHERE b.status = ? GROUP BY b.id ORDER BY b.id DESC", base);
                sqlx::query(&sql)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{} GROUP BY b.id ORDER BY b.id DESC", base);
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            match decode_summary(row) {
                Ok(summary) => summaries.push(summary),
                Err(e) => warn!("Skipping undecodable batch row in listing: {}", e),
            }
        }
        Ok(summaries)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

fn decode_batch(row: &SqliteRow) -> Result<Batch, BatchError> {
    let scanners_raw: String = row.try_get("scanners_configured")?;
    let status_raw: String = row.try_get("status")?;

    Ok(Batch {
        id: row.try_get("id")?,
        batch_code: row.try_get("batch_code")?,
        scanners_configured: decode_scanners(&scanners_raw)
            .map_err(|e| BatchError::Corrupt(format!("scanners_configured: {}", e)))?,
        status: BatchStatus::parse(&status_raw)
            .ok_or_else(|| BatchError::Corrupt(format!("unknown batch status {:?}", status_raw)))?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        total_items: row.try_get("total_items")?,
        created_at: row.try_get("created_at")?,
    })
}

fn decode_summary(row: &SqliteRow) -> Result<BatchSummary, BatchError> {
    let scanners_raw: String = row.try_get("scanners_configured")?;
    let status_raw: String = row.try_get("status")?;

    Ok(BatchSummary {
        id: row.try_get("id")?,
        batch_code: row.try_get("batch_code")?,
        scanners_configured: decode_scanners(&scanners_raw)
            .map_err(|e| BatchError::Corrupt(format!("scanners_configured: {}", e)))?,
        status: BatchStatus::parse(&status_raw)
            .ok_or_else(|| BatchError::Corrupt(format!("unknown batch status {:?}", status_raw)))?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        total_items: row.try_get("total_items")?,
        pass_count: row.try_get("pass_count")?,
        fail_count: row.try_get("fail_count")?,
    })
}

fn decode_item(row: &SqliteRow) -> Result<BatchItem, BatchError> {
    let result_raw: String = row.try_get("result")?;

    Ok(BatchItem {
        item_id: row.try_get("item_id")?,
        record_id: row.try_get("record_id")?,
        scanner_1: row.try_get("scanner_1")?,
        scanner_1_valid: row.try_get("scanner_1_valid")?,
        scanner_2: row.try_get("scanner_2")?,
        scanner_2_valid: row.try_get("scanner_2_valid")?,
        scanner_3: row.try_get("scanner_3")?,
        scanner_3_valid: row.try_get("scanner_3_valid")?,
        result: ItemVerdict::parse(&result_raw)
            .ok_or_else(|| BatchError::Corrupt(format!("unknown item result {:?}", result_raw)))?,
        fallback: row.try_get("fallback")?,
        created_at: row.try_get("created_at")?,
    })
}
