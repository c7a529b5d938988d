//! Batch report download endpoint

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use chrono::Utc;

use escan_common::db::models::BatchStatus;

use crate::db::BatchRepository;
use crate::lifecycle::BatchError;
use crate::sheet::export::{render_batch_sheet, report_filename};
use crate::AppState;

/// GET /api/batch/:id/export
///
/// Only completed batches with at least one persisted item can be
/// exported; the render is a pure read-side transform.
pub async fn export_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
) -> Result<Response, BatchError> {
    let repo = BatchRepository::new(state.db.clone());
    let batch = repo
        .get_batch(batch_id)
        .await?
        .ok_or(BatchError::NotFound(batch_id))?;

    if batch.status != BatchStatus::Completed {
        return Err(BatchError::NotCompleted(batch_id));
    }

    let items = repo.get_items(batch_id).await?;
    if items.is_empty() {
        return Err(BatchError::NoItems(batch_id));
    }

    let bytes = render_batch_sheet(&batch, &items)?;
    let filename = report_filename(batch_id, Utc::now());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(bytes.into())
        .map_err(|e| BatchError::Corrupt(e.to_string()))
}
