//! Batch lifecycle and read-side endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use escan_common::db::models::{Batch, BatchItem, BatchStatus, BatchSummary, ItemVerdict};

use crate::db::BatchRepository;
use crate::lifecycle::{BatchError, BatchLifecycle};
use crate::verdict::RawItem;
use crate::AppState;

/// Start request body
#[derive(Debug, Deserialize)]
pub struct StartBatchRequest {
    /// Scanner slots active for this batch
    #[serde(alias = "scanner_used")]
    pub scanners_configured: Vec<i64>,

    #[serde(default)]
    pub batch_code: Option<String>,
}

/// Start response
#[derive(Debug, Serialize)]
pub struct StartBatchResponse {
    pub record_id: i64,
    pub scanners_configured: Vec<u8>,
}

/// POST /api/batch/start
pub async fn start_batch(
    State(state): State<AppState>,
    Json(req): Json<StartBatchRequest>,
) -> Result<(StatusCode, Json<StartBatchResponse>), BatchError> {
    let lifecycle = BatchLifecycle::new(BatchRepository::new(state.db.clone()));
    let (record_id, scanners_configured) = lifecycle
        .start(&req.scanners_configured, req.batch_code.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartBatchResponse {
            record_id,
            scanners_configured,
        }),
    ))
}

/// Finish response
#[derive(Debug, Serialize)]
pub struct FinishBatchResponse {
    pub status: String,
    pub total_items: usize,
    pub scanners_configured: Vec<u8>,
}

/// POST /api/batch/:id/finish
///
/// Body is the full item list for the batch; the batch closes atomically
/// with it.
pub async fn finish_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
    Json(items): Json<Vec<RawItem>>,
) -> Result<Json<FinishBatchResponse>, BatchError> {
    let lifecycle = BatchLifecycle::new(BatchRepository::new(state.db.clone()));
    let outcome = lifecycle.finish(batch_id, &items).await?;

    Ok(Json(FinishBatchResponse {
        status: "completed".to_string(),
        total_items: outcome.total_items,
        scanners_configured: outcome.scanners_configured,
    }))
}

/// Batch detail response: metadata, the full item list, and pass/fail
/// counts (Unknown verdicts count in neither).
#[derive(Debug, Serialize)]
pub struct BatchDetailResponse {
    #[serde(flatten)]
    pub batch: Batch,
    pub pass_count: i64,
    pub fail_count: i64,
    pub items: Vec<BatchItem>,
}

/// GET /api/batch/:id
pub async fn get_batch_detail(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
) -> Result<Json<BatchDetailResponse>, BatchError> {
    let repo = BatchRepository::new(state.db.clone());
    let batch = repo
        .get_batch(batch_id)
        .await?
        .ok_or(BatchError::NotFound(batch_id))?;
    let items = repo.get_items(batch_id).await?;

    let pass_count = items.iter().filter(|i| i.result == ItemVerdict::Pass).count() as i64;
    let fail_count = items.iter().filter(|i| i.result == ItemVerdict::Fail).count() as i64;

    Ok(Json(BatchDetailResponse {
        batch,
        pass_count,
        fail_count,
        items,
    }))
}

/// Listing query parameters
#[derive(Debug, Deserialize)]
pub struct ListBatchesQuery {
    pub status: Option<String>,
}

/// GET /api/batches
pub async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<ListBatchesQuery>,
) -> Result<Json<Vec<BatchSummary>>, BatchError> {
    let status_filter = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(
            BatchStatus::parse(raw)
                .ok_or_else(|| BatchError::InvalidFilter(format!("{} (expected Running or Completed)", raw)))?,
        ),
    };

    let repo = BatchRepository::new(state.db.clone());
    let summaries = repo.list_batches(status_filter).await?;
    Ok(Json(summaries))
}
