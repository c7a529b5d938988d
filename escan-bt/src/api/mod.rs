//! HTTP API handlers for escan-bt

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::lifecycle::BatchError;

pub mod batches;
pub mod export;
pub mod health;
pub mod import;

pub use batches::{finish_batch, get_batch_detail, list_batches, start_batch};
pub use export::export_batch;
pub use health::health_routes;
pub use import::import_sheet;

impl IntoResponse for BatchError {
    fn into_response(self) -> Response {
        let status = match &self {
            BatchError::InvalidConfiguration(_) | BatchError::InvalidItems(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BatchError::EmptyInput
            | BatchError::InvalidFilter(_)
            | BatchError::InvalidFileType(_)
            | BatchError::MissingColumn(_)
            | BatchError::InvalidSheet(_) => StatusCode::BAD_REQUEST,
            BatchError::DuplicateBatchCode(_)
            | BatchError::AlreadyFinished(_)
            | BatchError::NotCompleted(_)
            | BatchError::NoItems(_) => StatusCode::CONFLICT,
            BatchError::NotFound(_) => StatusCode::NOT_FOUND,
            BatchError::Corrupt(_) | BatchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
