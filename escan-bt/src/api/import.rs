//! Legacy spreadsheet upload endpoint

use axum::extract::Multipart;
use axum::Json;
use serde::Serialize;

use crate::lifecycle::BatchError;
use crate::sheet::{parse_scanner_sheet, ImportedItem};

/// Import response: the parsed raw items, ready to submit to a finish
/// call once a batch is started for them.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub status: String,
    pub total_items: usize,
    pub items: Vec<ImportedItem>,
}

/// POST /api/import
///
/// Expects a multipart form with a `file` field holding a `.csv` sheet.
pub async fn import_sheet(mut multipart: Multipart) -> Result<Json<ImportResponse>, BatchError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BatchError::InvalidSheet(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(BatchError::InvalidFileType(filename));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| BatchError::InvalidSheet(e.to_string()))?;
        let items = parse_scanner_sheet(&data)?;

        return Ok(Json(ImportResponse {
            status: "ok".to_string(),
            total_items: items.len(),
            items,
        }));
    }

    Err(BatchError::InvalidSheet("upload has no file field".to_string()))
}
