//! Batch lifecycle management
//!
//! Owns the Running → Completed state machine. `start` validates the
//! scanner configuration and persists a new Running batch; `finish`
//! validates the request, computes every item's verdict against the
//! configuration captured at creation, and hands the repository one atomic
//! finalize. There is no other transition: a finished batch is closed for
//! good, and a second finish always fails.

use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;

use escan_common::db::models::BatchStatus;

use crate::db::BatchRepository;
use crate::verdict::{self, NormalizedItem, RawItem};

/// Domain errors surfaced by the batch tracker.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid scanner configuration: {0}")]
    InvalidConfiguration(String),

    #[error("batch code already in use: {0}")]
    DuplicateBatchCode(String),

    #[error("batch not found: {0}")]
    NotFound(i64),

    #[error("item list cannot be empty")]
    EmptyInput,

    #[error("batch {0} already finished")]
    AlreadyFinished(i64),

    #[error("batch {0} is not completed")]
    NotCompleted(i64),

    #[error("batch {0} has no items to export")]
    NoItems(i64),

    #[error("invalid items: {0}")]
    InvalidItems(String),

    #[error("invalid status filter: {0}")]
    InvalidFilter(String),

    #[error("unsupported file type: {0}")]
    InvalidFileType(String),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("spreadsheet error: {0}")]
    InvalidSheet(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Result of a successful finish operation.
#[derive(Debug, Clone)]
pub struct FinishOutcome {
    pub total_items: usize,
    pub scanners_configured: Vec<u8>,
}

/// The lifecycle manager over one repository.
pub struct BatchLifecycle {
    repo: BatchRepository,
}

impl BatchLifecycle {
    pub fn new(repo: BatchRepository) -> Self {
        Self { repo }
    }

    /// Open a new Running batch.
    ///
    /// The scanner configuration is validated and canonicalized to ascending
    /// slot order before anything is written; it is immutable for the life
    /// of the batch.
    pub async fn start(
        &self,
        scanners_configured: &[i64],
        batch_code: Option<&str>,
    ) -> Result<(i64, Vec<u8>), BatchError> {
        let slots = validate_scanner_config(scanners_configured)?;
        let start_time = Utc::now();
        let id = self.repo.insert_batch(&slots, batch_code, start_time).await?;
        Ok((id, slots))
    }

    /// Close a Running batch with its full item set.
    ///
    /// Validation happens in request order (unknown batch, empty item
    /// list, wrong state, bad items) and nothing is written until all of
    /// it passes. The repository then persists every item and the
    /// Completed transition in one transaction; a concurrent finish on the
    /// same batch loses that race and surfaces as `AlreadyFinished`.
    pub async fn finish(
        &self,
        batch_id: i64,
        raw_items: &[RawItem],
    ) -> Result<FinishOutcome, BatchError> {
        let batch = self
            .repo
            .get_batch(batch_id)
            .await?
            .ok_or(BatchError::NotFound(batch_id))?;

        if raw_items.is_empty() {
            return Err(BatchError::EmptyInput);
        }
        if batch.status != BatchStatus::Running {
            return Err(BatchError::AlreadyFinished(batch_id));
        }

        let normalized = normalize_all(raw_items, &batch.scanners_configured)?;
        let end_time = Utc::now();
        self.repo
            .finalize_batch(batch_id, &normalized, end_time)
            .await?;

        Ok(FinishOutcome {
            total_items: normalized.len(),
            scanners_configured: batch.scanners_configured,
        })
    }
}

/// Validate a requested scanner configuration and canonicalize it.
fn validate_scanner_config(slots: &[i64]) -> Result<Vec<u8>, BatchError> {
    if slots.is_empty() {
        return Err(BatchError::InvalidConfiguration(
            "at least one scanner must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(slots.len());
    for &slot in slots {
        if !(1..=3).contains(&slot) {
            return Err(BatchError::InvalidConfiguration(format!(
                "scanner {} is not one of 1, 2, 3",
                slot
            )));
        }
        if !seen.insert(slot) {
            return Err(BatchError::InvalidConfiguration(format!(
                "scanner {} listed more than once",
                slot
            )));
        }
        out.push(slot as u8);
    }
    out.sort_unstable();
    Ok(out)
}

/// Normalize every raw item, rejecting the whole set on a contract
/// violation.
fn normalize_all(
    raw_items: &[RawItem],
    scanners_configured: &[u8],
) -> Result<Vec<NormalizedItem>, BatchError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw_items.len());

    for (idx, raw) in raw_items.iter().enumerate() {
        let item_id = raw.item_id.ok_or_else(|| {
            BatchError::InvalidItems(format!("item at position {} has no item_id", idx + 1))
        })?;
        if !seen.insert(item_id) {
            return Err(BatchError::InvalidItems(format!(
                "duplicate item_id {}",
                item_id
            )));
        }
        out.push(verdict::normalize(
            item_id,
            raw.resolve_readings(),
            scanners_configured,
        ));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_rejects_empty() {
        assert!(matches!(
            validate_scanner_config(&[]),
            Err(BatchError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn config_validation_rejects_out_of_range_slots() {
        assert!(matches!(
            validate_scanner_config(&[1, 4]),
            Err(BatchError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            validate_scanner_config(&[0]),
            Err(BatchError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            validate_scanner_config(&[-1]),
            Err(BatchError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn config_validation_rejects_duplicates() {
        assert!(matches!(
            validate_scanner_config(&[2, 2]),
            Err(BatchError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn config_is_canonicalized_ascending() {
        assert_eq!(validate_scanner_config(&[3, 1]).unwrap(), vec![1, 3]);
    }

    #[test]
    fn items_without_item_id_reject_the_whole_set() {
        let items: Vec<RawItem> =
            serde_json::from_str(r#"[{"item_id": 1, "scanner_1": "A"}, {"scanner_1": "B"}]"#)
                .unwrap();
        assert!(matches!(
            normalize_all(&items, &[1]),
            Err(BatchError::InvalidItems(_))
        ));
    }

    #[test]
    fn duplicate_item_ids_reject_the_whole_set() {
        let items: Vec<RawItem> =
            serde_json::from_str(r#"[{"item_id": 7, "scanner_1": "A"}, {"item_id": 7, "scanner_1": "B"}]"#)
                .unwrap();
        assert!(matches!(
            normalize_all(&items, &[1]),
            Err(BatchError::InvalidItems(_))
        ));
    }
}
