//! Persisted batch and item models
//!
//! Single source of truth for the shapes stored in `batches` and
//! `batch_items`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a batch: created Running, closed Completed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Running,
    Completed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Running => "Running",
            BatchStatus::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Running" => Some(BatchStatus::Running),
            "Completed" => Some(BatchStatus::Completed),
            _ => None,
        }
    }
}

/// Computed outcome for one scanned item.
///
/// `Unknown` is representable in storage but never produced by the verdict
/// computation; aggregated listings count it in neither pass nor fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemVerdict {
    Pass,
    Fail,
    Unknown,
}

impl ItemVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemVerdict::Pass => "Pass",
            ItemVerdict::Fail => "Fail",
            ItemVerdict::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pass" => Some(ItemVerdict::Pass),
            "Fail" => Some(ItemVerdict::Fail),
            "Unknown" => Some(ItemVerdict::Unknown),
            _ => None,
        }
    }
}

/// A scanning batch row.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub id: i64,
    pub batch_code: Option<String>,
    /// Scanner slots active for this batch, ascending; fixed at creation
    pub scanners_configured: Vec<u8>,
    pub status: BatchStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_items: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Listing view of a batch with read-time pass/fail aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub id: i64,
    pub batch_code: Option<String>,
    pub scanners_configured: Vec<u8>,
    pub status: BatchStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_items: Option<i64>,
    pub pass_count: i64,
    pub fail_count: i64,
}

/// One scanned item as persisted at finalize time.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub item_id: i64,
    pub record_id: i64,
    pub scanner_1: Option<String>,
    pub scanner_1_valid: Option<bool>,
    pub scanner_2: Option<String>,
    pub scanner_2_valid: Option<bool>,
    pub scanner_3: Option<String>,
    pub scanner_3_valid: Option<bool>,
    pub result: ItemVerdict,
    pub fallback: bool,
    pub created_at: DateTime<Utc>,
}

impl BatchItem {
    /// Stored reading text for one scanner slot (1-3).
    pub fn scanner_value(&self, slot: u8) -> Option<&str> {
        match slot {
            1 => self.scanner_1.as_deref(),
            2 => self.scanner_2.as_deref(),
            3 => self.scanner_3.as_deref(),
            _ => None,
        }
    }
}

/// Encode a scanner configuration for the `scanners_configured` TEXT column.
pub fn encode_scanners(slots: &[u8]) -> String {
    let inner: Vec<String> = slots.iter().map(|s| s.to_string()).collect();
    format!("[{}]", inner.join(","))
}

/// Decode the `scanners_configured` column back into slot numbers.
pub fn decode_scanners(raw: &str) -> std::result::Result<Vec<u8>, serde_json::Error> {
    serde_json::from_str::<Vec<u8>>(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_encoding_round_trips() {
        let slots = vec![1u8, 3];
        let encoded = encode_scanners(&slots);
        assert_eq!(encoded, "[1,3]");
        assert_eq!(decode_scanners(&encoded).unwrap(), slots);
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        assert_eq!(BatchStatus::parse("Running"), Some(BatchStatus::Running));
        assert_eq!(BatchStatus::parse("Completed"), Some(BatchStatus::Completed));
        assert_eq!(BatchStatus::parse("Failed"), None);
    }

    #[test]
    fn verdict_round_trips_through_text() {
        for verdict in [ItemVerdict::Pass, ItemVerdict::Fail, ItemVerdict::Unknown] {
            assert_eq!(ItemVerdict::parse(verdict.as_str()), Some(verdict));
        }
    }
}
