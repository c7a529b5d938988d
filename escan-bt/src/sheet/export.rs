//! Batch report export
//!
//! Renders a completed batch's persisted items as a CSV report. Row order
//! is the persisted item order; the scanner columns are exactly the slots
//! configured for the batch.

use escan_common::db::models::{Batch, BatchItem};

use crate::lifecycle::BatchError;

/// Render the report sheet for one batch.
///
/// Columns: No | Item ID | Scanner <s> (per configured slot) | Result |
/// Scan Time.
pub fn render_batch_sheet(batch: &Batch, items: &[BatchItem]) -> Result<Vec<u8>, BatchError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = vec!["No".to_string(), "Item ID".to_string()];
    for slot in &batch.scanners_configured {
        header.push(format!("Scanner {}", slot));
    }
    header.push("Result".to_string());
    header.push("Scan Time".to_string());
    writer
        .write_record(&header)
        .map_err(|e| BatchError::InvalidSheet(e.to_string()))?;

    for (no, item) in items.iter().enumerate() {
        let mut row: Vec<String> = vec![(no + 1).to_string(), item.item_id.to_string()];
        for slot in &batch.scanners_configured {
            row.push(item.scanner_value(*slot).unwrap_or_default().to_string());
        }
        row.push(item.result.as_str().to_string());
        row.push(item.created_at.format("%Y-%m-%d %H:%M:%S").to_string());
        writer
            .write_record(&row)
            .map_err(|e| BatchError::InvalidSheet(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| BatchError::InvalidSheet(e.to_string()))
}

/// Suggested download filename for a batch report.
pub fn report_filename(batch_id: i64, now: chrono::DateTime<chrono::Utc>) -> String {
    format!("batch_{}_{}.csv", batch_id, now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use escan_common::db::models::{BatchStatus, ItemVerdict};

    fn sample_batch(scanners: Vec<u8>) -> Batch {
        let t = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        Batch {
            id: 42,
            batch_code: Some("BC-42".to_string()),
            scanners_configured: scanners,
            status: BatchStatus::Completed,
            start_time: t,
            end_time: Some(t),
            total_items: Some(2),
            created_at: t,
        }
    }

    fn sample_item(item_id: i64, s1: Option<&str>, s2: Option<&str>, result: ItemVerdict) -> BatchItem {
        BatchItem {
            item_id,
            record_id: 42,
            scanner_1: s1.map(str::to_string),
            scanner_1_valid: None,
            scanner_2: s2.map(str::to_string),
            scanner_2_valid: None,
            scanner_3: Some("ignored".to_string()),
            scanner_3_valid: Some(false),
            result,
            fallback: false,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn header_reflects_configured_scanners_only() {
        let batch = sample_batch(vec![1, 2]);
        let bytes = render_batch_sheet(&batch, &[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "No,Item ID,Scanner 1,Scanner 2,Result,Scan Time"
        );
    }

    #[test]
    fn rows_keep_persisted_order_and_formatting() {
        let batch = sample_batch(vec![1, 2]);
        let items = vec![
            sample_item(11, Some("A"), Some("B"), ItemVerdict::Pass),
            sample_item(12, None, Some("C"), ItemVerdict::Fail),
        ];
        let bytes = render_batch_sheet(&batch, &items).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "1,11,A,B,Pass,2026-03-14 09:30:00");
        assert_eq!(lines[2], "2,12,,C,Fail,2026-03-14 09:30:00");
    }

    #[test]
    fn single_scanner_batch_renders_one_scanner_column() {
        let batch = sample_batch(vec![3]);
        let items = vec![sample_item(1, Some("A"), None, ItemVerdict::Pass)];
        let bytes = render_batch_sheet(&batch, &items).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "No,Item ID,Scanner 3,Result,Scan Time"
        );
        // Slot 3's stored value is carried into the report even though it
        // never influenced the verdict.
        assert!(text.lines().nth(1).unwrap().contains("ignored"));
    }

    #[test]
    fn report_filename_embeds_id_and_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(report_filename(42, now), "batch_42_20260314_092653.csv");
    }
}
