//! Legacy spreadsheet import
//!
//! Accepts a CSV sheet with the three scanner columns (matched
//! case-insensitively), cleans each cell, and assigns item ids by row
//! position. The output shape is valid finish input once a batch's scanner
//! configuration is known.

use serde::Serialize;

use crate::lifecycle::BatchError;

/// Columns every import sheet must carry, in canonical spelling.
pub const REQUIRED_COLUMNS: [&str; 3] = ["scanner 1", "scanner 2", "scanner 3"];

/// One imported row, shaped like a raw finish item with bare readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedItem {
    /// 1-based row position within the sheet
    pub item_id: i64,
    pub scanner_1: Option<String>,
    pub scanner_2: Option<String>,
    pub scanner_3: Option<String>,
}

/// Parse a scanner sheet into raw items.
pub fn parse_scanner_sheet(data: &[u8]) -> Result<Vec<ImportedItem>, BatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| BatchError::InvalidSheet(e.to_string()))?
        .clone();

    // Case-insensitive header lookup; first match wins
    let mut indices: [Option<usize>; 3] = [None; 3];
    for (col, header) in headers.iter().enumerate() {
        let normalized = header.trim().to_ascii_lowercase();
        for (slot, required) in REQUIRED_COLUMNS.iter().enumerate() {
            if normalized == *required && indices[slot].is_none() {
                indices[slot] = Some(col);
            }
        }
    }

    let mut columns = [0usize; 3];
    for (slot, required) in REQUIRED_COLUMNS.iter().enumerate() {
        columns[slot] = indices[slot]
            .ok_or_else(|| BatchError::MissingColumn(required.to_uppercase()))?;
    }

    let mut items = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| BatchError::InvalidSheet(e.to_string()))?;
        let cell = |col: usize| {
            record
                .get(col)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        items.push(ImportedItem {
            item_id: (row_idx + 1) as i64,
            scanner_1: cell(columns[0]),
            scanner_2: cell(columns[1]),
            scanner_3: cell(columns[2]),
        });
    }

    Ok(items)
}
