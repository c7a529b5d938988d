//! Spreadsheet adapters
//!
//! Thin CSV conversions at the service boundary: `import` turns a legacy
//! sheet into raw items ready for the finish operation, `export` renders a
//! completed batch's persisted items. Neither touches the repository.

pub mod export;
pub mod import;

pub use export::render_batch_sheet;
pub use import::{parse_scanner_sheet, ImportedItem};
