//! Shared foundation for the ESCAN envelope-scan services
//!
//! Holds the pieces every service binary needs: the common error type,
//! startup configuration resolution, and the SQLite bootstrap with the
//! persisted batch/item models.

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
