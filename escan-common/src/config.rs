//! Service configuration and database path resolution
//!
//! Configuration is resolved once at process startup and passed down by
//! value; nothing in the service reads the environment after this point.

use crate::{Error, Result};
use std::path::PathBuf;

/// Configuration for one ESCAN service process.
///
/// Built in `main` and handed to the database layer explicitly.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path of the SQLite database file
    pub database_path: PathBuf,
    /// Port the HTTP server binds on
    pub port: u16,
}

impl ServiceConfig {
    /// Resolve the full configuration from the command-line layer.
    ///
    /// The CLI layer (clap) already folds in its own environment-variable
    /// fallbacks, so the tiers seen here are:
    /// 1. Command-line / environment value (highest priority)
    /// 2. TOML config file (`database_path` key)
    /// 3. OS-dependent compiled default
    pub fn resolve(cli_database: Option<PathBuf>, port: u16) -> Self {
        let database_path = resolve_database_path(cli_database);
        Self {
            database_path,
            port,
        }
    }
}

/// Resolve the database path from the configuration tiers.
pub fn resolve_database_path(cli_database: Option<PathBuf>) -> PathBuf {
    // Priority 1: command-line argument (or its env fallback)
    if let Some(path) = cli_database {
        return path;
    }

    // Priority 2: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(path) = config.get("database_path").and_then(|v| v.as_str()) {
                    return PathBuf::from(path);
                }
            }
        }
    }

    // Priority 3: OS-dependent compiled default
    default_database_path()
}

/// Locate the config file for the platform, if one exists.
///
/// Linux also honors a system-wide `/etc/escan/config.toml`; other platforms
/// use only the per-user config directory.
fn find_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir()
        .map(|d| d.join("escan").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if user_config.exists() {
        return Ok(user_config);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/escan/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Default database location: `<data dir>/escan/escan.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("escan"))
        .unwrap_or_else(|| PathBuf::from("./escan_data"))
        .join("escan.db")
}
