//! Configuration loading and database location resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable consulted when no `--database` flag is given
pub const DATABASE_ENV_VAR: &str = "PMPTEX_DATABASE";

/// Database location resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`PMPTEX_DATABASE`)
/// 3. TOML config file (`database` key)
/// 4. Compiled default (fallback)
pub fn resolve_database_path(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(database) = config.get("database").and_then(|v| v.as_str()) {
                    return PathBuf::from(database);
                }
            }
        }
    }

    // Priority 4: Compiled default
    default_database_path()
}

/// Get the configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    let path = dirs::config_dir()
        .map(|d| d.join("pmptex").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// Default database location when nothing else is configured
fn default_database_path() -> PathBuf {
    PathBuf::from("pmptex.db")
}
