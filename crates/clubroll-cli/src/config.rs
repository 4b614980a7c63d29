//! Config file discovery and service construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clubroll_core::config::ClubRollConfig;
use clubroll_core::storage::FileStore;
use clubroll_core::sync::HttpTransport;
use clubroll_core::ClubRoll;

use crate::error::CliError;

const APP_DIR_NAME: &str = "clubroll";
const CONFIG_FILE_NAME: &str = "config.json";

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("failed to resolve config directory".to_string()))
}

pub fn default_data_dir() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| CliError::Config("failed to resolve data directory".to_string()))
}

/// Load the config file (missing = defaults) and apply `CLUBROLL_*` overrides.
pub fn load_config(explicit_path: Option<&Path>) -> Result<ClubRollConfig, CliError> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    let config = ClubRollConfig::load_from_path(&path).map_err(|error| {
        CliError::Config(format!("failed to load {}: {error}", path.display()))
    })?;
    Ok(config.with_env_overrides())
}

/// `--data-dir` wins over the config file, which wins over the platform default.
pub fn resolve_data_dir(
    cli_data_dir: Option<PathBuf>,
    config: &ClubRollConfig,
) -> Result<PathBuf, CliError> {
    match cli_data_dir.or_else(|| config.data_dir.clone()) {
        Some(dir) => Ok(dir),
        None => default_data_dir(),
    }
}

pub fn open_service(data_dir: &Path, config: &ClubRollConfig) -> Result<ClubRoll, CliError> {
    let transport = HttpTransport::new(config.sync_base_url()?)?;
    tracing::debug!(
        data_dir = %data_dir.display(),
        sync_base_url = transport.base_url(),
        "Opening ClubRoll"
    );
    Ok(ClubRoll::open(
        Arc::new(FileStore::new(data_dir)),
        Arc::new(transport),
        config.sync_settings(),
    ))
}
