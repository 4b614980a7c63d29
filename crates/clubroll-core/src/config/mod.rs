//! Client configuration.
//!
//! `ClubRollConfig` is the on-disk JSON shape shared by every front end.
//! Missing files and missing fields mean defaults; text values are trimmed
//! and empty strings treated as absent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

pub const DEFAULT_SYNC_BASE_URL: &str = "https://api.npoint.io";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

pub const SYNC_URL_ENV: &str = "CLUBROLL_SYNC_URL";
pub const DATA_DIR_ENV: &str = "CLUBROLL_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClubRollConfig {
    pub sync_base_url: Option<String>,
    pub poll_interval_secs: u64,
    /// Zero disables the bound
    pub request_timeout_secs: u64,
    pub data_dir: Option<PathBuf>,
}

impl Default for ClubRollConfig {
    fn default() -> Self {
        Self {
            sync_base_url: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            data_dir: None,
        }
    }
}

/// Timing knobs handed to the sync coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub poll_interval: Duration,
    pub request_timeout: Option<Duration>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }
}

impl ClubRollConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config = serde_json::from_str::<Self>(&raw)?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Apply `CLUBROLL_*` overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = normalize_text_option(lookup(SYNC_URL_ENV)) {
            self.sync_base_url = Some(url);
        }
        if let Some(dir) = normalize_text_option(lookup(DATA_DIR_ENV)) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Sync endpoint base, validated, without a trailing slash.
    pub fn sync_base_url(&self) -> Result<String> {
        let url = normalize_text_option(self.sync_base_url.clone())
            .unwrap_or_else(|| DEFAULT_SYNC_BASE_URL.to_string());
        if is_http_url(&url) {
            Ok(url.trim_end_matches('/').to_string())
        } else {
            Err(Error::InvalidInput(format!(
                "sync_base_url must include http:// or https:// (got '{url}')"
            )))
        }
    }

    #[must_use]
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            request_timeout: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
        }
    }

    fn normalize(&mut self) {
        self.sync_base_url = normalize_text_option(self.sync_base_url.take());
        self.data_dir = self
            .data_dir
            .take()
            .filter(|dir| !dir.as_os_str().is_empty());
    }
}
