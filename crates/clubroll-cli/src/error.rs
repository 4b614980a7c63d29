use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] clubroll_core::Error),
    #[error(transparent)]
    Transport(#[from] clubroll_core::sync::TransportError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Permission denied: {0}")]
    Forbidden(String),
    #[error("Nothing to update; pass at least one field")]
    NothingToUpdate,
    #[error("Sync failed: {0}")]
    SyncFailed(String),
    #[error("Sync is not configured for this session. Log in with --sync-code to enable it.")]
    SyncNotConfigured,
}
