//! Remote transport seam.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AppState, Snapshot};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid sync configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Sync HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sync endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid snapshot payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("Sync request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Sync endpoint unavailable: {0}")]
    Unavailable(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Fetch and replace the remote blob stored under a sync code.
///
/// The code is both the namespace and the only access control.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Fetch the snapshot stored under `code`; `Ok(None)` when the code has
    /// never been written.
    async fn pull(&self, code: &str) -> TransportResult<Option<Snapshot>>;

    /// Replace the blob stored under `code` with `state`.
    async fn push(&self, code: &str, state: &AppState) -> TransportResult<()>;
}

/// Reject blank sync codes before any request is made.
pub(crate) fn normalize_code(code: &str) -> TransportResult<&str> {
    let code = code.trim();
    if code.is_empty() {
        Err(TransportError::InvalidConfiguration(
            "sync code must not be empty".to_string(),
        ))
    } else {
        Ok(code)
    }
}
