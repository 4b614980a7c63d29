//! In-process remote shared between clients.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::http::decode_snapshot;
use super::transport::{normalize_code, RemoteTransport, TransportError, TransportResult};
use crate::models::{AppState, Snapshot};

#[derive(Debug, Default)]
struct Shared {
    blobs: Mutex<HashMap<String, String>>,
    offline: AtomicBool,
    pushes: AtomicUsize,
}

/// Remote endpoint kept in memory.
///
/// Blobs are stored as the JSON an HTTP endpoint would hold, so payload
/// decoding matches [`super::HttpTransport`]. Clones talk to the same remote.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    shared: Arc<Shared>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`TransportError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    #[must_use]
    pub fn raw(&self, code: &str) -> Option<String> {
        self.blobs().get(code.trim()).cloned()
    }

    pub fn insert_raw(&self, code: &str, raw: impl Into<String>) {
        self.blobs().insert(code.trim().to_string(), raw.into());
    }

    /// Decoded blob under `code`, if any
    #[must_use]
    pub fn stored(&self, code: &str) -> Option<AppState> {
        serde_json::from_str(&self.raw(code)?).ok()
    }

    /// Successful pushes so far
    #[must_use]
    pub fn push_count(&self) -> usize {
        self.shared.pushes.load(Ordering::SeqCst)
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.shared
            .blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> TransportResult<()> {
        if self.shared.offline.load(Ordering::SeqCst) {
            Err(TransportError::Unavailable("memory remote is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteTransport for MemoryTransport {
    async fn pull(&self, code: &str) -> TransportResult<Option<Snapshot>> {
        let code = normalize_code(code)?;
        self.ensure_online()?;
        match self.raw(code) {
            Some(raw) => decode_snapshot(&raw),
            None => Ok(None),
        }
    }

    async fn push(&self, code: &str, state: &AppState) -> TransportResult<()> {
        let code = normalize_code(code)?;
        self.ensure_online()?;
        let raw = serde_json::to_string(state)?;
        self.blobs().insert(code.to_string(), raw);
        self.shared.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_dataset;

    #[tokio::test]
    async fn push_then_pull_through_a_clone() {
        let remote = MemoryTransport::new();
        let other = remote.clone();
        assert!(remote.pull("SFJH").await.unwrap().is_none());

        let state = default_dataset();
        remote.push("SFJH", &state).await.unwrap();

        let snapshot = other.pull(" SFJH ").await.unwrap().unwrap();
        assert_eq!(snapshot.clubs.map(|clubs| clubs.len()), Some(3));
        assert_eq!(other.push_count(), 1);
        assert_eq!(other.stored("SFJH"), Some(state));
    }

    #[tokio::test]
    async fn offline_remote_rejects_calls() {
        let remote = MemoryTransport::new();
        remote.set_offline(true);
        assert!(matches!(
            remote.pull("code").await,
            Err(TransportError::Unavailable(_))
        ));
        assert!(remote.push("code", &AppState::default()).await.is_err());
        assert_eq!(remote.push_count(), 0);
    }

    #[tokio::test]
    async fn garbage_blob_is_an_invalid_payload() {
        let remote = MemoryTransport::new();
        remote.insert_raw("code", "not json");
        assert!(matches!(
            remote.pull("code").await,
            Err(TransportError::InvalidPayload(_))
        ));
        remote.insert_raw("code", "null");
        assert!(remote.pull("code").await.unwrap().is_none());
    }
}
