//! Snapshot sync against the shared remote blob.
//!
//! A sync code names one JSON blob on a key-value endpoint. Clients pull the
//! blob and merge it into local state, and push their whole state after
//! every local change. Nothing here ever fails a caller: transport errors
//! are logged and reported as [`SyncOutcome::Failed`].

mod coordinator;
mod http;
mod memory;
mod transport;

use std::fmt;

use serde::Serialize;

pub use coordinator::{SyncCoordinator, MAX_RECENT_CONFLICTS};
pub use http::HttpTransport;
pub use memory::MemoryTransport;
pub use transport::{RemoteTransport, TransportError, TransportResult};

use crate::merge::MergeReport;

/// Sync status shown next to the session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Offline,
    Syncing,
    Synced,
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// What a single pull or push did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The session has no sync code
    Disabled,
    /// Another operation of the same kind was already in flight
    Skipped,
    /// Remote snapshot merged into local state
    Merged(MergeReport),
    /// Remote had nothing under the code; local state was pushed to create it
    Initialized,
    /// Local state replaced the remote blob
    Pushed,
    /// Transport failure; local state untouched
    Failed(String),
}

impl SyncOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Merged(_) | Self::Initialized | Self::Pushed)
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("sync disabled (no sync code)"),
            Self::Skipped => f.write_str("skipped, another sync is in progress"),
            Self::Merged(report) => write!(
                f,
                "merged: {} appended, {} replaced, {} kept local, {} conflicts",
                report.appended,
                report.replaced,
                report.kept_local,
                report.conflicts.len()
            ),
            Self::Initialized => f.write_str("remote was empty; pushed local state"),
            Self::Pushed => f.write_str("pushed local state"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transfers_count_as_success() {
        assert!(SyncOutcome::Pushed.is_success());
        assert!(SyncOutcome::Initialized.is_success());
        assert!(SyncOutcome::Merged(MergeReport::default()).is_success());
        assert!(!SyncOutcome::Disabled.is_success());
        assert!(!SyncOutcome::Skipped.is_success());
        assert!(!SyncOutcome::Failed("boom".to_string()).is_success());
    }

    #[test]
    fn outcome_display() {
        assert_eq!(
            SyncOutcome::Failed("HTTP 500".to_string()).to_string(),
            "failed: HTTP 500"
        );
        assert_eq!(SyncState::default().to_string(), "offline");
    }
}
