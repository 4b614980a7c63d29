//! Merge conflict model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a conflicting attendance key was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Local record was as new or newer
    KeptLocal,
    /// Remote record was strictly newer
    TookRemote,
}

/// Recorded attendance conflict resolved by last-writer-wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConflict {
    pub club_id: String,
    pub date: NaiveDate,
    /// Local record's timestamp (0 when it had none)
    pub local_updated_at: i64,
    /// Incoming record's timestamp (0 when it had none)
    pub incoming_updated_at: i64,
    /// Resolution timestamp (unix ms)
    pub resolved_at: i64,
    pub resolution: ConflictResolution,
}
