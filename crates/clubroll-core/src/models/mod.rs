//! Data models for ClubRoll
//!
//! Field names serialize in camelCase: the same JSON is written to the local
//! store and exchanged with the remote sync endpoint.

mod app_state;
mod attendance;
mod club;
mod leave;
mod merge_conflict;
mod session;

pub use app_state::{default_dataset, AppState, Snapshot};
pub use attendance::{AttendanceKey, AttendanceRecord, AttendanceStatus};
pub use club::{Club, Member, MemberUpdate};
pub use leave::LeaveRecord;
pub use merge_conflict::{ConflictResolution, MergeConflict};
pub use session::{User, UserRole};

/// Generate a fresh record id of the form `{prefix}-{uuid v7}`.
///
/// UUID v7 keeps ids created on one device roughly time-ordered; ids arriving
/// from other clients are treated as opaque strings.
pub(crate) fn new_record_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::now_v7())
}
