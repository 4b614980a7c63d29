//! Local persistence for the dataset and the session user.
//!
//! Named slots hold plain JSON: the full [`AppState`], the current [`User`]
//! and the log of recently resolved merge conflicts. Loading never fails the
//! caller. Unreadable or corrupt data is logged and treated as "nothing
//! stored": the built-in default dataset for the state slot, no session for
//! the user slot and an empty log for the conflict slot.
//!
//! Several processes may share one data directory (a long-running `watch`
//! next to one-shot commands). Dataset writers take the store's exclusive
//! [`StoreLock`] and re-read the slot before changing it.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::models::{AppState, MergeConflict, User};

/// Slot holding the serialized dataset
pub const STATE_SLOT: &str = "clubroll_data_v1";
/// Slot holding the serialized session user
pub const SESSION_SLOT: &str = "clubroll_user_v1";
/// Slot holding recently resolved merge conflicts
pub const CONFLICT_SLOT: &str = "clubroll_conflicts_v1";
/// Lock file guarding dataset writes in a data directory
pub const LOCK_FILE: &str = "clubroll.lock";

/// Exclusive write lock on a store's dataset, released on drop.
///
/// Stores with no other writers hand out an empty lock.
#[derive(Debug, Default)]
pub struct StoreLock {
    file: Option<std::fs::File>,
}

impl StoreLock {
    pub(crate) const fn held(file: std::fs::File) -> Self {
        Self { file: Some(file) }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            if let Err(error) = fs2::FileExt::unlock(file) {
                tracing::warn!("Failed to release store lock: {}", error);
            }
        }
    }
}

/// Durable key-value persistence used by the state owner.
///
/// Writes happen synchronously on every state transition. Implementations
/// log their own failures instead of returning them.
pub trait LocalStore: Send + Sync {
    /// Load the dataset, falling back to [`crate::models::default_dataset`].
    fn load_state(&self) -> AppState;

    fn save_state(&self, state: &AppState);

    /// Re-read the dataset slot, which another writer may have replaced.
    ///
    /// `None` when the slot is missing or unreadable; nothing is moved aside.
    fn reload_state(&self) -> Option<AppState>;

    /// Block until this process holds the dataset write lock.
    fn lock(&self) -> StoreLock {
        StoreLock::default()
    }

    fn load_session(&self) -> Option<User>;

    fn save_session(&self, user: &User);

    fn clear_session(&self);

    /// Recently resolved merge conflicts, oldest first; empty when unreadable.
    fn load_conflicts(&self) -> Vec<MergeConflict>;

    fn save_conflicts(&self, conflicts: &[MergeConflict]);
}

fn decode_state(raw: &str) -> serde_json::Result<AppState> {
    serde_json::from_str(raw)
}

fn decode_session(raw: &str) -> serde_json::Result<Option<User>> {
    serde_json::from_str(raw)
}

fn decode_conflicts(raw: &str) -> serde_json::Result<Vec<MergeConflict>> {
    serde_json::from_str(raw)
}
