//! In-process local store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{
    decode_conflicts, decode_session, decode_state, LocalStore, CONFLICT_SLOT, SESSION_SLOT,
    STATE_SLOT,
};
use crate::models::{default_dataset, AppState, MergeConflict, User};

/// Local store keeping serialized slots in memory.
///
/// Slots hold the same JSON a [`super::FileStore`] would write, so decoding
/// and fallback behave identically. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<&'static str, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store starting from the given dataset.
    #[must_use]
    pub fn with_state(state: &AppState) -> Self {
        let store = Self::new();
        store.save_state(state);
        store
    }

    /// Raw JSON currently held in the dataset slot
    #[must_use]
    pub fn raw_state(&self) -> Option<String> {
        self.slots().get(STATE_SLOT).cloned()
    }

    /// Overwrite the dataset slot with arbitrary bytes.
    pub fn set_raw_state(&self, raw: impl Into<String>) {
        self.slots().insert(STATE_SLOT, raw.into());
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStore for MemoryStore {
    fn load_state(&self) -> AppState {
        let Some(raw) = self.raw_state() else {
            return default_dataset();
        };
        decode_state(&raw).unwrap_or_else(|error| {
            tracing::warn!("Corrupt in-memory state ({}); using default dataset", error);
            default_dataset()
        })
    }

    fn save_state(&self, state: &AppState) {
        match serde_json::to_string(state) {
            Ok(raw) => {
                self.slots().insert(STATE_SLOT, raw);
            }
            Err(error) => tracing::warn!("Failed to serialize state: {}", error),
        }
    }

    fn reload_state(&self) -> Option<AppState> {
        decode_state(&self.raw_state()?).ok()
    }

    fn load_session(&self) -> Option<User> {
        let raw = self.slots().get(SESSION_SLOT).cloned()?;
        decode_session(&raw).unwrap_or_else(|error| {
            tracing::warn!("Ignoring unreadable session: {}", error);
            None
        })
    }

    fn save_session(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => {
                self.slots().insert(SESSION_SLOT, raw);
            }
            Err(error) => tracing::warn!("Failed to serialize session: {}", error),
        }
    }

    fn clear_session(&self) {
        self.slots().remove(SESSION_SLOT);
    }

    fn load_conflicts(&self) -> Vec<MergeConflict> {
        let Some(raw) = self.slots().get(CONFLICT_SLOT).cloned() else {
            return Vec::new();
        };
        decode_conflicts(&raw).unwrap_or_else(|error| {
            tracing::warn!("Ignoring unreadable conflict log: {}", error);
            Vec::new()
        })
    }

    fn save_conflicts(&self, conflicts: &[MergeConflict]) {
        match serde_json::to_string(conflicts) {
            Ok(raw) => {
                self.slots().insert(CONFLICT_SLOT, raw);
            }
            Err(error) => tracing::warn!("Failed to serialize conflict log: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_slot_falls_back_to_default_dataset() {
        let store = MemoryStore::new();
        store.set_raw_state("\u{0}garbage");

        let loaded = store.load_state();
        let ids = loaded
            .clubs
            .iter()
            .map(|club| club.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(store.load_session(), None);
    }

    #[test]
    fn clones_share_slots() {
        let store = MemoryStore::new();
        let other = store.clone();
        let state = AppState::default();
        store.save_state(&state);
        assert_eq!(other.load_state(), state);
        assert_eq!(
            other.raw_state().as_deref(),
            Some(r#"{"clubs":[],"attendanceRecords":[],"leaveRecords":[]}"#)
        );
    }
}
