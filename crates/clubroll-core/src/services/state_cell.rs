//! Single owner of the in-memory dataset.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::merge::{merge, MergeReport};
use crate::models::{AppState, Snapshot};
use crate::storage::{LocalStore, StoreLock};
use crate::Result;

/// Current [`AppState`] plus the store it is persisted to.
///
/// Every transition computes a new state from a copy, swaps it in and saves
/// it before the write lock is released, so readers never see a state that
/// was not persisted. The lock is never held across an `.await`.
///
/// Other processes may write the same store. Transitions therefore start from
/// the freshly re-read slot while holding the store's own lock, and fall back
/// to the cached copy only when the slot cannot be read.
pub struct StateCell {
    state: RwLock<AppState>,
    store: Arc<dyn LocalStore>,
}

impl std::fmt::Debug for StateCell {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("StateCell")
            .field("state", &*self.read_guard())
            .finish_non_exhaustive()
    }
}

impl StateCell {
    /// Load the persisted dataset (or the default one) from `store`.
    pub fn load(store: Arc<dyn LocalStore>) -> Self {
        let state = store.load_state();
        Self {
            state: RwLock::new(state),
            store,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    #[must_use]
    pub fn snapshot(&self) -> AppState {
        self.read_guard().clone()
    }

    pub fn read<R>(&self, view: impl FnOnce(&AppState) -> R) -> R {
        view(&self.read_guard())
    }

    /// Apply a fallible transformation. On error nothing changes.
    ///
    /// Returns the closure's value and a copy of the committed state.
    pub fn mutate<R>(
        &self,
        transition: impl FnOnce(&mut AppState) -> Result<R>,
    ) -> Result<(R, AppState)> {
        let mut guard = self.write_guard();
        let (_lock, mut next) = self.latest(&guard);
        let value = transition(&mut next)?;
        self.store.save_state(&next);
        *guard = next.clone();
        Ok((value, next))
    }

    /// Merge a remote snapshot into whatever state is current now.
    pub fn merge_remote(&self, remote: Snapshot, merged_at: i64) -> MergeReport {
        let mut guard = self.write_guard();
        let (_lock, current) = self.latest(&guard);
        let outcome = merge(&current, remote, merged_at);
        self.store.save_state(&outcome.state);
        *guard = outcome.state;
        outcome.report
    }

    pub fn mark_synced(&self, synced_at: i64) {
        let mut guard = self.write_guard();
        let (_lock, mut next) = self.latest(&guard);
        next.last_synced_at = Some(synced_at);
        self.store.save_state(&next);
        *guard = next;
    }

    pub fn set_sync_code(&self, code: Option<String>) {
        let mut guard = self.write_guard();
        let (_lock, mut next) = self.latest(&guard);
        if next.sync_code != code {
            next.sync_code = code;
            self.store.save_state(&next);
        }
        *guard = next;
    }

    /// Lock the store and read what it holds now, or the cached state when
    /// the slot is unreadable. Keep the lock until the result is saved.
    fn latest(&self, cached: &AppState) -> (StoreLock, AppState) {
        let lock = self.store.lock();
        let current = self
            .store
            .reload_state()
            .unwrap_or_else(|| cached.clone());
        (lock, current)
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Club;
    use crate::storage::MemoryStore;
    use crate::Error;

    fn cell() -> (StateCell, MemoryStore) {
        let store = MemoryStore::with_state(&AppState::default());
        (StateCell::load(Arc::new(store.clone())), store)
    }

    #[test]
    fn committed_mutation_is_persisted() {
        let (cell, store) = cell();
        let (id, committed) = cell
            .mutate(|state| {
                let club = Club::new("Chess", "");
                let id = club.id.clone();
                state.create_club(club)?;
                Ok(id)
            })
            .unwrap();

        assert_eq!(committed.clubs[0].id, id);
        assert_eq!(cell.snapshot(), committed);
        assert_eq!(store.load_state(), committed);
    }

    #[test]
    fn failed_mutation_changes_nothing() {
        let (cell, store) = cell();
        let before = store.raw_state();
        let result = cell.mutate(|state| state.delete_club("missing"));
        assert!(matches!(result, Err(Error::ClubNotFound(_))));
        assert_eq!(cell.snapshot(), AppState::default());
        assert_eq!(store.raw_state(), before);
    }

    #[test]
    fn merge_remote_stamps_and_persists() {
        let (cell, store) = cell();
        let remote = Snapshot {
            clubs: Some(vec![Club::new("Band", "")]),
            ..Snapshot::default()
        };

        let report = cell.merge_remote(remote, 42);
        assert!(!report.changed_attendance());
        let state = cell.snapshot();
        assert_eq!(state.clubs[0].name, "Band");
        assert_eq!(state.last_synced_at, Some(42));
        assert_eq!(store.load_state(), state);
    }

    #[test]
    fn transitions_start_from_what_another_writer_saved() {
        let (cell, store) = cell();
        let other = StateCell::load(Arc::new(store.clone()));

        other
            .mutate(|state| state.create_club(Club::new("Band", "")))
            .unwrap();
        let (_, committed) = cell
            .mutate(|state| state.create_club(Club::new("Chess", "")))
            .unwrap();

        let names = committed
            .clubs
            .iter()
            .map(|club| club.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Band", "Chess"]);
        assert_eq!(store.load_state(), committed);
    }

    #[test]
    fn unreadable_slot_keeps_cached_state() {
        let (cell, store) = cell();
        cell.mutate(|state| state.create_club(Club::new("Band", "")))
            .unwrap();
        store.set_raw_state("{oops");

        cell.mark_synced(9);
        let persisted = store.load_state();
        assert_eq!(persisted.clubs.len(), 1);
        assert_eq!(persisted.last_synced_at, Some(9));
    }

    #[test]
    fn mark_synced_and_sync_code() {
        let (cell, store) = cell();
        cell.mark_synced(7);
        cell.set_sync_code(Some("SFJH".to_string()));
        let persisted = store.load_state();
        assert_eq!(persisted.last_synced_at, Some(7));
        assert_eq!(persisted.sync_code.as_deref(), Some("SFJH"));
        assert_eq!(cell.read(|state| state.clubs.len()), 0);
    }
}
