//! File-backed local store: one JSON file per slot in a data directory.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::{
    decode_conflicts, decode_session, decode_state, LocalStore, StoreLock, CONFLICT_SLOT,
    LOCK_FILE, SESSION_SLOT, STATE_SLOT,
};
use crate::models::{default_dataset, AppState, MergeConflict, User};
use crate::Result;

/// Local store writing `clubroll_data_v1.json`, `clubroll_user_v1.json` and
/// `clubroll_conflicts_v1.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(format!("{STATE_SLOT}.json"))
    }

    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.dir.join(format!("{SESSION_SLOT}.json"))
    }

    #[must_use]
    pub fn conflicts_path(&self) -> PathBuf {
        self.dir.join(format!("{CONFLICT_SLOT}.json"))
    }

    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    fn acquire_lock(&self) -> Result<File> {
        std::fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read_slot(path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Write through a temporary sibling and rename, so a crash mid-write
    /// never leaves a truncated slot behind. Each write gets its own temp
    /// name; concurrent writers never share one.
    fn write_slot(&self, path: &Path, contents: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let temp_path =
            path.with_extension(format!("json.{}.tmp", uuid::Uuid::now_v7().simple()));
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    fn quarantine_corrupted_state(path: &Path) -> Result<PathBuf> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("clubroll_data_v1.json");
        let backup_path = path.with_file_name(format!("{file_name}.corrupt-{timestamp}"));
        std::fs::rename(path, &backup_path)?;
        Ok(backup_path)
    }

    fn try_save_state(&self, state: &AppState) -> Result<()> {
        let serialized = serde_json::to_string(state)?;
        self.write_slot(&self.state_path(), &serialized)
    }

    fn try_save_session(&self, user: &User) -> Result<()> {
        let serialized = serde_json::to_string(user)?;
        self.write_slot(&self.session_path(), &serialized)
    }

    fn try_save_conflicts(&self, conflicts: &[MergeConflict]) -> Result<()> {
        let serialized = serde_json::to_string(conflicts)?;
        self.write_slot(&self.conflicts_path(), &serialized)
    }
}

impl LocalStore for FileStore {
    fn load_state(&self) -> AppState {
        let path = self.state_path();
        let raw = match Self::read_slot(&path) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!("No local state at {}; using default dataset", path.display());
                return default_dataset();
            }
            Err(error) => {
                tracing::warn!(
                    "Failed to read local state at {}: {}. Using default dataset.",
                    path.display(),
                    error
                );
                return default_dataset();
            }
        };

        match decode_state(&raw) {
            Ok(state) => state,
            Err(error) => {
                match Self::quarantine_corrupted_state(&path) {
                    Ok(backup) => tracing::warn!(
                        "Corrupt local state ({}); moved it to {} and fell back to default dataset",
                        error,
                        backup.display()
                    ),
                    Err(move_error) => tracing::warn!(
                        "Corrupt local state ({}); could not move it aside: {}",
                        error,
                        move_error
                    ),
                }
                default_dataset()
            }
        }
    }

    fn save_state(&self, state: &AppState) {
        if let Err(error) = self.try_save_state(state) {
            tracing::warn!(
                "Failed to persist local state to {}: {}",
                self.state_path().display(),
                error
            );
        }
    }

    fn reload_state(&self) -> Option<AppState> {
        let path = self.state_path();
        let raw = match Self::read_slot(&path) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!("Failed to re-read local state at {}: {}", path.display(), error);
                return None;
            }
        };
        decode_state(&raw)
            .map_err(|error| {
                tracing::warn!("Ignoring unreadable local state at {}: {}", path.display(), error);
            })
            .ok()
    }

    fn lock(&self) -> StoreLock {
        match self.acquire_lock() {
            Ok(file) => StoreLock::held(file),
            Err(error) => {
                tracing::warn!(
                    "Failed to lock {}: {}; writing without it",
                    self.lock_path().display(),
                    error
                );
                StoreLock::default()
            }
        }
    }

    fn load_session(&self) -> Option<User> {
        let path = self.session_path();
        let raw = match Self::read_slot(&path) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!("Failed to read session at {}: {}", path.display(), error);
                return None;
            }
        };

        decode_session(&raw).unwrap_or_else(|error| {
            tracing::warn!("Ignoring unreadable session at {}: {}", path.display(), error);
            None
        })
    }

    fn save_session(&self, user: &User) {
        if let Err(error) = self.try_save_session(user) {
            tracing::warn!(
                "Failed to persist session to {}: {}",
                self.session_path().display(),
                error
            );
        }
    }

    fn clear_session(&self) {
        match std::fs::remove_file(self.session_path()) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => tracing::warn!("Failed to clear session: {}", error),
        }
    }

    fn load_conflicts(&self) -> Vec<MergeConflict> {
        let path = self.conflicts_path();
        let raw = match Self::read_slot(&path) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                tracing::warn!("Failed to read conflict log at {}: {}", path.display(), error);
                return Vec::new();
            }
        };

        decode_conflicts(&raw).unwrap_or_else(|error| {
            tracing::warn!("Ignoring unreadable conflict log at {}: {}", path.display(), error);
            Vec::new()
        })
    }

    fn save_conflicts(&self, conflicts: &[MergeConflict]) {
        if let Err(error) = self.try_save_conflicts(conflicts) {
            tracing::warn!(
                "Failed to persist conflict log to {}: {}",
                self.conflicts_path().display(),
                error
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictResolution, UserRole};
    use pretty_assertions::assert_eq;

    fn user() -> User {
        User {
            username: "t1".to_string(),
            role: UserRole::Teacher,
            name: "Club teacher (T1)".to_string(),
            assigned_club_id: Some("1".to_string()),
            assigned_class_name: None,
            sync_code: Some("SFJH-2025".to_string()),
        }
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.load_state().clubs.len(), 3);
        assert_eq!(store.load_session(), None);
    }

    #[test]
    fn state_and_session_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut state = default_dataset();
        state.clubs.truncate(1);
        state.last_synced_at = Some(123);
        store.save_state(&state);
        store.save_session(&user());

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.load_state(), state);
        assert_eq!(reopened.load_session(), Some(user()));
        assert_eq!(temp_files(dir.path()), 0);
    }

    fn temp_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn reload_sees_other_writers_and_skips_bad_slots() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileStore::new(dir.path());
        let second = FileStore::new(dir.path());
        assert_eq!(first.reload_state(), None);

        let mut state = default_dataset();
        state.clubs.truncate(2);
        second.save_state(&state);
        assert_eq!(first.reload_state(), Some(state));

        std::fs::write(first.state_path(), "{not json").unwrap();
        assert_eq!(first.reload_state(), None);
        assert!(first.state_path().exists());
    }

    #[test]
    fn store_lock_is_exclusive_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileStore::new(dir.path());
        let second = FileStore::new(dir.path());

        let held = first.lock();
        let other_handle = File::open(second.lock_path()).unwrap();
        assert!(FileExt::try_lock_exclusive(&other_handle).is_err());

        drop(held);
        assert!(FileExt::try_lock_exclusive(&other_handle).is_ok());
        FileExt::unlock(&other_handle).unwrap();
        drop(second.lock());
    }

    #[test]
    fn concurrent_writers_never_corrupt_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let writers = (0..4)
            .map(|index| {
                let store = FileStore::new(dir.path());
                std::thread::spawn(move || {
                    let mut state = default_dataset();
                    state.clubs.truncate(index % 3 + 1);
                    for _ in 0..25 {
                        store.save_state(&state);
                    }
                })
            })
            .collect::<Vec<_>>();
        for writer in writers {
            writer.join().unwrap();
        }

        let store = FileStore::new(dir.path());
        assert!(store.reload_state().is_some());
        assert_eq!(temp_files(dir.path()), 0);
    }

    #[test]
    fn corrupt_state_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.state_path(), "{not json").unwrap();

        let state = store.load_state();
        assert_eq!(state.clubs.len(), 3);
        assert!(!store.state_path().exists());

        let quarantined = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("clubroll_data_v1.json.corrupt-")
            })
            .count();
        assert_eq!(quarantined, 1);
    }

    #[test]
    fn corrupt_session_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.session_path(), "[1, 2").unwrap();
        assert_eq!(store.load_session(), None);
    }

    #[test]
    fn conflict_log_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load_conflicts().is_empty());

        let conflict = MergeConflict {
            club_id: "1".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            local_updated_at: 100,
            incoming_updated_at: 200,
            resolved_at: 300,
            resolution: ConflictResolution::TookRemote,
        };
        store.save_conflicts(std::slice::from_ref(&conflict));
        assert_eq!(store.load_conflicts(), vec![conflict]);

        std::fs::write(store.conflicts_path(), "oops").unwrap();
        assert!(store.load_conflicts().is_empty());
    }

    #[test]
    fn clear_session_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save_session(&user());
        store.clear_session();
        store.clear_session();
        assert_eq!(store.load_session(), None);
    }
}
