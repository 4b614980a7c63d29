//! State-owner service shared by every front end.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::task::JoinHandle;

use super::StateCell;
use crate::auth::authenticate;
use crate::config::SyncSettings;
use crate::models::{
    AppState, AttendanceRecord, AttendanceStatus, Club, LeaveRecord, Member, MemberUpdate,
    MergeConflict, User,
};
use crate::state::{DailySummary, RosterRow};
use crate::storage::LocalStore;
use crate::sync::{RemoteTransport, SyncCoordinator, SyncOutcome, SyncState};
use crate::util::unix_millis_now;
use crate::Result;

/// A successful login and the outcome of its initial pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub user: User,
    pub sync: SyncOutcome,
}

/// Owns the dataset, the session and the sync coordinator.
///
/// Mutations apply a pure transformation, persist the result and then push
/// it in the background when the session has a sync code. They work with or
/// without a session; authorization is left to the front end.
pub struct ClubRoll {
    cell: Arc<StateCell>,
    sync: Arc<SyncCoordinator>,
    session: RwLock<Option<User>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ClubRoll {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClubRoll")
            .field("session", &self.session())
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

impl ClubRoll {
    /// Load state and session from `store`. Never fails: unreadable data
    /// falls back to the default dataset and no session.
    pub fn open(
        store: Arc<dyn LocalStore>,
        transport: Arc<dyn RemoteTransport>,
        settings: SyncSettings,
    ) -> Self {
        let session = store.load_session();
        let conflicts = store.load_conflicts();
        let cell = Arc::new(StateCell::load(store));
        Self {
            cell,
            sync: Arc::new(SyncCoordinator::new(transport, settings).with_conflicts(conflicts)),
            session: RwLock::new(session),
            poller: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> AppState {
        self.cell.snapshot()
    }

    /// Run a read-only view against the current state without copying it.
    pub fn read<R>(&self, view: impl FnOnce(&AppState) -> R) -> R {
        self.cell.read(view)
    }

    #[must_use]
    pub fn session(&self) -> Option<User> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.sync.status()
    }

    #[must_use]
    pub fn recent_conflicts(&self) -> Vec<MergeConflict> {
        self.sync.recent_conflicts()
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.sync.settings().poll_interval
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poller_slot()
            .as_ref()
            .is_some_and(|poller| !poller.is_finished())
    }

    /// Check credentials, persist the session and pull once before returning.
    ///
    /// Admin sessions with a sync code also start the periodic pull.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        sync_code: Option<&str>,
    ) -> Result<Login> {
        let user = authenticate(username, password, sync_code)?;
        self.stop_polling();
        self.cell.store().save_session(&user);
        self.cell.set_sync_code(user.sync_code().map(str::to_string));
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        tracing::info!(username = %user.username, role = %user.role, "Logged in");

        let sync = self.sync.pull(user.sync_code(), &self.cell).await;
        self.resume_polling();
        Ok(Login { user, sync })
    }

    /// Start the periodic pull for a restored admin session.
    ///
    /// Returns whether a poller is running afterwards. Must be called from
    /// within a Tokio runtime.
    pub fn resume_polling(&self) -> bool {
        let Some(user) = self.session() else {
            return false;
        };
        let Some(code) = user.sync_code().filter(|_| user.polls_remote()) else {
            return false;
        };

        let mut slot = self.poller_slot();
        if slot.as_ref().is_some_and(|poller| !poller.is_finished()) {
            return true;
        }
        *slot = Some(
            self.sync
                .start_polling(code.to_string(), Arc::clone(&self.cell)),
        );
        true
    }

    /// End the session. Local data stays; only the session is cleared.
    pub fn logout(&self) {
        self.stop_polling();
        self.cell.store().clear_session();
        self.cell.store().save_conflicts(&[]);
        self.sync.reset();
        let previous = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(user) = previous {
            tracing::info!(username = %user.username, "Logged out");
        }
    }

    /// Pull and merge now.
    pub async fn sync_now(&self) -> SyncOutcome {
        self.sync.pull(self.sync_code().as_deref(), &self.cell).await
    }

    /// Push the current state now and wait for the result.
    pub async fn push_now(&self) -> SyncOutcome {
        self.sync
            .push(self.sync_code().as_deref(), self.cell.snapshot(), &self.cell)
            .await
    }

    /// Stop polling and wait for background pushes to finish.
    pub async fn shutdown(&self) {
        self.stop_polling();
        self.sync.drain().await;
    }

    pub fn create_club(&self, name: &str, description: &str) -> Result<Club> {
        let club = Club::new(name, description);
        self.commit(|state| {
            state.create_club(club.clone())?;
            Ok(club)
        })
    }

    pub fn update_club(&self, club_id: &str, name: &str, description: &str) -> Result<()> {
        self.commit(|state| state.update_club(club_id, name, description))
    }

    pub fn delete_club(&self, club_id: &str) -> Result<Club> {
        self.commit(|state| state.delete_club(club_id))
    }

    pub fn add_member(&self, club_id: &str, member: Member) -> Result<Member> {
        self.commit(|state| {
            state.add_member(club_id, member.clone())?;
            Ok(member)
        })
    }

    pub fn update_member(
        &self,
        club_id: &str,
        member_id: &str,
        update: &MemberUpdate,
    ) -> Result<()> {
        self.commit(|state| state.update_member(club_id, member_id, update))
    }

    pub fn delete_member(&self, club_id: &str, member_id: &str) -> Result<Member> {
        self.commit(|state| state.delete_member(club_id, member_id))
    }

    /// Save the bulk roster editor.
    pub fn replace_roster(&self, rows: Vec<RosterRow>) -> Result<()> {
        self.commit(|state| state.replace_roster(rows))
    }

    pub fn save_attendance(&self, record: AttendanceRecord) -> Result<AttendanceRecord> {
        let now = unix_millis_now();
        self.commit(|state| state.save_attendance(record, now))
    }

    pub fn set_leave(&self, leave: LeaveRecord) -> Result<LeaveRecord> {
        self.commit(|state| {
            state.set_leave(leave.clone())?;
            Ok(leave)
        })
    }

    pub fn cancel_leave(&self, leave_id: &str) -> Result<LeaveRecord> {
        let now = unix_millis_now();
        self.commit(|state| state.cancel_leave(leave_id, now))
    }

    #[must_use]
    pub fn effective_status(
        &self,
        club_id: &str,
        member_id: &str,
        date: NaiveDate,
    ) -> Option<AttendanceStatus> {
        self.read(|state| state.effective_status(club_id, member_id, date))
    }

    pub fn roll_call_draft(
        &self,
        club_id: &str,
        date: NaiveDate,
    ) -> Result<BTreeMap<String, AttendanceStatus>> {
        self.read(|state| state.roll_call_draft(club_id, date))
    }

    #[must_use]
    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        self.read(|state| state.daily_summary(date))
    }

    #[must_use]
    pub fn leave_for(&self, member_id: &str, date: NaiveDate) -> Option<LeaveRecord> {
        self.read(|state| state.leave_for(member_id, date).cloned())
    }

    #[must_use]
    pub fn attendance_for(&self, club_id: &str, date: NaiveDate) -> Option<AttendanceRecord> {
        self.read(|state| state.attendance_for(club_id, date).cloned())
    }

    fn commit<R>(&self, transition: impl FnOnce(&mut AppState) -> Result<R>) -> Result<R> {
        let (value, committed) = self.cell.mutate(transition)?;
        self.sync
            .spawn_push(self.sync_code(), committed, Arc::clone(&self.cell));
        Ok(value)
    }

    fn sync_code(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(User::sync_code)
            .map(str::to_string)
    }

    fn stop_polling(&self) {
        if let Some(poller) = self.poller_slot().take() {
            poller.abort();
            tracing::debug!("Stopped remote polling");
        }
    }

    fn poller_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ClubRoll {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::default_dataset;
    use crate::storage::MemoryStore;
    use crate::sync::MemoryTransport;
    use crate::Error;

    const CODE: &str = "SFJH-2025";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn service(store: &MemoryStore, remote: &MemoryTransport) -> ClubRoll {
        ClubRoll::open(
            Arc::new(store.clone()),
            Arc::new(remote.clone()),
            SyncSettings::default(),
        )
    }

    #[tokio::test]
    async fn login_persists_session_and_initializes_remote() {
        let store = MemoryStore::new();
        let remote = MemoryTransport::new();
        let roll = service(&store, &remote);

        let login = roll.login("admin", "admin123", Some(CODE)).await.unwrap();
        assert_eq!(login.sync, SyncOutcome::Initialized);
        assert_eq!(store.load_session(), Some(login.user));
        assert_eq!(remote.stored(CODE).unwrap().clubs.len(), 3);
        assert!(roll.is_polling());

        roll.logout();
        assert!(!roll.is_polling());
        assert_eq!(roll.session(), None);
        assert_eq!(store.load_session(), None);
        assert_eq!(roll.state().clubs.len(), 3);
    }

    #[tokio::test]
    async fn bad_credentials_change_nothing() {
        let store = MemoryStore::new();
        let roll = service(&store, &MemoryTransport::new());
        assert!(matches!(
            roll.login("admin", "nope", Some(CODE)).await,
            Err(Error::InvalidCredentials)
        ));
        assert_eq!(roll.session(), None);
        assert_eq!(store.load_session(), None);
    }

    #[tokio::test]
    async fn local_only_session_never_touches_remote() {
        let store = MemoryStore::new();
        let remote = MemoryTransport::new();
        let roll = service(&store, &remote);

        let login = roll.login("t1", "club123", Some("  ")).await.unwrap();
        assert_eq!(login.sync, SyncOutcome::Disabled);
        assert!(!roll.is_polling());

        roll.create_club("Robotics", "").unwrap();
        roll.shutdown().await;
        assert_eq!(remote.push_count(), 0);
        assert_eq!(store.load_state().clubs.len(), 4);
    }

    #[tokio::test]
    async fn teacher_session_does_not_poll() {
        let roll = service(&MemoryStore::new(), &MemoryTransport::new());
        roll.login("t2", "club123", Some(CODE)).await.unwrap();
        assert!(!roll.is_polling());
        assert!(!roll.resume_polling());
    }

    #[tokio::test]
    async fn mutations_persist_and_push() {
        let store = MemoryStore::new();
        let remote = MemoryTransport::new();
        let roll = service(&store, &remote);
        roll.login("admin", "admin123", Some(CODE)).await.unwrap();

        let club = roll.create_club("Chess", "Board games").unwrap();
        roll.shutdown().await;
        let member = roll
            .add_member(&club.id, Member::new("Amy", None, "801"))
            .unwrap();
        roll.shutdown().await;

        let stored = remote.stored(CODE).unwrap();
        let pushed = stored.club(&club.id).unwrap();
        assert_eq!(pushed.members, vec![member.clone()]);
        assert_eq!(store.load_state().club(&club.id).unwrap().members.len(), 1);

        assert!(matches!(
            roll.delete_club(&club.id),
            Err(Error::ClubHasMembers { count: 1, .. })
        ));
        roll.delete_member(&club.id, &member.id).unwrap();
        roll.shutdown().await;
        roll.delete_club(&club.id).unwrap();
        roll.shutdown().await;
        assert!(remote.stored(CODE).unwrap().club(&club.id).is_none());
    }

    #[tokio::test]
    async fn leave_flow_excuses_and_restores() {
        let store = MemoryStore::with_state(&default_dataset());
        let roll = service(&store, &MemoryTransport::new());
        let (club_id, member_id) = roll.read(|state| {
            let club = &state.clubs[0];
            (club.id.clone(), club.members[0].id.clone())
        });

        let leave = roll
            .set_leave(LeaveRecord::new(&member_id, "Wang Ming", date(), "sick"))
            .unwrap();
        let draft = roll.roll_call_draft(&club_id, date()).unwrap();
        assert_eq!(draft.get(&member_id), Some(&AttendanceStatus::Excused));

        let mut records = draft;
        records.insert(member_id.clone(), AttendanceStatus::Present);
        let saved = roll
            .save_attendance(AttendanceRecord::new(&club_id, date(), records))
            .unwrap();
        assert_eq!(saved.records.get(&member_id), Some(&AttendanceStatus::Excused));
        assert_eq!(
            roll.effective_status(&club_id, &member_id, date()),
            Some(AttendanceStatus::Excused)
        );
        assert_eq!(roll.daily_summary(date()).excused, 1);

        roll.cancel_leave(&leave.id).unwrap();
        assert_eq!(roll.leave_for(&member_id, date()), None);
        let record = roll.attendance_for(&club_id, date()).unwrap();
        assert_eq!(
            record.records.get(&member_id),
            Some(&AttendanceStatus::Present)
        );
    }

    #[tokio::test]
    async fn sync_now_merges_other_clients_work() {
        let remote = MemoryTransport::new();
        let first = service(&MemoryStore::new(), &remote);
        let second = service(&MemoryStore::new(), &remote);
        first.login("admin", "admin123", Some(CODE)).await.unwrap();
        second.login("t1", "club123", Some(CODE)).await.unwrap();

        let club_id = first.read(|state| state.clubs[0].id.clone());
        let draft = second.roll_call_draft(&club_id, date()).unwrap();
        second
            .save_attendance(AttendanceRecord::new(&club_id, date(), draft))
            .unwrap();
        second.shutdown().await;

        let SyncOutcome::Merged(report) = first.sync_now().await else {
            panic!("expected a merge");
        };
        assert_eq!(report.appended, 1);
        assert!(first.attendance_for(&club_id, date()).is_some());
        assert_eq!(first.sync_state(), SyncState::Synced);
    }

    #[tokio::test]
    async fn push_now_reports_failure_without_losing_data() {
        let store = MemoryStore::new();
        let remote = MemoryTransport::new();
        let roll = service(&store, &remote);
        roll.login("admin", "admin123", Some(CODE)).await.unwrap();

        remote.set_offline(true);
        roll.create_club("Band", "").unwrap();
        roll.shutdown().await;
        assert!(matches!(roll.push_now().await, SyncOutcome::Failed(_)));
        assert_eq!(roll.sync_state(), SyncState::Error);
        assert_eq!(store.load_state().clubs.len(), 4);

        remote.set_offline(false);
        assert_eq!(roll.push_now().await, SyncOutcome::Pushed);
        assert_eq!(remote.stored(CODE).unwrap().clubs.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn restored_admin_session_resumes_polling() {
        let store = MemoryStore::new();
        let remote = MemoryTransport::new();
        {
            let roll = service(&store, &remote);
            roll.login("admin", "admin123", Some(CODE)).await.unwrap();
        }

        let mut theirs = remote.stored(CODE).unwrap();
        theirs.clubs.truncate(1);
        remote.push(CODE, &theirs).await.unwrap();

        let roll = service(&store, &remote);
        assert!(roll.session().is_some_and(|user| user.is_admin()));
        assert!(roll.resume_polling());
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(roll.state().clubs.len(), 1);
    }
}
