//! Pull/push scheduling against one remote transport.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use super::transport::{RemoteTransport, TransportError, TransportResult};
use super::{SyncOutcome, SyncState};
use crate::config::SyncSettings;
use crate::models::{AppState, MergeConflict};
use crate::services::StateCell;
use crate::util::unix_millis_now;

/// Conflicts kept for inspection; older ones are dropped first.
pub const MAX_RECENT_CONFLICTS: usize = 50;

/// Marks one kind of sync operation as in flight for as long as it lives.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs pulls and pushes for a session.
///
/// At most one pull and one push are in flight at a time; a request that
/// finds its kind busy is dropped, not queued. Failures never reach callers.
pub struct SyncCoordinator {
    transport: Arc<dyn RemoteTransport>,
    settings: SyncSettings,
    pulling: AtomicBool,
    pushing: AtomicBool,
    background: Mutex<JoinSet<()>>,
    conflicts: Mutex<VecDeque<MergeConflict>>,
    status: Mutex<SyncState>,
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SyncCoordinator")
            .field("settings", &self.settings)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl SyncCoordinator {
    pub fn new(transport: Arc<dyn RemoteTransport>, settings: SyncSettings) -> Self {
        Self {
            transport,
            settings,
            pulling: AtomicBool::new(false),
            pushing: AtomicBool::new(false),
            background: Mutex::new(JoinSet::new()),
            conflicts: Mutex::new(VecDeque::new()),
            status: Mutex::new(SyncState::Offline),
        }
    }

    /// Seed the conflict history, typically from the local store.
    #[must_use]
    pub fn with_conflicts(self, conflicts: Vec<MergeConflict>) -> Self {
        {
            let mut recent = lock(&self.conflicts);
            recent.clear();
            let skip = conflicts.len().saturating_sub(MAX_RECENT_CONFLICTS);
            recent.extend(conflicts.into_iter().skip(skip));
        }
        self
    }

    #[must_use]
    pub const fn settings(&self) -> SyncSettings {
        self.settings
    }

    #[must_use]
    pub fn status(&self) -> SyncState {
        *lock(&self.status)
    }

    /// Most recent merge conflicts, oldest first
    #[must_use]
    pub fn recent_conflicts(&self) -> Vec<MergeConflict> {
        lock(&self.conflicts).iter().cloned().collect()
    }

    /// Fetch the remote snapshot and merge it into `cell`.
    ///
    /// The merge runs against the state current when the response arrives.
    /// When the remote has nothing under `code`, local state is pushed to
    /// create it.
    pub async fn pull(&self, code: Option<&str>, cell: &StateCell) -> SyncOutcome {
        let Some(code) = code else {
            return SyncOutcome::Disabled;
        };
        let Some(_guard) = InFlight::acquire(&self.pulling) else {
            tracing::debug!("Pull already in flight; skipping");
            return SyncOutcome::Skipped;
        };

        self.set_status(SyncState::Syncing);
        match self.bounded(self.transport.pull(code)).await {
            Ok(Some(snapshot)) => {
                let report = cell.merge_remote(snapshot, unix_millis_now());
                if !report.conflicts.is_empty() {
                    self.record_conflicts(&report.conflicts);
                    cell.store().save_conflicts(&self.recent_conflicts());
                }
                self.set_status(SyncState::Synced);
                tracing::info!(
                    appended = report.appended,
                    replaced = report.replaced,
                    conflicts = report.conflicts.len(),
                    "Merged remote snapshot"
                );
                SyncOutcome::Merged(report)
            }
            Ok(None) => {
                tracing::info!("Remote has no state for this sync code; initializing it");
                match self.push(Some(code), cell.snapshot(), cell).await {
                    SyncOutcome::Pushed => SyncOutcome::Initialized,
                    other => other,
                }
            }
            Err(error) => {
                tracing::warn!("Sync pull failed: {}", error);
                self.set_status(SyncState::Error);
                SyncOutcome::Failed(error.to_string())
            }
        }
    }

    /// Replace the remote blob with `state`.
    pub async fn push(&self, code: Option<&str>, state: AppState, cell: &StateCell) -> SyncOutcome {
        let Some(code) = code else {
            return SyncOutcome::Disabled;
        };
        let Some(_guard) = InFlight::acquire(&self.pushing) else {
            tracing::debug!("Push already in flight; skipping");
            return SyncOutcome::Skipped;
        };

        self.set_status(SyncState::Syncing);
        match self.bounded(self.transport.push(code, &state)).await {
            Ok(()) => {
                cell.mark_synced(unix_millis_now());
                self.set_status(SyncState::Synced);
                tracing::info!("Pushed local state");
                SyncOutcome::Pushed
            }
            Err(error) => {
                tracing::warn!("Sync push failed: {}", error);
                self.set_status(SyncState::Error);
                SyncOutcome::Failed(error.to_string())
            }
        }
    }

    /// Push in the background; the caller never sees the result.
    ///
    /// Needs a Tokio runtime. Without one the push is skipped with a warning.
    pub fn spawn_push(self: &Arc<Self>, code: Option<String>, state: AppState, cell: Arc<StateCell>) {
        let Some(code) = code else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available; background push skipped");
            return;
        };

        let coordinator = Arc::clone(self);
        let mut background = lock(&self.background);
        while background.try_join_next().is_some() {}
        background.spawn_on(
            async move {
                coordinator.push(Some(&code), state, &cell).await;
            },
            &handle,
        );
    }

    /// Pull every poll interval until the returned task is aborted.
    ///
    /// The first pull happens one full interval after the call.
    pub fn start_polling(self: &Arc<Self>, code: String, cell: Arc<StateCell>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        let period = self.settings.poll_interval;
        tracing::info!("Polling remote every {:?}", period);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                coordinator.pull(Some(&code), &cell).await;
            }
        })
    }

    /// Wait for every background push spawned so far.
    pub async fn drain(&self) {
        let mut pending = std::mem::take(&mut *lock(&self.background));
        while let Some(result) = pending.join_next().await {
            if let Err(error) = result {
                if !error.is_cancelled() {
                    tracing::warn!("Background push task failed: {}", error);
                }
            }
        }
    }

    /// Forget conflicts and status when the session ends.
    pub fn reset(&self) {
        lock(&self.conflicts).clear();
        self.set_status(SyncState::Offline);
    }

    async fn bounded<T>(
        &self,
        request: impl Future<Output = TransportResult<T>> + Send,
    ) -> TransportResult<T> {
        match self.settings.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => request.await,
        }
    }

    fn record_conflicts(&self, conflicts: &[MergeConflict]) {
        let mut recent = lock(&self.conflicts);
        for conflict in conflicts {
            tracing::warn!(
                club_id = %conflict.club_id,
                date = %conflict.date,
                resolution = ?conflict.resolution,
                "Attendance conflict resolved by last-writer-wins"
            );
            if recent.len() == MAX_RECENT_CONFLICTS {
                recent.pop_front();
            }
            recent.push_back(conflict.clone());
        }
    }

    fn set_status(&self, status: SyncState) {
        *lock(&self.status) = status;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
