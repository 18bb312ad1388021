use std::sync::Arc;

use async_trait::async_trait;
use time::Date;
use tokio::sync::Mutex;

use super::{
    elapsed::{aggregate_today, compute_base_hours},
    find_resumable,
};
use crate::domain::{
    events::{EventTx, TimerEvent},
    models::{
        stopped_entry_seconds, DailyTotals, ProjectId, RunningTimerView, SessionIdentity,
        StartTimerRequest, TaskId, TimeEntry, TimerSnapshot, UserId,
    },
    ports::{
        inbound::TimerService,
        outbound::{
            load, save, Clock, KeyValueStore, SystemClock, TimeTrackingClient, ACTIVE_TIMER_KEY,
        },
    },
    TimeTrackingError,
};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// A timer started elsewhere is now tracked locally.
    Adopted(TimeEntry),
    /// The tracked timer was stopped elsewhere.
    Stopped { previous: TimeEntry },
    /// Another timer replaced the tracked one.
    Switched {
        previous: TimeEntry,
        current: TimeEntry,
    },
    /// Same timer; notes or names changed.
    Refreshed(TimeEntry),
    InSync,
    /// The principal is unknown, so nothing is attributed to this session.
    Unattributable { cleared: bool },
    /// A start or stop completed while the entries were being fetched.
    Stale,
    Failed(TimeTrackingError),
}

/// Coarse summary of a [`ReconcileOutcome`] for display and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Changed,
    Stopped,
    Updated,
    None,
    Error,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Stopped => "stopped",
            Self::Updated => "updated",
            Self::None => "none",
            Self::Error => "error",
        }
    }
}

impl ReconcileOutcome {
    pub fn action(&self) -> SyncAction {
        match self {
            Self::Adopted(_) | Self::Switched { .. } => SyncAction::Changed,
            Self::Stopped { .. } | Self::Unattributable { cleared: true } => SyncAction::Stopped,
            Self::Refreshed(_) => SyncAction::Updated,
            Self::InSync | Self::Stale | Self::Unattributable { cleared: false } => {
                SyncAction::None
            }
            Self::Failed(_) => SyncAction::Error,
        }
    }
}

/// Owns the session's [`RunningTimerView`] and keeps it aligned with the provider.
///
/// `start`, `stop`, `update_notes` and the apply phase of `reconcile` all run
/// under one async mutex, so a poll never interleaves with a user action.
/// Reconcile fetches without holding the lock and discards its result when a
/// transition happened in the meantime.
pub struct TimerReconciler<C, S> {
    client: Arc<C>,
    store: Arc<S>,
    identity: Arc<SessionIdentity>,
    clock: Arc<dyn Clock>,
    events: Option<EventTx>,
    view: Mutex<RunningTimerView>,
}

impl<C, S> TimerReconciler<C, S>
where
    C: TimeTrackingClient,
    S: KeyValueStore,
{
    pub fn new(client: Arc<C>, store: Arc<S>, identity: Arc<SessionIdentity>) -> Self {
        Self {
            client,
            store,
            identity,
            clock: Arc::new(SystemClock),
            events: None,
            view: Mutex::new(RunningTimerView::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, events: EventTx) -> Self {
        self.events = Some(events);
        self
    }

    fn today_range(&self) -> (Date, Date) {
        let today = self.clock.today();
        (today, today)
    }

    async fn fetch_today(&self, user_id: UserId) -> Result<Vec<TimeEntry>, TimeTrackingError> {
        self.client
            .list_entries(self.today_range(), Some(user_id))
            .await
    }

    fn require_user(&self) -> Result<UserId, TimeTrackingError> {
        self.identity
            .user_id()
            .ok_or_else(|| TimeTrackingError::Unauthorized("identity not validated".to_string()))
    }

    fn notify(&self, event: TimerEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                tracing::debug!("No timer event listener");
            }
        }
    }

    /// Write or clear the snapshot. Failures are logged only.
    async fn persist(&self, view: &RunningTimerView) {
        let result = match view.to_snapshot() {
            Some(snapshot) => save(&*self.store, ACTIVE_TIMER_KEY, &snapshot).await,
            None => self.store.remove(&[ACTIVE_TIMER_KEY]).await,
        };
        if let Err(e) = result {
            tracing::warn!("Failed to persist timer snapshot: {}", e);
        }
    }

    async fn enter_running(&self, view: &mut RunningTimerView, entry: TimeEntry) {
        let now = self.clock.now();
        let segment_started_at = entry.segment_start().unwrap_or(now);
        let base_hours = compute_base_hours(entry.hours, segment_started_at, now);
        tracing::debug!(
            "Tracking entry {}: hours_at_fetch={:.4} base_hours={:.4}",
            entry.id,
            entry.hours,
            base_hours
        );

        view.begin(entry.clone(), segment_started_at, base_hours, now);
        self.persist(view).await;
        self.notify(TimerEvent::Started(entry));
    }

    async fn enter_idle(&self, view: &mut RunningTimerView, final_seconds: u64) -> Option<TimeEntry> {
        let previous = view.end(final_seconds);
        self.persist(view).await;
        self.notify(TimerEvent::Stopped);
        previous
    }

    /// Stop the running timer remotely, then go Idle. State is untouched on error.
    async fn stop_locked(
        &self,
        view: &mut RunningTimerView,
    ) -> Result<Option<TimeEntry>, TimeTrackingError> {
        let Some(entry) = view.entry().cloned() else {
            return Ok(None);
        };

        let final_seconds = view.display_seconds(self.clock.now());
        let stopped = self.client.stop_entry(entry.id).await.map_err(|e| {
            tracing::error!("Failed to stop entry {}: {}", entry.id, e);
            e
        })?;

        self.enter_idle(view, final_seconds).await;
        tracing::info!("Stopped entry {} at {}s", entry.id, final_seconds);
        Ok(Some(stopped))
    }

    /// Restart today's matching stopped entry, if any. Failures fall back to `None`.
    async fn try_resume(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        notes: &str,
    ) -> Option<TimeEntry> {
        // Without a known principal, today's list may hold a teammate's entries.
        let user_id = self.identity.user_id()?;

        let entries = match self.fetch_today(user_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Resume lookup failed, creating a new entry: {}", e);
                return None;
            }
        };

        let candidate = find_resumable(&entries, project_id, task_id, notes)?;
        tracing::info!("Resuming existing entry {} instead of creating one", candidate.id);
        match self.client.resume_entry(candidate.id).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Resume of entry {} failed, creating a new entry: {}", candidate.id, e);
                None
            }
        }
    }
}

#[async_trait]
impl<C, S> TimerService for TimerReconciler<C, S>
where
    C: TimeTrackingClient,
    S: KeyValueStore,
{
    async fn restore(&self) -> RunningTimerView {
        let snapshot = match load::<TimerSnapshot, _>(&*self.store, ACTIVE_TIMER_KEY).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Ignoring unreadable timer snapshot: {}", e);
                None
            }
        };

        let mut view = self.view.lock().await;
        let Some(snapshot) = snapshot else {
            return view.clone();
        };
        if view.is_running() {
            return view.clone();
        }

        let Some(user_id) = self.identity.user_id() else {
            tracing::warn!(
                "Identity unknown, not restoring entry {}",
                snapshot.entry.id
            );
            return view.clone();
        };
        if !snapshot.entry.is_owned_by(&user_id) {
            tracing::warn!(
                "Discarding snapshot of entry {} owned by user {}",
                snapshot.entry.id,
                snapshot.entry.user_id
            );
            if let Err(e) = self.store.remove(&[ACTIVE_TIMER_KEY]).await {
                tracing::warn!("Failed to clear timer snapshot: {}", e);
            }
            return view.clone();
        }

        let entry = snapshot.entry.clone();
        view.begin(
            snapshot.entry,
            snapshot.segment_started_at,
            snapshot.base_hours,
            self.clock.now(),
        );
        tracing::info!("Restored running entry {}", entry.id);
        self.notify(TimerEvent::Started(entry));
        view.clone()
    }

    async fn start(&self, request: &StartTimerRequest) -> Result<TimeEntry, TimeTrackingError> {
        let (project_id, task_id) = request.validate()?;

        let mut view = self.view.lock().await;
        if view.is_running() {
            self.stop_locked(&mut view).await?;
        }

        let entry = match self.try_resume(project_id, task_id, &request.notes).await {
            Some(entry) => entry,
            None => self
                .client
                .create_running_entry(project_id, task_id, &request.notes, self.clock.today())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create entry: {}", e);
                    e
                })?,
        };

        self.enter_running(&mut view, entry.clone()).await;
        tracing::info!("Started entry {} ({})", entry.id, entry.label());
        Ok(entry)
    }

    async fn stop(&self) -> Result<Option<TimeEntry>, TimeTrackingError> {
        let mut view = self.view.lock().await;
        self.stop_locked(&mut view).await
    }

    async fn reconcile(&self) -> ReconcileOutcome {
        let Some(user_id) = self.identity.user_id() else {
            let mut view = self.view.lock().await;
            if !view.is_running() {
                return ReconcileOutcome::Unattributable { cleared: false };
            }
            tracing::warn!("Identity unknown, clearing the local timer");
            let final_seconds = view.display_seconds(self.clock.now());
            self.enter_idle(&mut view, final_seconds).await;
            return ReconcileOutcome::Unattributable { cleared: true };
        };

        let generation = self.view.lock().await.generation();

        let entries = match self.fetch_today(user_id).await {
            Ok(entries) => entries,
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!("Reconcile fetch failed, keeping local state: {}", e);
                } else {
                    tracing::error!("Reconcile fetch failed, keeping local state: {}", e);
                }
                return ReconcileOutcome::Failed(e);
            }
        };

        let mut view = self.view.lock().await;
        if view.generation() != generation {
            tracing::debug!("Discarding stale reconcile result");
            return ReconcileOutcome::Stale;
        }

        let remote = entries
            .iter()
            .find(|e| e.is_running && e.is_owned_by(&user_id))
            .cloned();

        match (view.entry().cloned(), remote) {
            (None, None) => ReconcileOutcome::InSync,
            (None, Some(remote)) => {
                tracing::info!("Adopting entry {} started elsewhere", remote.id);
                self.enter_running(&mut view, remote.clone()).await;
                ReconcileOutcome::Adopted(remote)
            }
            (Some(local), None) => {
                let final_seconds = entries
                    .iter()
                    .find(|e| e.id == local.id)
                    .map(stopped_entry_seconds)
                    .unwrap_or_else(|| view.display_seconds(self.clock.now()));
                tracing::info!("Entry {} was stopped elsewhere", local.id);
                self.enter_idle(&mut view, final_seconds).await;
                ReconcileOutcome::Stopped { previous: local }
            }
            (Some(local), Some(remote)) if local.id != remote.id => {
                tracing::info!("Switching from entry {} to {}", local.id, remote.id);
                let final_seconds = view.display_seconds(self.clock.now());
                self.enter_idle(&mut view, final_seconds).await;
                self.enter_running(&mut view, remote.clone()).await;
                ReconcileOutcome::Switched {
                    previous: local,
                    current: remote,
                }
            }
            (Some(local), Some(remote)) => {
                if !local.display_differs(&remote) {
                    return ReconcileOutcome::InSync;
                }
                view.refresh_entry(remote.clone());
                self.persist(&view).await;
                ReconcileOutcome::Refreshed(remote)
            }
        }
    }

    async fn update_notes(&self, notes: &str) -> Result<Option<TimeEntry>, TimeTrackingError> {
        let mut view = self.view.lock().await;
        let Some(entry) = view.entry().cloned() else {
            return Ok(None);
        };

        let updated = self.client.update_notes(entry.id, notes).await?;
        view.refresh_entry(updated.clone());
        view.touch();
        self.persist(&view).await;
        Ok(Some(updated))
    }

    async fn status(&self) -> RunningTimerView {
        self.view.lock().await.clone()
    }

    async fn tick(&self) -> u64 {
        self.view.lock().await.tick(self.clock.now())
    }

    async fn daily_totals(&self) -> Result<DailyTotals, TimeTrackingError> {
        let user_id = self.require_user()?;
        let entries = self.fetch_today(user_id).await?;

        let view = self.view.lock().await;
        let live = view.display_seconds(self.clock.now());
        Ok(aggregate_today(
            &entries,
            self.clock.today(),
            view.entry().map(|e| e.id),
            live,
        ))
    }

    async fn today_entries(&self) -> Result<Vec<TimeEntry>, TimeTrackingError> {
        let user_id = self.require_user()?;
        let mut entries = self.fetch_today(user_id).await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}
