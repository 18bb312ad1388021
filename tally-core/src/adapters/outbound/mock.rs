//! In-memory test doubles for the outbound ports.
//!
//! `MockTimeTrackingClient` behaves like a tiny Harvest: it keeps entries,
//! accrues hours on the running one from a shared [`ManualClock`], and stops
//! the previous timer when a new one starts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use time::{Date, Duration, OffsetDateTime, UtcOffset};
use tokio::sync::Notify;

use crate::domain::{
    models::{AuthenticatedUser, EntryId, Project, ProjectId, Task, TaskId, TimeEntry, UserId},
    ports::outbound::{
        Clock, KeyValueStore, ObserverError, StoreError, TimeTrackingClient, TimerObserver,
    },
    TimeTrackingError,
};

/// Clock whose time only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
    offset: UtcOffset,
}

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
            offset: UtcOffset::UTC,
        }
    }

    /// Use `offset` as the local time zone for civil dates.
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }

    fn local_date(&self, at: OffsetDateTime) -> Date {
        at.to_offset(self.offset).date()
    }
}

/// Which client operation a call or an injected failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    List,
    Create,
    Stop,
    Resume,
    UpdateNotes,
    Me,
    Projects,
    Tasks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    List { user_id: Option<UserId> },
    Create { project_id: ProjectId, task_id: TaskId, spent_date: Date },
    Stop(EntryId),
    Resume(EntryId),
    UpdateNotes(EntryId),
    Me,
    Projects,
    Tasks(ProjectId),
}

impl MockCall {
    fn op(&self) -> MockOp {
        match self {
            Self::List { .. } => MockOp::List,
            Self::Create { .. } => MockOp::Create,
            Self::Stop(_) => MockOp::Stop,
            Self::Resume(_) => MockOp::Resume,
            Self::UpdateNotes(_) => MockOp::UpdateNotes,
            Self::Me => MockOp::Me,
            Self::Projects => MockOp::Projects,
            Self::Tasks(_) => MockOp::Tasks,
        }
    }
}

#[derive(Default)]
struct MockState {
    /// Stored `hours` exclude the running segment; it is added on read.
    entries: Vec<TimeEntry>,
    calls: Vec<MockCall>,
    failures: HashMap<MockOp, TimeTrackingError>,
    user: Option<AuthenticatedUser>,
    projects: Vec<Project>,
    tasks: HashMap<ProjectId, Vec<Task>>,
    next_id: u64,
}

/// In-memory time tracking provider.
///
/// # Example
///
/// ```ignore
/// let clock = Arc::new(ManualClock::new(datetime!(2025-09-18 09:00 UTC)));
/// let client = MockTimeTrackingClient::new(clock.clone())
///     .with_user(AuthenticatedUser::new(7, "Ada"))
///     .with_entry(TimeEntry::new(1, 7, date!(2025 - 09 - 18)).with_hours(1.0));
/// ```
pub struct MockTimeTrackingClient {
    state: Mutex<MockState>,
    clock: Arc<ManualClock>,
    list_gate: Option<Arc<Notify>>,
    task_gate: Option<Arc<Notify>>,
}

impl MockTimeTrackingClient {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 1000,
                ..Default::default()
            }),
            clock,
            list_gate: None,
            task_gate: None,
        }
    }

    pub fn with_user(self, user: AuthenticatedUser) -> Self {
        self.state.lock().unwrap().user = Some(user);
        self
    }

    pub fn with_entry(self, entry: TimeEntry) -> Self {
        self.insert_entry(entry);
        self
    }

    pub fn with_projects(self, projects: Vec<Project>) -> Self {
        self.state.lock().unwrap().projects = projects;
        self
    }

    pub fn with_tasks(self, project_id: ProjectId, tasks: Vec<Task>) -> Self {
        self.state.lock().unwrap().tasks.insert(project_id, tasks);
        self
    }

    /// `list_entries` waits on the gate after taking its snapshot of entries.
    pub fn with_list_gate(mut self, gate: Arc<Notify>) -> Self {
        self.list_gate = Some(gate);
        self
    }

    /// `get_task_assignments` waits on the gate after recording the call.
    pub fn with_task_gate(mut self, gate: Arc<Notify>) -> Self {
        self.task_gate = Some(gate);
        self
    }

    /// Add an entry as if created by another client. `hours` are banked hours.
    pub fn insert_entry(&self, entry: TimeEntry) {
        self.state.lock().unwrap().entries.push(entry);
    }

    /// Stop an entry as if from the Harvest web UI.
    pub fn stop_externally(&self, id: EntryId) {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.entries.iter_mut().find(|e| e.id == id) {
            bank_running_segment(entry, now);
        }
    }

    pub fn fail_on(&self, op: MockOp, error: TimeTrackingError) {
        self.state.lock().unwrap().failures.insert(op, error);
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: MockOp) -> usize {
        self.calls().iter().filter(|c| c.op() == op).count()
    }

    /// Entries as the provider would report them right now.
    pub fn entries(&self) -> Vec<TimeEntry> {
        let now = self.clock.now();
        let state = self.state.lock().unwrap();
        state.entries.iter().map(|e| reported(e, now)).collect()
    }

    pub fn entry(&self, id: EntryId) -> Option<TimeEntry> {
        self.entries().into_iter().find(|e| e.id == id)
    }

    pub fn running_entries(&self) -> Vec<TimeEntry> {
        self.entries().into_iter().filter(|e| e.is_running).collect()
    }

    fn record(&self, call: MockCall) -> Result<(), TimeTrackingError> {
        let mut state = self.state.lock().unwrap();
        let op = call.op();
        state.calls.push(call);
        match state.failures.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn not_found(id: EntryId) -> TimeTrackingError {
        TimeTrackingError::NotFound(format!("time entry {}", id))
    }
}

fn reported(entry: &TimeEntry, now: OffsetDateTime) -> TimeEntry {
    let mut entry = entry.clone();
    if let (true, Some(started)) = (entry.is_running, entry.timer_started_at) {
        entry.hours += (now - started).as_seconds_f64().max(0.0) / 3600.0;
    }
    entry
}

fn bank_running_segment(entry: &mut TimeEntry, now: OffsetDateTime) {
    if entry.is_running {
        entry.hours = reported(entry, now).hours;
        entry.is_running = false;
        entry.timer_started_at = None;
    }
}

#[async_trait]
impl TimeTrackingClient for MockTimeTrackingClient {
    async fn list_entries(
        &self,
        date_range: (Date, Date),
        user_id: Option<UserId>,
    ) -> Result<Vec<TimeEntry>, TimeTrackingError> {
        self.record(MockCall::List { user_id })?;
        let entries: Vec<_> = self
            .entries()
            .into_iter()
            .filter(|e| e.date >= date_range.0 && e.date <= date_range.1)
            .filter(|e| user_id.map_or(true, |id| e.user_id == id))
            .collect();

        // Response is already "in flight" while the gate is closed.
        if let Some(gate) = &self.list_gate {
            gate.notified().await;
        }
        Ok(entries)
    }

    async fn create_running_entry(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        notes: &str,
        spent_date: Date,
    ) -> Result<TimeEntry, TimeTrackingError> {
        self.record(MockCall::Create {
            project_id,
            task_id,
            spent_date,
        })?;

        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        let user_id = state.user.as_ref().map_or(0, |u| u.id.as_u64());
        for entry in state.entries.iter_mut().filter(|e| e.user_id.as_u64() == user_id) {
            bank_running_segment(entry, now);
        }

        state.next_id += 1;
        let entry = TimeEntry::new(state.next_id, user_id, spent_date)
            .with_project(project_id.as_u64(), format!("Project {}", project_id))
            .with_task(task_id.as_u64(), format!("Task {}", task_id))
            .with_notes(notes)
            .with_created_at(now)
            .running_since(now);
        state.entries.push(entry.clone());
        Ok(entry)
    }

    async fn stop_entry(&self, entry_id: EntryId) -> Result<TimeEntry, TimeTrackingError> {
        self.record(MockCall::Stop(entry_id))?;

        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| Self::not_found(entry_id))?;
        bank_running_segment(entry, now);
        Ok(entry.clone())
    }

    async fn resume_entry(&self, entry_id: EntryId) -> Result<TimeEntry, TimeTrackingError> {
        self.record(MockCall::Resume(entry_id))?;

        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        let user_id = state
            .entries
            .iter()
            .find(|e| e.id == entry_id)
            .map(|e| e.user_id)
            .ok_or_else(|| Self::not_found(entry_id))?;
        for entry in state.entries.iter_mut().filter(|e| e.user_id == user_id) {
            bank_running_segment(entry, now);
        }

        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| Self::not_found(entry_id))?;
        entry.is_running = true;
        entry.timer_started_at = Some(now);
        Ok(entry.clone())
    }

    async fn update_notes(
        &self,
        entry_id: EntryId,
        notes: &str,
    ) -> Result<TimeEntry, TimeTrackingError> {
        self.record(MockCall::UpdateNotes(entry_id))?;

        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| Self::not_found(entry_id))?;
        entry.notes = notes.to_string();
        Ok(reported(entry, now))
    }

    async fn get_authenticated_user(&self) -> Result<AuthenticatedUser, TimeTrackingError> {
        self.record(MockCall::Me)?;
        self.state
            .lock()
            .unwrap()
            .user
            .clone()
            .ok_or_else(|| TimeTrackingError::Unauthorized("no user".to_string()))
    }

    async fn get_projects(&self) -> Result<Vec<Project>, TimeTrackingError> {
        self.record(MockCall::Projects)?;
        Ok(self.state.lock().unwrap().projects.clone())
    }

    async fn get_task_assignments(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Task>, TimeTrackingError> {
        self.record(MockCall::Tasks(project_id))?;
        if let Some(gate) = &self.task_gate {
            gate.notified().await;
        }

        Ok(self
            .state
            .lock()
            .unwrap()
            .tasks
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Key-value store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `set`/`remove` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().unwrap().contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        let values = self.values.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|k| values.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, values: HashMap<String, Value>) -> Result<(), StoreError> {
        self.check_writable()?;
        self.values.lock().unwrap().extend(values);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut values = self.values.lock().unwrap();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Started(u64),
    Stopped,
}

/// Observer that records every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
    fail: bool,
}

impl RecordingObserver {
    /// Records events, then reports failure for each.
    pub fn failing() -> Self {
        Self {
            events: Mutex::default(),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: ObservedEvent) -> Result<(), ObserverError> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            return Err(ObserverError("recording observer set to fail".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TimerObserver for RecordingObserver {
    async fn on_timer_started(&self, entry: &TimeEntry) -> Result<(), ObserverError> {
        self.push(ObservedEvent::Started(entry.id.as_u64()))
    }

    async fn on_timer_stopped(&self) -> Result<(), ObserverError> {
        self.push(ObservedEvent::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[tokio::test]
    async fn running_entry_accrues_hours_and_banks_on_stop() {
        let clock = Arc::new(ManualClock::new(datetime!(2025-09-18 09:00 UTC)));
        let client = MockTimeTrackingClient::new(clock.clone())
            .with_user(AuthenticatedUser::new(7, "Ada"));

        let entry = client
            .create_running_entry(ProjectId::new(1), TaskId::new(2), "", date!(2025 - 09 - 18))
            .await
            .unwrap();
        clock.advance(Duration::minutes(30));
        assert!((client.entry(entry.id).unwrap().hours - 0.5).abs() < 1e-9);

        let stopped = client.stop_entry(entry.id).await.unwrap();
        clock.advance(Duration::minutes(30));
        assert!(!stopped.is_running);
        assert!((client.entry(entry.id).unwrap().hours - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn creating_stops_the_previous_timer() {
        let clock = Arc::new(ManualClock::new(datetime!(2025-09-18 09:00 UTC)));
        let client = MockTimeTrackingClient::new(clock.clone())
            .with_user(AuthenticatedUser::new(7, "Ada"));
        let today = date!(2025 - 09 - 18);

        client
            .create_running_entry(ProjectId::new(1), TaskId::new(2), "", today)
            .await
            .unwrap();
        let second = client
            .create_running_entry(ProjectId::new(1), TaskId::new(3), "", today)
            .await
            .unwrap();

        let running = client.running_entries();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].id, second.id);
    }

    #[test]
    fn manual_clock_uses_its_offset_for_civil_dates() {
        let clock = ManualClock::new(datetime!(2025-09-18 23:30 UTC))
            .with_offset(UtcOffset::from_hms(2, 0, 0).unwrap());
        assert_eq!(clock.today(), date!(2025 - 09 - 19));
    }
}
