use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{ProjectId, TaskId, TimeEntry};
use crate::domain::services::elapsed::{compute_elapsed_seconds, hours_to_seconds};
use crate::domain::TimeTrackingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
}

/// The session's belief about which timer is running.
///
/// Mutated only by the reconciler; everyone else reads a clone.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningTimerView {
    entry: Option<TimeEntry>,
    segment_started_at: Option<OffsetDateTime>,
    base_hours: f64,
    elapsed_seconds: u64,
    last_stopped_seconds: u64,
    generation: u64,
}

impl Default for RunningTimerView {
    fn default() -> Self {
        Self {
            entry: None,
            segment_started_at: None,
            base_hours: 0.0,
            elapsed_seconds: 0,
            last_stopped_seconds: 0,
            generation: 0,
        }
    }
}

impl RunningTimerView {
    pub fn state(&self) -> TimerState {
        if self.entry.is_some() {
            TimerState::Running
        } else {
            TimerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == TimerState::Running
    }

    pub fn entry(&self) -> Option<&TimeEntry> {
        self.entry.as_ref()
    }

    pub fn segment_started_at(&self) -> Option<OffsetDateTime> {
        self.segment_started_at
    }

    /// Hours banked before the current segment began.
    pub fn base_hours(&self) -> f64 {
        self.base_hours
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn last_stopped_seconds(&self) -> u64 {
        self.last_stopped_seconds
    }

    /// Bumped on every Idle/Running transition and on local edits.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Seconds to display right now: live while running, frozen once stopped.
    pub fn display_seconds(&self, now: OffsetDateTime) -> u64 {
        match self.segment_started_at {
            Some(start) if self.entry.is_some() => self
                .elapsed_seconds
                .max(compute_elapsed_seconds(self.base_hours, start, now)),
            _ => self.elapsed_seconds,
        }
    }

    pub(crate) fn begin(
        &mut self,
        entry: TimeEntry,
        segment_started_at: OffsetDateTime,
        base_hours: f64,
        now: OffsetDateTime,
    ) {
        let base_hours = base_hours.max(0.0);
        self.elapsed_seconds = compute_elapsed_seconds(base_hours, segment_started_at, now);
        self.entry = Some(entry);
        self.segment_started_at = Some(segment_started_at);
        self.base_hours = base_hours;
        self.generation += 1;
    }

    /// Go Idle, keeping `final_seconds` on display until the next start.
    pub(crate) fn end(&mut self, final_seconds: u64) -> Option<TimeEntry> {
        let previous = self.entry.take();
        self.segment_started_at = None;
        self.base_hours = 0.0;
        self.elapsed_seconds = final_seconds;
        self.last_stopped_seconds = final_seconds;
        self.generation += 1;
        previous
    }

    /// Swap the cached entry for a fresher copy of the same entry.
    pub(crate) fn refresh_entry(&mut self, entry: TimeEntry) {
        if self.entry.as_ref().map(|e| e.id) == Some(entry.id) {
            self.entry = Some(entry);
        }
    }

    /// Mark a local edit so in-flight fetches are treated as stale.
    pub(crate) fn touch(&mut self) {
        self.generation += 1;
    }

    /// Recompute the live total; never moves backwards while running.
    pub(crate) fn tick(&mut self, now: OffsetDateTime) -> u64 {
        self.elapsed_seconds = self.display_seconds(now);
        self.elapsed_seconds
    }

    pub(crate) fn to_snapshot(&self) -> Option<TimerSnapshot> {
        Some(TimerSnapshot {
            entry: self.entry.clone()?,
            segment_started_at: self.segment_started_at?,
            base_hours: self.base_hours,
        })
    }
}

/// What gets persisted locally so a restart can resume the display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub entry: TimeEntry,
    #[serde(with = "time::serde::rfc3339")]
    pub segment_started_at: OffsetDateTime,
    pub base_hours: f64,
}

/// Request to start (or resume) a timer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartTimerRequest {
    pub project_id: Option<ProjectId>,
    pub task_id: Option<TaskId>,
    pub notes: String,
}

impl StartTimerRequest {
    pub fn new(project_id: u64, task_id: u64) -> Self {
        Self {
            project_id: Some(ProjectId::new(project_id)),
            task_id: Some(TaskId::new(task_id)),
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn validate(&self) -> Result<(ProjectId, TaskId), TimeTrackingError> {
        let project_id = self
            .project_id
            .ok_or_else(|| TimeTrackingError::validation("a project must be selected"))?;
        let task_id = self
            .task_id
            .ok_or_else(|| TimeTrackingError::validation("a task must be selected"))?;
        Ok((project_id, task_id))
    }
}

/// Today's logged time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyTotals {
    /// Sum over today's entries other than the running one.
    pub base_seconds: u64,
    /// `base_seconds` plus the running entry's live elapsed time.
    pub total_seconds: u64,
}

impl DailyTotals {
    pub fn total_hours(&self) -> f64 {
        self.total_seconds as f64 / 3600.0
    }
}

/// Final seconds for an entry the provider reports as stopped.
pub(crate) fn stopped_entry_seconds(entry: &TimeEntry) -> u64 {
    hours_to_seconds(entry.hours)
}
