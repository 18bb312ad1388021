use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::{EntryId, ProjectId, TaskId, UserId};

/// A time entry as last fetched from the provider.
///
/// This is an immutable snapshot; the live timer state derived from it lives
/// in [`RunningTimerView`](super::RunningTimerView).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub project_name: String,
    pub task_id: TaskId,
    pub task_name: String,
    pub notes: String,
    /// Local civil date the entry is booked on.
    pub date: Date,
    pub is_running: bool,
    /// Accumulated hours at fetch time, including the running segment so far.
    pub hours: f64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub timer_started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl TimeEntry {
    pub fn new(id: u64, user_id: u64, date: Date) -> Self {
        Self {
            id: EntryId::new(id),
            user_id: UserId::new(user_id),
            project_id: ProjectId::new(0),
            project_name: String::new(),
            task_id: TaskId::new(0),
            task_name: String::new(),
            notes: String::new(),
            date,
            is_running: false,
            hours: 0.0,
            timer_started_at: None,
            created_at: None,
        }
    }

    pub fn with_project(mut self, id: u64, name: impl Into<String>) -> Self {
        self.project_id = ProjectId::new(id);
        self.project_name = name.into();
        self
    }

    pub fn with_task(mut self, id: u64, name: impl Into<String>) -> Self {
        self.task_id = TaskId::new(id);
        self.task_name = name.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_hours(mut self, hours: f64) -> Self {
        self.hours = hours;
        self
    }

    pub fn running_since(mut self, started_at: OffsetDateTime) -> Self {
        self.is_running = true;
        self.timer_started_at = Some(started_at);
        self
    }

    pub fn with_created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// When the current running segment began: the timer start, else creation time.
    pub fn segment_start(&self) -> Option<OffsetDateTime> {
        self.timer_started_at.or(self.created_at)
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    /// True when the fields shown to the user differ.
    pub fn display_differs(&self, other: &TimeEntry) -> bool {
        self.notes != other.notes
            || self.project_id != other.project_id
            || self.project_name != other.project_name
            || self.task_id != other.task_id
            || self.task_name != other.task_name
    }

    /// "Project / Task" label.
    pub fn label(&self) -> String {
        format!("{} / {}", self.project_name, self.task_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn segment_start_prefers_timer_start() {
        let entry = TimeEntry::new(1, 1, date!(2025 - 09 - 18))
            .with_created_at(datetime!(2025-09-18 08:00 UTC))
            .running_since(datetime!(2025-09-18 09:30 UTC));
        assert_eq!(entry.segment_start(), Some(datetime!(2025-09-18 09:30 UTC)));

        let created_only =
            TimeEntry::new(2, 1, date!(2025 - 09 - 18)).with_created_at(datetime!(2025-09-18 08:00 UTC));
        assert_eq!(created_only.segment_start(), Some(datetime!(2025-09-18 08:00 UTC)));

        assert_eq!(TimeEntry::new(3, 1, date!(2025 - 09 - 18)).segment_start(), None);
    }

    #[test]
    fn display_differs_ignores_hours() {
        let entry = TimeEntry::new(1, 1, date!(2025 - 09 - 18))
            .with_project(10, "Website")
            .with_task(20, "Design")
            .with_notes("hero banner");

        assert!(!entry.display_differs(&entry.clone().with_hours(3.0)));
        assert!(entry.display_differs(&entry.clone().with_notes("footer")));
        assert!(entry.display_differs(&entry.clone().with_task(20, "Design review")));
    }
}
