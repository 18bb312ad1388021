use async_trait::async_trait;
use time::Date;

use crate::domain::{
    models::{AuthenticatedUser, EntryId, Project, ProjectId, Task, TaskId, TimeEntry, UserId},
    TimeTrackingError,
};

/// Outbound port for the time tracking provider.
///
/// The client carries its own credentials, so callers never pass tokens.
#[async_trait]
pub trait TimeTrackingClient: Send + Sync + 'static {
    /// Entries whose date falls in the inclusive range.
    ///
    /// With `user_id` set, only that user's entries are returned.
    async fn list_entries(
        &self,
        date_range: (Date, Date),
        user_id: Option<UserId>,
    ) -> Result<Vec<TimeEntry>, TimeTrackingError>;

    /// Create an entry with a running timer. `spent_date` is the local civil date.
    async fn create_running_entry(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        notes: &str,
        spent_date: Date,
    ) -> Result<TimeEntry, TimeTrackingError>;

    async fn stop_entry(&self, entry_id: EntryId) -> Result<TimeEntry, TimeTrackingError>;

    /// Restart the timer on an existing, stopped entry.
    async fn resume_entry(&self, entry_id: EntryId) -> Result<TimeEntry, TimeTrackingError>;

    async fn update_notes(
        &self,
        entry_id: EntryId,
        notes: &str,
    ) -> Result<TimeEntry, TimeTrackingError>;

    async fn get_authenticated_user(&self) -> Result<AuthenticatedUser, TimeTrackingError>;

    async fn get_projects(&self) -> Result<Vec<Project>, TimeTrackingError>;

    /// Active tasks assigned to a project.
    async fn get_task_assignments(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Task>, TimeTrackingError>;
}
