mod conversions;

use async_trait::async_trait;
use time::Date;

use crate::domain::{
    models::{AuthenticatedUser, EntryId, Project, ProjectId, Task, TaskId, TimeEntry, UserId},
    ports::outbound::TimeTrackingClient,
    TimeTrackingError,
};

use self::conversions::{
    to_domain_project, to_domain_time_entries, to_domain_time_entry, to_domain_user, to_naive_date,
};

/// Adapter that wraps the Harvest client to implement the TimeTrackingClient port.
pub struct HarvestAdapter {
    client: harvest::HarvestClient,
}

impl HarvestAdapter {
    pub fn new(credentials: harvest::Credentials) -> Self {
        Self {
            client: harvest::HarvestClient::new(credentials),
        }
    }

    pub fn from_client(client: harvest::HarvestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TimeTrackingClient for HarvestAdapter {
    async fn list_entries(
        &self,
        date_range: (Date, Date),
        user_id: Option<UserId>,
    ) -> Result<Vec<TimeEntry>, TimeTrackingError> {
        let mut filter =
            harvest::TimeEntryFilter::new(to_naive_date(date_range.0)?, to_naive_date(date_range.1)?);
        if let Some(user_id) = user_id {
            filter = filter.with_user_id(user_id.as_u64());
        }

        let entries = self
            .client
            .time_entries(filter)
            .await
            .map_err(map_harvest_error)?;

        to_domain_time_entries(entries)
    }

    async fn create_running_entry(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        notes: &str,
        spent_date: Date,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let payload = harvest::CreateTimeEntryPayload::new(
            project_id.as_u64(),
            task_id.as_u64(),
            to_naive_date(spent_date)?,
            notes,
        );
        let entry = self
            .client
            .create_time_entry(&payload)
            .await
            .map_err(map_harvest_error)?;
        to_domain_time_entry(entry)
    }

    async fn stop_entry(&self, entry_id: EntryId) -> Result<TimeEntry, TimeTrackingError> {
        let entry = self
            .client
            .stop_time_entry(entry_id.as_u64())
            .await
            .map_err(map_harvest_error)?;
        to_domain_time_entry(entry)
    }

    async fn resume_entry(&self, entry_id: EntryId) -> Result<TimeEntry, TimeTrackingError> {
        let entry = self
            .client
            .restart_time_entry(entry_id.as_u64())
            .await
            .map_err(map_harvest_error)?;
        to_domain_time_entry(entry)
    }

    async fn update_notes(
        &self,
        entry_id: EntryId,
        notes: &str,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let entry = self
            .client
            .update_time_entry_notes(entry_id.as_u64(), notes)
            .await
            .map_err(map_harvest_error)?;
        to_domain_time_entry(entry)
    }

    async fn get_authenticated_user(&self) -> Result<AuthenticatedUser, TimeTrackingError> {
        let me = self.client.me().await.map_err(map_harvest_error)?;
        Ok(to_domain_user(me))
    }

    async fn get_projects(&self) -> Result<Vec<Project>, TimeTrackingError> {
        let projects = self.client.projects().await.map_err(map_harvest_error)?;
        Ok(projects.into_iter().map(to_domain_project).collect())
    }

    async fn get_task_assignments(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Task>, TimeTrackingError> {
        let assignments = self
            .client
            .task_assignments(project_id.as_u64())
            .await
            .map_err(map_harvest_error)?;
        Ok(assignments
            .into_iter()
            .filter(|a| a.is_active)
            .map(|a| Task::new(a.task.id, a.task.name))
            .collect())
    }
}

fn map_harvest_error(e: harvest::HarvestFetchError) -> TimeTrackingError {
    match e {
        harvest::HarvestFetchError::Unauthorized => {
            TimeTrackingError::Unauthorized("Harvest rejected the access token".to_string())
        }
        harvest::HarvestFetchError::InvalidCredentials(msg) => TimeTrackingError::Unauthorized(msg),
        harvest::HarvestFetchError::NotFound(msg) => TimeTrackingError::NotFound(msg),
        harvest::HarvestFetchError::ResponseError(msg) => TimeTrackingError::Network(msg),
        harvest::HarvestFetchError::ParsingError(msg) => TimeTrackingError::unknown(msg),
    }
}
