use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// `{ "id": .., "name": .. }` pair Harvest embeds for users, projects and tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub spent_date: NaiveDate,
    pub user: Reference,
    pub project: Reference,
    pub task: Reference,
    #[serde(default)]
    pub notes: Option<String>,
    /// Includes the running segment up to the moment the response was built.
    #[serde(default)]
    pub hours: Option<f64>,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub timer_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of `GET /time_entries`.
#[derive(Debug, Deserialize)]
pub struct TimeEntriesPage {
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

/// Body of `POST /time_entries`. Omitting hours makes Harvest start a timer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTimeEntryPayload {
    pub project_id: u64,
    pub task_id: u64,
    pub spent_date: NaiveDate,
    pub notes: String,
}

impl CreateTimeEntryPayload {
    pub fn new(project_id: u64, task_id: u64, spent_date: NaiveDate, notes: impl Into<String>) -> Self {
        Self {
            project_id,
            task_id,
            spent_date,
            notes: notes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateNotesPayload<'a> {
    pub notes: &'a str,
}
