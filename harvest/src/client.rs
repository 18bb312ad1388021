use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{
    domain::{
        ActiveFilter, CreateTimeEntryPayload, Me, Project, ProjectsPage, TaskAssignment,
        TaskAssignmentsPage, TimeEntriesPage, TimeEntry, TimeEntryFilter, UpdateNotesPayload,
    },
    Credentials, HarvestURL, API_BASE_URL, CLIENT_USER_AGENT,
};

/// Upper bound on followed `next_page` links, guards against a misbehaving server.
const MAX_PAGES: u32 = 50;

#[derive(Debug, Clone)]
pub struct HarvestClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: HarvestURL,
}

impl HarvestClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            base_url: HarvestURL::new(API_BASE_URL),
        }
    }

    /// Point the client at another API root, e.g. a local stub server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = HarvestURL::new(base_url);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn request(&self, method: Method, url: &HarvestURL) -> RequestBuilder {
        self.http
            .request(method, url.as_ref())
            .bearer_auth(&self.credentials.access_token)
            .header("Harvest-Account-Id", self.credentials.account_id.to_string())
            .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, HarvestFetchError> {
        let resp = request
            .send()
            .await
            .map_err(|e| HarvestFetchError::ResponseError(e.to_string()))?;
        let resp = check_status(resp).await?;

        resp.json::<T>().await.map_err(|e| {
            HarvestFetchError::ParsingError(format!("Failed to parse response as JSON: {}", e))
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, url: HarvestURL) -> Result<T, HarvestFetchError> {
        tracing::debug!("GET {}", url);
        self.send(self.request(Method::GET, &url)).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: HarvestURL,
        body: Option<&B>,
    ) -> Result<T, HarvestFetchError> {
        tracing::debug!("PATCH {}", url);
        let request = self.request(Method::PATCH, &url);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        self.send(request).await
    }

    pub async fn me(&self) -> Result<Me, HarvestFetchError> {
        self.fetch(self.base_url.append_path("/users/me")).await
    }

    /// All entries matching `filter`, following pagination.
    pub async fn time_entries(
        &self,
        filter: TimeEntryFilter,
    ) -> Result<Vec<TimeEntry>, HarvestFetchError> {
        let mut entries = Vec::new();
        let mut page = filter.page.unwrap_or(1);

        for _ in 0..MAX_PAGES {
            let url = self
                .base_url
                .append_path("/time_entries")
                .with_filter(&filter.clone().with_page(page));
            let response: TimeEntriesPage = self.fetch(url).await?;
            entries.extend(response.time_entries);

            match response.next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(entries)
    }

    pub async fn create_time_entry(
        &self,
        payload: &CreateTimeEntryPayload,
    ) -> Result<TimeEntry, HarvestFetchError> {
        let url = self.base_url.append_path("/time_entries");
        tracing::debug!("POST {}", url);
        self.send(self.request(Method::POST, &url).json(payload))
            .await
    }

    pub async fn stop_time_entry(&self, entry_id: u64) -> Result<TimeEntry, HarvestFetchError> {
        let url = self
            .base_url
            .append_path(&format!("/time_entries/{}/stop", entry_id));
        self.patch::<_, ()>(url, None).await
    }

    pub async fn restart_time_entry(&self, entry_id: u64) -> Result<TimeEntry, HarvestFetchError> {
        let url = self
            .base_url
            .append_path(&format!("/time_entries/{}/restart", entry_id));
        self.patch::<_, ()>(url, None).await
    }

    pub async fn update_time_entry_notes(
        &self,
        entry_id: u64,
        notes: &str,
    ) -> Result<TimeEntry, HarvestFetchError> {
        let url = self
            .base_url
            .append_path(&format!("/time_entries/{}", entry_id));
        self.patch(url, Some(&UpdateNotesPayload { notes })).await
    }

    pub async fn projects(&self) -> Result<Vec<Project>, HarvestFetchError> {
        let mut projects = Vec::new();
        let mut page = 1;

        for _ in 0..MAX_PAGES {
            let url = self
                .base_url
                .append_path("/projects")
                .with_filter(&ActiveFilter::default().with_page(page));
            let response: ProjectsPage = self.fetch(url).await?;
            projects.extend(response.projects);

            match response.next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(projects)
    }

    pub async fn task_assignments(
        &self,
        project_id: u64,
    ) -> Result<Vec<TaskAssignment>, HarvestFetchError> {
        let url = self
            .base_url
            .append_path(&format!("/projects/{}/task_assignments", project_id))
            .with_filter(&ActiveFilter::default());
        let response: TaskAssignmentsPage = self.fetch(url).await?;

        Ok(response.task_assignments)
    }
}

/// Turn non-2xx responses into errors, keeping the body for diagnostics.
pub(crate) async fn check_status(resp: Response) -> Result<Response, HarvestFetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::warn!("Harvest request failed: {} {}", status, body);
    Err(status_error(status, &body))
}

pub(crate) fn status_error(status: StatusCode, body: &str) -> HarvestFetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HarvestFetchError::Unauthorized,
        StatusCode::NOT_FOUND => HarvestFetchError::NotFound(body.to_string()),
        _ => HarvestFetchError::ResponseError(format!(
            "HTTP {}: {} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            body
        )),
    }
}

#[derive(Error, Debug)]
pub enum HarvestFetchError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("NotFound: {0}")]
    NotFound(String),
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
    #[error("InvalidCredentials: {0}")]
    InvalidCredentials(String),
}
