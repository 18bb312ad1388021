use std::path::PathBuf;

use async_trait::async_trait;
use tally_core::domain::{
    models::TimeEntry,
    ports::outbound::{ObserverError, TimerObserver},
};

/// Mirrors the running timer into a small text file for status bars.
///
/// The file holds `Project / Task` while a timer runs and is empty otherwise.
pub struct StatusFileObserver {
    path: PathBuf,
}

impl StatusFileObserver {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn write(&self, content: &str) -> Result<(), ObserverError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ObserverError(e.to_string()))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| ObserverError(format!("{}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl TimerObserver for StatusFileObserver {
    async fn on_timer_started(&self, entry: &TimeEntry) -> Result<(), ObserverError> {
        self.write(&format!("{}\n", entry.label())).await
    }

    async fn on_timer_stopped(&self) -> Result<(), ObserverError> {
        self.write("").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[tokio::test]
    async fn mirrors_start_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status");
        let observer = StatusFileObserver::new(path.clone());
        let entry = TimeEntry::new(1, 7, date!(2025 - 09 - 18))
            .with_project(10, "Website")
            .with_task(20, "Design");

        observer.on_timer_started(&entry).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Website / Design\n");

        observer.on_timer_stopped().await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
