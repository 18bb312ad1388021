use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::{
    models::{ProjectId, Task},
    ports::outbound::TimeTrackingClient,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectSelection {
    Loaded(Vec<Task>),
    /// Another selection was still loading; this one was dropped.
    Ignored,
}

/// Lazily loads and caches each project's task assignments.
///
/// Only one fetch runs at a time. A selection arriving while one is
/// outstanding is ignored rather than queued.
pub struct TaskAssignmentLoader<C> {
    client: Arc<C>,
    cache: Mutex<HashMap<ProjectId, Vec<Task>>>,
    loading: AtomicBool,
}

/// Clears the loading flag when the fetch finishes or is cancelled.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: TimeTrackingClient> TaskAssignmentLoader<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
            loading: AtomicBool::new(false),
        }
    }

    pub async fn select_project(&self, project_id: ProjectId) -> ProjectSelection {
        if let Some(tasks) = self.cached(project_id) {
            return ProjectSelection::Loaded(tasks);
        }

        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Ignoring selection of project {} while loading", project_id);
            return ProjectSelection::Ignored;
        }
        let _guard = LoadingGuard(&self.loading);

        match self.client.get_task_assignments(project_id).await {
            Ok(tasks) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(project_id, tasks.clone());
                }
                ProjectSelection::Loaded(tasks)
            }
            Err(e) => {
                tracing::error!("Failed to load tasks for project {}: {}", project_id, e);
                ProjectSelection::Loaded(Vec::new())
            }
        }
    }

    pub fn cached(&self, project_id: ProjectId) -> Option<Vec<Task>> {
        self.cache.lock().ok()?.get(&project_id).cloned()
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}
