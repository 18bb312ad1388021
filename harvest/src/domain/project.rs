use serde::{Deserialize, Serialize};

use super::Reference;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectsPage {
    pub projects: Vec<Project>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub id: u64,
    #[serde(default)]
    pub is_active: bool,
    pub task: Reference,
}

#[derive(Debug, Deserialize)]
pub struct TaskAssignmentsPage {
    pub task_assignments: Vec<TaskAssignment>,
    #[serde(default)]
    pub next_page: Option<u32>,
}
