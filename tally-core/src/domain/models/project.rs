use serde::{Deserialize, Serialize};

use super::{ProjectId, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub code: Option<String>,
}

impl Project {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(id),
            name: name.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// A task assignable within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
}

impl Task {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(id),
            name: name.into(),
        }
    }
}
