use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::{ProjectId, TaskId, TimeEntry};

/// Issue reference embedded in notes, e.g. `#4821: Fix login`.
static ISSUE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\d+:").expect("valid regex"));

pub fn issue_token(notes: &str) -> Option<&str> {
    ISSUE_TOKEN.find(notes).map(|m| m.as_str())
}

/// Find a stopped entry a new timer should resume instead of creating a new one.
///
/// Only stopped entries on the same project and task qualify. When the notes
/// carry an issue token, an entry whose notes contain the same token wins;
/// otherwise the trimmed notes must match exactly.
///
/// This is a content-based join over free text: identical notes on different
/// work get merged, and reworded notes on the same work do not.
pub fn find_resumable<'a>(
    entries: &'a [TimeEntry],
    project_id: ProjectId,
    task_id: TaskId,
    notes: &str,
) -> Option<&'a TimeEntry> {
    let mut candidates = entries
        .iter()
        .filter(|e| !e.is_running && e.project_id == project_id && e.task_id == task_id);

    let wanted = notes.trim();
    match issue_token(wanted) {
        Some(token) => {
            let candidates: Vec<_> = candidates.collect();
            candidates
                .iter()
                .find(|e| e.notes.contains(token))
                .or_else(|| candidates.iter().find(|e| e.notes.trim() == wanted))
                .copied()
        }
        None => candidates.find(|e| e.notes.trim() == wanted),
    }
}
