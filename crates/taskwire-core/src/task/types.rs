//! Task record and pagination types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Status label the service uses for tasks that can still be completed.
pub const STATUS_IN_PROGRESS: &str = "In Progress";

/// A user reference embedded in a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUser {
    pub id: u64,
    pub username: String,
}

/// A task as returned by the service.
///
/// Only `id` is mandatory. Fields the client does not model are kept in
/// `extra` so that re-serializing a task does not lose data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// The id of the list this task belongs to.
    #[serde(default)]
    pub list_tasks: Option<u64>,

    #[serde(default)]
    pub assigned_to: Option<TaskUser>,

    #[serde(default)]
    pub complete_before: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_completed: bool,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub list_name: Option<String>,

    #[serde(default)]
    pub assignee_name: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    /// Display title, falling back to a placeholder for unnamed tasks.
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Untitled")
    }

    /// Status label. Derived from `is_completed` when the server sent none.
    pub fn status_label(&self) -> &str {
        match self.status.as_deref() {
            Some(status) if !status.is_empty() => status,
            _ if self.is_completed => "Completed",
            _ => STATUS_IN_PROGRESS,
        }
    }

    /// Name of the assignee, if any.
    pub fn assignee(&self) -> Option<&str> {
        self.assignee_name
            .as_deref()
            .or_else(|| self.assigned_to.as_ref().map(|u| u.username.as_str()))
    }

    /// Returns true if the task can still be marked complete.
    pub fn is_completable(&self) -> bool {
        !self.is_completed && self.status_label() == STATUS_IN_PROGRESS
    }
}

/// One page of a limit/offset task listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPage {
    pub results: Vec<Task>,

    /// Link to the next page, if more tasks exist.
    #[serde(default)]
    pub next: Option<String>,

    /// Link to the previous page.
    #[serde(default)]
    pub previous: Option<String>,

    /// Total number of tasks, when the server reports it.
    #[serde(default)]
    pub count: Option<u64>,
}

impl TaskPage {
    /// Offset of the next page, parsed from the `next` link.
    pub fn next_offset(&self) -> Option<u64> {
        self.next.as_deref().and_then(next_offset)
    }
}

/// Extract the `offset` query parameter from a pagination link.
///
/// A link without an `offset` parameter points at the first page.
pub fn next_offset(link: &str) -> Option<u64> {
    let url = Url::parse(link)
        .or_else(|_| Url::parse("http://localhost").and_then(|base| base.join(link)))
        .ok()?;

    match url.query_pairs().find(|(key, _)| key == "offset") {
        Some((_, value)) => value.parse().ok(),
        None => Some(0),
    }
}
