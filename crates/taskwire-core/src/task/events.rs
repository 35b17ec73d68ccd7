//! Push-channel event types.

use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::Task;

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskAction {
    /// A task was created.
    Created,
    /// A task was modified.
    Updated,
    /// A task was deleted.
    Deleted,
}

impl TaskAction {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// A task mutation pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskChange {
    pub action: TaskAction,
    pub task: Task,
}

/// A decoded push-channel envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// `{"type": "task_updated", "action": ..., "task": {...}}`
    TaskUpdated(TaskChange),

    /// `{"type": "task_notify", "message": "..."}`
    TaskNotify { message: String },

    /// An envelope with a tag this client does not handle.
    Unknown { kind: String },
}

impl PushEvent {
    /// Decode a text frame.
    ///
    /// Unrecognized tags (and unrecognized task actions) decode to
    /// [`PushEvent::Unknown`]; only frames that are not JSON objects, or
    /// recognized envelopes with missing fields, are errors.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(malformed)?;
        let envelope = value.as_object().ok_or_else(|| Error::Malformed {
            message: "push frame is not a JSON object".to_string(),
        })?;

        let kind = envelope
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or_default();

        match kind {
            "task_updated" => {
                let action = envelope
                    .get("action")
                    .and_then(|a| a.as_str())
                    .unwrap_or_default();
                let Some(action) = TaskAction::parse(action) else {
                    return Ok(PushEvent::Unknown {
                        kind: format!("task_updated:{}", action),
                    });
                };
                let task = envelope.get("task").cloned().ok_or_else(|| Error::Malformed {
                    message: "task_updated without task".to_string(),
                })?;
                let task: Task = serde_json::from_value(task).map_err(malformed)?;
                Ok(PushEvent::TaskUpdated(TaskChange { action, task }))
            }
            "task_notify" => {
                let message = envelope
                    .get("message")
                    .and_then(|m| m.as_str())
                    .ok_or_else(|| Error::Malformed {
                        message: "task_notify without message".to_string(),
                    })?;
                Ok(PushEvent::TaskNotify {
                    message: message.to_string(),
                })
            }
            other => Ok(PushEvent::Unknown {
                kind: other.to_string(),
            }),
        }
    }
}

fn malformed(err: serde_json::Error) -> Error {
    Error::Malformed {
        message: err.to_string(),
    }
}
