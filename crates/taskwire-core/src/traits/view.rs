//! Consumer of pushed task changes.

use std::sync::Mutex;

use tracing::debug;

use crate::sync::MutexExt;
use crate::task::{TaskChange, TaskList};

/// Receives task mutations from the push channel.
pub trait TaskView: Send + Sync {
    fn apply(&self, change: TaskChange);
}

/// A [`TaskView`] that only logs what it receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogView;

impl TaskView for LogView {
    fn apply(&self, change: TaskChange) {
        debug!(action = ?change.action, task_id = change.task.id, "task change");
    }
}

impl TaskView for Mutex<TaskList> {
    fn apply(&self, change: TaskChange) {
        let update = self.lock_or_recover().apply(&change);
        debug!(?update, "task list updated");
    }
}
