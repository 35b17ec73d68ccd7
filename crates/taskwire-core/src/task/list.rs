//! Ordered in-memory task rows.

use super::{Task, TaskAction, TaskChange};

/// What the rendering layer has to do after a change was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// Insert a row at the top.
    Prepend(Task),
    /// Insert a row at the bottom.
    Append(Task),
    /// Replace the row at this position.
    Replace { index: usize, task: Task },
    /// Remove the row with this id.
    Remove { id: u64 },
    /// Nothing to do.
    Unchanged,
}

/// Task rows in display order, unique by id.
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Append a page of tasks, skipping ids that are already present.
    ///
    /// Returns how many rows were added.
    pub fn extend(&mut self, tasks: impl IntoIterator<Item = Task>) -> usize {
        let before = self.tasks.len();
        for task in tasks {
            if self.position(task.id).is_none() {
                self.tasks.push(task);
            }
        }
        self.tasks.len() - before
    }

    /// Apply a pushed change and report the row operation it implies.
    pub fn apply(&mut self, change: &TaskChange) -> ViewUpdate {
        let task = &change.task;
        match change.action {
            TaskAction::Created => {
                if self.position(task.id).is_some() {
                    return ViewUpdate::Unchanged;
                }
                self.tasks.insert(0, task.clone());
                ViewUpdate::Prepend(task.clone())
            }
            TaskAction::Updated => match self.position(task.id) {
                Some(index) => {
                    self.tasks[index] = task.clone();
                    ViewUpdate::Replace {
                        index,
                        task: task.clone(),
                    }
                }
                None => {
                    self.tasks.push(task.clone());
                    ViewUpdate::Append(task.clone())
                }
            },
            TaskAction::Deleted => match self.position(task.id) {
                Some(index) => {
                    self.tasks.remove(index);
                    ViewUpdate::Remove { id: task.id }
                }
                None => ViewUpdate::Unchanged,
            },
        }
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }
}
