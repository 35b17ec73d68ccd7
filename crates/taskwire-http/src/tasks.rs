//! Task listing, completion and pagination.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, instrument, warn};

use taskwire_core::sync::MutexExt;
use taskwire_core::task::next_offset;
use taskwire_core::{Result, Task, TaskChange, TaskList, TaskPage, TaskView, ViewUpdate};

use crate::api::endpoints::{TASKS, complete_task};
use crate::api::{ApiClient, ApiRequest};
use crate::client::TaskClient;

impl TaskClient {
    /// Fetch one page of the current user's tasks.
    #[instrument(skip(self))]
    pub async fn list_tasks(&self, limit: u32, offset: u64) -> Result<TaskPage> {
        let request = ApiRequest::get(TASKS)
            .with_query("limit", limit)
            .with_query("offset", offset);
        self.executor()
            .execute_json(&request, "Failed to load tasks")
            .await
    }

    /// Mark a task complete. The updated task arrives over the push channel.
    #[instrument(skip(self))]
    pub async fn complete_task(&self, id: u64) -> Result<()> {
        let request = ApiRequest::post(complete_task(id));
        let response = self.executor().send(&request).await?;

        if response.status().is_success() {
            debug!("task completed");
            Ok(())
        } else {
            Err(ApiClient::rejection(response, "Failed to complete task")
                .await
                .into())
        }
    }

    /// A pager over the task list using the configured page size.
    pub fn pager(&self) -> TaskPager {
        TaskPager::new(self.clone(), self.config().page_limit)
    }
}

#[derive(Debug, Default)]
struct PagerState {
    offset: u64,
    next: Option<String>,
    previous: Option<String>,
    count: Option<u64>,
    tasks: TaskList,
}

/// Accumulates pages of tasks for an infinite-scroll style view.
///
/// Only one load runs at a time; a load requested while another is
/// running returns immediately with nothing added.
pub struct TaskPager {
    client: TaskClient,
    limit: u32,
    loading: AtomicBool,
    state: Mutex<PagerState>,
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl TaskPager {
    pub fn new(client: TaskClient, limit: u32) -> Self {
        Self {
            client,
            limit: limit.max(1),
            loading: AtomicBool::new(false),
            state: Mutex::new(PagerState::default()),
        }
    }

    /// Discard loaded rows and fetch the first page.
    ///
    /// Returns how many rows were added.
    pub async fn load_initial(&self) -> Result<usize> {
        let Some(_loading) = self.begin() else {
            return Ok(0);
        };

        let page = self.client.list_tasks(self.limit, 0).await?;

        let mut state = self.state.lock_or_recover();
        state.tasks.clear();
        Ok(Self::absorb(&mut state, 0, page))
    }

    /// Fetch the page after the last one loaded.
    ///
    /// Does nothing when there is no next page.
    pub async fn load_next(&self) -> Result<usize> {
        let Some(offset) = self.next_page_offset() else {
            return Ok(0);
        };
        let Some(_loading) = self.begin() else {
            return Ok(0);
        };

        let page = self.client.list_tasks(self.limit, offset).await?;

        let mut state = self.state.lock_or_recover();
        Ok(Self::absorb(&mut state, offset, page))
    }

    /// Load the first page, then follow next links until there are none.
    ///
    /// A page that adds no new rows does not end the walk; only a missing
    /// next link or one that fails to move past the current offset does.
    pub async fn load_all(&self) -> Result<usize> {
        self.load_initial().await?;
        while let Some(next) = self.next_page_offset() {
            let current = self.offset();
            if next <= current {
                warn!(current, next, "next page does not advance, stopping");
                break;
            }
            let added = self.load_next().await?;
            if self.offset() == current {
                // another load holds the pager
                break;
            }
            debug!(offset = next, added, "task page loaded");
        }
        Ok(self.len())
    }

    pub fn has_next(&self) -> bool {
        self.next_page_offset().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock_or_recover().tasks.tasks().to_vec()
    }

    pub fn len(&self) -> usize {
        self.state.lock_or_recover().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of the last page loaded.
    pub fn offset(&self) -> u64 {
        self.state.lock_or_recover().offset
    }

    /// Total task count reported by the server.
    pub fn total(&self) -> Option<u64> {
        self.state.lock_or_recover().count
    }

    pub fn has_previous(&self) -> bool {
        self.state.lock_or_recover().previous.is_some()
    }

    /// Apply a pushed change to the loaded rows.
    pub fn apply_change(&self, change: &TaskChange) -> ViewUpdate {
        self.state.lock_or_recover().tasks.apply(change)
    }

    fn begin(&self) -> Option<LoadingGuard<'_>> {
        if self.loading.swap(true, Ordering::SeqCst) {
            debug!("task page already loading");
            return None;
        }
        Some(LoadingGuard(&self.loading))
    }

    fn next_page_offset(&self) -> Option<u64> {
        self.state
            .lock_or_recover()
            .next
            .as_deref()
            .and_then(next_offset)
    }

    fn absorb(state: &mut PagerState, offset: u64, page: TaskPage) -> usize {
        state.offset = offset;
        state.next = page.next;
        state.previous = page.previous;
        state.count = page.count.or(state.count);
        state.tasks.extend(page.results)
    }
}

impl TaskView for TaskPager {
    fn apply(&self, change: TaskChange) {
        let update = self.apply_change(&change);
        debug!(?update, "pager updated");
    }
}

impl std::fmt::Debug for TaskPager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPager")
            .field("limit", &self.limit)
            .field("loading", &self.is_loading())
            .field("state", &*self.state.lock_or_recover())
            .finish()
    }
}
