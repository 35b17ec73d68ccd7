//! Task types, push events and the in-memory task list.
//!
//! The network operations that produce these values live in
//! `taskwire-http`; this module only describes them.

mod events;
mod list;
mod types;

pub use events::{PushEvent, TaskAction, TaskChange};
pub use list::{TaskList, ViewUpdate};
pub use types::{Task, TaskPage, TaskUser, next_offset};
