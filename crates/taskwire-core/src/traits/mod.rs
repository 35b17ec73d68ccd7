//! Seams between the client core and its collaborators.

mod notifier;
mod storage;
mod view;

pub use notifier::{LogNotifier, NotificationLevel, Notifier};
pub use storage::TokenStorage;
pub use view::{LogView, TaskView};
