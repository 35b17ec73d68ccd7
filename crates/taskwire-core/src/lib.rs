//! taskwire-core - Core types, errors and credential policy for the taskwire client.
//!
//! This crate has no network code. It defines the data the client moves
//! around (tasks, push events, tokens), the error taxonomy, and the
//! [`TokenStore`] that decides whether a stored access token is still
//! usable.

pub mod account;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod store;
pub mod sync;
pub mod task;
pub mod tokens;
pub mod traits;
pub mod types;

pub use account::{LoginForm, Registration};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::Error;
pub use store::{MemoryStorage, StoredTokens, TokenStore};
pub use task::{PushEvent, Task, TaskAction, TaskChange, TaskList, TaskPage, ViewUpdate};
pub use tokens::{AccessToken, RefreshToken};
pub use traits::{LogNotifier, LogView, NotificationLevel, Notifier, TaskView, TokenStorage};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
