//! taskwire-http - Network client for the taskwire task service.
//!
//! The pieces, leaves first:
//!
//! - [`ApiClient`]: one HTTP request under a timeout
//! - [`TokenRefresher`]: single-flight refresh-token exchange
//! - [`SessionGate`]: hands out a usable access token
//! - [`AuthedExecutor`]: authenticated requests with one retry after a 401/403
//! - [`PushChannel`]: the reconnecting WebSocket
//!
//! [`TaskClient`] wires them together around one
//! [`TokenStore`](taskwire_core::TokenStore).

pub mod api;
mod auth;
pub mod channel;
mod client;
pub mod executor;
pub mod gate;
pub mod refresh;
mod tasks;

pub use api::{ApiClient, ApiRequest, RequestBody};
pub use auth::LoginOutput;
pub use channel::{ChannelState, PushChannel};
pub use client::{TaskClient, TaskClientBuilder};
pub use executor::AuthedExecutor;
pub use gate::SessionGate;
pub use refresh::TokenRefresher;
pub use tasks::TaskPager;
