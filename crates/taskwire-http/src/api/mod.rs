//! REST client plumbing.
//!
//! [`ApiClient`] sends one request under the configured timeout and
//! normalizes errors; it knows nothing about sessions. Authentication and
//! retry live in [`crate::executor`].

pub(crate) mod client;
pub(crate) mod endpoints;
mod request;

pub use client::ApiClient;
pub use endpoints::TokenResponse;
pub use request::{ApiRequest, RequestBody};
