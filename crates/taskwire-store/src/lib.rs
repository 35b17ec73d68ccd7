//! taskwire-store - File-backed credential storage.
//!
//! Provides [`FileStorage`], a [`TokenStorage`](taskwire_core::TokenStorage)
//! that keeps the session's tokens in a single JSON document.

mod file;

pub use file::FileStorage;
