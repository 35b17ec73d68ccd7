//! Session gate: the one place that decides which token a request uses.

use tracing::{debug, warn};

use taskwire_core::{AccessToken, TokenStore};

use crate::refresh::TokenRefresher;

/// Hands out a usable access token, refreshing when the stored one is stale.
///
/// The gate never logs in; with no usable token it clears the store and
/// returns `None`, and the caller decides whether to go on unauthenticated.
#[derive(Debug, Clone)]
pub struct SessionGate {
    store: TokenStore,
    refresher: TokenRefresher,
}

impl SessionGate {
    pub fn new(store: TokenStore, refresher: TokenRefresher) -> Self {
        Self { store, refresher }
    }

    pub async fn ensure_token(&self) -> Option<AccessToken> {
        if self.store.is_access_valid() {
            if let Some(token) = self.store.access_token() {
                return Some(token);
            }
        }

        debug!("stored access token missing or stale");
        if let Some(token) = self.refresher.refresh().await {
            return Some(token);
        }

        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear credentials");
        }
        None
    }
}
