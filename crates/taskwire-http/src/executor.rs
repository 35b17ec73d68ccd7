//! Authenticated request execution with one retry after re-authentication.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use taskwire_core::error::AuthError;
use taskwire_core::{NotificationLevel, Notifier, Result, TokenStore};

use crate::api::client::is_auth_failure;
use crate::api::{ApiClient, ApiRequest};
use crate::gate::SessionGate;
use crate::refresh::TokenRefresher;

/// Shown when a request is rejected and the session cannot be renewed.
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Sends API requests with the current session's token.
///
/// A 401 or 403 triggers one token refresh and one resend with the new
/// token. If the refresh fails the credentials are cleared, the user is
/// told, and the call fails with [`AuthError::Unauthorized`].
#[derive(Clone)]
pub struct AuthedExecutor {
    api: ApiClient,
    gate: SessionGate,
    refresher: TokenRefresher,
    store: TokenStore,
    notifier: Arc<dyn Notifier>,
}

impl AuthedExecutor {
    pub fn new(
        api: ApiClient,
        gate: SessionGate,
        refresher: TokenRefresher,
        store: TokenStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            gate,
            refresher,
            store,
            notifier,
        }
    }

    /// Execute with retry enabled.
    pub async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        self.execute(request, true).await
    }

    /// Execute a request.
    ///
    /// With `allow_retry == false` a 401/403 response is returned to the
    /// caller untouched.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(
        &self,
        request: &ApiRequest,
        allow_retry: bool,
    ) -> Result<reqwest::Response> {
        let token = self.gate.ensure_token().await;
        if token.is_none() {
            debug!("no session, sending unauthenticated");
        }

        let response = self.api.send(request, token.as_ref()).await?;
        if !allow_retry || !is_auth_failure(response.status()) {
            return Ok(response);
        }

        info!(status = %response.status(), "request rejected, refreshing session");
        match self.refresher.refresh().await {
            // The resend is final: its status goes back to the caller as-is.
            Some(fresh) => self.api.send(request, Some(&fresh)).await,
            None => {
                if let Err(err) = self.store.clear() {
                    warn!(error = %err, "failed to clear credentials");
                }
                self.notifier.notify(SESSION_EXPIRED, NotificationLevel::Error);
                Err(AuthError::Unauthorized.into())
            }
        }
    }

    /// Execute with retry and decode the JSON body.
    ///
    /// Non-2xx responses become a [`ServerRejection`] using `fallback` when
    /// the body carries no message.
    ///
    /// [`ServerRejection`]: taskwire_core::error::ServerRejection
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        fallback: &str,
    ) -> Result<T> {
        let response = self.send(request).await?;
        ApiClient::decode(response, fallback).await
    }
}

impl std::fmt::Debug for AuthedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthedExecutor")
            .field("api", &self.api.base())
            .finish_non_exhaustive()
    }
}
