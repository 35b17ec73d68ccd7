//! Single-flight access token refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use taskwire_core::sync::MutexExt;
use taskwire_core::{AccessToken, RefreshToken, Result, TokenStore};

use crate::api::endpoints::{TOKEN_REFRESH, TokenResponse};
use crate::api::{ApiClient, ApiRequest};

type PendingRefresh = Shared<BoxFuture<'static, Option<AccessToken>>>;

/// Exchanges the stored refresh token for a new access token.
///
/// At most one exchange runs at a time. Callers that arrive while one is
/// in flight wait for it and get the same result. The exchange itself runs
/// on a spawned task, so a caller giving up does not abort it for the
/// others.
#[derive(Clone)]
pub struct TokenRefresher {
    inner: Arc<RefresherInner>,
}

struct RefresherInner {
    api: ApiClient,
    store: TokenStore,
    in_flight: Mutex<Option<PendingRefresh>>,
    exchanges: AtomicU64,
}

/// Clears the in-flight marker when the exchange task ends, however it ends.
struct InFlightGuard(Arc<RefresherInner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.lock_or_recover().take();
    }
}

impl TokenRefresher {
    pub fn new(api: ApiClient, store: TokenStore) -> Self {
        Self {
            inner: Arc::new(RefresherInner {
                api,
                store,
                in_flight: Mutex::new(None),
                exchanges: AtomicU64::new(0),
            }),
        }
    }

    /// Refresh the access token.
    ///
    /// Returns `None` without touching the network when no refresh token
    /// is stored. On any failure the stored credentials are cleared and
    /// `None` is returned; the exchange is never retried here.
    pub async fn refresh(&self) -> Option<AccessToken> {
        let pending = {
            let mut slot = self.inner.in_flight.lock_or_recover();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    let Some(refresh_token) = self.inner.store.refresh_token() else {
                        debug!("no refresh token stored");
                        return None;
                    };

                    let inner = Arc::clone(&self.inner);
                    let task = tokio::spawn(async move {
                        let _guard = InFlightGuard(Arc::clone(&inner));
                        inner.exchange(refresh_token).await
                    });

                    let pending = async move {
                        task.await.unwrap_or_else(|err| {
                            warn!(error = %err, "token refresh task failed");
                            None
                        })
                    }
                    .boxed()
                    .shared();

                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Returns true while an exchange is running.
    pub fn in_flight(&self) -> bool {
        self.inner.in_flight.lock_or_recover().is_some()
    }

    /// Number of network exchanges started so far.
    pub fn exchange_count(&self) -> u64 {
        self.inner.exchanges.load(Ordering::SeqCst)
    }
}

impl RefresherInner {
    #[instrument(skip_all, fields(exchange = tracing::field::Empty))]
    async fn exchange(&self, refresh_token: RefreshToken) -> Option<AccessToken> {
        let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::Span::current().record("exchange", n);
        info!("refreshing access token");

        match self.try_exchange(&refresh_token).await {
            Ok(token) => {
                debug!("access token refreshed");
                Some(token)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, clearing credentials");
                if let Err(err) = self.store.clear() {
                    warn!(error = %err, "failed to clear credentials");
                }
                None
            }
        }
    }

    async fn try_exchange(&self, refresh_token: &RefreshToken) -> Result<AccessToken> {
        let request =
            ApiRequest::post(TOKEN_REFRESH).with_json(json!({ "refresh": refresh_token.as_str() }));
        let response = self.api.send(&request, None).await?;
        let body: TokenResponse = ApiClient::decode(response, "Token refresh failed").await?;

        let access = AccessToken::new(body.access);
        let refresh = body
            .refresh
            .map(RefreshToken::new)
            .unwrap_or_else(|| refresh_token.clone());

        self.store.save(&access, &refresh, body.access_expires_in)?;
        Ok(access)
    }
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("in_flight", &self.in_flight())
            .field("exchanges", &self.exchange_count())
            .finish()
    }
}
