//! The client facade.

use std::sync::Arc;

use taskwire_core::{
    ClientConfig, Clock, LogNotifier, LogView, MemoryStorage, Notifier, SystemClock, TaskView,
    TokenStorage, TokenStore,
};

use crate::api::ApiClient;
use crate::channel::PushChannel;
use crate::executor::AuthedExecutor;
use crate::gate::SessionGate;
use crate::refresh::TokenRefresher;

/// A task service client.
///
/// Owns one token store and wires the refresher, session gate, request
/// executor and push channel around it. Cheap to clone; clones share
/// everything.
///
/// # Example
///
/// ```no_run
/// use taskwire_core::ClientConfig;
/// use taskwire_http::TaskClient;
///
/// # async fn run() -> taskwire_core::Result<()> {
/// let client = TaskClient::new(ClientConfig::default());
/// client.login("alice", "secret").await?;
///
/// let page = client.list_tasks(20, 0).await?;
/// for task in &page.results {
///     println!("{} {}", task.id, task.title());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TaskClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    api: ApiClient,
    store: TokenStore,
    refresher: TokenRefresher,
    gate: SessionGate,
    executor: AuthedExecutor,
    channel: PushChannel,
    notifier: Arc<dyn Notifier>,
}

impl TaskClient {
    /// A client with in-memory credentials that logs notifications and
    /// task changes.
    pub fn new(config: ClientConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> TaskClientBuilder {
        TaskClientBuilder {
            config,
            storage: None,
            clock: None,
            notifier: None,
            view: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    pub fn refresher(&self) -> &TokenRefresher {
        &self.inner.refresher
    }

    pub fn gate(&self) -> &SessionGate {
        &self.inner.gate
    }

    pub fn executor(&self) -> &AuthedExecutor {
        &self.inner.executor
    }

    pub fn channel(&self) -> &PushChannel {
        &self.inner.channel
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    /// Returns true if a token pair is stored. The access token may
    /// still need a refresh.
    pub fn has_session(&self) -> bool {
        self.inner.store.get().is_some()
    }
}

impl std::fmt::Debug for TaskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskClient")
            .field("api", &self.inner.config.api_base)
            .field("ws", &self.inner.config.ws_base)
            .field("channel", &self.inner.channel.state())
            .finish()
    }
}

/// Builder for [`TaskClient`].
pub struct TaskClientBuilder {
    config: ClientConfig,
    storage: Option<Arc<dyn TokenStorage>>,
    clock: Option<Arc<dyn Clock>>,
    notifier: Option<Arc<dyn Notifier>>,
    view: Option<Arc<dyn TaskView>>,
}

impl TaskClientBuilder {
    /// Where credentials are persisted. Defaults to memory.
    pub fn storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Receiver of task changes from the push channel.
    pub fn view(mut self, view: Arc<dyn TaskView>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn build(self) -> TaskClient {
        let config = self.config;
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));
        let view = self.view.unwrap_or_else(|| Arc::new(LogView));

        let store = TokenStore::new(storage, clock);
        let api = ApiClient::new(config.api_base.clone(), config.request_timeout);
        let refresher = TokenRefresher::new(api.clone(), store.clone());
        let gate = SessionGate::new(store.clone(), refresher.clone());
        let executor = AuthedExecutor::new(
            api.clone(),
            gate.clone(),
            refresher.clone(),
            store.clone(),
            notifier.clone(),
        );
        let channel = PushChannel::new(
            config.ws_base.clone(),
            config.reconnect_delay,
            config.request_timeout,
            gate.clone(),
            refresher.clone(),
            view,
            notifier.clone(),
        );

        TaskClient {
            inner: Arc::new(ClientInner {
                config,
                api,
                store,
                refresher,
                gate,
                executor,
                channel,
                notifier,
            }),
        }
    }
}
