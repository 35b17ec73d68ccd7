//! Push channel: a self-healing WebSocket to the task service.
//!
//! The channel connects with the session's access token, forwards task
//! changes and notifications to their consumers, and reconnects after
//! every close. Close codes 4001 and 1006 mean the token may be stale, so
//! the token is refreshed before reconnecting; if that fails the channel
//! is [`ChannelState::Abandoned`] and the user is told to log in again.
//!
//! Sockets are numbered by a generation counter. Close reports and timers
//! that carry an old generation are ignored, which is what keeps a
//! replaced or shut-down socket from scheduling reconnects.

mod pump;
mod state;

pub use state::{
    CLOSE_ABNORMAL, CLOSE_NO_STATUS, CLOSE_NORMAL, CLOSE_TOKEN_INVALID, ChannelState,
    needs_refresh,
};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, instrument, warn};
use url::Url;

use taskwire_core::error::{AuthError, Error, InvalidInputError, TransportError};
use taskwire_core::sync::MutexExt;
use taskwire_core::{ApiUrl, NotificationLevel, Notifier, Result, TaskView};

use crate::api::endpoints::WS_TASKS;
use crate::gate::SessionGate;
use crate::refresh::TokenRefresher;

use pump::{Dispatcher, WsStream};

/// Shown when the channel gives up because the session cannot be renewed.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again.";

/// Handle to the push channel. Clones share the same socket.
#[derive(Clone)]
pub struct PushChannel {
    inner: Arc<ChannelInner>,
}

pub(crate) struct ChannelInner {
    ws_base: ApiUrl,
    reconnect_delay: Duration,
    handshake_timeout: Duration,
    gate: SessionGate,
    refresher: TokenRefresher,
    dispatcher: Dispatcher,
    session: Mutex<ChannelSession>,
}

struct ChannelSession {
    state: ChannelState,
    /// The connect attempt currently in progress.
    connecting: Option<u64>,
    attempts: u64,
    last_close_code: Option<u16>,
    generation: u64,
    socket: Option<SocketHandle>,
    /// The pending refresh or reconnect timer, if any.
    reconnect: Option<JoinHandle<()>>,
    states: watch::Sender<ChannelState>,
}

struct SocketHandle {
    outbound: mpsc::UnboundedSender<Message>,
    _task: JoinHandle<()>,
}

impl ChannelSession {
    fn set_state(&mut self, next: ChannelState) {
        if self.state != next {
            info!(from = %self.state, to = %next, "push channel state");
            self.state = next;
            self.states.send_replace(next);
        }
    }
}

/// Ends a connect attempt: releases the connecting flag and undoes the
/// `Connecting` state if the attempt stopped before reaching another state.
struct ConnectingGuard<'a> {
    inner: &'a ChannelInner,
    attempt: u64,
    generation: u64,
    previous: ChannelState,
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        let mut session = self.inner.session.lock_or_recover();
        if session.connecting != Some(self.attempt) {
            return;
        }
        session.connecting = None;
        if session.generation == self.generation && session.state == ChannelState::Connecting {
            session.set_state(self.previous);
        }
    }
}

impl PushChannel {
    pub fn new(
        ws_base: ApiUrl,
        reconnect_delay: Duration,
        handshake_timeout: Duration,
        gate: SessionGate,
        refresher: TokenRefresher,
        view: Arc<dyn TaskView>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                ws_base,
                reconnect_delay,
                handshake_timeout,
                gate,
                refresher,
                dispatcher: Dispatcher { view, notifier },
                session: Mutex::new(ChannelSession {
                    state: ChannelState::Idle,
                    connecting: None,
                    attempts: 0,
                    last_close_code: None,
                    generation: 0,
                    socket: None,
                    reconnect: None,
                    states: watch::Sender::new(ChannelState::Idle),
                }),
            }),
        }
    }

    pub fn state(&self) -> ChannelState {
        self.inner.session.lock_or_recover().state
    }

    /// Watch state transitions. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.inner.session.lock_or_recover().states.subscribe()
    }

    /// Close code of the most recent close, if the socket has closed.
    pub fn last_close_code(&self) -> Option<u16> {
        self.inner.session.lock_or_recover().last_close_code
    }

    /// Returns true while a refresh or reconnect timer is pending.
    pub fn reconnect_pending(&self) -> bool {
        self.inner
            .session
            .lock_or_recover()
            .reconnect
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Open the channel.
    ///
    /// Does nothing if a connect is already running or the channel is
    /// open. Fails with [`AuthError::SessionExpired`] if there is no
    /// usable token; the state is left as it was. A failed handshake is
    /// handled like a close, so a reconnect is already scheduled when this
    /// returns an error.
    #[instrument(skip(self), fields(url = %self.inner.ws_base))]
    pub async fn connect(&self) -> Result<()> {
        let (attempt, generation, previous) = {
            let mut session = self.inner.session.lock_or_recover();
            if session.connecting.is_some() || session.state == ChannelState::Open {
                debug!(state = %session.state, "connect skipped");
                return Ok(());
            }
            session.attempts += 1;
            let attempt = session.attempts;
            session.connecting = Some(attempt);
            let previous = session.state;
            session.set_state(ChannelState::Connecting);
            (attempt, session.generation, previous)
        };

        let connecting = ConnectingGuard {
            inner: &self.inner,
            attempt,
            generation,
            previous,
        };

        let Some(token) = self.inner.gate.ensure_token().await else {
            warn!("no session, push channel not connected");
            return Err(AuthError::SessionExpired.into());
        };

        let mut url = Url::parse(&self.inner.ws_base.endpoint(WS_TASKS)).map_err(|e| {
            InvalidInputError::Url {
                value: self.inner.ws_base.to_string(),
                reason: e.to_string(),
            }
        })?;
        url.query_pairs_mut().append_pair("token", token.as_str());

        debug!("push channel handshake");
        let handshake =
            tokio::time::timeout(self.inner.handshake_timeout, connect_async(url.as_str())).await;

        let (code, err): (Option<u16>, Error) = match handshake {
            Ok(Ok((stream, _))) => {
                self.attach(attempt, generation, stream);
                return Ok(());
            }
            Ok(Err(WsError::Http(response)))
                if matches!(response.status().as_u16(), 401 | 403) =>
            {
                warn!(status = %response.status(), "push channel handshake rejected");
                (Some(CLOSE_TOKEN_INVALID), AuthError::Unauthorized.into())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "push channel connect failed");
                let err = TransportError::Connection {
                    message: e.to_string(),
                };
                (None, err.into())
            }
            Err(_) => {
                warn!("push channel handshake timed out");
                let err = TransportError::Timeout {
                    duration_ms: self.inner.handshake_timeout.as_millis() as u64,
                };
                (None, err.into())
            }
        };

        // Release the attempt first so the scheduled reconnect can run.
        drop(connecting);
        self.on_closed(generation, code);
        Err(err)
    }

    /// Send a JSON message. Returns false, and drops the message, unless
    /// the channel is open.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode outbound message");
                return false;
            }
        };

        let session = self.inner.session.lock_or_recover();
        match (&session.state, &session.socket) {
            (ChannelState::Open, Some(socket)) => socket.outbound.send(Message::text(text)).is_ok(),
            _ => {
                warn!(state = %session.state, "push channel not open, message dropped");
                false
            }
        }
    }

    /// Close the socket and stop reconnecting.
    pub fn shutdown(&self) {
        let mut session = self.inner.session.lock_or_recover();
        session.generation += 1;
        if let Some(task) = session.reconnect.take() {
            task.abort();
        }
        session.socket = None;
        session.set_state(ChannelState::Idle);
    }

    fn attach(&self, attempt: u64, generation: u64, stream: WsStream) {
        let mut session = self.inner.session.lock_or_recover();
        if session.connecting == Some(attempt) {
            session.connecting = None;
        }
        if session.generation != generation {
            debug!("channel shut down during handshake, dropping socket");
            return;
        }

        session.generation += 1;
        let generation = session.generation;

        let (outbound, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump::run(
            Arc::downgrade(&self.inner),
            generation,
            stream,
            rx,
            self.inner.dispatcher.clone(),
        ));

        // Dropping the old handle closes its socket
        session.socket = Some(SocketHandle {
            outbound,
            _task: task,
        });
        session.last_close_code = None;
        session.set_state(ChannelState::Open);
    }

    /// Handle the end of a socket or a failed handshake.
    pub(crate) fn on_closed(&self, generation: u64, code: Option<u16>) {
        let mut session = self.inner.session.lock_or_recover();
        if session.generation != generation {
            debug!(?code, "ignoring close of a replaced socket");
            return;
        }

        session.socket = None;
        session.last_close_code = code;
        session.set_state(ChannelState::Closed);

        if needs_refresh(code) {
            session.set_state(ChannelState::Reconnecting);
            let channel = Arc::downgrade(&self.inner);
            let task = tokio::spawn(async move {
                if let Some(inner) = channel.upgrade() {
                    PushChannel { inner }.refresh_then_reconnect(generation).await;
                }
            });
            replace_pending(&mut session, task);
        } else {
            self.schedule_reconnect(&mut session, generation);
        }
    }

    async fn refresh_then_reconnect(&self, generation: u64) {
        let refreshed = self.inner.refresher.refresh().await;

        let mut session = self.inner.session.lock_or_recover();
        if session.generation != generation || session.state != ChannelState::Reconnecting {
            return;
        }
        // This task is the pending one; release its handle before replacing it.
        session.reconnect = None;

        if refreshed.is_some() {
            info!("token refreshed, reconnecting");
            self.schedule_reconnect(&mut session, generation);
        } else {
            drop(session);
            self.abandon(generation);
        }
    }

    fn schedule_reconnect(&self, session: &mut ChannelSession, generation: u64) {
        let delay = self.inner.reconnect_delay;
        debug!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");

        let channel = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = channel.upgrade() {
                PushChannel { inner }.reconnect(generation).await;
            }
        });
        replace_pending(session, task);
    }

    async fn reconnect(&self, generation: u64) {
        {
            let mut session = self.inner.session.lock_or_recover();
            let waiting = matches!(
                session.state,
                ChannelState::Closed | ChannelState::Reconnecting
            );
            if session.generation != generation || !waiting {
                debug!(state = %session.state, "reconnect no longer needed");
                return;
            }
            session.reconnect = None;
        }

        match self.connect().await {
            Ok(()) => {}
            Err(Error::Auth(AuthError::SessionExpired)) => self.abandon(generation),
            // The failed handshake already scheduled the next attempt
            Err(e) => debug!(error = %e, "reconnect attempt failed"),
        }
    }

    fn abandon(&self, generation: u64) {
        {
            let mut session = self.inner.session.lock_or_recover();
            if session.generation != generation {
                return;
            }
            session.socket = None;
            session.reconnect = None;
            session.set_state(ChannelState::Abandoned);
        }

        warn!("push channel abandoned, session cannot be renewed");
        self.inner
            .dispatcher
            .notifier
            .notify(SESSION_EXPIRED_MESSAGE, NotificationLevel::Error);
    }
}

fn replace_pending(session: &mut ChannelSession, task: JoinHandle<()>) {
    if let Some(previous) = session.reconnect.replace(task) {
        previous.abort();
    }
}

impl std::fmt::Debug for PushChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.inner.session.lock_or_recover();
        f.debug_struct("PushChannel")
            .field("url", &self.inner.ws_base)
            .field("state", &session.state)
            .field("last_close_code", &session.last_close_code)
            .finish()
    }
}
