//! Shared helpers for the taskwire-http integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use wiremock::MockServer;

use taskwire_core::{
    AccessToken, ApiUrl, ClientConfig, ManualClock, NotificationLevel, Notifier, RefreshToken,
    TaskChange, TaskView,
};
use taskwire_http::TaskClient;

// ============================================================================
// Recording collaborators
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, NotificationLevel)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, NotificationLevel)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.messages().iter().any(|(m, _)| m == text)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, level: NotificationLevel) {
        self.messages.lock().unwrap().push((message.to_string(), level));
    }
}

#[derive(Default)]
pub struct RecordingView {
    changes: Mutex<Vec<TaskChange>>,
}

impl RecordingView {
    pub fn changes(&self) -> Vec<TaskChange> {
        self.changes.lock().unwrap().clone()
    }
}

impl TaskView for RecordingView {
    fn apply(&self, change: TaskChange) {
        self.changes.lock().unwrap().push(change);
    }
}

// ============================================================================
// Client harness
// ============================================================================

pub struct Harness {
    pub client: TaskClient,
    pub notifier: Arc<RecordingNotifier>,
    pub view: Arc<RecordingView>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Store a token pair as if the user had logged in.
    pub fn login_as(&self, access: &str, refresh: &str, expires_in: Option<u64>) {
        self.client
            .store()
            .save(
                &AccessToken::new(access),
                &RefreshToken::new(refresh),
                expires_in,
            )
            .unwrap();
    }
}

/// API base for a mock server, mounted under `/api` like the real service.
pub fn api_base(server: &MockServer) -> ApiUrl {
    ApiUrl::new(format!("{}/api", server.uri())).unwrap()
}

pub fn harness(server: &MockServer) -> Harness {
    harness_with(ClientConfig::new(api_base(server)).unwrap())
}

pub fn harness_with(config: ClientConfig) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let view = Arc::new(RecordingView::default());
    let clock = Arc::new(ManualClock::default());

    let client = TaskClient::builder(config)
        .clock(clock.clone())
        .notifier(notifier.clone())
        .view(view.clone())
        .build();

    Harness {
        client,
        notifier,
        view,
        clock,
    }
}

/// Poll `check` until it holds, failing the test after five seconds.
pub async fn wait_until<F: FnMut() -> bool>(what: &str, mut check: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Run `fut` with a five second limit.
pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out")
}

// ============================================================================
// Push channel server
// ============================================================================

/// What the test server does with one accepted connection.
#[derive(Clone, Debug)]
pub enum Script {
    /// Keep the socket open and record what the client sends.
    Hold,
    /// Send these text frames, then hold.
    Send(Vec<String>),
    /// Close with this code.
    Close(u16),
    /// Drop the TCP connection without a close frame.
    Drop,
    /// Refuse the handshake with this HTTP status.
    Reject(u16),
    /// Wait this long before answering the handshake, then hold.
    Stall(Duration),
}

/// A local WebSocket server that plays one script per connection.
pub struct WsServer {
    pub base: ApiUrl,
    tokens: Arc<Mutex<Vec<String>>>,
    received: Arc<Mutex<Vec<String>>>,
    accepted: Arc<AtomicUsize>,
}

impl WsServer {
    /// Start serving. Connections beyond the scripts given get [`Script::Hold`].
    pub async fn start(scripts: Vec<Script>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let tokens = Arc::new(Mutex::new(Vec::new()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let server = Self {
            base: ApiUrl::new(format!("ws://127.0.0.1:{}", port)).unwrap(),
            tokens: tokens.clone(),
            received: received.clone(),
            accepted: accepted.clone(),
        };

        tokio::spawn(async move {
            let mut index = 0;
            while let Ok((stream, _)) = listener.accept().await {
                let script = scripts.get(index).cloned().unwrap_or(Script::Hold);
                index += 1;
                tokio::spawn(serve(
                    stream,
                    script,
                    tokens.clone(),
                    received.clone(),
                    accepted.clone(),
                ));
            }
        });

        server
    }

    /// Tokens presented by every handshake, accepted or not.
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    /// Text frames received from the client.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// Number of completed handshakes.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

async fn serve(
    stream: tokio::net::TcpStream,
    script: Script,
    tokens: Arc<Mutex<Vec<String>>>,
    received: Arc<Mutex<Vec<String>>>,
    accepted: Arc<AtomicUsize>,
) {
    if let Script::Stall(delay) = script {
        tokio::time::sleep(delay).await;
    }

    let reject = match script {
        Script::Reject(status) => Some(status),
        _ => None,
    };

    let callback = move |request: &Request, response: Response| {
        let token = request.uri().query().and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(k, _)| k == "token")
                .map(|(_, v)| v.into_owned())
        });
        tokens.lock().unwrap().push(token.unwrap_or_default());

        match reject {
            Some(status) => {
                let mut error = ErrorResponse::new(Some("rejected".to_string()));
                *error.status_mut() = StatusCode::from_u16(status).unwrap();
                Err(error)
            }
            None => Ok(response),
        }
    };

    let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
        return;
    };
    accepted.fetch_add(1, Ordering::SeqCst);

    match script {
        Script::Close(code) => {
            let frame = CloseFrame {
                code: CloseCode::from(code),
                reason: "".into(),
            };
            let _ = ws.close(Some(frame)).await;
            while let Some(Ok(_)) = ws.next().await {}
            return;
        }
        Script::Drop => return,
        Script::Send(frames) => {
            for frame in frames {
                if ws.send(Message::text(frame)).await.is_err() {
                    return;
                }
            }
        }
        Script::Hold | Script::Reject(_) | Script::Stall(_) => {}
    }

    while let Some(Ok(message)) = ws.next().await {
        if let Message::Text(text) = message {
            received.lock().unwrap().push(text.as_str().to_string());
        }
    }
}
