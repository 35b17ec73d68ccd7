//! Socket read/write loop.

use std::sync::{Arc, Weak};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use taskwire_core::{NotificationLevel, Notifier, PushEvent, TaskView};

use super::state::{CLOSE_ABNORMAL, CLOSE_NO_STATUS};
use super::{ChannelInner, PushChannel};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Routes decoded frames to the view and the notifier.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    pub view: Arc<dyn TaskView>,
    pub notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn dispatch(&self, text: &str) {
        match PushEvent::parse(text) {
            Ok(PushEvent::TaskUpdated(change)) => {
                debug!(action = ?change.action, task_id = change.task.id, "task change");
                self.view.apply(change);
            }
            Ok(PushEvent::TaskNotify { message }) => {
                self.notifier.notify(&message, NotificationLevel::Info);
            }
            Ok(PushEvent::Unknown { kind }) => {
                trace!(kind, "ignoring push event");
            }
            Err(err) => {
                warn!(error = %err, "malformed push frame ignored");
            }
        }
    }
}

/// Run one socket until it closes.
///
/// Dropping the outbound sender is a local teardown: the socket is closed
/// and the channel is not told, since it already moved on.
pub(crate) async fn run(
    channel: Weak<ChannelInner>,
    generation: u64,
    stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    dispatcher: Dispatcher,
) {
    let (mut write, mut read) = stream.split();

    let code = loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatcher.dispatch(text.as_str()),
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => dispatcher.dispatch(text),
                    Err(_) => warn!(len = data.len(), "non-UTF-8 binary frame ignored"),
                },
                Some(Ok(Message::Ping(data))) => {
                    trace!("received ping");
                    if let Err(e) = write.send(Message::Pong(data)).await {
                        warn!(error = %e, "failed to send pong");
                    }
                }
                Some(Ok(Message::Pong(_))) => trace!("received pong"),
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "push channel closed by server");
                    break frame.map(|f| u16::from(f.code)).unwrap_or(CLOSE_NO_STATUS);
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "push channel error");
                    break CLOSE_ABNORMAL;
                }
                None => {
                    debug!("push channel stream ended");
                    break CLOSE_ABNORMAL;
                }
            },
            message = outbound.recv() => match message {
                Some(message) => {
                    if let Err(e) = write.send(message).await {
                        warn!(error = %e, "failed to send frame");
                        break CLOSE_ABNORMAL;
                    }
                }
                None => {
                    debug!("closing push channel socket");
                    let _ = write.send(Message::Close(None)).await;
                    return;
                }
            },
        }
    };

    // Flush the close handshake reply, if any
    let _ = write.close().await;

    if let Some(inner) = channel.upgrade() {
        PushChannel { inner }.on_closed(generation, Some(code));
    }
}
