//! Push channel states and close codes.

use std::fmt;

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// The peer closed without a status code.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// The connection dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// The server rejected the access token.
pub const CLOSE_TOKEN_INVALID: u16 = 4001;

/// Returns true for close codes that mean the token has to be renewed
/// before the next connect.
pub fn needs_refresh(code: Option<u16>) -> bool {
    matches!(code, Some(CLOSE_TOKEN_INVALID | CLOSE_ABNORMAL))
}

/// Lifecycle of the push channel.
///
/// ```text
/// Idle -> Connecting -> Open -> Closed -> Connecting ...
///                                  \-> Reconnecting -> Connecting ...
///                                              \-> Abandoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Never connected, or shut down locally.
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Socket open; frames are flowing.
    Open,
    /// Socket gone; a reconnect is scheduled.
    Closed,
    /// Token being refreshed before the next connect.
    Reconnecting,
    /// The session could not be renewed. Nothing is scheduled.
    Abandoned,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelState::Idle => "idle",
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::Closed => "closed",
            ChannelState::Reconnecting => "reconnecting",
            ChannelState::Abandoned => "abandoned",
        };
        f.write_str(s)
    }
}
