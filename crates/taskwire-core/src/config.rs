//! Client configuration.

use std::time::Duration;

use crate::error::Error;
use crate::types::ApiUrl;

/// Default REST base of a local development server.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/api";

/// Default push-channel base of a local development server.
pub const DEFAULT_WS_BASE: &str = "ws://127.0.0.1:8000";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Endpoints and timing for a task client.
///
/// ```
/// use std::time::Duration;
/// use taskwire_core::{ApiUrl, ClientConfig};
///
/// let config = ClientConfig::new(ApiUrl::new("https://tasks.example.com/api").unwrap())
///     .unwrap()
///     .with_request_timeout(Duration::from_secs(5));
/// assert_eq!(config.ws_base.as_str(), "wss://tasks.example.com/");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: ApiUrl,
    pub ws_base: ApiUrl,
    /// Budget for a single HTTP request.
    pub request_timeout: Duration,
    /// Delay between a push-channel close and the next connect attempt.
    pub reconnect_delay: Duration,
    pub page_limit: u32,
}

impl ClientConfig {
    /// Build a configuration for `api_base`, deriving the push-channel base
    /// from its host.
    pub fn new(api_base: ApiUrl) -> Result<Self, Error> {
        let ws_base = api_base.to_websocket()?;
        Ok(Self {
            api_base,
            ws_base,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            page_limit: DEFAULT_PAGE_LIMIT,
        })
    }

    pub fn with_ws_base(mut self, ws_base: ApiUrl) -> Self {
        self.ws_base = ws_base;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: ApiUrl::new(DEFAULT_API_BASE).expect("default API base is valid"),
            ws_base: ApiUrl::new(DEFAULT_WS_BASE).expect("default WS base is valid"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}
