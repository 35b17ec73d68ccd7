//! Endpoint paths and wire types.

use serde::Deserialize;

pub const TOKEN: &str = "auth/token/";
pub const TOKEN_REFRESH: &str = "auth/token/refresh/";
pub const TOKEN_BLACKLIST: &str = "auth/token/blacklist/";
pub const REGISTER: &str = "auth/register/";
pub const TASKS: &str = "tasks/";

/// Push channel path below the WebSocket base.
pub const WS_TASKS: &str = "ws/tasks/";

pub fn complete_task(id: u64) -> String {
    format!("tasks/{}/complete/", id)
}

/// Body of a successful login or refresh.
///
/// `refresh` is only present on login and when the server rotates
/// refresh tokens.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub access_expires_in: Option<u64>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access", &"[REDACTED]")
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .field("access_expires_in", &self.access_expires_in)
            .finish()
    }
}
