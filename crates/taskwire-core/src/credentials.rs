//! Stored session credentials.

use chrono::{DateTime, Duration, Utc};

use crate::{AccessToken, RefreshToken};

/// Seconds before the recorded expiry at which an access token is
/// already considered stale.
pub const EXPIRY_MARGIN_SECS: i64 = 10;

/// The token pair of a logged-in session.
///
/// Returned by [`TokenStore::get`](crate::TokenStore::get). Mutations go
/// through the store; this is a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    /// When the access token expires, if the server said so.
    pub access_expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Returns true if the access token is still usable at `now`.
    pub fn is_access_valid_at(&self, now: DateTime<Utc>) -> bool {
        access_valid_at(self.access_expires_at, now)
    }
}

/// Expiry rule shared by [`Credentials`] and the token store.
///
/// No recorded expiry means the token is trusted until the server rejects it.
pub(crate) fn access_valid_at(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        None => true,
        Some(expiry) => now < expiry - Duration::seconds(EXPIRY_MARGIN_SECS),
    }
}
