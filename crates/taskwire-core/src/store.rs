//! Token store: expiry policy over a pluggable storage backend.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::credentials::access_valid_at;
use crate::error::StorageError;
use crate::sync::MutexExt;
use crate::traits::TokenStorage;
use crate::{AccessToken, Credentials, RefreshToken};

// Lifetimes beyond this are clamped; chrono panics on out-of-range durations.
const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// The persisted token document.
///
/// Each value is optional so that a partially written store from an
/// older client still loads.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for StoredTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredTokens")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("access_expires_at", &self.access_expires_at)
            .finish()
    }
}

/// Owner of the session credentials.
///
/// Every other component reads and writes tokens through this type. All
/// operations are synchronous and go straight to the backend, so a value
/// written by `save` is visible to the next `get` from any thread.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// An in-memory store on the system clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::default()), Arc::new(SystemClock))
    }

    /// The stored token pair, if both tokens are present.
    pub fn get(&self) -> Option<Credentials> {
        let doc = self.load()?;
        Some(Credentials {
            access_token: AccessToken::new(doc.access_token?),
            refresh_token: RefreshToken::new(doc.refresh_token?),
            access_expires_at: doc.access_expires_at,
        })
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.load()?.access_token.map(AccessToken::new)
    }

    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.load()?.refresh_token.map(RefreshToken::new)
    }

    /// Replace the stored credentials.
    ///
    /// `expires_in` is the access token lifetime in seconds. `None` or `0`
    /// means no expiry is recorded, and any earlier one is dropped.
    pub fn save(
        &self,
        access: &AccessToken,
        refresh: &RefreshToken,
        expires_in: Option<u64>,
    ) -> Result<(), StorageError> {
        let access_expires_at = expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| self.clock.now() + Duration::seconds(secs.min(MAX_LIFETIME_SECS) as i64));

        let doc = StoredTokens {
            access_token: Some(access.as_str().to_string()),
            refresh_token: Some(refresh.as_str().to_string()),
            access_expires_at,
        };

        self.storage.store(&doc)?;
        debug!(expires_at = ?access_expires_at, "credentials saved");
        Ok(())
    }

    /// Remove every stored value.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove()?;
        debug!("credentials cleared");
        Ok(())
    }

    /// Returns true if an access token is stored and not about to expire.
    pub fn is_access_valid(&self) -> bool {
        match self.load() {
            Some(doc) if doc.access_token.is_some() => {
                access_valid_at(doc.access_expires_at, self.clock.now())
            }
            _ => false,
        }
    }

    fn load(&self) -> Option<StoredTokens> {
        match self.storage.load() {
            Ok(doc) => doc,
            Err(err) => {
                warn!(error = %err, "failed to read stored credentials, treating as logged out");
                None
            }
        }
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

/// Process-local [`TokenStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    doc: Mutex<Option<StoredTokens>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<StoredTokens>, StorageError> {
        Ok(self.doc.lock_or_recover().clone())
    }

    fn store(&self, tokens: &StoredTokens) -> Result<(), StorageError> {
        *self.doc.lock_or_recover() = Some(tokens.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.doc.lock_or_recover() = None;
        Ok(())
    }
}
