//! Service URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated base URL for the task service.
///
/// Used both for the REST API (`http`/`https`) and for the push channel
/// (`ws`/`wss`). Plain-text schemes are accepted for any host; a warning
/// is logged when one points somewhere other than the local machine.
///
/// # Example
///
/// ```
/// use taskwire_core::ApiUrl;
///
/// let api = ApiUrl::new("http://127.0.0.1:8000/api").unwrap();
/// assert_eq!(api.endpoint("auth/token/"), "http://127.0.0.1:8000/api/auth/token/");
///
/// let ws = api.to_websocket().unwrap();
/// assert_eq!(ws.as_str(), "ws://127.0.0.1:8000/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiUrl(Url);

impl ApiUrl {
    /// Create a new service URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let mut url = Url::parse(s).map_err(|e| InvalidInputError::Url {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        // Normalize: remove trailing slash
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self(url))
    }

    /// Returns the full URL for a path below this base.
    pub fn endpoint(&self, path: &str) -> String {
        // The URL crate always keeps a slash on root paths, so trim it here
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns the URL scheme.
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Returns true if this is a push-channel URL (`ws://` or `wss://`).
    pub fn is_websocket(&self) -> bool {
        matches!(self.0.scheme(), "ws" | "wss")
    }

    /// Derive the push-channel base from an API base.
    ///
    /// `https` maps to `wss` and `http` to `ws`; the path is dropped, since
    /// the push endpoint hangs off the host root.
    pub fn to_websocket(&self) -> Result<Self, Error> {
        if self.is_websocket() {
            return Ok(self.clone());
        }

        let scheme = if self.0.scheme() == "https" { "wss" } else { "ws" };
        let host = self.0.host_str().unwrap_or_default();
        let authority = match self.0.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Self::new(format!("{}://{}", scheme, authority))
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        // Must be absolute
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::Url {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let secure = matches!(url.scheme(), "https" | "wss");
        let plain = matches!(url.scheme(), "http" | "ws");

        if !secure && !plain {
            return Err(InvalidInputError::Url {
                value: original.to_string(),
                reason: "scheme must be one of http, https, ws or wss".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::Url {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        let is_localhost = url
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]");
        if plain && !is_localhost {
            warn!(url = %original, "service URL uses an unencrypted scheme");
        }

        Ok(())
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ApiUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
