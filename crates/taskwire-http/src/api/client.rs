//! HTTP client for the task API.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use taskwire_core::error::{Error, ServerRejection, TransportError};
use taskwire_core::{AccessToken, ApiUrl, Result};

use super::request::{ApiRequest, RequestBody};

pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        TransportError::Timeout {
            duration_ms: timeout.as_millis() as u64,
        }
        .into()
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
        .into()
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
        .into()
    }
}

/// Returns true for the statuses that mean "your token was not accepted".
pub(crate) fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// HTTP client bound to one API base.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: ApiUrl,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client for `base` with a per-request time budget.
    pub fn new(base: ApiUrl, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("taskwire/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base,
            timeout,
        }
    }

    pub fn base(&self) -> &ApiUrl {
        &self.base
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a request path against the API base.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            self.base.endpoint(path)
        }
    }

    /// Send one request, with a bearer token if one is given.
    ///
    /// Any HTTP status is a successful send; only transport failures and
    /// the timeout are errors.
    #[instrument(skip(self, request, token), fields(method = %request.method, path = %request.path))]
    pub async fn send(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<reqwest::Response> {
        let url = self.url(&request.path);
        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }

        let wants_json = !matches!(request.body, RequestBody::Binary(_))
            && !request.headers.contains_key(CONTENT_TYPE);
        if wants_json {
            builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(value.to_string()),
            RequestBody::Binary(bytes) => builder.body(bytes.clone()),
        };

        debug!(authenticated = token.is_some(), "sending request");

        let response = match tokio::time::timeout(self.timeout, builder.send()).await {
            Ok(result) => result.map_err(|e| transport_error(e, self.timeout))?,
            Err(_) => {
                return Err(TransportError::Timeout {
                    duration_ms: self.timeout.as_millis() as u64,
                }
                .into());
            }
        };

        trace!(status = %response.status(), "response");
        Ok(response)
    }

    /// Decode a 2xx body as JSON, or turn any other status into a
    /// [`ServerRejection`] with `fallback` as its default message.
    pub async fn decode<R: DeserializeOwned>(response: reqwest::Response, fallback: &str) -> Result<R> {
        if !response.status().is_success() {
            return Err(Self::rejection(response, fallback).await.into());
        }

        let bytes = response.bytes().await.map_err(|e| TransportError::Http {
            message: e.to_string(),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| Error::Malformed {
            message: e.to_string(),
        })
    }

    /// Normalize a non-2xx response body.
    pub async fn rejection(response: reqwest::Response, fallback: &str) -> ServerRejection {
        let status = response.status().as_u16();
        let body = response.bytes().await.ok();
        ServerRejection::from_body(status, body.as_deref(), fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_absolute_paths() {
        let base = ApiUrl::new("http://127.0.0.1:8000/api").unwrap();
        let client = ApiClient::new(base, Duration::from_secs(10));

        assert_eq!(client.url("tasks/"), "http://127.0.0.1:8000/api/tasks/");
        assert_eq!(
            client.url("http://127.0.0.1:8000/api/tasks/?offset=20"),
            "http://127.0.0.1:8000/api/tasks/?offset=20"
        );
    }

    #[test]
    fn auth_failure_statuses() {
        assert!(is_auth_failure(StatusCode::UNAUTHORIZED));
        assert!(is_auth_failure(StatusCode::FORBIDDEN));
        assert!(!is_auth_failure(StatusCode::NOT_FOUND));
    }
}
