//! Request descriptions.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Payload of an [`ApiRequest`].
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON; gets a JSON content type unless one is set.
    Json(serde_json::Value),
    /// Sent as-is. No content type is added; the caller sets its own
    /// (e.g. a multipart boundary).
    Binary(Vec<u8>),
}

/// A request against the task API, relative to the API base.
///
/// Requests are plain values so the executor can send the same one twice
/// when it retries after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API base, or an absolute `http(s)://` URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_binary(mut self, body: Vec<u8>) -> Self {
        self.body = RequestBody::Binary(body);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}
