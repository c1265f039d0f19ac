//! HTTP Response representation for handlers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::HandlerError;

/// Content type used for every JSON response.
pub const APPLICATION_JSON: &str = "application/json";

/// Body of every 500 response.
pub const INTERNAL_SERVER_ERROR_BODY: &str = "Internal Server Error";

/// Represents an outgoing HTTP response.
///
/// # Quick Reference
///
/// | Method | Status | Content-Type | Use Case |
/// |--------|--------|--------------|----------|
/// | `try_json(status, body)` | any | application/json | Serialized payload |
/// | `unauthorized()` | 401 | application/json | Shared secret rejected |
/// | `internal_error()` | 500 | none | Anything that escaped the handler |
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Response body
    #[serde(default)]
    pub body: Option<String>,
}

impl Response {
    /// Create a new response with the given status code (no body).
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create a JSON response with a custom status code.
    ///
    /// Unlike a best-effort encoder this reports serialization failures, so
    /// the caller can turn them into a 500 instead of sending an empty body.
    ///
    /// # Example
    /// ```ignore
    /// Response::try_json(200, &json!({"geo": record}))?
    /// ```
    pub fn try_json<T: Serialize + ?Sized>(status: u16, body: &T) -> Result<Self, HandlerError> {
        let body = serde_json::to_string(body)?;
        Ok(Self::new(status)
            .with_header("Content-Type", APPLICATION_JSON)
            .with_body(body))
    }

    /// Create a 401 Unauthorized response: `{"Error":"Unauthorized"}`.
    pub fn unauthorized() -> Self {
        let body = serde_json::json!({ "Error": "Unauthorized" });
        Self::new(401)
            .with_header("Content-Type", APPLICATION_JSON)
            .with_body(body.to_string())
    }

    /// Create a 500 response with a plain, fixed body and no Content-Type.
    pub fn internal_error() -> Self {
        Self::new(500).with_body(INTERNAL_SERVER_ERROR_BODY)
    }

    /// Add a header to the response (builder pattern).
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the body (builder pattern).
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get a header value (case-insensitive lookup).
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Get the Content-Type header value.
    pub fn content_type(&self) -> Option<&String> {
        self.header("Content-Type")
    }

    /// Check if the response carries a JSON content type.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.contains(APPLICATION_JSON))
            .unwrap_or(false)
    }
}
