//! Error types for geoip-edge handlers

use thiserror::Error;

/// Errors that can occur in a handler
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("IPC error: {0}")]
    IpcError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Geolocation lookup failed: {0}")]
    LookupError(String),

    #[error("Auth store error: {0}")]
    AuthStoreError(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Convert the error to an HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::Unauthorized => 401,
            _ => 500,
        }
    }

    /// Whether the error is an operational failure that operators should see.
    /// Denied requests are expected traffic and are not.
    pub fn is_operational(&self) -> bool {
        !matches!(self, HandlerError::Unauthorized)
    }

    /// Convert to a Response.
    ///
    /// The 500 body is deliberately generic; the error detail only goes to logs.
    pub fn to_response(&self) -> crate::Response {
        match self {
            HandlerError::Unauthorized => crate::Response::unauthorized(),
            _ => crate::Response::internal_error(),
        }
    }
}

impl From<HandlerError> for crate::Response {
    fn from(err: HandlerError) -> Self {
        err.to_response()
    }
}
