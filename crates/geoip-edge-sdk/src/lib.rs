//! geoip-edge SDK - Types and utilities for writing geoip-edge handlers
//!
//! This crate provides the request/response types handlers work with, the
//! error type they return, the error boundary that turns failures into a
//! single response, and the IPC loop used by worker processes.

pub mod request;
pub mod response;
pub mod ipc;
pub mod error;
pub mod handler;

pub mod prelude {
    //! Common imports for geoip-edge handlers
    pub use crate::request::Request;
    pub use crate::response::Response;
    pub use crate::error::HandlerError;
    pub use crate::handler::with_error_boundary;
    pub use crate::ipc::{read_request, send_response, serve};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{json, Value as JsonValue};
}

// Re-export key types at crate root
pub use request::Request;
pub use response::Response;
pub use error::HandlerError;
