//! Error boundary for handlers
//!
//! Handlers are written as `async fn(...) -> Result<Response, HandlerError>`
//! and wrapped exactly once by [`with_error_boundary`], which guarantees a
//! single response per request:
//!
//! - `Ok(response)` is returned as is;
//! - `Err(HandlerError::Unauthorized)` becomes the 401 JSON response;
//! - any other error, or a panic inside the handler, becomes the plain 500
//!   response and is logged with its detail.
//!
//! # Example
//!
//! ```ignore
//! use geoip_edge_sdk::prelude::*;
//!
//! async fn lookup(req: &Request) -> Result<Response, HandlerError> {
//!     let ip = req.non_empty_query_param("ip").ok_or(HandlerError::Unauthorized)?;
//!     Response::try_json(200, &json!({"ip": ip}))
//! }
//!
//! let response = with_error_boundary(&req.request_id, lookup(&req)).await;
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::{HandlerError, Response};

/// Run a fallible handler future and convert every outcome into a response.
pub async fn with_error_boundary<Fut>(request_id: &str, handler: Fut) -> Response
where
    Fut: Future<Output = Result<Response, HandlerError>>,
{
    match AssertUnwindSafe(handler).catch_unwind().await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            let status = err.status_code();
            if err.is_operational() {
                tracing::error!(request_id = %request_id, status, error = %err, "Handler failed");
            } else {
                tracing::debug!(request_id = %request_id, status, "Request rejected: {}", err);
            }
            Response::from(err)
        }
        Err(payload) => {
            tracing::error!(
                request_id = %request_id,
                panic = %panic_message(payload.as_ref()),
                "Handler panicked"
            );
            Response::internal_error()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
