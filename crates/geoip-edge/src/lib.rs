//! geoip-edge - edge geolocation handler
//!
//! Resolves the `ip` query parameter (or the caller's address) to a
//! geolocation record and answers with `{"geo": {...}}`, optionally behind a
//! shared-secret header checked against an auth store.
//!
//! - [`handler`] - the request handler and its deployment options
//! - [`geo`] - geolocation backends
//! - [`auth`] - the shared-secret store
//! - [`router`] - axum front end
//! - [`worker`] - stdin/stdout worker loop for deployed handlers
//! - [`config`], [`logging`] - process setup

pub mod auth;
pub mod config;
pub mod geo;
pub mod handler;
pub mod logging;
pub mod router;
pub mod worker;

use crate::handler::GeoHandler;

/// Shared application state
pub struct AppState {
    pub handler: GeoHandler,
}
