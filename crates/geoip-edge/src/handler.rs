//! Edge geolocation handler
//!
//! One handler serves every deployment variant. [`HandlerOptions`] decides
//! whether the `X-Secret` gate runs and whether the provider's region is
//! passed through:
//!
//! | Preset | `require_auth` | `include_region` |
//! |--------|----------------|------------------|
//! | [`HandlerOptions::open`] | no | no (`region` is always `null`) |
//! | [`HandlerOptions::authenticated`] | yes | yes |
//!
//! Per request: check the secret (if enabled), resolve the target IP, look it
//! up, shape `{"geo": {...}}`. [`GeoHandler::handle`] wraps all of it in the
//! SDK error boundary, so every request gets exactly one response.

use std::sync::Arc;

use anyhow::bail;
use geoip_edge_sdk::handler::with_error_boundary;
use geoip_edge_sdk::{HandlerError, Request, Response};
use serde::Serialize;

use crate::auth::{is_allowed, AuthStore, SECRET_HEADER};
use crate::config::AppConfig;
use crate::geo::{GeoLookup, GeoRecord};

/// Query parameter naming the address to look up
pub const IP_QUERY_PARAM: &str = "ip";

/// Deployment switches for [`GeoHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Reject requests whose `X-Secret` is not allowed by the auth store
    pub require_auth: bool,
    /// Send the provider's region instead of `null`
    pub include_region: bool,
}

impl HandlerOptions {
    /// Unauthenticated deployment: no gate, region always null.
    pub fn open() -> Self {
        Self {
            require_auth: false,
            include_region: false,
        }
    }

    /// Authenticated deployment: gate enabled, region passed through.
    pub fn authenticated() -> Self {
        Self {
            require_auth: true,
            include_region: true,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            require_auth: config.require_auth,
            include_region: config.include_region,
        }
    }
}

#[derive(Serialize)]
struct GeoResponse<'a> {
    geo: &'a GeoRecord,
}

/// The geolocation request handler. Cheap to share behind an `Arc`.
pub struct GeoHandler {
    options: HandlerOptions,
    geo: Arc<dyn GeoLookup>,
    auth: Option<Arc<dyn AuthStore>>,
}

impl GeoHandler {
    pub fn new(options: HandlerOptions, geo: Arc<dyn GeoLookup>) -> Self {
        Self {
            options,
            geo,
            auth: None,
        }
    }

    /// Builder pattern: attach the auth store
    pub fn with_auth_store(mut self, store: Arc<dyn AuthStore>) -> Self {
        self.auth = Some(store);
        self
    }

    /// Build a handler, rejecting a gated deployment that has no store.
    pub fn build(
        options: HandlerOptions,
        geo: Arc<dyn GeoLookup>,
        auth: Option<Arc<dyn AuthStore>>,
    ) -> anyhow::Result<Self> {
        if options.require_auth && auth.is_none() {
            bail!("authorization is required but no auth store is configured");
        }
        Ok(Self {
            options,
            geo,
            auth,
        })
    }

    pub fn options(&self) -> HandlerOptions {
        self.options
    }

    /// Handle one request. Never fails and never panics past this point.
    pub async fn handle(&self, req: Request) -> Response {
        with_error_boundary(&req.request_id, self.try_handle(&req)).await
    }

    /// The handler without its error boundary.
    pub async fn try_handle(&self, req: &Request) -> Result<Response, HandlerError> {
        tracing::debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "Incoming request"
        );

        if self.options.require_auth {
            self.authorize(req).await?;
        }

        let ip = resolve_target_ip(req)?;
        let mut record = self.geo.lookup(ip)?;
        if !self.options.include_region {
            record.region = None;
        }

        tracing::debug!(
            request_id = %req.request_id,
            ip = %ip,
            provider = self.geo.name(),
            country = %record.country_code,
            "Lookup succeeded"
        );
        Response::try_json(200, &GeoResponse { geo: &record })
    }

    /// A missing or empty secret is denied without consulting the store.
    async fn authorize(&self, req: &Request) -> Result<(), HandlerError> {
        let store = self.auth.as_ref().ok_or_else(|| {
            HandlerError::Internal("authorization is required but no auth store is configured".into())
        })?;

        let Some(token) = req
            .header(SECRET_HEADER)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
        else {
            return Err(HandlerError::Unauthorized);
        };

        let value = store.get(token).await?;
        if is_allowed(value.as_deref()) {
            Ok(())
        } else {
            Err(HandlerError::Unauthorized)
        }
    }
}

/// The `ip` query parameter if present and non-empty, else the caller's address.
///
/// The value is passed on untouched; validation belongs to the provider.
pub fn resolve_target_ip(req: &Request) -> Result<&str, HandlerError> {
    req.non_empty_query_param(IP_QUERY_PARAM)
        .or_else(|| req.client_address())
        .ok_or_else(|| {
            HandlerError::Internal("no ip parameter and no client address on request".into())
        })
}
