//! Authenticated geolocation worker: requires a recognised `X-Secret`.
//!
//! The auth store is read from `GEOIP_EDGE_AUTH_STORE_PATH`; startup fails
//! without it.
use geoip_edge::handler::HandlerOptions;

fn main() -> anyhow::Result<()> {
    geoip_edge::worker::run(HandlerOptions::authenticated())
}
