//! Unauthenticated geolocation worker: no secret check, region always null.
use geoip_edge::handler::HandlerOptions;

fn main() -> anyhow::Result<()> {
    geoip_edge::worker::run(HandlerOptions::open())
}
