//! IPC worker - runs the handler over stdin/stdout
//!
//! Each deployable handler binary is a thin `main` around [`run`] with a
//! fixed [`HandlerOptions`] preset. Requests are answered one at a time.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use geoip_edge_sdk::ipc;

use crate::auth::store_from_config;
use crate::config::AppConfig;
use crate::geo::provider_from_config;
use crate::handler::{GeoHandler, HandlerOptions};
use crate::logging::{init_tracing, LogOutput};

/// Entry point for handler workers.
pub fn run(options: HandlerOptions) -> Result<()> {
    init_tracing(LogOutput::Stderr)?;

    let config = AppConfig::from_env();
    let store = if options.require_auth {
        store_from_config(&config)?
    } else {
        None
    };
    let handler = GeoHandler::build(options, provider_from_config(&config)?, store)?;
    tracing::info!(options = ?handler.options(), "Worker ready");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    serve_handler(&handler, &mut stdin.lock(), &mut stdout.lock())
}

/// Answer every framed request on `reader` until it closes.
pub fn serve_handler<R: Read, W: Write>(
    handler: &GeoHandler,
    reader: &mut R,
    writer: &mut W,
) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create Tokio runtime")?;

    ipc::serve(reader, writer, |req| rt.block_on(handler.handle(req)))
        .context("handler loop stopped")
}
