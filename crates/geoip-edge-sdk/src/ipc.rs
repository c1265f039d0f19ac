//! IPC protocol between a hosting runtime and a handler worker.
//!
//! Workers communicate using a simple length-prefixed JSON protocol: each
//! frame is a 4-byte big-endian length followed by that many bytes of JSON.
//! The runtime writes `Request` frames to the worker's stdin and reads
//! `Response` frames from its stdout. Logs must go to stderr.
//!
//! # Example
//! ```ignore
//! use geoip_edge_sdk::prelude::*;
//!
//! fn main() -> Result<(), HandlerError> {
//!     let stdin = std::io::stdin();
//!     let stdout = std::io::stdout();
//!     serve(&mut stdin.lock(), &mut stdout.lock(), |req| handle(req))
//! }
//! ```

use crate::{HandlerError, Request, Response};
use std::io::{ErrorKind, Read, Write};

/// Largest frame a worker accepts (1 MiB).
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Read one request frame.
///
/// Returns `Ok(None)` when the stream ends cleanly before a new frame starts.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Option<Request>, HandlerError> {
    // Read length prefix (4 bytes, big-endian)
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match reader.read(&mut len_buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(HandlerError::IpcError("Truncated length prefix".into())),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(HandlerError::IpcError(format!("Failed to read length prefix: {}", e))),
        }
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(HandlerError::IpcError(format!("Frame of {} bytes exceeds limit", len)));
    }

    // Read the JSON payload
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .map_err(|e| HandlerError::IpcError(format!("Failed to read payload: {}", e)))?;

    serde_json::from_slice(&payload)
        .map(Some)
        .map_err(|e| HandlerError::IpcError(format!("Failed to parse request: {}", e)))
}

/// Write one response frame and flush it.
pub fn send_response<W: Write>(writer: &mut W, response: &Response) -> Result<(), HandlerError> {
    let payload = serde_json::to_vec(response)
        .map_err(|e| HandlerError::IpcError(format!("Failed to serialize response: {}", e)))?;

    let len = u32::try_from(payload.len())
        .map_err(|_| HandlerError::IpcError("Response too large for frame".into()))?;
    writer
        .write_all(&len.to_be_bytes())
        .map_err(|e| HandlerError::IpcError(format!("Failed to write length: {}", e)))?;

    writer
        .write_all(&payload)
        .map_err(|e| HandlerError::IpcError(format!("Failed to write payload: {}", e)))?;

    writer
        .flush()
        .map_err(|e| HandlerError::IpcError(format!("Failed to flush: {}", e)))?;

    Ok(())
}

/// Answer every request on `reader` with exactly one response on `writer`.
///
/// Returns when the input ends cleanly; a malformed frame or a broken output
/// stream ends the loop with an error.
pub fn serve<R, W, F>(reader: &mut R, writer: &mut W, mut handle: F) -> Result<(), HandlerError>
where
    R: Read,
    W: Write,
    F: FnMut(Request) -> Response,
{
    let mut served = 0u64;
    while let Some(req) = read_request(reader)? {
        let response = handle(req);
        send_response(writer, &response)?;
        served += 1;
    }
    tracing::debug!(served, "Input closed, stopping handler loop");
    Ok(())
}
