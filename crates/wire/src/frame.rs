// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded, timeout-guarded framing over async streams.
//!
//! The receiver accumulates bytes until the peer half-closes its write
//! side (EOF), or — for `results` — until the declared payload length
//! is satisfied. Every read and write is wrapped in a timeout; a peer
//! that stalls looks exactly like a dead peer to the caller.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Reply, Request};
use thiserror::Error;

/// The command header (everything before a `results` payload) must fit
/// in the initial read buffer.
pub const MAX_HEADER: usize = 1024;

/// Upper bound on a peer-declared `results` payload length. A larger
/// declaration is a protocol error, never an unbounded read.
pub const MAX_PAYLOAD: usize = 4 * 1024 * 1024;

/// Errors from protocol encoding/decoding and stream I/O.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("operation timed out")]
    Timeout,

    #[error("invalid command")]
    Malformed,

    #[error("request header exceeds {MAX_HEADER} bytes")]
    HeaderTooLarge,

    #[error("declared payload length {0} exceeds {MAX_PAYLOAD} bytes")]
    PayloadTooLarge(usize),

    #[error("payload length mismatch: declared {declared}, received {received}")]
    LengthMismatch { declared: usize, received: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read one request from `reader`.
///
/// Stops at EOF, at the exact declared end of a `results` frame, or
/// with an error once a bound is exceeded. Returns `ConnectionClosed`
/// if the peer sent nothing at all.
pub async fn read_request<R>(reader: &mut R, timeout: Duration) -> Result<Request, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let buf = read_bounded(reader, timeout, |buf| {
        match Request::results_total_len(buf)? {
            // Complete results header: read exactly to the declared end.
            Some(total) => {
                if buf.len() > total {
                    return Err(ProtocolError::LengthMismatch {
                        declared: total,
                        received: buf.len(),
                    });
                }
                Ok(Some(total))
            }
            // Header-only commands (and incomplete results headers) must
            // fit in the initial buffer; wait for EOF within it.
            None => {
                if buf.len() > MAX_HEADER {
                    return Err(ProtocolError::HeaderTooLarge);
                }
                Ok(None)
            }
        }
    })
    .await?;
    Request::parse(&buf)
}

/// Read one reply from `reader` (replies are short text).
pub async fn read_reply<R>(reader: &mut R, timeout: Duration) -> Result<Reply, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let buf = read_bounded(reader, timeout, |buf| {
        if buf.len() > MAX_HEADER {
            return Err(ProtocolError::HeaderTooLarge);
        }
        Ok(None)
    })
    .await?;
    Reply::parse(&buf)
}

/// Write a reply and half-close the stream so the peer sees EOF.
pub async fn write_reply<W>(
    writer: &mut W,
    reply: &Reply,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    write_all_eof(writer, &reply.encode(), timeout).await
}

/// Write a request and half-close the stream so the peer sees EOF.
pub async fn write_request<W>(
    writer: &mut W,
    request: &Request,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    write_all_eof(writer, &request.encode(), timeout).await
}

/// Accumulate bytes until EOF or until `complete_at` names a target
/// length that has been reached. `complete_at` also enforces bounds and
/// may fail the read early.
async fn read_bounded<R, F>(
    reader: &mut R,
    timeout: Duration,
    mut complete_at: F,
) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
    F: FnMut(&[u8]) -> Result<Option<usize>, ProtocolError>,
{
    let mut buf = Vec::with_capacity(MAX_HEADER);
    let mut chunk = [0u8; MAX_HEADER];
    loop {
        let n = tokio::time::timeout(timeout, reader.read(&mut chunk))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        if n == 0 {
            return Ok(buf);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(target) = complete_at(&buf)? {
            if buf.len() == target {
                return Ok(buf);
            }
        }
    }
}

async fn write_all_eof<W>(
    writer: &mut W,
    bytes: &[u8],
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    tokio::time::timeout(timeout, async {
        writer.write_all(bytes).await?;
        writer.shutdown().await
    })
    .await
    .map_err(|_| ProtocolError::Timeout)??;
    Ok(())
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
