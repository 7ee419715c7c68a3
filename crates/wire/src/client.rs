// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot request/reply client.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::frame::{read_reply, write_request, ProtocolError};
use crate::{Reply, Request};

/// Open a fresh connection to `addr`, send one request, and read the
/// reply. Connect, write, and read are each bounded by `timeout`.
///
/// Connection-level failures surface as errors; the caller decides
/// whether that means eviction (dispatcher probing a runner) or
/// self-shutdown (runner probing the dispatcher).
pub async fn communicate(
    addr: &str,
    request: &Request,
    timeout: Duration,
) -> Result<Reply, ProtocolError> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    let (mut reader, mut writer) = stream.into_split();
    write_request(&mut writer, request, timeout).await?;
    let reply = read_reply(&mut reader, timeout).await?;
    debug!(addr, command = request.name(), reply = ?reply, "exchange complete");
    Ok(reply)
}
