// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the dispatcher's control socket.
//!
//! Accepts connections and handles each in a spawned task without
//! blocking the control loops. Handlers treat the registry as a
//! capability object: every mutation goes through its synchronized
//! methods, never raw collections.

use std::sync::Arc;

use relay_wire::{read_request, write_reply, ProtocolError, Reply, Request};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::env::Tunables;
use crate::registry::{CompleteOutcome, Registry};
use crate::store::ResultStore;

/// Shared dispatcher context for all request handlers.
pub(crate) struct ListenCtx {
    pub registry: Arc<Registry>,
    pub store: ResultStore,
    pub tunables: Tunables,
}

/// Accept loop. Runs until shutdown; connection tasks are tracked so
/// shutdown can drain them.
pub(crate) async fn run(
    listener: TcpListener,
    ctx: Arc<ListenCtx>,
    token: CancellationToken,
    tracker: TaskTracker,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(%addr, "connection accepted");
                        let ctx = Arc::clone(&ctx);
                        tracker.spawn(async move {
                            let (mut reader, mut writer) = stream.into_split();
                            if let Err(e) = handle_connection(&mut reader, &mut writer, &ctx).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("accept error: {}", e),
                }
            }
        }
    }
    debug!("listener stopped");
}

fn log_connection_error(e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!("client disconnected"),
        ProtocolError::Timeout => warn!("connection timeout"),
        _ => error!("connection error: {}", e),
    }
}

/// Handle one request/reply exchange.
///
/// Generic over reader/writer so tests can drive it with in-memory
/// duplex streams.
pub(crate) async fn handle_connection<R, W>(
    reader: &mut R,
    writer: &mut W,
    ctx: &ListenCtx,
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let timeout = ctx.tunables.io_timeout;
    let request = match read_request(reader, timeout).await {
        Ok(request) => request,
        // Local, non-fatal: tell the peer and close.
        Err(ProtocolError::Malformed
        | ProtocolError::HeaderTooLarge
        | ProtocolError::PayloadTooLarge(_)
        | ProtocolError::LengthMismatch { .. }) => {
            return write_reply(writer, &Reply::Invalid, timeout).await;
        }
        Err(other) => return Err(other),
    };

    debug!(command = request.name(), "received request");
    let reply = handle_request(request, ctx).await;
    write_reply(writer, &reply, timeout).await
}

async fn handle_request(request: Request, ctx: &ListenCtx) -> Reply {
    match request {
        Request::Status => Reply::Ok,

        Request::Register(runner) => {
            ctx.registry.register(runner);
            Reply::Ok
        }

        Request::Dispatch(commit) => {
            let has_runners = ctx.registry.has_runners();
            if ctx.registry.enqueue(commit.clone()) {
                info!(%commit, "commit queued");
            } else {
                // Already pending or assigned: exactly one owner.
                info!(%commit, "duplicate dispatch ignored");
            }
            if has_runners {
                Reply::Ok
            } else {
                // Still queued; the redistributor picks it up once a
                // runner registers.
                Reply::Error("No runners are registered".to_string())
            }
        }

        Request::Results { commit, payload } => {
            match ctx.store.write(&commit, &payload).await {
                Ok(path) => debug!(%commit, path = %path.display(), "results persisted"),
                Err(e) => {
                    // Requeue so the commit is re-run rather than lost:
                    // it must end up completed-with-a-file or pending.
                    error!(%commit, error = %e, "failed to persist results, requeuing");
                    ctx.registry.complete(&commit);
                    ctx.registry.enqueue(commit);
                    return Reply::Error("failed to persist results".to_string());
                }
            }
            match ctx.registry.complete(&commit) {
                CompleteOutcome::WasAssigned(runner) => {
                    info!(%commit, %runner, "commit completed");
                }
                CompleteOutcome::WasPending => {
                    info!(%commit, "late results resolved a requeued commit");
                }
                CompleteOutcome::Untracked => {
                    info!(%commit, "results for untracked commit accepted");
                }
            }
            Reply::Ok
        }

        // Runner-side commands; a dispatcher does not serve them.
        Request::Ping | Request::RunTest(_) => Reply::Invalid,
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
