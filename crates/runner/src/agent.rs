// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-runner state machine: heartbeats and at-most-one job.
//!
//! `ping` handling never touches job state; the busy flag is claimed
//! with a single compare-exchange so two concurrent `runtest` requests
//! can never both be accepted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use relay_core::{Clock, CommitId};
use relay_wire::{communicate, read_request, write_reply, ProtocolError, Reply, Request};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::env::Tunables;
use crate::executor::TestExecutor;

/// Shared agent state.
pub struct AgentState<C: Clock> {
    busy: AtomicBool,
    last_heartbeat: Mutex<Instant>,
    dispatcher: String,
    executor: Arc<dyn TestExecutor>,
    tunables: Tunables,
    clock: C,
}

impl<C: Clock> AgentState<C> {
    pub fn new(
        dispatcher: String,
        executor: Arc<dyn TestExecutor>,
        tunables: Tunables,
        clock: C,
    ) -> Self {
        let now = clock.now();
        Self {
            busy: AtomicBool::new(false),
            last_heartbeat: Mutex::new(now),
            dispatcher,
            executor,
            tunables,
            clock,
        }
    }

    /// Claim the single job slot. Check and set are one atomic step.
    pub fn try_claim(&self) -> bool {
        self.busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Record that the dispatcher just spoke to us.
    pub fn touch_heartbeat(&self) {
        *self.last_heartbeat.lock() = self.clock.now();
    }

    /// Time since the dispatcher last spoke to us.
    pub fn heartbeat_age(&self) -> Duration {
        self.clock.now().saturating_duration_since(*self.last_heartbeat.lock())
    }

    pub(crate) fn dispatcher(&self) -> &str {
        &self.dispatcher
    }

    pub(crate) fn tunables(&self) -> &Tunables {
        &self.tunables
    }
}

/// Accept loop. Cancellation stops new connections; in-flight jobs are
/// tracked and drained by the caller.
pub(crate) async fn run<C: Clock>(
    listener: TcpListener,
    state: Arc<AgentState<C>>,
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
                        let state = Arc::clone(&state);
                        tracker.spawn(async move {
                            let (mut reader, mut writer) = stream.into_split();
                            if let Err(e) = handle_connection(&mut reader, &mut writer, &state).await
                            {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("accept error: {}", e),
                }
            }
        }
    }
    debug!("agent listener stopped");
}

fn log_connection_error(e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!("client disconnected"),
        ProtocolError::Timeout => warn!("connection timeout"),
        _ => error!("connection error: {}", e),
    }
}

/// Handle one request. Generic over the stream halves so tests can
/// drive it with in-memory duplex pipes.
pub(crate) async fn handle_connection<C, R, W>(
    reader: &mut R,
    writer: &mut W,
    state: &Arc<AgentState<C>>,
) -> Result<(), ProtocolError>
where
    C: Clock,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let timeout = state.tunables().io_timeout;
    let request = match read_request(reader, timeout).await {
        Ok(request) => request,
        Err(ProtocolError::Malformed
        | ProtocolError::HeaderTooLarge
        | ProtocolError::PayloadTooLarge(_)
        | ProtocolError::LengthMismatch { .. }) => {
            return write_reply(writer, &Reply::Invalid, timeout).await;
        }
        Err(other) => return Err(other),
    };

    match request {
        Request::Ping => {
            state.touch_heartbeat();
            write_reply(writer, &Reply::Pong, timeout).await
        }

        Request::RunTest(commit) => {
            if !state.try_claim() {
                debug!(%commit, "refusing job, already busy");
                return write_reply(writer, &Reply::Busy, timeout).await;
            }
            // Accept first so the dispatcher is not blocked on the
            // test run, then execute in this (tracked) task.
            write_reply(writer, &Reply::Ok, timeout).await?;
            run_job(state, commit).await;
            Ok(())
        }

        // Dispatcher-side commands; a runner does not serve them.
        Request::Status
        | Request::Register(_)
        | Request::Dispatch(_)
        | Request::Results { .. } => write_reply(writer, &Reply::Invalid, timeout).await,
    }
}

/// Execute the claimed job and report back, releasing the busy flag
/// whatever happens.
async fn run_job<C: Clock>(state: &Arc<AgentState<C>>, commit: CommitId) {
    info!(%commit, "job started");
    let payload = match state.executor.run(&commit).await {
        Ok(report) => report,
        // The dispatcher still gets a report; a launch failure is the
        // result of this run.
        Err(e) => {
            error!(%commit, error = %e, "executor failed to launch");
            format!("executor error: {}", e).into_bytes()
        }
    };

    let request = Request::Results { commit: commit.clone(), payload };
    match communicate(state.dispatcher(), &request, state.tunables().report_timeout).await {
        Ok(Reply::Ok) => info!(%commit, "results delivered"),
        Ok(other) => warn!(%commit, reply = ?other, "dispatcher did not accept results"),
        Err(e) => warn!(%commit, error = %e, "failed to deliver results"),
    }
    state.release();
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
