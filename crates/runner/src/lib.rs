// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! relay-runner: a worker agent that executes one test job at a time.
//!
//! On startup the agent binds a listening port (scanning a bounded
//! range when none is given), registers once with the dispatcher, and
//! then serves `ping` and `runtest` until it is interrupted or its
//! watchdog decides the dispatcher is gone.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod agent;
pub mod env;
pub mod executor;
#[cfg(test)]
mod test_support;
mod watchdog;

use std::net::SocketAddr;
use std::sync::Arc;

use relay_core::{Clock, RunnerRef, SystemClock};
use relay_wire::{communicate, ProtocolError, Reply, Request};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

use crate::agent::AgentState;
use crate::env::Tunables;
use crate::executor::TestExecutor;

/// First port tried when no explicit port is configured.
pub const PORT_RANGE_START: u16 = 8900;

/// Number of consecutive ports tried before giving up.
pub const PORT_RANGE_TRIES: u16 = 100;

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Host to bind and to advertise in `register`.
    pub host: String,
    /// Explicit listening port; `None` scans from [`PORT_RANGE_START`].
    pub port: Option<u16>,
    /// Dispatcher `host:port` address.
    pub dispatcher: String,
    /// Timing knobs (env-overridable, see [`env`]).
    pub tunables: Tunables,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            dispatcher: "localhost:8888".to_string(),
            tunables: Tunables::from_env(),
        }
    }
}

/// Fatal startup errors. A runner that cannot bind or register has no
/// reason to exist.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("could not bind any port in range {0}-{1}")]
    NoPortAvailable(u16, u16),

    #[error("failed to bind {0}: {1}")]
    BindFailed(String, #[source] std::io::Error),

    #[error("failed to register with dispatcher at {0}: {1}")]
    RegisterFailed(String, #[source] ProtocolError),

    #[error("dispatcher refused registration: {0:?}")]
    RegisterRefused(Reply),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running agent: the connection listener plus the dispatcher
/// watchdog.
pub struct RunnerHandle {
    addr: SocketAddr,
    token: CancellationToken,
    tracker: TaskTracker,
    loops: Vec<JoinHandle<()>>,
}

impl RunnerHandle {
    /// The bound listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Resolves when the agent decides to stop on its own (watchdog
    /// lost the dispatcher) or [`RunnerHandle::shutdown`] is called.
    pub async fn terminated(&self) {
        self.token.cancelled().await;
    }

    /// Graceful stop: no new jobs are accepted, the in-flight job (if
    /// any) finishes its report attempt, then both loops exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        for handle in self.loops {
            let _ = handle.await;
        }
        self.tracker.close();
        self.tracker.wait().await;
        info!("runner shutdown complete");
    }
}

/// Start a runner with the system clock.
pub async fn start(
    config: RunnerConfig,
    executor: Arc<dyn TestExecutor>,
) -> Result<RunnerHandle, StartError> {
    start_with_clock(config, executor, SystemClock).await
}

/// Start a runner with an injected clock (used by watchdog tests).
pub async fn start_with_clock<C: Clock>(
    config: RunnerConfig,
    executor: Arc<dyn TestExecutor>,
    clock: C,
) -> Result<RunnerHandle, StartError> {
    let listener = bind(&config).await?;
    let addr = listener.local_addr()?;

    let identity = RunnerRef::new(config.host.clone(), addr.port());
    register(&config, &identity).await?;
    info!(runner = %identity, dispatcher = %config.dispatcher, "registered with dispatcher");

    let state = Arc::new(AgentState::new(
        config.dispatcher.clone(),
        executor,
        config.tunables.clone(),
        clock,
    ));

    let token = CancellationToken::new();
    let tracker = TaskTracker::new();

    let mut loops = Vec::new();
    loops.push(tokio::spawn(agent::run(
        listener,
        Arc::clone(&state),
        token.clone(),
        tracker.clone(),
    )));
    loops.push(tokio::spawn(watchdog::run(state, token.clone())));

    Ok(RunnerHandle { addr, token, tracker, loops })
}

/// Bind the configured port, or scan the default range.
async fn bind(config: &RunnerConfig) -> Result<TcpListener, StartError> {
    if let Some(port) = config.port {
        let addr = format!("{}:{}", config.host, port);
        return TcpListener::bind(&addr).await.map_err(|e| StartError::BindFailed(addr, e));
    }
    for offset in 0..PORT_RANGE_TRIES {
        let port = PORT_RANGE_START + offset;
        let addr = format!("{}:{}", config.host, port);
        match TcpListener::bind(&addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => continue,
            Err(e) => return Err(StartError::BindFailed(addr, e)),
        }
    }
    Err(StartError::NoPortAvailable(PORT_RANGE_START, PORT_RANGE_START + PORT_RANGE_TRIES - 1))
}

/// Issue the one-time `register`. Anything but `OK` is fatal.
async fn register(config: &RunnerConfig, identity: &RunnerRef) -> Result<(), StartError> {
    let request = Request::Register(identity.clone());
    let reply = communicate(&config.dispatcher, &request, config.tunables.io_timeout)
        .await
        .map_err(|e| StartError::RegisterFailed(config.dispatcher.clone(), e))?;
    if !reply.is_ok() {
        return Err(StartError::RegisterRefused(reply));
    }
    Ok(())
}
