// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! relay-dispatcher: the single coordinating process.
//!
//! Owns the runner registry and commit queue, serves the control
//! protocol, and runs two background loops: the heartbeat monitor
//! (evicts dead runners, requeues their work) and the redistributor
//! (drains the pending queue onto idle runners).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod assign;
pub mod env;
mod heartbeat;
mod listener;
mod redistribute;
pub mod registry;
pub mod store;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

use crate::env::Tunables;
use crate::listener::ListenCtx;
use crate::registry::Registry;
use crate::store::ResultStore;

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on (default `localhost`).
    pub host: String,
    /// Port to listen on (default 8888; 0 picks an ephemeral port).
    pub port: u16,
    /// Directory receiving one result file per commit ID.
    pub results_dir: PathBuf,
    /// Timing knobs (env-overridable, see [`env`]).
    pub tunables: Tunables,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8888,
            results_dir: PathBuf::from("test_results"),
            tunables: Tunables::from_env(),
        }
    }
}

/// Fatal startup errors. Everything after startup is absorbed into
/// state transitions instead of propagating.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("failed to bind {0}: {1}")]
    BindFailed(String, #[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running dispatcher: listener plus the two control loops.
pub struct DispatcherHandle {
    addr: SocketAddr,
    registry: Arc<Registry>,
    token: CancellationToken,
    tracker: TaskTracker,
    loops: Vec<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// The bound listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared registry, for status inspection.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Stop accepting, cancel both background loops, and wait for them
    /// and any in-flight connection handlers to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        for handle in self.loops {
            let _ = handle.await;
        }
        self.tracker.close();
        self.tracker.wait().await;
        info!("dispatcher shutdown complete");
    }
}

/// Bind the control socket and spawn the listener, heartbeat monitor,
/// and redistributor.
pub async fn start(config: Config) -> Result<DispatcherHandle, StartError> {
    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| StartError::BindFailed(bind_addr, e))?;
    let addr = listener.local_addr()?;

    let registry = Arc::new(Registry::new());
    let store = ResultStore::new(config.results_dir.clone());
    let tunables = config.tunables.clone();

    let token = CancellationToken::new();
    let tracker = TaskTracker::new();

    let ctx = Arc::new(ListenCtx {
        registry: Arc::clone(&registry),
        store,
        tunables: tunables.clone(),
    });

    let mut loops = Vec::new();
    loops.push(tokio::spawn(listener::run(
        listener,
        Arc::clone(&ctx),
        token.clone(),
        tracker.clone(),
    )));
    loops.push(tokio::spawn(heartbeat::run(
        Arc::clone(&registry),
        tunables.clone(),
        token.clone(),
    )));
    loops.push(tokio::spawn(redistribute::run(
        Arc::clone(&registry),
        tunables,
        token.clone(),
    )));

    info!(%addr, "dispatcher listening");
    Ok(DispatcherHandle { addr, registry, token, tracker, loops })
}
