// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat monitor loop.
//!
//! Pings every live runner each period. A non-`pong` reply, a timeout,
//! or any connection error evicts the runner and requeues its in-flight
//! work: work assigned to a dead runner is never lost.

use std::sync::Arc;

use relay_wire::{communicate, Reply, Request};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::env::Tunables;
use crate::registry::Registry;

pub(crate) async fn run(registry: Arc<Registry>, tunables: Tunables, token: CancellationToken) {
    let mut ticker = tokio::time::interval(tunables.ping_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        sweep(&registry, &tunables).await;
    }
    debug!("heartbeat monitor stopped");
}

/// Probe every live runner once, evicting the unresponsive.
async fn sweep(registry: &Arc<Registry>, tunables: &Tunables) {
    // Snapshot first; the lock is never held while pinging.
    for runner in registry.runners() {
        match communicate(&runner.addr(), &Request::Ping, tunables.ping_timeout).await {
            Ok(Reply::Pong) => {
                debug!(%runner, "heartbeat ok");
            }
            Ok(other) => {
                warn!(%runner, reply = ?other, "unexpected heartbeat reply, evicting");
                evict(registry, &runner);
            }
            Err(e) => {
                warn!(%runner, error = %e, "heartbeat failed, evicting");
                evict(registry, &runner);
            }
        }
    }
}

fn evict(registry: &Arc<Registry>, runner: &relay_core::RunnerRef) {
    let requeued = registry.evict(runner);
    if !requeued.is_empty() {
        warn!(%runner, requeued = requeued.len(), "requeued orphaned commits");
    }
}
