// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher-liveness watchdog.
//!
//! A runner serving a dead coordinator is useless: when no heartbeat
//! has arrived for longer than the silence threshold, probe the
//! dispatcher directly and shut down if it is gone. Cancelling the
//! shared token starts the graceful stop; in-flight work drains in
//! the shutdown path.

use std::sync::Arc;

use relay_core::Clock;
use relay_wire::{communicate, Reply, Request};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::agent::AgentState;

pub(crate) async fn run<C: Clock>(state: Arc<AgentState<C>>, token: CancellationToken) {
    let interval = state.tunables().watchdog_interval;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if check(&state).await == Verdict::Gone {
            warn!("dispatcher is no longer reachable, shutting down");
            token.cancel();
            break;
        }
    }
    debug!("watchdog stopped");
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Alive,
    Gone,
}

/// One watchdog check: quiet recently enough, or answers `status`.
pub(crate) async fn check<C: Clock>(state: &Arc<AgentState<C>>) -> Verdict {
    if state.heartbeat_age() <= state.tunables().heartbeat_timeout {
        return Verdict::Alive;
    }
    let timeout = state.tunables().io_timeout;
    match communicate(state.dispatcher(), &Request::Status, timeout).await {
        Ok(Reply::Ok) => {
            // Reachable after all; treat the probe as contact so the
            // next checks back off until silence builds up again.
            state.touch_heartbeat();
            Verdict::Alive
        }
        Ok(other) => {
            warn!(reply = ?other, "dispatcher status probe rejected");
            Verdict::Gone
        }
        Err(e) => {
            warn!(error = %e, "dispatcher status probe failed");
            Verdict::Gone
        }
    }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
