// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redistributor loop: the single owner of the assignment algorithm.
//!
//! All assignment flows through this task — `dispatch` handlers only
//! enqueue and wake it — so two connections can never race to assign
//! the same commit. Wakes on new work, new capacity, or an eviction
//! requeue; a pacing tick retries when every runner was busy.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::assign::{try_assign, AssignResult};
use crate::env::Tunables;
use crate::registry::Registry;

pub(crate) async fn run(registry: Arc<Registry>, tunables: Tunables, token: CancellationToken) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = registry.woken() => {}
            _ = tokio::time::sleep(tunables.redispatch_interval) => {}
        }
        drain(&registry, &tunables, &token).await;
    }
    debug!("redistributor stopped");
}

/// Try to place every pending commit, front to back, until one round
/// finds no willing runner.
async fn drain(registry: &Arc<Registry>, tunables: &Tunables, token: &CancellationToken) {
    while let Some(commit) = registry.peek_pending() {
        if token.is_cancelled() {
            return;
        }
        match try_assign(registry, &commit, tunables).await {
            // Both outcomes removed the head entry; move to the next.
            AssignResult::Assigned | AssignResult::Stale => continue,
            // No capacity right now; wait for a wake or the next tick.
            AssignResult::NoneAccepted => return,
        }
    }
}
