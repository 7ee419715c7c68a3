// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The assignment algorithm.
//!
//! Walks the live pool in registration order offering `runtest` to each
//! runner. The registry lock is never held across a network round-trip;
//! acceptance is committed afterwards in one short critical section
//! that re-verifies the world.

use std::sync::Arc;

use relay_core::CommitId;
use relay_wire::{communicate, Reply, Request};
use tracing::{debug, info, warn};

use crate::env::Tunables;
use crate::registry::{AssignOutcome, Registry};

/// Result of one assignment round for a single commit.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AssignResult {
    /// A runner accepted and the assignment was recorded.
    Assigned,
    /// The commit stopped being pending mid-round (late results).
    Stale,
    /// Every live runner was busy or unreachable; the commit stays
    /// pending for a later round.
    NoneAccepted,
}

pub(crate) async fn try_assign(
    registry: &Arc<Registry>,
    commit: &CommitId,
    tunables: &Tunables,
) -> AssignResult {
    for runner in registry.runners() {
        let request = Request::RunTest(commit.clone());
        match communicate(&runner.addr(), &request, tunables.runtest_timeout).await {
            Ok(Reply::Ok) => match registry.commit_assignment(commit, &runner) {
                AssignOutcome::Committed => {
                    info!(%commit, %runner, "commit dispatched");
                    return AssignResult::Assigned;
                }
                AssignOutcome::RunnerGone => {
                    // Accepted by a runner we evicted mid-flight. Its
                    // work will be redone elsewhere; that is the
                    // eviction contract.
                    warn!(%commit, %runner, "runner evicted between accept and commit");
                    continue;
                }
                AssignOutcome::CommitGone => {
                    warn!(%commit, %runner, "commit completed while assignment was in flight");
                    return AssignResult::Stale;
                }
            },
            Ok(Reply::Busy) => {
                debug!(%commit, %runner, "runner busy");
                continue;
            }
            Ok(other) => {
                warn!(%commit, %runner, reply = ?other, "unexpected runtest reply");
                continue;
            }
            Err(e) => {
                // Unreachable runner: skip it here, the heartbeat
                // monitor owns eviction.
                debug!(%commit, %runner, error = %e, "runner unreachable during assignment");
                continue;
            }
        }
    }
    AssignResult::NoneAccepted
}
