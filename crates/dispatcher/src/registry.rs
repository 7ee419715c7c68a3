// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner-pool and commit-queue state.
//!
//! All mutations go through one mutex with short critical sections;
//! nothing here performs network I/O. A tracked commit is in exactly
//! one of {pending queue, assignment map} at any instant — transitions
//! between the two happen inside a single lock acquisition.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use relay_core::{CommitId, RunnerRef};
use tokio::sync::Notify;
use tracing::{info, warn};

/// Outcome of committing an assignment after a runner accepted a job.
#[derive(Debug, PartialEq, Eq)]
pub enum AssignOutcome {
    /// Commit moved pending -> assigned.
    Committed,
    /// The accepting runner was evicted between accept and commit; the
    /// commit stays pending and will be reassigned.
    RunnerGone,
    /// The commit left the pending queue while the attempt was in
    /// flight (late results completed it). Nothing to record.
    CommitGone,
}

/// What the registry knew about a commit when its results arrived.
#[derive(Debug, PartialEq, Eq)]
pub enum CompleteOutcome {
    /// Normal path: the assignment was removed.
    WasAssigned(RunnerRef),
    /// The commit had been requeued after an eviction; the report
    /// resolves the race, so it is pulled out of pending.
    WasPending,
    /// Never heard of it (or already completed).
    Untracked,
}

#[derive(Default)]
struct Inner {
    runners: Vec<RunnerRef>,
    pending: VecDeque<CommitId>,
    assignments: HashMap<CommitId, RunnerRef>,
}

/// Process-wide dispatcher state: live runners, pending commits, and
/// the assignment map, plus the redistributor wake-up signal.
pub struct Registry {
    inner: Mutex<Inner>,
    wake: Notify,
}

impl Registry {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()), wake: Notify::new() }
    }

    /// Add a runner to the live pool. Registration is keyed by
    /// `(host, port)`: a re-registration of a known key is ignored so
    /// the pool never holds two refs to the same agent.
    pub fn register(&self, runner: RunnerRef) {
        let mut inner = self.inner.lock();
        if inner.runners.contains(&runner) {
            warn!(%runner, "duplicate registration ignored");
            return;
        }
        info!(%runner, "runner registered");
        inner.runners.push(runner);
        drop(inner);
        self.wake();
    }

    /// Snapshot of the live pool in registration order.
    pub fn runners(&self) -> Vec<RunnerRef> {
        self.inner.lock().runners.clone()
    }

    pub fn has_runners(&self) -> bool {
        !self.inner.lock().runners.is_empty()
    }

    /// Queue a commit for assignment. Returns false if the commit is
    /// already tracked (pending or assigned) — a duplicate `dispatch`
    /// must not create a second owner.
    pub fn enqueue(&self, commit: CommitId) -> bool {
        let mut inner = self.inner.lock();
        if inner.assignments.contains_key(&commit) || inner.pending.contains(&commit) {
            return false;
        }
        inner.pending.push_back(commit);
        drop(inner);
        self.wake();
        true
    }

    /// Head of the pending queue, if any. The redistributor is the only
    /// task that acts on this; the entry stays pending until
    /// [`Registry::commit_assignment`] moves it.
    pub fn peek_pending(&self) -> Option<CommitId> {
        self.inner.lock().pending.front().cloned()
    }

    /// Atomically move a commit pending -> assigned after `runner`
    /// accepted the job. Re-verifies the world under the lock: the
    /// runner may have been evicted, or the commit completed, while the
    /// network round-trip was in flight.
    pub fn commit_assignment(&self, commit: &CommitId, runner: &RunnerRef) -> AssignOutcome {
        let mut inner = self.inner.lock();
        if !inner.runners.contains(runner) {
            return AssignOutcome::RunnerGone;
        }
        let Some(pos) = inner.pending.iter().position(|c| c == commit) else {
            return AssignOutcome::CommitGone;
        };
        inner.pending.remove(pos);
        inner.assignments.insert(commit.clone(), runner.clone());
        AssignOutcome::Committed
    }

    /// Record completion of a commit: drop its assignment, or pull it
    /// out of pending if an eviction had requeued it first.
    pub fn complete(&self, commit: &CommitId) -> CompleteOutcome {
        let mut inner = self.inner.lock();
        if let Some(runner) = inner.assignments.remove(commit) {
            return CompleteOutcome::WasAssigned(runner);
        }
        if let Some(pos) = inner.pending.iter().position(|c| c == commit) {
            inner.pending.remove(pos);
            return CompleteOutcome::WasPending;
        }
        CompleteOutcome::Untracked
    }

    /// Remove a runner from the live pool and requeue everything that
    /// was assigned to it. Evicting an absent runner is a no-op.
    /// Returns the requeued commits.
    pub fn evict(&self, runner: &RunnerRef) -> Vec<CommitId> {
        let mut inner = self.inner.lock();
        inner.runners.retain(|r| r != runner);
        let orphaned: Vec<CommitId> = inner
            .assignments
            .iter()
            .filter(|(_, r)| *r == runner)
            .map(|(c, _)| c.clone())
            .collect();
        for commit in &orphaned {
            inner.assignments.remove(commit);
            inner.pending.push_back(commit.clone());
        }
        drop(inner);
        if !orphaned.is_empty() {
            self.wake();
        }
        orphaned
    }

    /// Runner currently executing `commit`, if it is assigned.
    pub fn assigned_runner(&self, commit: &CommitId) -> Option<RunnerRef> {
        self.inner.lock().assignments.get(commit).cloned()
    }

    /// Snapshot of the pending queue.
    pub fn pending_commits(&self) -> Vec<CommitId> {
        self.inner.lock().pending.iter().cloned().collect()
    }

    /// Wake the redistributor (new work, new capacity, or a requeue).
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Wait until someone calls [`Registry::wake`]. A wake that arrives
    /// while nobody is waiting is latched, not lost.
    pub async fn woken(&self) {
        self.wake.notified().await;
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
