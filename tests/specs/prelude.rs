// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the end-to-end specs.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use relay_runner::executor::{ExecutorError, TestExecutor};

pub use std::time::Duration;

pub use relay_core::{CommitId, RunnerRef};
pub use relay_dispatcher::DispatcherHandle;
pub use relay_runner::RunnerHandle;
pub use relay_wire::{communicate, Reply, Request};

/// Upper bound for condition polling.
pub const SPEC_WAIT_MAX_MS: u64 = 10_000;

/// Generous timeout for one request/reply round-trip in a spec.
pub const SPEC_IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll `condition` every 25ms until it holds or `max_ms` elapses.
pub async fn wait_for<F: FnMut() -> bool>(max_ms: u64, mut condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(max_ms);
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

pub fn commit(s: &str) -> CommitId {
    CommitId::parse(s).unwrap()
}

/// Start a dispatcher on an ephemeral loopback port with spec-speed
/// heartbeat and redistribution intervals.
pub async fn start_dispatcher(results_dir: &Path) -> DispatcherHandle {
    let config = relay_dispatcher::Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        results_dir: results_dir.to_path_buf(),
        tunables: relay_dispatcher::env::Tunables {
            io_timeout: SPEC_IO_TIMEOUT,
            ping_interval: Duration::from_millis(100),
            ping_timeout: Duration::from_millis(500),
            runtest_timeout: SPEC_IO_TIMEOUT,
            redispatch_interval: Duration::from_millis(100),
        },
    };
    relay_dispatcher::start(config).await.unwrap()
}

/// Start a runner agent registered with `dispatcher`, with a watchdog
/// fast enough to notice dispatcher loss within test time.
pub async fn start_runner(
    dispatcher: &DispatcherHandle,
    executor: Arc<dyn TestExecutor>,
) -> RunnerHandle {
    let config = relay_runner::RunnerConfig {
        host: "127.0.0.1".to_string(),
        port: None,
        dispatcher: dispatcher.addr().to_string(),
        tunables: relay_runner::env::Tunables {
            io_timeout: SPEC_IO_TIMEOUT,
            report_timeout: Duration::from_secs(5),
            watchdog_interval: Duration::from_millis(100),
            heartbeat_timeout: Duration::from_millis(300),
        },
    };
    relay_runner::start(config, executor).await.unwrap()
}

/// Counting executor with a fixed report and optional run duration.
pub struct StubExecutor {
    report: Vec<u8>,
    delay: Duration,
    runs: AtomicUsize,
}

impl StubExecutor {
    pub fn new(report: &str) -> Arc<Self> {
        Self::slow(report, Duration::ZERO)
    }

    pub fn slow(report: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self { report: report.as_bytes().to_vec(), delay, runs: AtomicUsize::new(0) })
    }

    /// Number of jobs started so far.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestExecutor for StubExecutor {
    async fn run(&self, _commit: &CommitId) -> Result<Vec<u8>, ExecutorError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.report.clone())
    }
}
