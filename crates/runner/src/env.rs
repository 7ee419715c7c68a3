// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the runner.

use std::time::Duration;

/// Timing knobs for the agent's network calls and watchdog.
#[derive(Debug, Clone)]
pub struct Tunables {
    /// Per-connection read/write timeout, also used for `register` and
    /// `status` probes.
    pub io_timeout: Duration,
    /// Timeout for delivering a `results` report (payloads can be
    /// large, so this is more generous than `io_timeout`).
    pub report_timeout: Duration,
    /// Watchdog check period.
    pub watchdog_interval: Duration,
    /// Silence threshold: when no `ping` has arrived for this long the
    /// watchdog probes the dispatcher directly.
    pub heartbeat_timeout: Duration,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            io_timeout: Duration::from_secs(5),
            report_timeout: Duration::from_secs(30),
            watchdog_interval: Duration::from_secs(5),
            heartbeat_timeout: Duration::from_secs(10),
        }
    }
}

impl Tunables {
    /// Defaults overridden by `RELAY_RUNNER_*_MS` environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            io_timeout: duration_ms("RELAY_RUNNER_IO_TIMEOUT_MS").unwrap_or(d.io_timeout),
            report_timeout: duration_ms("RELAY_RUNNER_REPORT_TIMEOUT_MS")
                .unwrap_or(d.report_timeout),
            watchdog_interval: duration_ms("RELAY_RUNNER_WATCHDOG_INTERVAL_MS")
                .unwrap_or(d.watchdog_interval),
            heartbeat_timeout: duration_ms("RELAY_RUNNER_HEARTBEAT_TIMEOUT_MS")
                .unwrap_or(d.heartbeat_timeout),
        }
    }
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}
