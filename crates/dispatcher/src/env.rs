// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the dispatcher.

use std::time::Duration;

/// Timing knobs for the dispatcher's loops and network calls.
///
/// Every network operation is bounded: a runner that hangs past its
/// timeout is indistinguishable from a dead one.
#[derive(Debug, Clone)]
pub struct Tunables {
    /// Per-connection read/write timeout for the listener.
    pub io_timeout: Duration,
    /// Heartbeat monitor period.
    pub ping_interval: Duration,
    /// Timeout for a single `ping` round-trip.
    pub ping_timeout: Duration,
    /// Timeout for a single `runtest` hand-off round-trip.
    pub runtest_timeout: Duration,
    /// Redistributor fallback tick when no wake-up arrives.
    pub redispatch_interval: Duration,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            io_timeout: Duration::from_secs(5),
            ping_interval: Duration::from_secs(1),
            ping_timeout: Duration::from_secs(2),
            runtest_timeout: Duration::from_secs(5),
            redispatch_interval: Duration::from_secs(5),
        }
    }
}

impl Tunables {
    /// Defaults overridden by `RELAY_*_MS` environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            io_timeout: duration_ms("RELAY_IO_TIMEOUT_MS").unwrap_or(d.io_timeout),
            ping_interval: duration_ms("RELAY_PING_INTERVAL_MS").unwrap_or(d.ping_interval),
            ping_timeout: duration_ms("RELAY_PING_TIMEOUT_MS").unwrap_or(d.ping_timeout),
            runtest_timeout: duration_ms("RELAY_RUNTEST_TIMEOUT_MS").unwrap_or(d.runtest_timeout),
            redispatch_interval: duration_ms("RELAY_REDISPATCH_INTERVAL_MS")
                .unwrap_or(d.redispatch_interval),
        }
    }
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}
