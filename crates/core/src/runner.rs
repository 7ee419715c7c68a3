// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner identity.

use std::fmt;
use thiserror::Error;

/// Address of one registered test-runner agent.
///
/// The `(host, port)` pair is the runner's identity in the dispatcher
/// registry: no two live runners share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunnerRef {
    pub host: String,
    pub port: u16,
}

/// Errors parsing a `host:port` address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunnerAddrError {
    #[error("address must be host:port, got {0:?}")]
    MissingPort(String),

    #[error("invalid port in {0:?}")]
    InvalidPort(String),
}

impl RunnerRef {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Parse a `host:port` string (e.g. `localhost:8900`).
    ///
    /// The port must be a non-zero u16; zero is reserved for
    /// "pick any port" and is never a peer address.
    pub fn parse(addr: &str) -> Result<Self, RunnerAddrError> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| RunnerAddrError::MissingPort(addr.to_string()))?;
        if host.is_empty() {
            return Err(RunnerAddrError::MissingPort(addr.to_string()));
        }
        let port: u16 = port.parse().map_err(|_| RunnerAddrError::InvalidPort(addr.to_string()))?;
        if port == 0 {
            return Err(RunnerAddrError::InvalidPort(addr.to_string()));
        }
        Ok(Self::new(host, port))
    }

    /// The connectable `host:port` form of this runner.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for RunnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
