// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply grammar.

use crate::frame::ProtocolError;

/// A control-channel reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Request accepted.
    Ok,
    /// Heartbeat answer.
    Pong,
    /// Runner already has a job; caller retries elsewhere.
    Busy,
    /// Input did not match the command grammar.
    Invalid,
    /// Free-text error (e.g. `No runners are registered`).
    Error(String),
}

impl Reply {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Reply::Ok => b"OK".to_vec(),
            Reply::Pong => b"pong".to_vec(),
            Reply::Busy => b"BUSY".to_vec(),
            Reply::Invalid => b"Invalid command".to_vec(),
            Reply::Error(message) => message.clone().into_bytes(),
        }
    }

    /// Parse a complete reply buffer. Any text that is not a known
    /// keyword is an error reply carrying that text.
    pub fn parse(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.is_empty() {
            return Err(ProtocolError::ConnectionClosed);
        }
        let text = std::str::from_utf8(buf).map_err(|_| ProtocolError::Malformed)?;
        Ok(match text.trim_end_matches(['\r', '\n']) {
            "OK" => Reply::Ok,
            "pong" => Reply::Pong,
            "BUSY" => Reply::Busy,
            "Invalid command" => Reply::Invalid,
            other => Reply::Error(other.to_string()),
        })
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok)
    }
}

#[cfg(test)]
#[path = "reply_tests.rs"]
mod tests;
