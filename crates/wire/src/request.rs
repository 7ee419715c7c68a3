// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request grammar: `COMMAND[:ARG]*`.

use relay_core::{CommitId, RunnerRef};

use crate::frame::{ProtocolError, MAX_PAYLOAD};

/// A parsed control-channel request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Liveness probe (observer/runner -> dispatcher).
    Status,
    /// Heartbeat (dispatcher -> runner).
    Ping,
    /// Runner joins the pool (runner -> dispatcher).
    Register(RunnerRef),
    /// Schedule a test run for a commit (observer -> dispatcher).
    Dispatch(CommitId),
    /// Hand a job to a runner (dispatcher -> runner).
    RunTest(CommitId),
    /// Report a finished job (runner -> dispatcher). The payload is the
    /// raw test report, framed with an explicit byte length.
    Results { commit: CommitId, payload: Vec<u8> },
}

impl Request {
    /// Command keyword, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Status => "status",
            Request::Ping => "ping",
            Request::Register(_) => "register",
            Request::Dispatch(_) => "dispatch",
            Request::RunTest(_) => "runtest",
            Request::Results { .. } => "results",
        }
    }

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Request::Status => b"status".to_vec(),
            Request::Ping => b"ping".to_vec(),
            Request::Register(runner) => {
                format!("register:{}:{}", runner.host, runner.port).into_bytes()
            }
            Request::Dispatch(commit) => format!("dispatch:{}", commit).into_bytes(),
            Request::RunTest(commit) => format!("runtest:{}", commit).into_bytes(),
            Request::Results { commit, payload } => {
                let mut buf = format!("results:{}:{}:", commit, payload.len()).into_bytes();
                buf.extend_from_slice(payload);
                buf
            }
        }
    }

    /// Parse a complete request buffer.
    ///
    /// All commands except `results` are pure text; a trailing newline
    /// is tolerated so hand-driven probes (`printf status | nc`) work.
    /// The `results` payload is exact bytes and is never trimmed.
    pub fn parse(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.is_empty() {
            return Err(ProtocolError::ConnectionClosed);
        }

        let (command, rest) = match buf.iter().position(|&b| b == b':') {
            Some(i) => (&buf[..i], Some(&buf[i + 1..])),
            None => (&buf[..], None),
        };
        let command = std::str::from_utf8(command)
            .map_err(|_| ProtocolError::Malformed)?
            .trim_end_matches(['\r', '\n']);

        match (command, rest) {
            ("status", None) => Ok(Request::Status),
            ("ping", None) => Ok(Request::Ping),
            ("register", Some(rest)) => {
                let addr = text_arg(rest)?;
                let runner = RunnerRef::parse(addr).map_err(|_| ProtocolError::Malformed)?;
                Ok(Request::Register(runner))
            }
            ("dispatch", Some(rest)) => Ok(Request::Dispatch(commit_arg(rest)?)),
            ("runtest", Some(rest)) => Ok(Request::RunTest(commit_arg(rest)?)),
            ("results", Some(rest)) => parse_results(rest),
            _ => Err(ProtocolError::Malformed),
        }
    }

    /// Declared total length of a `results` request whose buffer starts
    /// with a complete `results:<commit>:<len>:` header, if the header
    /// is available yet. Used by the frame reader to stop at exactly
    /// the right byte and to reject oversized declarations early.
    pub(crate) fn results_total_len(buf: &[u8]) -> Result<Option<usize>, ProtocolError> {
        const PREFIX: &[u8] = b"results:";
        if !buf.starts_with(PREFIX) {
            return Ok(None);
        }
        let rest = &buf[PREFIX.len()..];
        let Some(commit_end) = rest.iter().position(|&b| b == b':') else {
            return Ok(None); // header still incomplete
        };
        let after_commit = &rest[commit_end + 1..];
        let Some(len_end) = after_commit.iter().position(|&b| b == b':') else {
            return Ok(None);
        };
        let declared = parse_len(&after_commit[..len_end])?;
        let header = PREFIX.len() + commit_end + 1 + len_end + 1;
        Ok(Some(header + declared))
    }
}

/// Parse and bound a declared payload length.
fn parse_len(digits: &[u8]) -> Result<usize, ProtocolError> {
    let declared: usize = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(ProtocolError::Malformed)?;
    if declared > MAX_PAYLOAD {
        return Err(ProtocolError::PayloadTooLarge(declared));
    }
    Ok(declared)
}

fn parse_results(rest: &[u8]) -> Result<Request, ProtocolError> {
    let commit_end = rest.iter().position(|&b| b == b':').ok_or(ProtocolError::Malformed)?;
    let commit = commit_arg_exact(&rest[..commit_end])?;
    let after_commit = &rest[commit_end + 1..];
    let len_end = after_commit.iter().position(|&b| b == b':').ok_or(ProtocolError::Malformed)?;
    let declared = parse_len(&after_commit[..len_end])?;
    let payload = &after_commit[len_end + 1..];
    if payload.len() != declared {
        return Err(ProtocolError::LengthMismatch { declared, received: payload.len() });
    }
    Ok(Request::Results { commit, payload: payload.to_vec() })
}

fn text_arg(bytes: &[u8]) -> Result<&str, ProtocolError> {
    let s = std::str::from_utf8(bytes).map_err(|_| ProtocolError::Malformed)?;
    Ok(s.trim_end_matches(['\r', '\n']))
}

fn commit_arg(bytes: &[u8]) -> Result<CommitId, ProtocolError> {
    CommitId::parse(text_arg(bytes)?).ok_or(ProtocolError::Malformed)
}

/// Commit ID inside a `results` frame: no newline trimming, the byte
/// count that follows depends on exact offsets.
fn commit_arg_exact(bytes: &[u8]) -> Result<CommitId, ProtocolError> {
    let s = std::str::from_utf8(bytes).map_err(|_| ProtocolError::Malformed)?;
    CommitId::parse(s).ok_or(ProtocolError::Malformed)
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
