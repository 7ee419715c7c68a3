// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit identifier.

use std::borrow::Borrow;
use std::fmt;

/// Opaque revision ID naming one unit of schedulable work.
///
/// Commit IDs arrive over the wire and double as result-store file
/// names, so the accepted character set is restricted to
/// `[A-Za-z0-9._-]` (validated by [`CommitId::parse`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    /// Validate and wrap a wire-supplied revision ID.
    ///
    /// Returns `None` for an empty string or any character outside the
    /// filename-safe set. Path separators are rejected here so a
    /// commit ID can never escape the result directory.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')) {
            return None;
        }
        // "." and ".." are valid per the charset but are directory names
        if s == "." || s == ".." {
            return None;
        }
        Some(Self(s.to_string()))
    }

    /// Get the string value of this CommitId.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for CommitId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CommitId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for CommitId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
