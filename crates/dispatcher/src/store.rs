// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable result artifacts.
//!
//! One file per commit ID in a flat directory, content = the raw report
//! payload with protocol framing stripped. The layout is part of the
//! external contract: a build-status UI reads these files directly.

use std::path::{Path, PathBuf};

use relay_core::CommitId;

/// Flat-directory result store, created on first use.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a report. A duplicate report for the same commit
    /// overwrites the previous file (idempotent completion).
    pub async fn write(&self, commit: &CommitId, payload: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        // CommitId's charset guarantees this stays inside `dir`.
        let path = self.dir.join(commit.as_str());
        tokio::fs::write(&path, payload).await?;
        Ok(path)
    }

    /// Read back a stored report.
    pub async fn read(&self, commit: &CommitId) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.dir.join(commit.as_str())).await
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
