// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam to the external test executor.
//!
//! The agent core only needs a report payload; how the tests actually
//! run (shell script, container, in-process) is behind [`TestExecutor`].

use std::path::PathBuf;

use async_trait::async_trait;
use relay_core::CommitId;
use thiserror::Error;
use tracing::debug;

/// Errors launching the external executor. A test suite that runs and
/// fails is not an error — its report is the evidence.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Executes the test suite for one commit and produces the raw report.
#[async_trait]
pub trait TestExecutor: Send + Sync {
    async fn run(&self, commit: &CommitId) -> Result<Vec<u8>, ExecutorError>;
}

/// Runs a script with the repository path and commit ID as arguments,
/// capturing combined stdout/stderr as the report.
pub struct ShellExecutor {
    script: PathBuf,
    repo: PathBuf,
}

impl ShellExecutor {
    pub fn new(script: PathBuf, repo: PathBuf) -> Self {
        Self { script, repo }
    }
}

#[async_trait]
impl TestExecutor for ShellExecutor {
    async fn run(&self, commit: &CommitId) -> Result<Vec<u8>, ExecutorError> {
        let output = tokio::process::Command::new(&self.script)
            .arg(&self.repo)
            .arg(commit.as_str())
            .output()
            .await
            .map_err(|source| ExecutorError::Launch {
                command: self.script.display().to_string(),
                source,
            })?;

        debug!(%commit, status = %output.status, "test script finished");
        let mut report = output.stdout;
        report.extend_from_slice(&output.stderr);
        Ok(report)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
