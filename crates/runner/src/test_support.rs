// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared stubs for runner tests.

use async_trait::async_trait;
use relay_core::CommitId;

use crate::executor::{ExecutorError, TestExecutor};

/// Executor that returns a fixed report immediately.
pub(crate) struct StubExecutor {
    report: Vec<u8>,
}

impl StubExecutor {
    pub fn new(report: impl Into<Vec<u8>>) -> Self {
        Self { report: report.into() }
    }
}

#[async_trait]
impl TestExecutor for StubExecutor {
    async fn run(&self, _commit: &CommitId) -> Result<Vec<u8>, ExecutorError> {
        Ok(self.report.clone())
    }
}
