// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher loss: the runner's watchdog shuts the agent down.

use crate::prelude::*;

#[tokio::test]
async fn runner_terminates_after_dispatcher_disappears() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = start_dispatcher(dir.path()).await;
    let runner = start_runner(&dispatcher, StubExecutor::new("ok")).await;

    // Take the dispatcher away; its port stops answering entirely.
    dispatcher.shutdown().await;

    let terminated =
        tokio::time::timeout(Duration::from_secs(10), runner.terminated()).await;
    assert!(terminated.is_ok(), "watchdog never noticed the dispatcher was gone");

    runner.shutdown().await;
}
