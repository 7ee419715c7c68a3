// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One job at a time: a busy runner refuses, the queue waits its turn.

use crate::prelude::*;

#[tokio::test]
async fn busy_runner_refuses_direct_work() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = start_dispatcher(dir.path()).await;
    let executor = StubExecutor::slow("done", Duration::from_secs(2));
    let runner = start_runner(&dispatcher, executor.clone()).await;

    let addr = dispatcher.addr().to_string();
    communicate(&addr, &Request::Dispatch(commit("busy-1")), SPEC_IO_TIMEOUT).await.unwrap();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || executor.runs() >= 1).await);

    // The runner is mid-job; a second hand-off is refused outright.
    let runner_addr = runner.addr().to_string();
    let reply = communicate(&runner_addr, &Request::RunTest(commit("busy-2")), SPEC_IO_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(reply, Reply::Busy);

    assert!(wait_for(SPEC_WAIT_MAX_MS, || dir.path().join("busy-1").exists()).await);

    runner.shutdown().await;
    dispatcher.shutdown().await;
}

#[tokio::test]
async fn queued_commits_run_one_after_another() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = start_dispatcher(dir.path()).await;
    let executor = StubExecutor::slow("done", Duration::from_millis(300));
    let runner = start_runner(&dispatcher, executor.clone()).await;

    let addr = dispatcher.addr().to_string();
    communicate(&addr, &Request::Dispatch(commit("first")), SPEC_IO_TIMEOUT).await.unwrap();
    communicate(&addr, &Request::Dispatch(commit("second")), SPEC_IO_TIMEOUT).await.unwrap();

    let both = wait_for(SPEC_WAIT_MAX_MS, || {
        dir.path().join("first").exists() && dir.path().join("second").exists()
    });
    assert!(both.await, "second commit never got its turn");
    assert_eq!(executor.runs(), 2);

    runner.shutdown().await;
    dispatcher.shutdown().await;
}
