// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Happy-path pipeline: dispatch, execute, persist.

use crate::prelude::*;

#[tokio::test]
async fn commit_flows_from_dispatch_to_result_file() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = start_dispatcher(dir.path()).await;
    let executor = StubExecutor::new("all tests passed");
    let runner = start_runner(&dispatcher, executor.clone()).await;

    let addr = dispatcher.addr().to_string();
    let reply = communicate(&addr, &Request::Dispatch(commit("abc123")), SPEC_IO_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(reply, Reply::Ok);

    let result_path = dir.path().join("abc123");
    assert!(wait_for(SPEC_WAIT_MAX_MS, || result_path.exists()).await, "result never landed");
    assert_eq!(std::fs::read(&result_path).unwrap(), b"all tests passed");
    assert_eq!(executor.runs(), 1);

    // nothing left pending or assigned
    assert!(dispatcher.registry().pending_commits().is_empty());
    assert_eq!(dispatcher.registry().assigned_runner(&commit("abc123")), None);

    runner.shutdown().await;
    dispatcher.shutdown().await;
}

#[tokio::test]
async fn status_answers_while_work_is_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = start_dispatcher(dir.path()).await;
    let executor = StubExecutor::slow("slow report", Duration::from_millis(300));
    let runner = start_runner(&dispatcher, executor.clone()).await;

    let addr = dispatcher.addr().to_string();
    communicate(&addr, &Request::Dispatch(commit("deadbeef")), SPEC_IO_TIMEOUT).await.unwrap();

    let reply = communicate(&addr, &Request::Status, SPEC_IO_TIMEOUT).await.unwrap();
    assert_eq!(reply, Reply::Ok);

    let result_path = dir.path().join("deadbeef");
    assert!(wait_for(SPEC_WAIT_MAX_MS, || result_path.exists()).await);

    runner.shutdown().await;
    dispatcher.shutdown().await;
}

#[tokio::test]
async fn several_commits_all_complete_on_one_runner() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = start_dispatcher(dir.path()).await;
    let executor = StubExecutor::new("ok");
    let runner = start_runner(&dispatcher, executor.clone()).await;

    let addr = dispatcher.addr().to_string();
    let commits = ["rev-1", "rev-2", "rev-3"];
    for id in commits {
        communicate(&addr, &Request::Dispatch(commit(id)), SPEC_IO_TIMEOUT).await.unwrap();
    }

    let all_done =
        wait_for(SPEC_WAIT_MAX_MS, || commits.iter().all(|id| dir.path().join(id).exists()));
    assert!(all_done.await, "some commits never finished");
    assert_eq!(executor.runs(), 3);

    runner.shutdown().await;
    dispatcher.shutdown().await;
}
