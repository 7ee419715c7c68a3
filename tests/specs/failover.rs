// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner loss: eviction, requeue, and completion elsewhere.

use relay_wire::{read_request, write_reply};
use tokio::net::TcpListener;

use crate::prelude::*;

/// A runner that answers pings, accepts exactly one job, and then
/// vanishes without ever reporting results.
async fn doomed_runner() -> (u16, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let task = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { return };
            let (mut reader, mut writer) = stream.into_split();
            match read_request(&mut reader, SPEC_IO_TIMEOUT).await {
                Ok(Request::Ping) => {
                    let _ = write_reply(&mut writer, &Reply::Pong, SPEC_IO_TIMEOUT).await;
                }
                Ok(Request::RunTest(_)) => {
                    let _ = write_reply(&mut writer, &Reply::Ok, SPEC_IO_TIMEOUT).await;
                    return;
                }
                _ => return,
            }
        }
    });
    (port, task)
}

#[tokio::test]
async fn work_on_a_dead_runner_is_requeued_and_finished_elsewhere() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = start_dispatcher(dir.path()).await;
    let addr = dispatcher.addr().to_string();

    let (doomed_port, doomed) = doomed_runner().await;
    let reply = communicate(
        &addr,
        &Request::Register(RunnerRef::new("127.0.0.1", doomed_port)),
        SPEC_IO_TIMEOUT,
    )
    .await
    .unwrap();
    assert_eq!(reply, Reply::Ok);

    communicate(&addr, &Request::Dispatch(commit("abc123")), SPEC_IO_TIMEOUT).await.unwrap();

    // The doomed runner accepts the job and disappears.
    assert!(wait_for(SPEC_WAIT_MAX_MS, || doomed.is_finished()).await);

    // A healthy runner joins; the heartbeat monitor evicts the dead
    // one, the commit is requeued, and the new runner completes it.
    let executor = StubExecutor::new("recovered");
    let runner = start_runner(&dispatcher, executor.clone()).await;

    let result_path = dir.path().join("abc123");
    assert!(wait_for(SPEC_WAIT_MAX_MS, || result_path.exists()).await, "commit was lost");
    assert_eq!(std::fs::read(&result_path).unwrap(), b"recovered");

    let survivors = dispatcher.registry().runners();
    assert_eq!(survivors, vec![RunnerRef::new("127.0.0.1", runner.addr().port())]);

    runner.shutdown().await;
    dispatcher.shutdown().await;
}
