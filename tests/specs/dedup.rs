// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duplicate dispatches and registrations collapse to one owner.

use relay_wire::{read_request, write_reply};
use tokio::net::TcpListener;

use crate::prelude::*;

/// A bare listener that answers heartbeat pings so the pool entry under
/// test is not evicted mid-assertion.
async fn pong_forever(listener: TcpListener) {
    loop {
        let Ok((stream, _)) = listener.accept().await else { return };
        let (mut reader, mut writer) = stream.into_split();
        if let Ok(Request::Ping) = read_request(&mut reader, SPEC_IO_TIMEOUT).await {
            let _ = write_reply(&mut writer, &Reply::Pong, SPEC_IO_TIMEOUT).await;
        }
    }
}

#[tokio::test]
async fn duplicate_dispatch_runs_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = start_dispatcher(dir.path()).await;
    let addr = dispatcher.addr().to_string();

    // No runners yet: both dispatches are queued (with a warning reply)
    // but only one entry survives.
    for _ in 0..2 {
        let reply =
            communicate(&addr, &Request::Dispatch(commit("abc123")), SPEC_IO_TIMEOUT)
                .await
                .unwrap();
        assert_eq!(reply, Reply::Error("No runners are registered".to_string()));
    }
    assert_eq!(dispatcher.registry().pending_commits(), vec![commit("abc123")]);

    let executor = StubExecutor::new("once");
    let runner = start_runner(&dispatcher, executor.clone()).await;

    assert!(wait_for(SPEC_WAIT_MAX_MS, || dir.path().join("abc123").exists()).await);

    // Leave the redistributor time to make a second pass.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(executor.runs(), 1);

    runner.shutdown().await;
    dispatcher.shutdown().await;
}

#[tokio::test]
async fn duplicate_registration_keeps_one_pool_entry() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = start_dispatcher(dir.path()).await;
    let addr = dispatcher.addr().to_string();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let pinger = tokio::spawn(pong_forever(listener));

    let runner_ref = RunnerRef::new("127.0.0.1", port);
    for _ in 0..2 {
        let reply = communicate(&addr, &Request::Register(runner_ref.clone()), SPEC_IO_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(reply, Reply::Ok);
    }
    assert_eq!(dispatcher.registry().runners(), vec![runner_ref]);

    pinger.abort();
    dispatcher.shutdown().await;
}
