// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! relayr: test-runner agent entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use relay_runner::executor::ShellExecutor;
use relay_runner::{start, RunnerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relayr", about = "CI test runner: executes one job at a time for a dispatcher")]
struct Args {
    /// Host to bind and advertise.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Listening port; when omitted, scans from 8900.
    #[arg(long)]
    port: Option<u16>,

    /// Dispatcher host:port address.
    #[arg(long, default_value = "localhost:8888")]
    dispatcher: String,

    /// Script invoked as `<script> <repo> <commit>` to run the tests.
    #[arg(long, default_value = "./test_runner_script.sh")]
    script: PathBuf,

    /// Path to the repository working copy under test.
    #[arg(value_name = "REPO")]
    repo: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = RunnerConfig {
        host: args.host,
        port: args.port,
        dispatcher: args.dispatcher,
        ..RunnerConfig::default()
    };
    let executor = Arc::new(ShellExecutor::new(args.script, args.repo));

    let handle = match start(config, executor).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %handle.addr(), "runner serving");

    tokio::select! {
        _ = handle.terminated() => info!("runner stopping on its own"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("failed to wait for interrupt: {}", e);
            }
            info!("interrupt received, shutting down");
        }
    }
    handle.shutdown().await;
    ExitCode::SUCCESS
}
