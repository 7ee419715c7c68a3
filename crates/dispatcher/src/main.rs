// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! relayd: dispatcher daemon entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use relay_dispatcher::{start, Config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relayd", about = "CI dispatcher: coordinates a pool of test runners")]
struct Args {
    /// Host to listen on.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8888)]
    port: u16,

    /// Directory receiving one result file per commit ID.
    #[arg(long, default_value = "test_results")]
    results_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = Config {
        host: args.host,
        port: args.port,
        results_dir: args.results_dir,
        ..Config::default()
    };

    let handle = match start(config).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to wait for interrupt: {}", e);
    }
    info!("interrupt received, shutting down");
    handle.shutdown().await;
    ExitCode::SUCCESS
}
