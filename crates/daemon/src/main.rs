// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tsd: the task scheduler daemon binary.
//!
//! Process bootstrap (§9A, "ambient stack"): parses the `--version`/`--help` informational
//! flags, loads [`DaemonConfig`] from the environment, sets up rolling-file + stderr logging,
//! connects the database gateway, and drives the [`Scheduler`] on a `tokio::select!` loop
//! until a POSIX signal asks it to stop or reload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod auth;
mod config;
mod credential;
mod error;
mod heartbeat;
mod reconcile;
mod rows;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use config::DaemonConfig;
use credential::EnvCredentialProvider;
use scheduler::Scheduler;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use ts_core::SystemClock;
use ts_gateway::Gateway;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("tsd {VERSION}");
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: tsd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = DaemonConfig::load();
    let _log_guard = setup_logging(&config)?;

    info!("starting task scheduler daemon");

    let database_url = config.database_url.clone().ok_or("TS_DATABASE_URL is not set")?;
    let gateway = Gateway::connect(&database_url, config.database_pool_min.max(1)).await?;
    let gateway = Arc::new(gateway);
    let credentials = Arc::new(EnvCredentialProvider);

    let mut scheduler = Scheduler::new(
        gateway,
        credentials,
        SystemClock,
        config.agent.clone(),
        config.host.clone(),
        config.heartbeat_interval,
    );

    run(&mut scheduler).await
}

/// The `tokio::select!` event loop (§5, §9A): a 1-second timer, outstanding batch
/// completions, and the four POSIX signals the spec names (`SIGTERM`/`SIGQUIT` exit,
/// `SIGHUP` reload, `SIGUSR1` log reopen). No mutex anywhere in this loop — only one task
/// ever touches `scheduler`.
async fn run<G, C>(scheduler: &mut scheduler::Scheduler<G, C>) -> Result<(), Box<dyn std::error::Error>>
where
    G: ts_gateway::Dispatch + 'static,
    C: ts_core::Clock + 'static,
{
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    info!("daemon ready");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                scheduler.tick();
            }
            () = scheduler.poll_one(), if scheduler.has_pending() => {}
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigquit.recv() => {
                info!("received SIGQUIT, shutting down");
                break;
            }
            _ = sighup.recv() => {
                info!("received SIGHUP, reloading in-memory state");
                scheduler.reload();
            }
            _ = sigusr1.recv() => {
                warn!("received SIGUSR1, log reopen requested (best-effort, no-op for non-blocking file appender)");
            }
        }
    }

    // Drain in-flight batches before exiting so a cancel/complete callback is never lost
    // mid-transaction (§5, "SIGTERM/SIGQUIT flip an exiting flag polled by the loop").
    while scheduler.has_pending() {
        scheduler.poll_one().await;
    }

    info!("daemon stopped");
    Ok(())
}

fn print_help() {
    println!("tsd {VERSION}");
    println!("Task scheduler daemon — drives job lifecycle transitions against a Postgres");
    println!("stored-procedure catalog.");
    println!();
    println!("USAGE:");
    println!("    tsd");
    println!();
    println!("The daemon reads its configuration from the environment (TS_DATABASE_URL,");
    println!("TS_CLIENT_ID, TS_CLIENT_SECRET, TS_HEARTBEAT_INTERVAL_MS, ...) and is typically");
    println!("started by a process supervisor, not invoked interactively.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}

fn setup_logging(
    config: &DaemonConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        config.log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("daemon.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(guard)
}
