// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fingerd: the Finger orchestration daemon.

use fg_daemon::lifecycle::{self, Config};
use fg_daemon::listener::Listener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let (dir, file) = match (config.log_path.parent(), config.log_path.file_name()) {
        (Some(dir), Some(file)) => (dir.to_path_buf(), file.to_owned()),
        _ => return None,
    };
    std::fs::create_dir_all(&dir).ok()?;
    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fingerd: {e}");
            std::process::exit(1);
        }
    };
    let _log_guard = init_tracing(&config);

    let outcome = match lifecycle::startup(&config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("fingerd: {e}");
            std::process::exit(1);
        }
    };
    info!(home = %config.home.root().display(), "fingerd started");

    let shutdown = CancellationToken::new();
    let listener = Listener::new(outcome.socket, outcome.daemon.clone(), shutdown.clone());
    let listener_task = tokio::spawn(listener.run());

    wait_for_stop_signal(&shutdown).await;
    shutdown.cancel();

    lifecycle::shutdown(&outcome.daemon, &config).await;
    listener_task.abort();
}

/// Resolve on SIGTERM, SIGINT, or an internal shutdown request.
async fn wait_for_stop_signal(shutdown: &CancellationToken) {
    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
    {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!(error = %e, "cannot install SIGTERM handler");
            shutdown.cancelled().await;
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM received"),
        interrupted = tokio::signal::ctrl_c() => {
            if interrupted.is_ok() {
                info!("SIGINT received");
            }
        }
        _ = shutdown.cancelled() => info!("shutdown requested over the control socket"),
    }
}
