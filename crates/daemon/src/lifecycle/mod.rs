// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

mod startup;

pub use startup::{startup, StartupOutcome};

use fg_core::clock::{EpochMillis, SystemClock};
use fg_gateway::GatewaySupervisor;
use fg_hub::{EventBus, MessageHub, ModuleRegistry};
use fg_runtime::{
    AgentRuntimeBlock, ErrorHandler, FsmManager, InputLockManager, SessionManager, ToolExecutor,
    WorkflowManager,
};
use fg_storage::{FingerHome, Ledger};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Daemon configuration paths, all under the finger home.
#[derive(Debug, Clone)]
pub struct Config {
    pub home: FingerHome,
    /// Path to the Unix control socket
    pub socket_path: PathBuf,
    /// Path to the lock/PID file
    pub lock_path: PathBuf,
    /// Path to the daemon log file
    pub log_path: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon (`~/.finger`, or
    /// `FINGER_HOME`).
    pub fn load() -> Result<Self, LifecycleError> {
        let home = FingerHome::resolve().map_err(|e| LifecycleError::Home(e.to_string()))?;
        Ok(Self::at(home))
    }

    pub fn at(home: FingerHome) -> Self {
        Self {
            socket_path: home.socket_path(),
            lock_path: home.pid_path(),
            log_path: home.logs_dir().join("daemon.log"),
            home,
        }
    }
}

/// Errors from daemon lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot resolve finger home: {0}")]
    Home(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("another daemon already holds {0}")]
    AlreadyRunning(PathBuf),
}

/// Every long-lived component of the daemon, wired together at startup.
pub struct Daemon {
    pub home: FingerHome,
    pub bus: EventBus,
    pub hub: MessageHub,
    pub registry: ModuleRegistry,
    pub tools: ToolExecutor,
    pub errors: ErrorHandler,
    pub sessions: SessionManager,
    pub locks: InputLockManager,
    pub workflows: WorkflowManager,
    pub workflow_fsms: FsmManager,
    pub orchestrators: FsmManager,
    pub agent_block: AgentRuntimeBlock,
    pub gateways: Arc<GatewaySupervisor>,
    pub ledger: Ledger,
    clock: Arc<dyn EpochMillis>,
    /// Held for the daemon's lifetime; dropping releases the PID lock.
    _pid_lock: File,
}

impl Daemon {
    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }
}

/// Take the PID lockfile, refusing to start a second daemon.
pub(crate) fn acquire_pid_lock(path: &std::path::Path) -> Result<File, LifecycleError> {
    use fs2::FileExt;
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new().create(true).write(true).open(path)?;
    if file.try_lock_exclusive().is_err() {
        return Err(LifecycleError::AlreadyRunning(path.to_path_buf()));
    }
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

pub(crate) fn system_clock() -> Arc<dyn EpochMillis> {
    Arc::new(SystemClock)
}

/// Graceful stop: drain gateways, flush workflow snapshots, remove the
/// socket and pidfile.
pub async fn shutdown(daemon: &Daemon, config: &Config) {
    info!("daemon shutting down");
    daemon.gateways.stop_all().await;
    daemon.workflows.flush_all();
    if let Err(e) = std::fs::remove_file(&config.socket_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(error = %e, "failed to remove socket file");
        }
    }
    if let Err(e) = std::fs::remove_file(&config.lock_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(error = %e, "failed to remove pid file");
        }
    }
    info!("daemon stopped");
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
