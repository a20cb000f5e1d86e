// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Finger home directory layout.
//!
//! Everything the daemon persists lives under one root (default
//! `~/.finger`, overridable with `FINGER_HOME`):
//!
//! ```text
//! agents/         *.agent.json configs + <agentId>.pid
//! workflows/      <workflowId>.json authoritative snapshots
//! checkpoints/    <checkpointId>.json.zst
//! sessions/       <sessionId>/<agentId>/<mode>/context-ledger.jsonl …
//! gateways/       gateway manifests
//! capabilities/   capability manifests
//! plugins/        plugin manifests
//! logs/           daemon log files
//! ```

use fg_core::error::FingerError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FingerHome {
    root: PathBuf,
}

impl FingerHome {
    /// Resolve from `FINGER_HOME` or fall back to `~/.finger`.
    pub fn resolve() -> Result<Self, FingerError> {
        if let Ok(root) = std::env::var("FINGER_HOME") {
            if !root.is_empty() {
                return Ok(Self { root: PathBuf::from(root) });
            }
        }
        let home = dirs::home_dir()
            .ok_or_else(|| FingerError::InvalidConfig("cannot determine home directory".into()))?;
        Ok(Self { root: home.join(".finger") })
    }

    /// Use an explicit root (tests, embedded use).
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    pub fn workflows_dir(&self) -> PathBuf {
        self.root.join("workflows")
    }

    pub fn checkpoints_dir(&self) -> PathBuf {
        self.root.join("checkpoints")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn gateways_dir(&self) -> PathBuf {
        self.root.join("gateways")
    }

    pub fn capabilities_dir(&self) -> PathBuf {
        self.root.join("capabilities")
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join("plugins")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn socket_path(&self) -> PathBuf {
        self.root.join("daemon.sock")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.root.join("daemon.pid")
    }

    pub fn agent_pid_path(&self, agent_id: &str) -> PathBuf {
        self.agents_dir().join(format!("{agent_id}.pid"))
    }

    /// Directory holding one agent-mode ledger:
    /// `sessions/<session>/<agent>/<mode>/`.
    pub fn ledger_dir(&self, session_id: &str, agent_id: &str, mode: &str) -> PathBuf {
        self.sessions_dir().join(session_id).join(agent_id).join(mode)
    }

    /// Create every directory of the layout.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        for dir in [
            self.agents_dir(),
            self.workflows_dir(),
            self.checkpoints_dir(),
            self.sessions_dir(),
            self.gateways_dir(),
            self.capabilities_dir(),
            self.plugins_dir(),
            self.logs_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "home_tests.rs"]
mod tests;
