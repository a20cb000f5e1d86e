// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hub URL advertised to clients (`FINGER_HUB_URL`).
pub fn hub_url() -> String {
    std::env::var("FINGER_HUB_URL").unwrap_or_else(|_| "http://127.0.0.1:7801".to_string())
}

/// WebSocket URL advertised to clients (`FINGER_WS_URL`).
pub fn ws_url() -> String {
    std::env::var("FINGER_WS_URL").unwrap_or_else(|_| "ws://127.0.0.1:7801/ws".to_string())
}

/// Agent config directory override (`FINGER_AGENT_CONFIG_DIR`).
pub fn agent_config_dir() -> Option<PathBuf> {
    std::env::var("FINGER_AGENT_CONFIG_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// CLI plugin directory override (`FINGER_CLI_PLUGIN_DIR`).
pub fn cli_plugin_dir() -> Option<PathBuf> {
    std::env::var("FINGER_CLI_PLUGIN_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Capability manifest directory override (`FINGER_CLI_CAPABILITY_DIR`).
pub fn cli_capability_dir() -> Option<PathBuf> {
    std::env::var("FINGER_CLI_CAPABILITY_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Agent id capability invocations run as (`FINGER_CAPABILITY_AGENT_ID`).
pub fn capability_agent_id() -> String {
    std::env::var("FINGER_CAPABILITY_AGENT_ID").unwrap_or_else(|_| "capability".to_string())
}

/// Default IPC timeout (`FINGER_IPC_TIMEOUT_MS`).
pub fn ipc_timeout() -> Duration {
    std::env::var("FINGER_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
