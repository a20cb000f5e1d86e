// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway manifests, loaded from `gateways/*.json`.

use crate::envelope::DeliveryMode;
use fg_core::error::FingerError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Which way messages flow through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayDirection {
    Input,
    Output,
    Bidirectional,
}

fg_core::simple_display! {
    GatewayDirection {
        Input => "input",
        Output => "output",
        Bidirectional => "bidirectional",
    }
}

/// Delivery modes the gateway supports and its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMode {
    #[serde(default = "default_supported")]
    pub supported: Vec<DeliveryMode>,
    #[serde(default)]
    pub default: DeliveryMode,
}

fn default_supported() -> Vec<DeliveryMode> {
    vec![DeliveryMode::Sync, DeliveryMode::Async]
}

impl Default for GatewayMode {
    fn default() -> Self {
        Self { supported: default_supported(), default: DeliveryMode::Sync }
    }
}

/// How to run and talk to the child process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_ack_timeout_ms() -> u64 {
    3_000
}

/// One gateway declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayManifest {
    pub id: String,
    pub direction: GatewayDirection,
    #[serde(default = "default_transport")]
    pub transport: String,
    #[serde(default)]
    pub mode: GatewayMode,
    pub process: ProcessSpec,
    /// Hub module inbound `input` envelopes fall back to when they name
    /// no target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_transport() -> String {
    "process_stdio".to_string()
}

fn default_enabled() -> bool {
    true
}

impl GatewayManifest {
    pub fn from_json(raw: &str) -> Result<Self, FingerError> {
        let manifest: GatewayManifest =
            serde_json::from_str(raw).map_err(|e| FingerError::InvalidConfig(e.to_string()))?;
        if manifest.transport != "process_stdio" {
            return Err(FingerError::InvalidConfig(format!(
                "unsupported gateway transport: {}",
                manifest.transport
            )));
        }
        Ok(manifest)
    }

    /// Content hash used by reload to detect changed manifests.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        if let Ok(canonical) = serde_json::to_value(self) {
            hasher.update(canonical.to_string().as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Load every `*.json` manifest in a directory. Unparseable files are
/// skipped with a warning.
pub fn load_dir(dir: &Path) -> Vec<GatewayManifest> {
    let mut manifests = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return manifests,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable gateway manifest");
                continue;
            }
        };
        match GatewayManifest::from_json(&raw) {
            Ok(manifest) => manifests.push(manifest),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping invalid gateway manifest");
            }
        }
    }
    manifests.sort_by(|a, b| a.id.cmp(&b.id));
    manifests
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
