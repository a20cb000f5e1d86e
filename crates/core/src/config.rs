// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent runtime configuration, loaded from `agents/*.agent.json`.
//!
//! Unknown top-level keys are tolerated so configs survive forward-version
//! edits; unknown keys inside `session` and `governance` are rejected
//! because a typo there silently changes behavior.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Provider backing for an agent implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(rename = "type", default)]
    pub provider_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

/// How the agent's provider session binds to finger sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionConfig {
    /// `finger` or `finger+agent`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_path: Option<String>,
}

/// Approval posture for governed tool use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalMode {
    #[default]
    Default,
    AutoEdit,
    Yolo,
    Plan,
}

crate::simple_display! {
    ApprovalMode {
        Default => "default",
        AutoEdit => "autoEdit",
        Yolo => "yolo",
        Plan => "plan",
    }
}

/// Governance block for iflow-governed agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IflowGovernance {
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub disallowed_tools: Vec<String>,
    #[serde(default)]
    pub approval_mode: ApprovalMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_capabilities: Option<bool>,
    #[serde(default)]
    pub capability_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GovernanceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iflow: Option<IflowGovernance>,
}

/// Tool policy block of an agent config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    #[serde(default)]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub blacklist: Vec<String>,
    #[serde(default)]
    pub authorization_required: Vec<String>,
}

/// One agent's runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance: Option<GovernanceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl AgentConfig {
    /// Parse a single `*.agent.json` document.
    pub fn from_json(raw: &str) -> Result<Self, crate::error::FingerError> {
        serde_json::from_str(raw)
            .map_err(|e| crate::error::FingerError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
