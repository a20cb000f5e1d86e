// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent tool access policy.
//!
//! Decision rule, in order: blacklist wins, an empty whitelist denies
//! everything, otherwise the tool must be whitelisted. All mutations are
//! idempotent.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Outcome of an access check, with the reason surfaced to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPolicy {
    pub whitelist: BTreeSet<String>,
    pub blacklist: BTreeSet<String>,
}

/// Access policies for every agent.
#[derive(Clone, Default)]
pub struct AgentToolAccess {
    policies: Arc<Mutex<HashMap<String, AgentPolicy>>>,
}

impl AgentToolAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the decision rule for `(agent, tool)`.
    pub fn can_use(&self, agent_id: &str, tool_name: &str) -> AccessDecision {
        let policies = self.policies.lock();
        let Some(policy) = policies.get(agent_id) else {
            return AccessDecision { allowed: false, reason: "no policy for agent".into() };
        };
        if policy.blacklist.contains(tool_name) {
            return AccessDecision { allowed: false, reason: "tool is blacklisted".into() };
        }
        if policy.whitelist.is_empty() {
            return AccessDecision { allowed: false, reason: "whitelist is empty".into() };
        }
        if policy.whitelist.contains(tool_name) {
            AccessDecision { allowed: true, reason: "whitelisted".into() }
        } else {
            AccessDecision { allowed: false, reason: "not in whitelist".into() }
        }
    }

    /// Replace an agent's whitelist wholesale.
    pub fn set_whitelist(&self, agent_id: &str, tools: impl IntoIterator<Item = String>) {
        let mut policies = self.policies.lock();
        let policy = policies.entry(agent_id.to_string()).or_default();
        policy.whitelist = tools.into_iter().collect();
    }

    /// Add one tool to the whitelist.
    pub fn grant(&self, agent_id: &str, tool_name: &str) {
        let mut policies = self.policies.lock();
        policies.entry(agent_id.to_string()).or_default().whitelist.insert(tool_name.to_string());
    }

    /// Remove one tool from the whitelist.
    pub fn revoke(&self, agent_id: &str, tool_name: &str) {
        let mut policies = self.policies.lock();
        if let Some(policy) = policies.get_mut(agent_id) {
            policy.whitelist.remove(tool_name);
        }
    }

    /// Add one tool to the blacklist.
    pub fn deny(&self, agent_id: &str, tool_name: &str) {
        let mut policies = self.policies.lock();
        policies.entry(agent_id.to_string()).or_default().blacklist.insert(tool_name.to_string());
    }

    /// Remove one tool from the blacklist.
    pub fn allow(&self, agent_id: &str, tool_name: &str) {
        let mut policies = self.policies.lock();
        if let Some(policy) = policies.get_mut(agent_id) {
            policy.blacklist.remove(tool_name);
        }
    }

    /// Snapshot an agent's policy for introspection endpoints.
    pub fn policy(&self, agent_id: &str) -> AgentPolicy {
        self.policies.lock().get(agent_id).cloned().unwrap_or_default()
    }

    /// Tools the agent may currently use (whitelist minus blacklist).
    pub fn allowed_tools(&self, agent_id: &str) -> Vec<String> {
        let policy = self.policy(agent_id);
        policy.whitelist.difference(&policy.blacklist).cloned().collect()
    }
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;
