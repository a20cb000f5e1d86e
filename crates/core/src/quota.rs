// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrency quotas for agent dispatch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where an effective quota came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaSource {
    Workflow,
    Project,
    Default,
}

crate::simple_display! {
    QuotaSource {
        Workflow => "workflow",
        Project => "project",
        Default => "default",
    }
}

/// Per-agent quota policy. Narrower scopes win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    pub default_quota: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_quota: Option<u32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub workflow_quota: HashMap<String, u32>,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self { default_quota: 1, project_quota: None, workflow_quota: HashMap::new() }
    }
}

impl QuotaPolicy {
    /// Resolve the quota for a dispatch, reporting which scope supplied it.
    pub fn effective(&self, workflow_id: Option<&str>) -> (u32, QuotaSource) {
        if let Some(wf) = workflow_id {
            if let Some(q) = self.workflow_quota.get(wf) {
                return (*q, QuotaSource::Workflow);
            }
        }
        if let Some(q) = self.project_quota {
            return (q, QuotaSource::Project);
        }
        (self.default_quota, QuotaSource::Default)
    }

    /// Overlay another policy onto this one (deploy-time merge).
    pub fn merge(&mut self, other: &QuotaPolicy) {
        if other.default_quota != 0 {
            self.default_quota = other.default_quota;
        }
        if other.project_quota.is_some() {
            self.project_quota = other.project_quota;
        }
        for (wf, q) in &other.workflow_quota {
            self.workflow_quota.insert(wf.clone(), *q);
        }
    }
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod tests;
