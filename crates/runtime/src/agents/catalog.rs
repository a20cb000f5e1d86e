// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent catalog, startup templates, runtime view, and control.
//!
//! The catalog is assembled from three sources: on-disk agent configs,
//! agent-kind modules registered at runtime, and built-in startup
//! templates. Later sources do not shadow earlier ones; entries merge by
//! agent id with the config as the richest source.

use super::{AgentRuntimeBlock, ControlAction, ControlRequest, DispatchRequest, InstanceStatus};
use fg_core::config::AgentConfig;
use fg_core::error::FingerError;
use fg_core::quota::QuotaSource;
use fg_hub::ModuleKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// How much of each catalog entry to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogLayer {
    Summary,
    Execution,
    Governance,
    #[default]
    Full,
}

impl CatalogLayer {
    pub fn parse(s: &str) -> CatalogLayer {
        match s {
            "summary" => CatalogLayer::Summary,
            "execution" => CatalogLayer::Execution,
            "governance" => CatalogLayer::Governance,
            _ => CatalogLayer::Full,
        }
    }
}

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub agent_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// `config`, `module`, or `template`.
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implementations: Vec<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub capabilities: Value,
}

/// Built-in agent blueprint offered by `list_startup_templates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupTemplate {
    pub id: String,
    pub name: String,
    pub role: String,
    pub description: String,
}

/// Built-in templates always present in the catalog.
pub fn startup_templates() -> Vec<StartupTemplate> {
    vec![
        StartupTemplate {
            id: "executor".into(),
            name: "Executor".into(),
            role: "executor".into(),
            description: "runs tasks end to end".into(),
        },
        StartupTemplate {
            id: "reviewer".into(),
            name: "Reviewer".into(),
            role: "reviewer".into(),
            description: "reviews executor output with evidence".into(),
        },
        StartupTemplate {
            id: "researcher".into(),
            name: "Researcher".into(),
            role: "researcher".into(),
            description: "fans out research queries".into(),
        },
    ]
}

/// Per-agent slice of the runtime view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub agent_id: String,
    pub running_count: usize,
    pub queued_count: usize,
    pub effective_quota: u32,
    pub quota_source: QuotaSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event: Option<String>,
    pub instances: Vec<InstanceView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceView {
    pub id: String,
    pub status: InstanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl AgentRuntimeBlock {
    /// Assemble the agent catalog at the requested detail layer.
    pub fn catalog(&self, layer: CatalogLayer) -> Vec<CatalogEntry> {
        let mut entries: BTreeMap<String, CatalogEntry> = BTreeMap::new();

        // On-disk configs are the richest source.
        if let Some(dir) = &self.configs_dir {
            if let Ok(dir_entries) = std::fs::read_dir(dir) {
                for entry in dir_entries.flatten() {
                    let path = entry.path();
                    let is_agent_config = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(".agent.json"));
                    if !is_agent_config {
                        continue;
                    }
                    let raw = match std::fs::read_to_string(&path) {
                        Ok(raw) => raw,
                        Err(_) => continue,
                    };
                    match AgentConfig::from_json(&raw) {
                        Ok(config) => {
                            let entry = self.entry_from_config(&config, layer);
                            entries.insert(entry.agent_id.clone(), entry);
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "skipping bad agent config");
                        }
                    }
                }
            }
        }

        // Runtime-registered agent modules.
        for module in self.hub_modules() {
            entries.entry(module.id.as_str().to_string()).or_insert_with(|| CatalogEntry {
                agent_id: module.id.as_str().to_string(),
                name: module.name.clone(),
                role: None,
                source: "module".into(),
                allowed_tools: self.access_tools(module.id.as_str()),
                implementations: vec!["native-module".into()],
                capabilities: capabilities_for(layer, &module.capabilities),
            });
        }

        // Built-in templates fill the remaining gaps.
        for template in startup_templates() {
            entries.entry(template.id.clone()).or_insert_with(|| CatalogEntry {
                agent_id: template.id.clone(),
                name: template.name.clone(),
                role: Some(template.role.clone()),
                source: "template".into(),
                allowed_tools: Vec::new(),
                implementations: vec!["template".into()],
                capabilities: capabilities_for(layer, &[template.description.clone()]),
            });
        }

        entries.into_values().collect()
    }

    /// Built-in startup templates.
    pub fn list_startup_templates(&self) -> Vec<StartupTemplate> {
        startup_templates()
    }

    /// Live per-agent and per-instance view.
    ///
    /// An instance counts as `running` when the provider subsystem reports
    /// an active turn for its session, regardless of the stored status.
    pub fn runtime_view(&self) -> Vec<AgentView> {
        let state = self.state.lock();
        let mut views: Vec<AgentView> = state
            .agents
            .values()
            .map(|record| {
                let instances: Vec<InstanceView> = record
                    .instances
                    .iter()
                    .map(|i| {
                        let provider_active = i
                            .session_id
                            .as_deref()
                            .is_some_and(|s| self.provider.has_active_turn(s));
                        let status = if provider_active {
                            InstanceStatus::Running
                        } else {
                            i.status
                        };
                        InstanceView {
                            id: i.id.clone(),
                            status,
                            session_id: i.session_id.clone(),
                            provider_id: Some(i.implementation_id.clone()),
                        }
                    })
                    .collect();
                let running_count =
                    instances.iter().filter(|i| i.status == InstanceStatus::Running).count();
                let (effective_quota, quota_source) = record.quota.effective(None);
                AgentView {
                    agent_id: record.agent_id.clone(),
                    running_count,
                    queued_count: state
                        .queues
                        .get(&record.agent_id)
                        .map_or(0, std::collections::VecDeque::len),
                    effective_quota,
                    quota_source,
                    last_event: record.last_event.clone(),
                    instances,
                }
            })
            .collect();
        views.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        views
    }

    /// Control-plane entry point for a target agent.
    pub async fn control(&self, req: ControlRequest) -> Result<Value, FingerError> {
        match req.action {
            ControlAction::Status => {
                let view = self
                    .runtime_view()
                    .into_iter()
                    .find(|v| v.agent_id == req.target)
                    .ok_or_else(|| FingerError::AgentNotStarted(req.target.clone()))?;
                Ok(serde_json::to_value(view)?)
            }
            ControlAction::Pause => {
                let changed = req.session_id.as_deref().map_or(false, |session| {
                    self.sessions.set_status(session, crate::sessions::SessionStatus::Paused)
                });
                Ok(json!({"paused": changed}))
            }
            ControlAction::Resume => {
                let changed = req.session_id.as_deref().map_or(false, |session| {
                    self.sessions.set_status(session, crate::sessions::SessionStatus::Active)
                });
                Ok(json!({"resumed": changed}))
            }
            ControlAction::Interrupt => {
                if let Some(session) = req.session_id.as_deref() {
                    self.provider.interrupt(session);
                }
                Ok(json!({"interrupted": true}))
            }
            ControlAction::Cancel => {
                let cancelled = self.cancel_queued(&req.target);
                Ok(json!({"cancelled": cancelled}))
            }
            ControlAction::Dispatch => {
                let payload = req
                    .payload
                    .ok_or_else(|| FingerError::MissingField("payload".into()))?;
                let task = payload.get("task").cloned().unwrap_or(Value::Null);
                let source = payload
                    .get("source_agent_id")
                    .and_then(Value::as_str)
                    .unwrap_or("control")
                    .to_string();
                let result = self
                    .dispatch(DispatchRequest {
                        source_agent_id: source,
                        target_agent_id: req.target.clone(),
                        task,
                        session_id: req.session_id.clone(),
                        workflow_id: payload
                            .get("workflow_id")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        blocking: payload
                            .get("blocking")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        queue_on_busy: payload
                            .get("queue_on_busy")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        assignment: None,
                    })
                    .await?;
                Ok(serde_json::to_value(result)?)
            }
        }
    }

    fn hub_modules(&self) -> Vec<std::sync::Arc<fg_hub::Module>> {
        self.hub.modules_of_kind(ModuleKind::Agent)
    }

    fn access_tools(&self, agent_id: &str) -> Vec<String> {
        self.access.allowed_tools(agent_id)
    }

    fn entry_from_config(&self, config: &AgentConfig, layer: CatalogLayer) -> CatalogEntry {
        let mut implementations = Vec::new();
        if let Some(provider) = &config.provider {
            implementations.push(format!("provider:{}", provider.provider_type));
        }
        if self.hub.get_module(&config.id).is_some() {
            implementations.push("native-module".into());
        }
        if implementations.is_empty() {
            implementations.push("unbound".into());
        }

        let allowed_tools = match &config.tools {
            Some(tools) if !tools.whitelist.is_empty() => tools.whitelist.clone(),
            _ => self.access_tools(&config.id),
        };

        let capabilities = match layer {
            CatalogLayer::Summary => json!({"layer": "summary"}),
            CatalogLayer::Execution => json!({
                "layer": "execution",
                "tools": allowed_tools,
            }),
            CatalogLayer::Governance => json!({
                "layer": "governance",
                "governance": config.governance,
            }),
            CatalogLayer::Full => json!({
                "layer": "full",
                "tools": allowed_tools,
                "governance": config.governance,
                "provider": config.provider,
            }),
        };

        CatalogEntry {
            agent_id: config.id.clone(),
            name: config.name.clone().unwrap_or_else(|| config.id.clone()),
            role: config.role.clone(),
            source: "config".into(),
            allowed_tools,
            implementations,
            capabilities,
        }
    }
}

fn capabilities_for(layer: CatalogLayer, items: &[String]) -> Value {
    match layer {
        CatalogLayer::Summary => json!({"layer": "summary"}),
        _ => json!({"layer": layer, "items": items}),
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
