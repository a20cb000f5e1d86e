// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::agents::{
    AgentRuntimeBlock, ControlAction, ControlRequest, DeployRequest, NoopProviderRuntime,
};
use crate::sessions::SessionManager;
use crate::tools::AgentToolAccess;
use fg_core::clock::SystemClock;
use fg_hub::{handler_fn, EventBus, MessageHub, Module, ModuleKind};
use serde_json::json;
use std::sync::Arc;

fn block_with_configs(dir: Option<&std::path::Path>) -> AgentRuntimeBlock {
    let hub = MessageHub::new(EventBus::new());
    hub.register_module(Module::new(
        "native-agent",
        ModuleKind::Agent,
        handler_fn(|_| Ok(json!({"ok": true}))),
    ))
    .unwrap();
    let sessions = SessionManager::new(Arc::new(SystemClock));
    let access = AgentToolAccess::new();
    access.grant("cfg-agent", "read_file");
    let block =
        AgentRuntimeBlock::new(hub, sessions, access, Arc::new(NoopProviderRuntime));
    match dir {
        Some(dir) => block.with_configs_dir(dir),
        None => block,
    }
}

#[test]
fn catalog_merges_configs_modules_and_templates() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("cfg-agent.agent.json"),
        r#"{"id": "cfg-agent", "name": "Configured", "role": "executor",
            "provider": {"type": "iflow"},
            "tools": {"whitelist": ["read_file"], "blacklist": []}}"#,
    )
    .unwrap();
    std::fs::write(tmp.path().join("not-an-agent.json"), "{}").unwrap();

    let block = block_with_configs(Some(tmp.path()));
    let catalog = block.catalog(CatalogLayer::Full);

    let sources: Vec<(&str, &str)> =
        catalog.iter().map(|e| (e.agent_id.as_str(), e.source.as_str())).collect();
    assert!(sources.contains(&("cfg-agent", "config")));
    assert!(sources.contains(&("native-agent", "module")));
    assert!(sources.contains(&("executor", "template")));
    assert!(sources.contains(&("reviewer", "template")));

    let cfg = catalog.iter().find(|e| e.agent_id == "cfg-agent").unwrap();
    assert_eq!(cfg.allowed_tools, vec!["read_file"]);
    assert!(cfg.implementations.iter().any(|i| i == "provider:iflow"));
}

#[test]
fn summary_layer_hides_detail() {
    let block = block_with_configs(None);
    let catalog = block.catalog(CatalogLayer::Summary);
    for entry in catalog {
        assert_eq!(entry.capabilities["layer"], "summary");
        assert!(entry.capabilities.get("tools").is_none());
    }
}

#[test]
fn startup_templates_are_stable() {
    let block = block_with_configs(None);
    let templates = block.list_startup_templates();
    let ids: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["executor", "reviewer", "researcher"]);
}

#[test]
fn runtime_view_reports_counts_and_quota_source() {
    let block = block_with_configs(None);
    block
        .deploy(DeployRequest {
            agent_id: "native-agent".into(),
            instance_count: 2,
            ..Default::default()
        })
        .unwrap();

    let views = block.runtime_view();
    assert_eq!(views.len(), 1);
    let view = &views[0];
    assert_eq!(view.agent_id, "native-agent");
    assert_eq!(view.instances.len(), 2);
    assert_eq!(view.running_count, 0);
    assert_eq!(view.queued_count, 0);
    assert_eq!(view.effective_quota, 1);
    assert_eq!(view.quota_source, fg_core::quota::QuotaSource::Default);
}

struct BusyProvider;

impl super::super::ProviderRuntime for BusyProvider {
    fn set_agent_runtime_config(&self, _agent_id: &str, _config: serde_json::Value) {}
    fn has_active_turn(&self, session_id: &str) -> bool {
        session_id == "ses-busy"
    }
    fn interrupt(&self, _session_id: &str) {}
}

#[test]
fn instance_running_is_synthesized_from_provider_turns() {
    let hub = MessageHub::new(EventBus::new());
    let sessions = SessionManager::new(Arc::new(SystemClock));
    let block =
        AgentRuntimeBlock::new(hub, sessions, AgentToolAccess::new(), Arc::new(BusyProvider));
    block
        .deploy(DeployRequest {
            agent_id: "prov-agent".into(),
            instance_count: 1,
            session_id: Some("ses-busy".into()),
            ..Default::default()
        })
        .unwrap();

    let views = block.runtime_view();
    assert_eq!(views[0].instances[0].status, InstanceStatus::Running);
    assert_eq!(views[0].running_count, 1);
}

#[tokio::test]
async fn control_status_and_cancel() {
    let block = block_with_configs(None);
    block
        .deploy(DeployRequest {
            agent_id: "native-agent".into(),
            instance_count: 1,
            ..Default::default()
        })
        .unwrap();

    let status = block
        .control(ControlRequest {
            action: ControlAction::Status,
            target: "native-agent".into(),
            session_id: None,
            payload: None,
        })
        .await
        .unwrap();
    assert_eq!(status["agent_id"], "native-agent");

    let cancelled = block
        .control(ControlRequest {
            action: ControlAction::Cancel,
            target: "native-agent".into(),
            session_id: None,
            payload: None,
        })
        .await
        .unwrap();
    assert_eq!(cancelled["cancelled"], 0);
}

#[tokio::test]
async fn control_dispatch_routes_through_the_block() {
    let block = block_with_configs(None);
    block
        .deploy(DeployRequest {
            agent_id: "native-agent".into(),
            instance_count: 1,
            ..Default::default()
        })
        .unwrap();

    let out = block
        .control(ControlRequest {
            action: ControlAction::Dispatch,
            target: "native-agent".into(),
            session_id: None,
            payload: Some(json!({"task": {"text": "go"}, "blocking": true})),
        })
        .await
        .unwrap();
    assert_eq!(out["status"], "completed");
    assert_eq!(out["result"]["ok"], true);
}

#[tokio::test]
async fn control_status_for_unknown_agent_errors() {
    let block = block_with_configs(None);
    let err = block
        .control(ControlRequest {
            action: ControlAction::Status,
            target: "ghost".into(),
            session_id: None,
            payload: None,
        })
        .await;
    assert!(err.is_err());
}
