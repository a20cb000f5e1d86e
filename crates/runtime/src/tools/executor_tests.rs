// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::tools::access::AgentToolAccess;
use crate::tools::authorization::{AuthorizationManager, GrantSpec};
use crate::tools::registry::{tool_fn, ToolDef, ToolRegistry};
use fg_core::clock::FakeClock;
use fg_hub::HistoryFilter;
use std::sync::Arc;

struct Fixture {
    executor: ToolExecutor,
    bus: EventBus,
}

fn fixture() -> Fixture {
    let bus = EventBus::new();
    let registry = ToolRegistry::new(bus.clone());
    registry.register(ToolDef::new("apply_patch", tool_fn(|input| Ok(json!({"applied": input})))));
    registry.register(ToolDef::new(
        "broken",
        tool_fn(|_| Err(FingerError::ProviderFailure("spawn failed: ENOENT".into()))),
    ));
    let access = AgentToolAccess::new();
    access.grant("executor-a", "apply_patch");
    access.grant("executor-a", "broken");
    let authorization = AuthorizationManager::new(Arc::new(FakeClock::new()));
    let executor = ToolExecutor::new(registry, access, authorization, bus.clone());
    Fixture { executor, bus }
}

fn audit_events(bus: &EventBus) -> Vec<fg_core::event::Event> {
    bus.history(
        &HistoryFilter { event_type: Some("tool_execution".into()), ..Default::default() },
        0,
    )
}

#[tokio::test]
async fn allowed_execution_succeeds_and_audits() {
    let f = fixture();
    let out = f.executor.execute("executor-a", "apply_patch", json!({"f": 1}), None).await.unwrap();
    assert_eq!(out, json!({"applied": {"f": 1}}));

    let audit = audit_events(&f.bus);
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].payload["outcome"], "success");
    assert_eq!(audit[0].agent_id.as_ref().map(|a| a.as_str()), Some("executor-a"));
}

#[tokio::test]
async fn access_denied_blocks_before_handler() {
    let f = fixture();
    let err = f.executor.execute("stranger", "apply_patch", json!(null), None).await;
    assert!(matches!(err, Err(FingerError::ToolDenied(_))));
    assert_eq!(audit_events(&f.bus)[0].payload["outcome"], "failure");
}

#[tokio::test]
async fn required_tool_without_token_is_authorization_required() {
    let f = fixture();
    f.executor.authorization().set_tool_required("apply_patch", true);
    let err = f.executor.execute("executor-a", "apply_patch", json!(null), None).await;
    assert!(matches!(err, Err(FingerError::AuthorizationRequired(_))));
}

#[tokio::test]
async fn one_shot_token_allows_once() {
    let f = fixture();
    f.executor.authorization().set_tool_required("apply_patch", true);
    let grant = f.executor.authorization().issue(
        "executor-a",
        "apply_patch",
        "operator",
        GrantSpec { ttl_ms: 5_000, max_uses: 1 },
    );

    let first = f
        .executor
        .execute("executor-a", "apply_patch", json!(null), Some(grant.token.as_str()))
        .await;
    assert!(first.is_ok());

    let second = f
        .executor
        .execute("executor-a", "apply_patch", json!(null), Some(grant.token.as_str()))
        .await;
    assert!(matches!(second, Err(FingerError::AuthorizationExpired(_))));
}

#[tokio::test]
async fn failure_audit_carries_humanized_message() {
    let f = fixture();
    let err = f.executor.execute("executor-a", "broken", json!(null), None).await;
    assert!(err.is_err());

    let audit = audit_events(&f.bus);
    assert_eq!(audit[0].payload["message"], "未找到可执行命令");
}
