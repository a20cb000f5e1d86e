// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const FULL_CONFIG: &str = r#"{
    "id": "executor-a",
    "name": "Executor A",
    "role": "executor",
    "provider": {"type": "iflow", "model": "large", "options": {"temperature": 0}},
    "session": {"bindingScope": "finger+agent", "resume": true, "mapPath": "sessions/map.json"},
    "governance": {"iflow": {
        "allowedTools": ["read_file"],
        "disallowedTools": ["rm"],
        "approvalMode": "autoEdit",
        "capabilityIds": ["cap-1"]
    }},
    "tools": {"whitelist": ["read_file"], "blacklist": [], "authorizationRequired": ["apply_patch"]},
    "model": "large"
}"#;

#[test]
fn full_config_parses() {
    let cfg = AgentConfig::from_json(FULL_CONFIG).unwrap();
    assert_eq!(cfg.id, "executor-a");
    let session = cfg.session.unwrap();
    assert_eq!(session.binding_scope.as_deref(), Some("finger+agent"));
    assert_eq!(session.resume, Some(true));
    let iflow = cfg.governance.unwrap().iflow.unwrap();
    assert_eq!(iflow.approval_mode, ApprovalMode::AutoEdit);
    assert_eq!(iflow.allowed_tools, vec!["read_file"]);
    let tools = cfg.tools.unwrap();
    assert_eq!(tools.authorization_required, vec!["apply_patch"]);
}

#[test]
fn unknown_top_level_keys_are_ignored() {
    let cfg = AgentConfig::from_json(r#"{"id": "a", "future_field": {"x": 1}}"#).unwrap();
    assert_eq!(cfg.id, "a");
}

#[test]
fn unknown_session_keys_are_rejected() {
    let err = AgentConfig::from_json(r#"{"id": "a", "session": {"bindingScope": "finger", "typo": 1}}"#);
    assert!(matches!(err, Err(crate::error::FingerError::InvalidConfig(_))));
}

#[test]
fn unknown_governance_keys_are_rejected() {
    let err = AgentConfig::from_json(r#"{"id": "a", "governance": {"unexpected": {}}}"#);
    assert!(err.is_err());
}

#[test]
fn minimal_config_needs_only_id() {
    let cfg = AgentConfig::from_json(r#"{"id": "bare"}"#).unwrap();
    assert!(cfg.provider.is_none());
    assert!(cfg.tools.is_none());
    assert!(cfg.metadata.is_empty());
}

#[test]
fn approval_mode_defaults() {
    let iflow: IflowGovernance = serde_json::from_str("{}").unwrap();
    assert_eq!(iflow.approval_mode, ApprovalMode::Default);
}
