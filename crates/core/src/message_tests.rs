// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn stable_json_sorts_keys_and_omits_absent_fields() {
    let msg = HubMessage {
        message_type: "test".into(),
        route: None,
        target: Some("mod-a".into()),
        source: None,
        session_id: None,
        callback_id: None,
        payload: json!({"z": 1, "a": 2}),
    };
    let s = msg.stable_json();
    // serde_json maps are BTree-backed: keys come out sorted.
    assert_eq!(s, r#"{"payload":{"a":2,"z":1},"target":"mod-a","type":"test"}"#);
}

#[test]
fn stable_json_is_deterministic() {
    let a = HubMessage::with_payload("t", json!({"x": [1, 2], "y": {"b": 1, "a": 2}}));
    let b = HubMessage::with_payload("t", json!({"y": {"a": 2, "b": 1}, "x": [1, 2]}));
    assert_eq!(a.stable_json(), b.stable_json());
}

#[test]
fn of_type_defaults_everything_else() {
    let msg = HubMessage::of_type("ping");
    assert_eq!(msg.message_type, "ping");
    assert!(msg.route.is_none());
    assert!(msg.payload.is_null());
}

#[test]
fn message_round_trips_through_json() {
    let msg = HubMessage {
        message_type: "dispatch".into(),
        route: Some("agents".into()),
        target: Some("executor-a".into()),
        source: Some("orchestrator".into()),
        session_id: Some(SessionId::new("ses-9")),
        callback_id: Some("cb-1".into()),
        payload: json!({"text": "do the thing"}),
    };
    let raw = serde_json::to_string(&msg).unwrap();
    let back: HubMessage = serde_json::from_str(&raw).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn agent_id_borrows_as_str() {
    let mut map = std::collections::HashMap::new();
    map.insert(AgentId::new("executor-a"), 1);
    assert_eq!(map.get("executor-a"), Some(&1));
    assert!(AgentId::new("x") == "x");
}
