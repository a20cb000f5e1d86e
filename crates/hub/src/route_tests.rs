// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::module::handler_fn;
use fg_core::message::HubMessage;
use serde_json::json;

fn noop() -> Arc<dyn ModuleHandler> {
    handler_fn(|_| Ok(json!(null)))
}

#[test]
fn literal_matches_type_or_route() {
    let pattern = Pattern::literal("deploy");
    assert!(pattern.matches(&HubMessage::of_type("deploy")));

    let mut by_route = HubMessage::of_type("other");
    by_route.route = Some("deploy".into());
    assert!(pattern.matches(&by_route));

    assert!(!pattern.matches(&HubMessage::of_type("undeploy")));
}

#[test]
fn regex_tests_against_stable_serialization() {
    let pattern = Pattern::regex(r#""session_id":"ses-\d+""#).unwrap();
    let mut msg = HubMessage::of_type("anything");
    msg.session_id = Some("ses-42".into());
    assert!(pattern.matches(&msg));
    msg.session_id = Some("other".into());
    assert!(!pattern.matches(&msg));
}

#[test]
fn regex_sees_sorted_keys() {
    // Payload key order in construction must not affect matching.
    let pattern = Pattern::regex(r#""payload":\{"a":1,"b":2\}"#).unwrap();
    let msg = HubMessage::with_payload("t", json!({"b": 2, "a": 1}));
    assert!(pattern.matches(&msg));
}

#[test]
fn invalid_regex_is_invalid_argument() {
    assert!(matches!(
        Pattern::regex("("),
        Err(fg_core::error::FingerError::InvalidArgument(_))
    ));
}

#[test]
fn predicate_runs_against_message() {
    let pattern = Pattern::predicate(|m| m.payload.get("urgent").is_some());
    assert!(pattern.matches(&HubMessage::with_payload("t", json!({"urgent": true}))));
    assert!(!pattern.matches(&HubMessage::of_type("t")));
}

#[test]
fn rule_builder_sets_fields() {
    let rule = RouteRule::new(Pattern::literal("x"), noop())
        .blocking(true)
        .priority(7)
        .describe("test route");
    assert!(rule.blocking);
    assert_eq!(rule.priority, 7);
    assert_eq!(rule.description.as_deref(), Some("test route"));
    assert!(rule.id.starts_with("rt-"));
}
