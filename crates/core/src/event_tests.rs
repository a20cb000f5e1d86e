// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

#[test]
fn draft_into_event_assigns_id_and_timestamps() {
    let evt = EventDraft::new("dispatch.accepted", EventGroup::Task)
        .with_session("ses-1")
        .with_payload(json!({"dispatch_id": "dsp-1"}))
        .into_event(1_700_000_000_000);
    assert!(evt.id.as_str().starts_with("evt-"));
    assert_eq!(evt.timestamp_ms, 1_700_000_000_000);
    assert!(evt.timestamp_iso.starts_with("2023-11-14T"));
    assert_eq!(evt.group, EventGroup::Task);
    assert_eq!(evt.session_id.as_ref().map(|s| s.as_str()), Some("ses-1"));
}

#[test]
fn event_serializes_type_field() {
    let evt = EventDraft::new("phase_transition", EventGroup::Phase).into_event(1);
    let v = serde_json::to_value(&evt).unwrap();
    assert_eq!(v["type"], "phase_transition");
    assert_eq!(v["group"], "PHASE");
}

#[parameterized(
    session = { "SESSION", EventGroup::Session },
    task = { "TASK", EventGroup::Task },
    tool = { "TOOL", EventGroup::Tool },
    dialog = { "DIALOG", EventGroup::Dialog },
    progress = { "PROGRESS", EventGroup::Progress },
    phase = { "PHASE", EventGroup::Phase },
    human = { "HUMAN_IN_LOOP", EventGroup::HumanInLoop },
    system = { "SYSTEM", EventGroup::System },
)]
fn group_parse_round_trips(name: &str, group: EventGroup) {
    assert_eq!(EventGroup::parse(name), Some(group));
    assert_eq!(group.to_string(), name);
}

#[test]
fn group_parse_rejects_unknown() {
    assert_eq!(EventGroup::parse("NOISE"), None);
}

#[test]
fn iso_companion_handles_zero() {
    assert_eq!(iso_from_epoch_ms(0), "1970-01-01T00:00:00.000Z");
}
