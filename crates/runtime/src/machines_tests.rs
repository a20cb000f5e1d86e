// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fg_core::clock::FakeClock;
use fg_core::workflow_fsm::workflow_machine;
use fg_hub::HistoryFilter;
use serde_json::json;

fn manager() -> (FsmManager, EventBus, FakeClock) {
    let clock = FakeClock::new();
    let bus = {
        let clock = clock.clone();
        EventBus::with_now_fn(1000, move || fg_core::clock::Clock::epoch_ms(&clock))
    };
    let manager =
        FsmManager::new("workflow", Arc::new(clock.clone()), bus.clone(), workflow_machine);
    (manager, bus, clock)
}

#[test]
fn applied_transition_emits_phase_event() {
    let (manager, bus, _clock) = manager();
    let applied = manager.trigger("wfl-1", "user_task_received", None).unwrap();
    assert_eq!(applied.to, "semantic_understanding");

    let events = bus.history(
        &HistoryFilter { event_type: Some("phase_transition".into()), ..Default::default() },
        0,
    );
    assert_eq!(events.len(), 1);
    let payload = &events[0].payload;
    assert_eq!(payload["machine"], "workflow");
    assert_eq!(payload["key"], "wfl-1");
    assert_eq!(payload["from"], "idle");
    assert_eq!(payload["to"], "semantic_understanding");
    assert_eq!(payload["round"], 1);
}

#[test]
fn rejected_trigger_emits_nothing() {
    let (manager, bus, _clock) = manager();
    assert!(manager.trigger("wfl-1", "review_passed", None).is_none());
    assert_eq!(
        bus.history(
            &HistoryFilter { event_type: Some("phase_transition".into()), ..Default::default() },
            0
        )
        .len(),
        0
    );
    assert_eq!(manager.state("wfl-1").as_deref(), Some("idle"));
}

#[test]
fn machines_are_independent_per_key() {
    let (manager, _bus, _clock) = manager();
    manager.trigger("wfl-1", "user_task_received", None);
    assert_eq!(manager.state("wfl-1").as_deref(), Some("semantic_understanding"));
    assert_eq!(manager.state("wfl-2"), None);

    manager.trigger("wfl-2", "user_task_received", None);
    manager.trigger("wfl-2", "understanding_complete", None);
    assert_eq!(manager.state("wfl-1").as_deref(), Some("semantic_understanding"));
    assert_eq!(manager.state("wfl-2").as_deref(), Some("routing_decision"));
    assert_eq!(manager.keys(), vec!["wfl-1".to_string(), "wfl-2".to_string()]);
}

#[test]
fn context_updates_are_visible() {
    let (manager, _bus, _clock) = manager();
    manager.trigger("wfl-1", "user_task_received", Some(json!({"note": "kept"})));
    let note = manager
        .with_context("wfl-1", |ctx| ctx.get("note").cloned())
        .flatten()
        .unwrap();
    assert_eq!(note, json!("kept"));
}

#[test]
fn restore_resets_state_for_resume() {
    let (manager, _bus, _clock) = manager();
    manager.trigger("wfl-1", "user_task_received", None);
    manager.restore("wfl-1", "execution", fg_core::fsm::FsmContext::new());
    assert_eq!(manager.state("wfl-1").as_deref(), Some("execution"));
}

#[test]
fn remove_forgets_machine() {
    let (manager, _bus, _clock) = manager();
    manager.trigger("wfl-1", "user_task_received", None);
    assert!(manager.remove("wfl-1"));
    assert!(!manager.remove("wfl-1"));
    assert_eq!(manager.state("wfl-1"), None);
}

#[test]
fn history_timestamps_come_from_the_clock() {
    let (manager, bus, clock) = manager();
    clock.set_epoch_ms(42_000);
    manager.trigger("wfl-1", "user_task_received", None);
    let events = bus.history(&HistoryFilter::default(), 0);
    assert_eq!(events[0].timestamp_ms, 42_000);
}
