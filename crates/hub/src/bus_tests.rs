// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fg_core::event::EventDraft;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

fn draft(event_type: &str, group: EventGroup) -> EventDraft {
    EventDraft::new(event_type, group)
}

#[test]
fn emit_assigns_id_and_stores() {
    let bus = EventBus::with_now_fn(10, || 777);
    let evt = bus.emit(draft("tool_registered", EventGroup::Tool));
    assert!(evt.id.as_str().starts_with("evt-"));
    assert_eq!(evt.timestamp_ms, 777);
    assert_eq!(bus.history_len(), 1);
}

#[test]
fn history_is_bounded_fifo() {
    let bus = EventBus::with_now_fn(3, || 1);
    for i in 0..5 {
        bus.emit(draft(&format!("e{i}"), EventGroup::System));
    }
    let history = bus.history(&HistoryFilter::default(), 0);
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].event_type, "e2");
    assert_eq!(history[2].event_type, "e4");
}

#[test]
fn subscribers_by_type_and_group_both_fire() {
    let bus = EventBus::new();
    let by_type = std::sync::Arc::new(AtomicUsize::new(0));
    let by_group = std::sync::Arc::new(AtomicUsize::new(0));

    let t = by_type.clone();
    bus.subscribe_by_type("dispatch.accepted", move |_| {
        t.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let g = by_group.clone();
    bus.subscribe_by_group(EventGroup::Task, move |_| {
        g.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    bus.emit(draft("dispatch.accepted", EventGroup::Task));
    bus.emit(draft("dispatch.queued", EventGroup::Task));
    bus.emit(draft("dispatch.accepted", EventGroup::Session));

    assert_eq!(by_type.load(Ordering::SeqCst), 2);
    assert_eq!(by_group.load(Ordering::SeqCst), 2);
}

#[test]
fn failing_subscriber_does_not_suppress_others_or_store() {
    let bus = EventBus::new();
    let later = std::sync::Arc::new(AtomicUsize::new(0));

    bus.subscribe_by_group(EventGroup::System, |_| {
        Err(FingerError::InvalidArgument("broken subscriber".into()))
    });
    let l = later.clone();
    bus.subscribe_by_group(EventGroup::System, move |_| {
        l.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    bus.emit(draft("anything", EventGroup::System));
    assert_eq!(later.load(Ordering::SeqCst), 1);
    assert_eq!(bus.history_len(), 1);
}

#[test]
fn history_filters_by_type_group_session() {
    let bus = EventBus::new();
    bus.emit(draft("a", EventGroup::Task));
    bus.emit(
        EventDraft::new("b", EventGroup::Tool)
            .with_session("ses-1")
            .with_payload(json!({"n": 1})),
    );
    bus.emit(draft("b", EventGroup::Tool));

    let by_type = bus.history(&HistoryFilter { event_type: Some("b".into()), ..Default::default() }, 0);
    assert_eq!(by_type.len(), 2);

    let by_group = bus.history(&HistoryFilter { group: Some(EventGroup::Task), ..Default::default() }, 0);
    assert_eq!(by_group.len(), 1);

    let by_session = bus.history(
        &HistoryFilter { session_id: Some("ses-1".into()), ..Default::default() },
        0,
    );
    assert_eq!(by_session.len(), 1);
    assert_eq!(by_session[0].event_type, "b");
}

#[test]
fn history_limit_keeps_most_recent() {
    let bus = EventBus::new();
    for i in 0..4 {
        bus.emit(draft(&format!("e{i}"), EventGroup::System));
    }
    let limited = bus.history(&HistoryFilter::default(), 2);
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].event_type, "e2");
}

#[test]
fn subscriber_may_emit_reentrantly() {
    let bus = EventBus::new();
    let bus2 = bus.clone();
    bus.subscribe_by_type("outer", move |_| {
        bus2.emit(EventDraft::new("inner", EventGroup::System));
        Ok(())
    });
    bus.emit(draft("outer", EventGroup::System));
    assert_eq!(bus.history_len(), 2);
}
