// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fsm::FsmContext;
use serde_json::json;
use yare::parameterized;

fn at_routing_decision() -> Machine {
    let mut m = workflow_machine("wfl-test");
    m.trigger("user_task_received", None, 1);
    m.trigger("understanding_complete", None, 2);
    assert_eq!(m.state(), "routing_decision");
    m
}

#[parameterized(
    full = { "full", "plan_loop" },
    minor_replan = { "minor_replan", "plan_loop" },
    continue_execution = { "continue_execution", "execution" },
    wait_user = { "wait_user_decision", "wait_user_decision" },
    new_task = { "new_task", "wait_user_decision" },
)]
fn routing_decided_fans_out_on_route(route: &str, expected: &str) {
    let mut m = at_routing_decision();
    m.trigger(
        "routing_decided",
        Some(json!({"routing_decision": {"route": route}})),
        3,
    );
    assert_eq!(m.state(), expected);
}

#[test]
fn routing_decided_without_route_is_rejected() {
    let mut m = at_routing_decision();
    assert!(m.trigger("routing_decided", None, 3).is_none());
    assert_eq!(m.state(), "routing_decision");
}

#[test]
fn task_completed_finishes_only_when_all_done() {
    let mut m = at_routing_decision();
    m.trigger("routing_decided", Some(json!({"routing_decision": {"route": "continue_execution"}})), 3);
    m.trigger("task_completed", Some(json!({"all_tasks_done": false})), 4);
    assert_eq!(m.state(), "review");
    m.trigger("review_passed", None, 5);
    assert_eq!(m.state(), "execution");
    m.trigger("task_completed", Some(json!({"all_tasks_done": true})), 6);
    assert_eq!(m.state(), "completed");
}

#[test]
fn review_rejected_returns_to_planning() {
    let mut m = at_routing_decision();
    m.trigger("routing_decided", Some(json!({"routing_decision": {"route": "continue_execution"}})), 3);
    m.trigger("task_completed", Some(json!({"all_tasks_done": false})), 4);
    m.trigger("review_rejected", None, 5);
    assert_eq!(m.state(), "plan_loop");
}

#[test]
fn error_occurred_requires_last_error_in_context() {
    let mut m = at_routing_decision();
    assert!(m.trigger("error_occurred", None, 3).is_none());
    m.trigger("error_occurred", Some(json!({"last_error": "boom"})), 4);
    assert_eq!(m.state(), "failed");
}

#[test]
fn pause_and_resume_restore_previous_state() {
    let mut m = at_routing_decision();
    m.trigger("routing_decided", Some(json!({"routing_decision": {"route": "continue_execution"}})), 3);
    assert_eq!(m.state(), "execution");
    m.trigger("pause_requested", None, 4);
    assert_eq!(m.state(), "paused");
    let t = m.trigger("resume_requested", None, 5).unwrap();
    assert_eq!(t.to, "execution");
    assert_eq!(m.state(), "execution");
}

#[test]
fn resume_without_prior_pause_is_rejected() {
    let mut m = workflow_machine("wfl-test");
    m.restore("paused", FsmContext::new(), Vec::new());
    assert!(m.trigger("resume_requested", None, 1).is_none());
    assert_eq!(m.state(), "paused");
}

#[test]
fn double_pause_still_resumes_to_working_state() {
    let mut m = at_routing_decision();
    m.trigger("routing_decided", Some(json!({"routing_decision": {"route": "continue_execution"}})), 3);
    m.trigger("pause_requested", None, 4);
    // wildcard matches paused too; resume must skip the paused->paused entry
    m.trigger("pause_requested", None, 5);
    let t = m.trigger("resume_requested", None, 6).unwrap();
    assert_eq!(t.to, "execution");
}
