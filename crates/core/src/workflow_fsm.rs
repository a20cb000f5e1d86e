// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow-level state machine.
//!
//! Routing guards read `context.routing_decision.route`; the execution
//! completion split reads `context.all_tasks_done` which the workflow
//! manager refreshes before triggering. Pause is a wildcard transition and
//! resume restores the state that preceded the pause.

use crate::fsm::{ctx_nested_str, ctx_str, Machine, Transition};

/// Workflow FSM states.
pub const STATES: [&str; 11] = [
    "idle",
    "semantic_understanding",
    "routing_decision",
    "plan_loop",
    "execution",
    "review",
    "replan_evaluation",
    "wait_user_decision",
    "paused",
    "completed",
    "failed",
];

fn route_is(ctx: &crate::fsm::FsmContext, expected: &[&str]) -> bool {
    ctx_nested_str(ctx, "routing_decision", "route").is_some_and(|r| expected.contains(&r))
}

/// Build the workflow machine in its initial state.
pub fn workflow_machine(workflow_id: &str) -> Machine {
    let transitions = vec![
        Transition::new("idle", "user_task_received", "semantic_understanding"),
        Transition::new("semantic_understanding", "understanding_complete", "routing_decision"),
        // routing_decision fans out on the decided route
        Transition::new("routing_decision", "routing_decided", "plan_loop")
            .with_guard(|ctx| route_is(ctx, &["full", "minor_replan"])),
        Transition::new("routing_decision", "routing_decided", "execution")
            .with_guard(|ctx| route_is(ctx, &["continue_execution"])),
        Transition::new("routing_decision", "routing_decided", "wait_user_decision")
            .with_guard(|ctx| route_is(ctx, &["wait_user_decision", "new_task"])),
        Transition::new("plan_loop", "plan_ready", "execution"),
        // task_completed finishes the workflow only when every task is done
        Transition::new("execution", "task_completed", "completed")
            .with_guard(|ctx| ctx.get("all_tasks_done").and_then(|v| v.as_bool()) == Some(true)),
        Transition::new("execution", "task_completed", "review"),
        Transition::new("execution", "major_change_detected", "replan_evaluation"),
        Transition::new("review", "review_passed", "execution"),
        Transition::new("review", "review_rejected", "plan_loop"),
        Transition::new("replan_evaluation", "replan_confirmed", "plan_loop"),
        Transition::new("replan_evaluation", "replan_dismissed", "execution"),
        Transition::new("wait_user_decision", "user_decision", "routing_decision"),
        // wildcard pause / failure
        Transition::from_any("pause_requested", "paused"),
        Transition::from_any("error_occurred", "failed")
            .with_guard(|ctx| ctx_str(ctx, "last_error").is_some()),
        // resume restores whatever state preceded the pause
        Transition::dynamic("paused", "resume_requested").with_action(|scope| {
            let prior = scope
                .history
                .iter()
                .rev()
                .find(|h| h.to == "paused" && h.from != "paused")
                .map(|h| h.from.clone());
            if let Some(state) = prior {
                scope.set_next_state(state);
            }
        }),
    ];
    Machine::new(format!("workflow:{workflow_id}"), "idle", transitions)
}

#[cfg(test)]
#[path = "workflow_fsm_tests.rs"]
mod tests;
