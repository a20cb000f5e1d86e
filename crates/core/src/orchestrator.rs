// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator state machine, second revision.
//!
//! Adds over the workflow machine: a pre-intake probe for resumable work,
//! a clarification branch for low-confidence intake, a bounded plan-review
//! feedback loop, a research fanout that keeps spinning until the collector
//! reports enough information, queueing when scheduling hits busy
//! resources, and an evidence gate on review acceptance.

use crate::fsm::{FsmContext, Machine, Transition};
use serde_json::Value;

/// Plan-review feedback rounds allowed before escalating to the user.
pub const MAX_PLAN_REVIEW_ROUNDS: i64 = 3;

const NON_TERMINAL: [&str; 11] = [
    "idle",
    "probe",
    "intake",
    "ask_user",
    "research",
    "plan",
    "plan_review",
    "schedule",
    "queued",
    "dispatch",
    "execution_review",
];

fn flag(ctx: &FsmContext, key: &str) -> bool {
    ctx.get(key).and_then(Value::as_bool) == Some(true)
}

fn review_rounds(ctx: &FsmContext) -> i64 {
    ctx.get("review_rounds").and_then(Value::as_i64).unwrap_or(0)
}

/// Build the orchestrator machine in its initial state.
pub fn orchestrator_machine(name: &str) -> Machine {
    let mut transitions = vec![
        Transition::new("idle", "start", "probe"),
        // probe: resume prior work when any is found
        Transition::new("probe", "probe_complete", "plan")
            .with_guard(|ctx| flag(ctx, "resumable")),
        Transition::new("probe", "probe_complete", "intake"),
        // intake: ask the user when confidence is low
        Transition::new("intake", "intake_complete", "ask_user")
            .with_guard(|ctx| flag(ctx, "low_confidence")),
        Transition::new("intake", "intake_complete", "plan"),
        Transition::new("ask_user", "user_clarified", "intake"),
        // research fanout loops until the collector has enough
        Transition::new("plan", "research_needed", "research"),
        Transition::new("research", "research_complete", "research")
            .with_guard(|ctx| flag(ctx, "need_more_results")),
        Transition::new("research", "research_complete", "plan"),
        // bounded plan-review feedback loop
        Transition::new("plan", "plan_ready", "plan_review"),
        Transition::new("plan_review", "plan_approved", "schedule"),
        Transition::new("plan_review", "plan_feedback", "plan")
            .with_guard(|ctx| review_rounds(ctx) < MAX_PLAN_REVIEW_ROUNDS)
            .with_action(|scope| {
                let rounds = review_rounds(scope.context) + 1;
                scope.context.insert("review_rounds".into(), Value::from(rounds));
            }),
        Transition::new("plan_review", "plan_feedback", "ask_user"),
        // scheduling queues when the resource pool is busy
        Transition::new("schedule", "resource_busy", "queued"),
        Transition::new("schedule", "scheduled", "dispatch"),
        Transition::new("queued", "resource_available", "dispatch"),
        Transition::new("dispatch", "dispatch_complete", "execution_review"),
        // acceptance requires evidence; a bare claim becomes a reject
        Transition::new("execution_review", "review_accept", "completed")
            .with_guard(|ctx| flag(ctx, "has_evidence")),
        Transition::new("execution_review", "review_accept", "dispatch").with_action(|scope| {
            scope
                .context
                .insert("reject_reason".into(), Value::from("missing_evidence"));
        }),
        Transition::new("execution_review", "review_reject", "dispatch"),
    ];

    // Global cancel / fatal_error from every non-terminal state.
    for state in NON_TERMINAL {
        transitions.push(Transition::new(state, "cancel", "cancelled"));
        transitions.push(Transition::new(state, "fatal_error", "failed"));
    }

    Machine::new(format!("orchestrator:{name}"), "idle", transitions)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
