// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    deps_met = { TaskStatus::Created, "deps_satisfied", Some(TaskStatus::Ready) },
    unblocked = { TaskStatus::Blocked, "deps_satisfied", Some(TaskStatus::Ready) },
    dispatch = { TaskStatus::Ready, "orchestrator_dispatch", Some(TaskStatus::Dispatching) },
    ack = { TaskStatus::Dispatching, "dispatch_ack", Some(TaskStatus::Dispatched) },
    nack = { TaskStatus::Dispatching, "dispatch_nack", Some(TaskStatus::DispatchFailed) },
    timeout = { TaskStatus::Dispatching, "dispatch_timeout", Some(TaskStatus::DispatchFailed) },
    no_resource = { TaskStatus::Dispatching, "no_resource", Some(TaskStatus::DispatchFailed) },
    started = { TaskStatus::Dispatched, "task_execution_started", Some(TaskStatus::Running) },
    success = { TaskStatus::Running, "task_execution_result_success", Some(TaskStatus::ExecutionSucceeded) },
    failure = { TaskStatus::Running, "task_execution_result_failure", Some(TaskStatus::ExecutionFailed) },
    review = { TaskStatus::ExecutionSucceeded, "review_requested", Some(TaskStatus::Reviewing) },
    pass = { TaskStatus::Reviewing, "review_pass", Some(TaskStatus::Done) },
    reject = { TaskStatus::Reviewing, "review_reject", Some(TaskStatus::ReworkRequired) },
    rework = { TaskStatus::ReworkRequired, "replan_or_retry", Some(TaskStatus::Ready) },
)]
fn listed_transitions_apply(from: TaskStatus, trigger: &str, expected: Option<TaskStatus>) {
    assert_eq!(from.on(trigger), expected);
}

#[parameterized(
    done_is_sink = { TaskStatus::Done, "replan_or_retry" },
    done_ignores_review = { TaskStatus::Done, "review_reject" },
    created_cannot_run = { TaskStatus::Created, "task_execution_started" },
    running_ignores_ack = { TaskStatus::Running, "dispatch_ack" },
)]
fn unlisted_transitions_reject(from: TaskStatus, trigger: &str) {
    assert_eq!(from.on(trigger), None);
}

#[test]
fn terminal_success_set() {
    assert!(TaskStatus::Done.is_terminal_success());
    assert!(TaskStatus::ExecutionSucceeded.is_terminal_success());
    assert!(!TaskStatus::Running.is_terminal_success());
}

#[test]
fn completed_is_accepted_as_done_on_the_wire() {
    let s: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
    assert_eq!(s, TaskStatus::Done);
    assert_eq!(serde_json::to_string(&TaskStatus::Done).unwrap(), "\"done\"");
}

#[test]
fn task_without_deadline_never_times_out() {
    let task = TaskNode::new(TaskId::new(), "t");
    assert!(!task.is_overdue(u64::MAX));
}

#[test]
fn deadline_in_the_past_is_overdue() {
    let mut task = TaskNode::new(TaskId::new(), "t");
    task.deadline = Some(100);
    assert!(!task.is_overdue(100));
    assert!(task.is_overdue(101));
}
