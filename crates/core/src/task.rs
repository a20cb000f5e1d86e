// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task node and its state machine.
//!
//! Tasks are the vertices of a workflow DAG. `dependents` is the reverse
//! adjacency of `dependencies` and the workflow manager keeps both in sync.

use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for a task within a workflow.
    pub struct TaskId("tsk-");
}

/// Role the assigned agent plays for this task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Executor,
    Reviewer,
    Planner,
    Researcher,
}

crate::simple_display! {
    TaskType {
        Executor => "executor",
        Reviewer => "reviewer",
        Planner => "planner",
        Researcher => "researcher",
    }
}

/// Task lifecycle states.
///
/// `completed` is accepted on the wire as an alias of `done` for clients
/// speaking the coarser workflow vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Created,
    Ready,
    Dispatching,
    Dispatched,
    DispatchFailed,
    Running,
    ExecutionFailed,
    ExecutionSucceeded,
    Reviewing,
    #[serde(alias = "completed")]
    Done,
    ReworkRequired,
    Blocked,
}

crate::simple_display! {
    TaskStatus {
        Created => "created",
        Ready => "ready",
        Dispatching => "dispatching",
        Dispatched => "dispatched",
        DispatchFailed => "dispatch_failed",
        Running => "running",
        ExecutionFailed => "execution_failed",
        ExecutionSucceeded => "execution_succeeded",
        Reviewing => "reviewing",
        Done => "done",
        ReworkRequired => "rework_required",
        Blocked => "blocked",
    }
}

impl TaskStatus {
    /// Apply a trigger. Unlisted triggers are rejected (`None`).
    pub fn on(self, trigger: &str) -> Option<TaskStatus> {
        use TaskStatus::*;
        match (self, trigger) {
            (Created, "deps_satisfied") | (Blocked, "deps_satisfied") => Some(Ready),
            (Created, "deps_pending") => Some(Blocked),
            (Ready, "orchestrator_dispatch") => Some(Dispatching),
            (Dispatching, "dispatch_ack") => Some(Dispatched),
            (Dispatching, "dispatch_nack")
            | (Dispatching, "dispatch_timeout")
            | (Dispatching, "no_resource") => Some(DispatchFailed),
            (Dispatched, "task_execution_started") => Some(Running),
            (Running, "task_execution_result_success") => Some(ExecutionSucceeded),
            (Running, "task_execution_result_failure") => Some(ExecutionFailed),
            (ExecutionSucceeded, "review_requested") => Some(Reviewing),
            (Reviewing, "review_pass") => Some(Done),
            (Reviewing, "review_reject") => Some(ReworkRequired),
            (ReworkRequired, "replan_or_retry")
            | (DispatchFailed, "replan_or_retry")
            | (ExecutionFailed, "replan_or_retry") => Some(Ready),
            _ => None,
        }
    }

    /// States counting as successfully finished for dependency resolution.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::ExecutionSucceeded)
    }

    /// States where an agent is actively occupied with the task.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskStatus::Dispatching
                | TaskStatus::Dispatched
                | TaskStatus::Running
                | TaskStatus::Reviewing
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

/// One vertex of the workflow DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: TaskId,
    pub description: String,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    /// Reverse edges, maintained by the workflow manager.
    #[serde(default)]
    pub dependents: Vec<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    /// Epoch ms after which the task counts as timed out. Unset = never.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl TaskNode {
    pub fn new(id: TaskId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            task_type: TaskType::Executor,
            status: TaskStatus::Created,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            assignee: None,
            started_at: None,
            completed_at: None,
            deadline: None,
            result: None,
        }
    }

    /// True once the deadline has passed. A task without a deadline never
    /// reports timeout.
    pub fn is_overdue(&self, now_ms: u64) -> bool {
        self.deadline.is_some_and(|d| now_ms > d)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
