// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow record: one DAG of tasks derived from a user request.

use crate::message::SessionId;
use crate::task::{TaskId, TaskNode, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a workflow.
    pub struct WorkflowId("wfl-");
}

/// Coarse workflow status persisted with the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Planning,
    Executing,
    Review,
    Paused,
    Completed,
    Failed,
}

crate::simple_display! {
    WorkflowStatus {
        Planning => "planning",
        Executing => "executing",
        Review => "review",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
    }
}

impl WorkflowStatus {
    /// Terminal workflows are excluded from resume scans.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }
}

/// One user request decomposed into a task DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    #[serde(default)]
    pub user_task: String,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub tasks: HashMap<TaskId, TaskNode>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Workflow {
    pub fn new(id: WorkflowId, now_ms: u64) -> Self {
        Self {
            id,
            session_id: None,
            epic_id: None,
            user_task: String::new(),
            status: WorkflowStatus::Planning,
            tasks: HashMap::new(),
            context: Value::Null,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Tasks whose dependencies are all terminally successful.
    pub fn unmet_dependencies(&self, task: &TaskNode) -> usize {
        task.dependencies
            .iter()
            .filter(|dep| {
                self.tasks.get(dep.as_str()).map_or(true, |d| !d.status.is_terminal_success())
            })
            .count()
    }

    /// True when every task reached a terminal-success state.
    pub fn all_tasks_succeeded(&self) -> bool {
        !self.tasks.is_empty()
            && self.tasks.values().all(|t| t.status.is_terminal_success())
    }

    /// Structural equality ignoring `updated_at` (used by store round-trips).
    pub fn same_shape(&self, other: &Workflow) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.updated_at = 0;
        b.updated_at = 0;
        a == b
    }

    /// Count tasks currently in the given status.
    pub fn count_in(&self, status: TaskStatus) -> usize {
        self.tasks.values().filter(|t| t.status == status).count()
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
