// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::message::SessionId;
use crate::task::{TaskId, TaskNode, TaskStatus, TaskType};
use crate::workflow::{Workflow, WorkflowId, WorkflowStatus};
use serde_json::Value;
use std::collections::HashMap;

crate::builder! {
    pub struct TaskBuilder => TaskNode {
        into {
            id: TaskId = TaskId::new(),
            description: String = "test task",
        }
        set {
            task_type: TaskType = TaskType::Executor,
            status: TaskStatus = TaskStatus::Created,
            dependencies: Vec<TaskId> = Vec::new(),
            dependents: Vec<TaskId> = Vec::new(),
        }
        option {
            assignee: String = None,
        }
        computed {
            started_at: Option<u64> = None,
            completed_at: Option<u64> = None,
            deadline: Option<u64> = None,
            result: Option<Value> = None,
        }
    }
}

crate::builder! {
    pub struct WorkflowBuilder => Workflow {
        into {
            id: WorkflowId = WorkflowId::new(),
            user_task: String = "test user task",
        }
        set {
            status: WorkflowStatus = WorkflowStatus::Planning,
            tasks: HashMap<TaskId, TaskNode> = HashMap::new(),
            created_at: u64 = 1_000_000,
            updated_at: u64 = 1_000_000,
        }
        option {
            session_id: SessionId = None,
            epic_id: String = None,
        }
        computed {
            context: Value = Value::Null,
        }
    }
}

/// Task with explicit id and dependency ids, in `created` status.
pub fn task_with_deps(id: &str, deps: &[&str]) -> TaskNode {
    TaskBuilder::default()
        .id(id)
        .description(format!("task {id}"))
        .dependencies(deps.iter().map(|d| TaskId::from(*d)).collect())
        .build()
}
