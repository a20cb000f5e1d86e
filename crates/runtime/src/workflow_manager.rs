// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow manager: the task DAG, the agent busy-set, and checkpoints.
//!
//! Every mutation persists the workflow snapshot; a persistence failure is
//! logged and the in-memory state stays authoritative (the next mutation
//! retries the write).

use fg_core::clock::EpochMillis;
use fg_core::event::{EventDraft, EventGroup};
use fg_core::message::SessionId;
use fg_core::task::{TaskId, TaskNode, TaskStatus};
use fg_core::workflow::{Workflow, WorkflowId, WorkflowStatus};
use fg_hub::EventBus;
use fg_storage::{build_resume_context, Checkpoint, CheckpointId, CheckpointStore, ResumeContext, WorkflowStore};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Options for creating a workflow.
#[derive(Debug, Clone, Default)]
pub struct CreateWorkflow {
    pub id: Option<WorkflowId>,
    pub session_id: Option<SessionId>,
    pub epic_id: Option<String>,
    pub user_task: String,
}

#[derive(Default)]
struct ManagerState {
    workflows: HashMap<WorkflowId, Workflow>,
    busy_agents: HashSet<String>,
    /// agent name -> role
    registered_agents: HashMap<String, String>,
}

#[derive(Clone)]
pub struct WorkflowManager {
    now: Arc<dyn EpochMillis>,
    bus: EventBus,
    store: WorkflowStore,
    checkpoints: CheckpointStore,
    state: Arc<Mutex<ManagerState>>,
}

impl WorkflowManager {
    pub fn new(
        now: Arc<dyn EpochMillis>,
        bus: EventBus,
        store: WorkflowStore,
        checkpoints: CheckpointStore,
    ) -> Self {
        Self { now, bus, store, checkpoints, state: Arc::new(Mutex::new(ManagerState::default())) }
    }

    // ── workflows ───────────────────────────────────────────────────────

    /// Create a workflow; idempotent on id.
    pub fn create_workflow(&self, opts: CreateWorkflow) -> Workflow {
        let now = self.now.epoch_ms();
        let id = opts.id.unwrap_or_default();
        let workflow = {
            let mut state = self.state.lock();
            if let Some(existing) = state.workflows.get(&id) {
                return existing.clone();
            }
            let mut workflow = Workflow::new(id, now);
            workflow.session_id = opts.session_id;
            workflow.epic_id = opts.epic_id;
            workflow.user_task = opts.user_task;
            state.workflows.insert(id, workflow.clone());
            workflow
        };
        self.persist(&workflow);
        self.bus.emit(
            EventDraft::new("workflow_created", EventGroup::Task)
                .with_payload(json!({"workflow_id": workflow.id.as_str()})),
        );
        workflow
    }

    pub fn get(&self, workflow_id: &str) -> Option<Workflow> {
        self.state.lock().workflows.get(workflow_id).cloned()
    }

    pub fn list(&self) -> Vec<Workflow> {
        let mut workflows: Vec<Workflow> =
            self.state.lock().workflows.values().cloned().collect();
        workflows.sort_by_key(|wf| wf.created_at);
        workflows
    }

    /// Adopt a workflow loaded from disk (resume path).
    pub fn adopt(&self, workflow: Workflow) {
        self.state.lock().workflows.insert(workflow.id, workflow);
    }

    pub fn set_workflow_status(&self, workflow_id: &str, status: WorkflowStatus) -> bool {
        let now = self.now.epoch_ms();
        let updated = {
            let mut state = self.state.lock();
            match state.workflows.get_mut(workflow_id) {
                Some(wf) => {
                    wf.status = status;
                    wf.updated_at = now;
                    Some(wf.clone())
                }
                None => None,
            }
        };
        match updated {
            Some(wf) => {
                self.persist(&wf);
                true
            }
            None => false,
        }
    }

    /// Persist every workflow (shutdown flush).
    pub fn flush_all(&self) {
        for wf in self.list() {
            self.persist(&wf);
        }
    }

    // ── tasks ───────────────────────────────────────────────────────────

    /// Add a task, wiring reverse edges and settling its initial status
    /// (`ready` when its dependencies are already satisfied, `blocked`
    /// otherwise).
    pub fn add_task(&self, workflow_id: &str, mut task: TaskNode) -> Result<TaskNode, fg_core::error::FingerError> {
        let now = self.now.epoch_ms();
        let added = {
            let mut state = self.state.lock();
            let wf = state
                .workflows
                .get_mut(workflow_id)
                .ok_or_else(|| fg_core::error::FingerError::InvalidArgument(format!(
                    "unknown workflow: {workflow_id}"
                )))?;

            // Reverse edges on each dependency.
            let task_id = task.id;
            for dep in task.dependencies.clone() {
                if let Some(dep_task) = wf.tasks.get_mut(dep.as_str()) {
                    if !dep_task.dependents.contains(&task_id) {
                        dep_task.dependents.push(task_id);
                    }
                }
            }

            let trigger = if wf.unmet_dependencies(&task) == 0 {
                "deps_satisfied"
            } else {
                "deps_pending"
            };
            if let Some(next) = task.status.on(trigger) {
                task.status = next;
            }

            wf.tasks.insert(task_id, task.clone());
            wf.updated_at = now;
            wf.clone()
        };
        self.persist(&added);
        self.bus.emit(
            EventDraft::new("task_added", EventGroup::Task).with_payload(
                json!({"workflow_id": workflow_id, "task_id": task.id.as_str(), "status": task.status.to_string()}),
            ),
        );
        Ok(task)
    }

    /// Set a task's status directly.
    ///
    /// Leaving an active state releases the assignee from the busy set.
    /// When the new status is terminally successful, every dependent whose
    /// dependencies are now all satisfied moves `blocked → ready` in this
    /// same call.
    pub fn update_task_status(
        &self,
        workflow_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Vec<TaskId>, fg_core::error::FingerError> {
        let now = self.now.epoch_ms();
        let (workflow, unblocked, released) = {
            let mut state = self.state.lock();
            let wf = state
                .workflows
                .get_mut(workflow_id)
                .ok_or_else(|| fg_core::error::FingerError::InvalidArgument(format!(
                    "unknown workflow: {workflow_id}"
                )))?;
            let task = wf.tasks.get_mut(task_id).ok_or_else(|| {
                fg_core::error::FingerError::InvalidArgument(format!("unknown task: {task_id}"))
            })?;

            let was_active = task.status.is_active();
            task.status = status;
            match status {
                TaskStatus::Dispatching | TaskStatus::Running => {
                    task.started_at.get_or_insert(now);
                }
                s if s.is_terminal_success() => {
                    task.completed_at = Some(now);
                }
                TaskStatus::ExecutionFailed | TaskStatus::DispatchFailed => {
                    task.completed_at = Some(now);
                }
                _ => {}
            }

            let released = if was_active && !status.is_active() {
                task.assignee.clone()
            } else {
                None
            };
            let dependents = task.dependents.clone();

            // Unblock dependents whose dependencies are now all satisfied.
            let mut unblocked = Vec::new();
            if status.is_terminal_success() {
                for dep_id in dependents {
                    let satisfied = match wf.tasks.get(dep_id.as_str()) {
                        Some(dependent) if dependent.status == TaskStatus::Blocked => {
                            wf.unmet_dependencies(dependent) == 0
                        }
                        _ => false,
                    };
                    if satisfied {
                        if let Some(dependent) = wf.tasks.get_mut(dep_id.as_str()) {
                            if let Some(next) = dependent.status.on("deps_satisfied") {
                                dependent.status = next;
                                unblocked.push(dep_id);
                            }
                        }
                    }
                }
            }

            if let Some(agent) = &released {
                state.busy_agents.remove(agent);
            }
            let wf = state.workflows.get_mut(workflow_id).map(|wf| {
                wf.updated_at = now;
                wf.clone()
            });
            (wf, unblocked, released)
        };

        if let Some(wf) = &workflow {
            self.persist(wf);
        }
        self.bus.emit(
            EventDraft::new("task_status_changed", EventGroup::Task).with_payload(json!({
                "workflow_id": workflow_id,
                "task_id": task_id,
                "status": status.to_string(),
                "unblocked": unblocked.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                "released_agent": released,
            })),
        );
        Ok(unblocked)
    }

    /// Tasks with no unmet dependencies, ready to dispatch.
    pub fn get_ready_tasks(&self, workflow_id: &str) -> Vec<TaskNode> {
        let state = self.state.lock();
        let Some(wf) = state.workflows.get(workflow_id) else {
            return Vec::new();
        };
        let mut ready: Vec<TaskNode> = wf
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Ready && wf.unmet_dependencies(t) == 0)
            .cloned()
            .collect();
        ready.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        ready
    }

    /// Assign a task to an agent, marking the agent busy.
    pub fn assign_task(&self, workflow_id: &str, task_id: &str, agent: &str) -> bool {
        let now = self.now.epoch_ms();
        let updated = {
            let mut state = self.state.lock();
            let Some(wf) = state.workflows.get_mut(workflow_id) else {
                return false;
            };
            let Some(task) = wf.tasks.get_mut(task_id) else {
                return false;
            };
            task.assignee = Some(agent.to_string());
            wf.updated_at = now;
            let wf = wf.clone();
            state.busy_agents.insert(agent.to_string());
            wf
        };
        self.persist(&updated);
        true
    }

    // ── agents ──────────────────────────────────────────────────────────

    pub fn register_agent(&self, agent: &str, role: &str) {
        self.state.lock().registered_agents.insert(agent.to_string(), role.to_string());
    }

    /// Registered agents of a role, minus the busy set.
    pub fn get_available_agents(&self, role: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut agents: Vec<String> = state
            .registered_agents
            .iter()
            .filter(|(name, r)| *r == role && !state.busy_agents.contains(*name))
            .map(|(name, _)| name.clone())
            .collect();
        agents.sort();
        agents
    }

    pub fn is_busy(&self, agent: &str) -> bool {
        self.state.lock().busy_agents.contains(agent)
    }

    // ── checkpoints ─────────────────────────────────────────────────────

    /// Serialize the workflow into a checkpoint, returning its id.
    pub fn create_checkpoint(
        &self,
        workflow_id: &str,
    ) -> Result<CheckpointId, fg_core::error::FingerError> {
        let wf = self.get(workflow_id).ok_or_else(|| {
            fg_core::error::FingerError::InvalidArgument(format!("unknown workflow: {workflow_id}"))
        })?;
        self.checkpoints.create(&wf, self.now.epoch_ms())
    }

    pub fn load_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>, fg_core::error::FingerError> {
        self.checkpoints.load(id)
    }

    pub fn find_latest_checkpoint(
        &self,
        session_id: &str,
    ) -> Result<Option<Checkpoint>, fg_core::error::FingerError> {
        self.checkpoints.find_latest(session_id)
    }

    pub fn build_resume_context(&self, checkpoint: &Checkpoint) -> ResumeContext {
        build_resume_context(checkpoint)
    }

    fn persist(&self, workflow: &Workflow) {
        if let Err(e) = self.store.save(workflow) {
            warn!(workflow = %workflow.id, error = %e, "workflow persistence failed; memory stays authoritative");
        }
    }
}

#[cfg(test)]
#[path = "workflow_manager_tests.rs"]
mod tests;
