// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-runtime block: deploy, dispatch, quotas, and per-target queues.
//!
//! Deploy reserves runtime instances for an agent; dispatch hands a task
//! to one of them through the hub, respecting the agent's effective quota.
//! Overflow always enqueues (strict FIFO per target); a blocking dispatch
//! at quota suspends until a slot drains, unless doing so would deadlock
//! on the caller's own slot.

mod catalog;

pub use catalog::{AgentView, CatalogEntry, CatalogLayer, InstanceView, StartupTemplate};

use fg_core::assignment::{Assignment, AssignmentPhase, ReviewDecision};
use fg_core::error::FingerError;
use fg_core::event::{EventDraft, EventGroup};
use fg_core::quota::{QuotaPolicy, QuotaSource};
use fg_hub::{EventBus, MessageHub};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::sessions::SessionManager;

/// Runtime instance states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Available,
    #[default]
    Deployed,
    Busy,
    Running,
    Error,
    Released,
}

fg_core::simple_display! {
    InstanceStatus {
        Available => "available",
        Deployed => "deployed",
        Busy => "busy",
        Running => "running",
        Error => "error",
        Released => "released",
    }
}

impl InstanceStatus {
    /// Occupying a quota slot.
    fn is_inflight(&self) -> bool {
        matches!(self, InstanceStatus::Running | InstanceStatus::Busy)
    }

    /// Eligible to take new work.
    fn is_free(&self) -> bool {
        matches!(
            self,
            InstanceStatus::Available | InstanceStatus::Deployed | InstanceStatus::Released
        )
    }
}

/// One deployed runtime instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInstance {
    pub id: String,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub implementation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    pub status: InstanceStatus,
    pub total_deployments: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event: Option<String>,
    /// Source agent currently holding this slot.
    #[serde(skip)]
    pub occupied_by: Option<String>,
}

/// Provider subsystem handle. Opaque to the kernel: it only pushes
/// resolved configs and asks about turn activity.
pub trait ProviderRuntime: Send + Sync {
    fn set_agent_runtime_config(&self, agent_id: &str, config: Value);
    fn has_active_turn(&self, session_id: &str) -> bool;
    fn interrupt(&self, session_id: &str);
}

/// Provider that does nothing (native-module-only deployments).
#[derive(Default)]
pub struct NoopProviderRuntime;

impl ProviderRuntime for NoopProviderRuntime {
    fn set_agent_runtime_config(&self, _agent_id: &str, _config: Value) {}
    fn has_active_turn(&self, _session_id: &str) -> bool {
        false
    }
    fn interrupt(&self, _session_id: &str) {}
}

/// Resolved provider config pushed at deploy time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentRuntimeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

/// Deploy parameters.
#[derive(Debug, Clone, Default)]
pub struct DeployRequest {
    pub agent_id: String,
    /// Hub module tasks are dispatched to; defaults to the agent id.
    pub module_id: Option<String>,
    pub implementation_id: Option<String>,
    pub instance_count: u32,
    pub session_id: Option<String>,
    /// Provider-backed implementations push this (merged over the
    /// manifest config) into the provider runtime.
    pub provider_config: Option<AgentRuntimeConfig>,
    /// Quotas merged into the agent's policy.
    pub quota: Option<QuotaPolicy>,
}

/// Dispatch parameters.
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub source_agent_id: String,
    pub target_agent_id: String,
    pub task: Value,
    pub session_id: Option<String>,
    pub workflow_id: Option<String>,
    pub blocking: bool,
    /// When true, an enqueued dispatch reports its queue position.
    pub queue_on_busy: bool,
    pub assignment: Option<Assignment>,
}

/// Dispatch outcome statuses. Immediate acceptance and deferral are
/// distinct: `accepted` means a slot was taken now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Accepted,
    Queued,
    Completed,
    Failed,
}

fg_core::simple_display! {
    DispatchStatus {
        Accepted => "accepted",
        Queued => "queued",
        Completed => "completed",
        Failed => "failed",
    }
}

/// What the caller gets back from `dispatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub dispatch_id: String,
    pub status: DispatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,
}

/// Control-plane actions accepted for a target agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Status,
    Pause,
    Resume,
    Interrupt,
    Cancel,
    Dispatch,
}

#[derive(Debug, Clone)]
pub struct ControlRequest {
    pub action: ControlAction,
    pub target: String,
    pub session_id: Option<String>,
    pub payload: Option<Value>,
}

struct AgentRecord {
    agent_id: String,
    module_id: String,
    quota: QuotaPolicy,
    instances: Vec<AgentInstance>,
    last_event: Option<String>,
}

struct QueuedDispatch {
    dispatch_id: String,
    request: DispatchRequest,
    assignment: Assignment,
    resolve: Option<oneshot::Sender<DispatchResult>>,
}

#[derive(Default)]
struct BlockState {
    agents: HashMap<String, AgentRecord>,
    queues: HashMap<String, VecDeque<QueuedDispatch>>,
}

/// The agent-runtime block.
#[derive(Clone)]
pub struct AgentRuntimeBlock {
    hub: MessageHub,
    bus: EventBus,
    sessions: SessionManager,
    provider: Arc<dyn ProviderRuntime>,
    /// Directory of `*.agent.json` configs for the catalog.
    configs_dir: Option<PathBuf>,
    access: crate::tools::AgentToolAccess,
    state: Arc<Mutex<BlockState>>,
}

impl AgentRuntimeBlock {
    pub fn new(
        hub: MessageHub,
        sessions: SessionManager,
        access: crate::tools::AgentToolAccess,
        provider: Arc<dyn ProviderRuntime>,
    ) -> Self {
        let bus = hub.bus().clone();
        Self {
            hub,
            bus,
            sessions,
            provider,
            configs_dir: None,
            access,
            state: Arc::new(Mutex::new(BlockState::default())),
        }
    }

    pub fn with_configs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.configs_dir = Some(dir.into());
        self
    }

    // ── deploy ──────────────────────────────────────────────────────────

    /// Create or replace runtime instances for an agent. Deploy must
    /// precede dispatch.
    pub fn deploy(&self, req: DeployRequest) -> Result<Vec<AgentInstance>, FingerError> {
        if req.agent_id.is_empty() {
            return Err(FingerError::MissingField("agent_id".into()));
        }
        let count = req.instance_count.max(1);
        let module_id = req.module_id.clone().unwrap_or_else(|| req.agent_id.clone());
        let implementation_id =
            req.implementation_id.clone().unwrap_or_else(|| "native-module".to_string());

        if let Some(config) = &req.provider_config {
            let resolved = serde_json::to_value(config).unwrap_or(Value::Null);
            self.provider.set_agent_runtime_config(&req.agent_id, resolved);
        }

        let instances = {
            let mut state = self.state.lock();
            let record = state.agents.entry(req.agent_id.clone()).or_insert_with(|| AgentRecord {
                agent_id: req.agent_id.clone(),
                module_id: module_id.clone(),
                quota: QuotaPolicy::default(),
                instances: Vec::new(),
                last_event: None,
            });
            record.module_id = module_id;
            if let Some(quota) = &req.quota {
                record.quota.merge(quota);
            }

            let generation =
                record.instances.iter().map(|i| i.total_deployments).max().unwrap_or(0) + 1;
            record.instances = (0..count)
                .map(|n| AgentInstance {
                    id: format!("{}#{n}", req.agent_id),
                    agent_id: req.agent_id.clone(),
                    session_id: req.session_id.clone(),
                    implementation_id: implementation_id.clone(),
                    module_id: Some(record.module_id.clone()),
                    status: InstanceStatus::Deployed,
                    total_deployments: generation,
                    last_event: None,
                    occupied_by: None,
                })
                .collect();
            record.instances.clone()
        };

        info!(agent = %req.agent_id, count, "agent deployed");
        self.bus.emit(
            EventDraft::new("agent_deployed", EventGroup::Session)
                .with_agent(req.agent_id.clone())
                .with_payload(json!({"instance_count": count})),
        );
        Ok(instances)
    }

    /// Merge a quota policy for an agent outside of deploy.
    pub fn set_quota(&self, agent_id: &str, quota: QuotaPolicy) -> Result<(), FingerError> {
        let mut state = self.state.lock();
        let record = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| FingerError::AgentNotStarted(agent_id.to_string()))?;
        record.quota.merge(&quota);
        Ok(())
    }

    pub fn effective_quota(
        &self,
        agent_id: &str,
        workflow_id: Option<&str>,
    ) -> Option<(u32, QuotaSource)> {
        self.state.lock().agents.get(agent_id).map(|r| r.quota.effective(workflow_id))
    }

    // ── dispatch ────────────────────────────────────────────────────────

    /// Dispatch a task to an agent.
    ///
    /// Below quota the task executes immediately (`accepted`, or
    /// `completed`/`failed` when blocking). At quota the dispatch always
    /// enqueues; non-blocking callers resolve right away with `queued`
    /// (position reported only with `queue_on_busy`), blocking callers
    /// suspend until a slot drains, unless they would be waiting on a
    /// slot they themselves hold, which fails fast as a deadlock.
    pub async fn dispatch(&self, req: DispatchRequest) -> Result<DispatchResult, FingerError> {
        let dispatch_id = format!("dsp-{}", nanoid::nanoid!(12));
        let mut assignment = req.assignment.clone().unwrap_or_else(|| {
            Assignment::new(req.source_agent_id.clone(), req.target_agent_id.clone())
        });

        enum Admission {
            Execute { module_id: String, instance_id: String },
            Enqueue,
            Deadlock,
        }

        let admission = {
            let mut state = self.state.lock();
            let record = state
                .agents
                .get_mut(&req.target_agent_id)
                .ok_or_else(|| FingerError::AgentNotStarted(req.target_agent_id.clone()))?;
            if record.instances.is_empty() {
                return Err(FingerError::AgentNotStarted(req.target_agent_id.clone()));
            }

            let (quota, _source) = record.quota.effective(req.workflow_id.as_deref());
            let inflight = record.instances.iter().filter(|i| i.status.is_inflight()).count();

            if inflight < quota as usize {
                match record.instances.iter_mut().find(|i| i.status.is_free()) {
                    Some(instance) => {
                        instance.status = InstanceStatus::Running;
                        instance.occupied_by = Some(req.source_agent_id.clone());
                        Admission::Execute {
                            module_id: record.module_id.clone(),
                            instance_id: instance.id.clone(),
                        }
                    }
                    None => Admission::Enqueue,
                }
            } else if req.blocking
                && req.source_agent_id == req.target_agent_id
                && record
                    .instances
                    .iter()
                    .filter(|i| i.status.is_inflight())
                    .all(|i| i.occupied_by.as_deref() == Some(req.source_agent_id.as_str()))
            {
                Admission::Deadlock
            } else {
                Admission::Enqueue
            }
        };

        match admission {
            Admission::Deadlock => Err(FingerError::DispatchDeadlock(format!(
                "{} holds every slot of {}",
                req.source_agent_id, req.target_agent_id
            ))),
            Admission::Execute { module_id, instance_id } => {
                assignment.advance(AssignmentPhase::Assigned);
                self.emit_dispatch("dispatch.accepted", &dispatch_id, &req, &assignment, None);
                if req.blocking {
                    let result = self
                        .run_dispatch(&dispatch_id, &req, assignment, &module_id, &instance_id)
                        .await;
                    self.drain(&req.target_agent_id).await;
                    Ok(result)
                } else {
                    let block = self.clone();
                    let spawned_req = req.clone();
                    let spawned_id = dispatch_id.clone();
                    let spawned_assignment = assignment.clone();
                    tokio::spawn(async move {
                        block
                            .run_dispatch(
                                &spawned_id,
                                &spawned_req,
                                spawned_assignment,
                                &module_id,
                                &instance_id,
                            )
                            .await;
                        block.drain(&spawned_req.target_agent_id).await;
                    });
                    Ok(DispatchResult {
                        dispatch_id,
                        status: DispatchStatus::Accepted,
                        queue_position: None,
                        result: None,
                        error: None,
                        assignment: Some(assignment),
                    })
                }
            }
            Admission::Enqueue => {
                assignment.advance(AssignmentPhase::Queued);
                let (resolve, wait) = if req.blocking {
                    let (tx, rx) = oneshot::channel();
                    (Some(tx), Some(rx))
                } else {
                    (None, None)
                };
                let position = {
                    let mut state = self.state.lock();
                    let queue = state.queues.entry(req.target_agent_id.clone()).or_default();
                    queue.push_back(QueuedDispatch {
                        dispatch_id: dispatch_id.clone(),
                        request: req.clone(),
                        assignment: assignment.clone(),
                        resolve,
                    });
                    queue.len()
                };
                self.emit_dispatch(
                    "dispatch.queued",
                    &dispatch_id,
                    &req,
                    &assignment,
                    Some(position),
                );

                // Nudge the drain in case a slot freed while enqueueing.
                {
                    let block = self.clone();
                    let target = req.target_agent_id.clone();
                    tokio::spawn(async move { block.drain(&target).await });
                }

                match wait {
                    Some(rx) => rx.await.map_err(|_| {
                        FingerError::DispatchCancelled(req.target_agent_id.clone())
                    }),
                    None => Ok(DispatchResult {
                        dispatch_id,
                        status: DispatchStatus::Queued,
                        queue_position: req.queue_on_busy.then_some(position),
                        result: None,
                        error: None,
                        assignment: Some(assignment),
                    }),
                }
            }
        }
    }

    /// Execute one admitted dispatch on a reserved instance.
    async fn run_dispatch(
        &self,
        dispatch_id: &str,
        req: &DispatchRequest,
        mut assignment: Assignment,
        module_id: &str,
        instance_id: &str,
    ) -> DispatchResult {
        // Best-effort: the user-visible task text lands in the session log.
        if let Some(session_id) = &req.session_id {
            let text = task_text(&req.task);
            self.sessions.append_message(session_id, "user", "dispatch", &text);
        }

        assignment.advance(AssignmentPhase::Started);
        self.emit_dispatch("dispatch.started", dispatch_id, req, &assignment, None);

        let msg = normalize_task(req);
        let outcome = self.hub.send_to_module(module_id, msg).await;

        let (status, result, error) = match outcome {
            Ok(value) => {
                let phase = review_decision(&value)
                    .map(|d| d.phase())
                    .unwrap_or(AssignmentPhase::Passed);
                assignment.advance(phase);
                (DispatchStatus::Completed, Some(value), None)
            }
            Err(e) => {
                assignment.advance(AssignmentPhase::Failed);
                (DispatchStatus::Failed, None, Some(e.to_string()))
            }
        };
        assignment.advance(AssignmentPhase::Closed);

        // Free the slot.
        {
            let mut state = self.state.lock();
            if let Some(record) = state.agents.get_mut(&req.target_agent_id) {
                record.last_event = Some(format!("dispatch.{status}"));
                if let Some(instance) =
                    record.instances.iter_mut().find(|i| i.id == instance_id)
                {
                    instance.status = InstanceStatus::Available;
                    instance.occupied_by = None;
                    instance.last_event = Some(format!("dispatch.{status}"));
                }
            }
        }

        let event_name = match status {
            DispatchStatus::Completed => "dispatch.completed",
            _ => "dispatch.failed",
        };
        self.emit_dispatch(event_name, dispatch_id, req, &assignment, None);
        self.bus.emit(
            EventDraft::new("agent_runtime_dispatch", EventGroup::Task)
                .with_agent(req.target_agent_id.clone())
                .with_payload(json!({
                    "dispatch_id": dispatch_id,
                    "status": status.to_string(),
                })),
        );

        DispatchResult {
            dispatch_id: dispatch_id.to_string(),
            status,
            queue_position: None,
            result,
            error,
            assignment: Some(assignment),
        }
    }

    /// Execute queued dispatches while free slots remain. Strict FIFO.
    async fn drain(&self, target: &str) {
        loop {
            let next = {
                let mut guard = self.state.lock();
                let state = &mut *guard;
                let Some(queue) = state.queues.get_mut(target) else { break };
                let Some(front_workflow) =
                    queue.front().map(|e| e.request.workflow_id.clone())
                else {
                    break;
                };
                let Some(record) = state.agents.get_mut(target) else { break };
                let (quota, _) = record.quota.effective(front_workflow.as_deref());
                let inflight = record.instances.iter().filter(|i| i.status.is_inflight()).count();
                if inflight >= quota as usize {
                    break;
                }
                let Some(slot) = record.instances.iter_mut().find(|i| i.status.is_free()) else {
                    break;
                };
                let Some(entry) = queue.pop_front() else { break };
                slot.status = InstanceStatus::Running;
                slot.occupied_by = Some(entry.request.source_agent_id.clone());
                let instance_id = slot.id.clone();
                let module_id = record.module_id.clone();
                (entry, module_id, instance_id)
            };

            let (entry, module_id, instance_id) = next;
            debug!(target, dispatch = %entry.dispatch_id, "draining queued dispatch");
            let result = self
                .run_dispatch(
                    &entry.dispatch_id,
                    &entry.request,
                    entry.assignment,
                    &module_id,
                    &instance_id,
                )
                .await;
            if let Some(tx) = entry.resolve {
                let _ = tx.send(result);
            }
        }
    }

    /// Cancel every queued dispatch for a target. Blocking waiters resolve
    /// with a failed result naming the cancellation.
    pub fn cancel_queued(&self, target: &str) -> usize {
        let entries = {
            let mut state = self.state.lock();
            state.queues.remove(target).unwrap_or_default()
        };
        let cancelled = entries.len();
        for entry in entries {
            warn!(target, dispatch = %entry.dispatch_id, "dispatch cancelled");
            let error = FingerError::DispatchCancelled(target.to_string()).to_string();
            if let Some(tx) = entry.resolve {
                let _ = tx.send(DispatchResult {
                    dispatch_id: entry.dispatch_id.clone(),
                    status: DispatchStatus::Failed,
                    queue_position: None,
                    result: None,
                    error: Some(error.clone()),
                    assignment: Some(entry.assignment),
                });
            }
            self.bus.emit(
                EventDraft::new("dispatch.cancelled", EventGroup::Task)
                    .with_payload(json!({"dispatch_id": entry.dispatch_id, "target": target})),
            );
        }
        cancelled
    }

    pub fn queue_len(&self, target: &str) -> usize {
        self.state.lock().queues.get(target).map_or(0, VecDeque::len)
    }

    fn emit_dispatch(
        &self,
        event: &str,
        dispatch_id: &str,
        req: &DispatchRequest,
        assignment: &Assignment,
        position: Option<usize>,
    ) {
        let mut draft = EventDraft::new(event, EventGroup::Task)
            .with_agent(req.target_agent_id.clone())
            .with_payload(json!({
                "dispatch_id": dispatch_id,
                "source": req.source_agent_id,
                "target": req.target_agent_id,
                "workflow_id": req.workflow_id,
                "queue_position": position,
                "assignment": assignment,
            }));
        if let Some(session) = &req.session_id {
            draft = draft.with_session(session.clone());
        }
        self.bus.emit(draft);
    }
}

/// Extract the user-visible text of a task payload.
fn task_text(task: &Value) -> String {
    match task {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("description"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Shape the dispatch task into the hub message handed to the module.
fn normalize_task(req: &DispatchRequest) -> fg_core::message::HubMessage {
    let mut msg = fg_core::message::HubMessage::with_payload("agent_task", req.task.clone());
    msg.source = Some(req.source_agent_id.clone());
    msg.target = Some(req.target_agent_id.clone());
    msg.session_id = req.session_id.clone().map(fg_core::message::SessionId::new);
    msg
}

/// Review decision carried in a child result, if any.
fn review_decision(value: &Value) -> Option<ReviewDecision> {
    value
        .get("reviewDecision")
        .or_else(|| value.get("review_decision"))
        .and_then(Value::as_str)
        .and_then(ReviewDecision::parse)
}
