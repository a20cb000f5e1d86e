// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request handlers for everything except the tool surface.

use crate::env::PROTOCOL_VERSION;
use crate::lifecycle::Daemon;
use crate::protocol::{Request, Response, WorkflowStateView};
use fg_core::error::FingerError;
use fg_core::event::EventGroup;
use fg_core::message::{HubMessage, SessionId};
use fg_hub::{HistoryFilter, SendOutcome};
use fg_runtime::{CatalogLayer, DeployRequest, DispatchRequest, SessionStatus};
use std::collections::BTreeSet;

/// Dispatch one request to its handler.
pub(crate) async fn handle(daemon: &Daemon, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Health => Response::Health {
            status: "healthy".into(),
            timestamp_ms: daemon.now_ms(),
            version: PROTOCOL_VERSION.to_string(),
        },

        // -- events --
        Request::EventTypes => {
            let types: BTreeSet<String> = daemon
                .bus
                .history(&HistoryFilter::default(), 0)
                .into_iter()
                .map(|e| e.event_type)
                .collect();
            Response::EventTypes { types: types.into_iter().collect() }
        }
        Request::EventGroups => Response::EventGroups {
            groups: EventGroup::ALL.iter().map(|g| g.to_string()).collect(),
        },
        Request::EventHistory { event_type, group, session_id, limit } => {
            let filter = HistoryFilter {
                event_type,
                group: group.as_deref().and_then(EventGroup::parse),
                session_id,
            };
            Response::Events { events: daemon.bus.history(&filter, limit) }
        }
        Request::Subscribe { .. } | Request::Unsubscribe => {
            // Handled at the connection layer.
            Response::Error { code: 400, message: "subscription handled per-connection".into() }
        }

        // -- sessions --
        Request::SessionCreate { id } => {
            let session = daemon.sessions.create(id.map(SessionId::new));
            Response::Session { session }
        }
        Request::SessionList => Response::Sessions { sessions: daemon.sessions.list() },
        Request::SessionCurrent => match daemon.sessions.current() {
            Some(session) => Response::Session { session },
            None => Response::Error { code: 400, message: "no current session".into() },
        },
        Request::SessionSetCurrent { id } => {
            if daemon.sessions.set_current(&id) {
                Response::Ok
            } else {
                not_found("session", &id)
            }
        }
        Request::SessionGet { id } => match daemon.sessions.get(&id) {
            Some(session) => Response::Session { session },
            None => not_found("session", &id),
        },
        Request::SessionDelete { id } => Response::Deleted { deleted: daemon.sessions.delete(&id) },
        Request::SessionPause { id } => {
            if daemon.sessions.set_status(&id, SessionStatus::Paused) {
                Response::Ok
            } else {
                not_found("session", &id)
            }
        }
        Request::SessionResume { id } => {
            if daemon.sessions.set_status(&id, SessionStatus::Active) {
                Response::Ok
            } else {
                not_found("session", &id)
            }
        }
        Request::SessionMessages { id } => {
            Response::SessionMessages { messages: daemon.sessions.messages(&id) }
        }

        // -- targeted message --
        Request::Message { target, blocking, message } => {
            let message_id = format!("msg-{}", nanoid::nanoid!(12));
            let msg: HubMessage = match serde_json::from_value(message.clone()) {
                Ok(msg) => msg,
                Err(_) => HubMessage::with_payload("message", message),
            };
            let outcome = match target {
                Some(target) => daemon.hub.send_to_module(&target, msg).await.map(Some),
                None => daemon.hub.send(msg).await.map(|outcome| match outcome {
                    SendOutcome::Delivered(v) => v,
                    SendOutcome::Queued => None,
                }),
            };
            match outcome {
                Ok(result) => Response::MessageResult {
                    message_id,
                    status: if blocking && result.is_some() { "completed" } else { "accepted" }
                        .to_string(),
                    result: if blocking { result } else { None },
                    error: None,
                },
                Err(e) => Response::MessageResult {
                    message_id,
                    status: "failed".into(),
                    result: None,
                    error: Some(e.to_string()),
                },
            }
        }

        // -- workflows --
        Request::WorkflowList => Response::Workflows { workflows: daemon.workflows.list() },
        Request::WorkflowGet { id } => match daemon.workflows.get(&id) {
            Some(workflow) => Response::Workflow { workflow },
            None => not_found("workflow", &id),
        },
        Request::WorkflowState { id } => match daemon.workflows.get(&id) {
            Some(workflow) => Response::WorkflowState {
                state: WorkflowStateView {
                    workflow_id: id.clone(),
                    state: daemon.workflow_fsms.state(&id),
                    status: workflow.status.to_string(),
                },
            },
            None => not_found("workflow", &id),
        },
        Request::WorkflowPause { workflow_id } => {
            daemon.workflow_fsms.trigger(&workflow_id, "pause_requested", None);
            daemon
                .workflows
                .set_workflow_status(&workflow_id, fg_core::workflow::WorkflowStatus::Paused);
            Response::Ok
        }
        Request::WorkflowResume { workflow_id } => {
            daemon.workflow_fsms.trigger(&workflow_id, "resume_requested", None);
            daemon
                .workflows
                .set_workflow_status(&workflow_id, fg_core::workflow::WorkflowStatus::Executing);
            Response::Ok
        }
        Request::WorkflowInput { workflow_id, input } => {
            daemon.workflow_fsms.trigger(
                &workflow_id,
                "user_decision",
                Some(serde_json::json!({"user_input": input})),
            );
            Response::Ok
        }

        // -- tools (delegated) --
        Request::ToolList
        | Request::ToolSetPolicy { .. }
        | Request::ToolSetAuthorization { .. }
        | Request::ToolGrantIssue { .. }
        | Request::ToolGrantRevoke { .. }
        | Request::ToolGrantList
        | Request::ToolExecute { .. }
        | Request::AgentPolicyGet { .. }
        | Request::AgentPolicySet { .. }
        | Request::AgentToolGrant { .. }
        | Request::AgentToolRevoke { .. }
        | Request::AgentToolDeny { .. }
        | Request::AgentToolAllow { .. } => super::tools::handle(daemon, request).await,

        // -- module registry --
        Request::ModuleRegister { file_path } => {
            match daemon.registry.load_from_file(&file_path).await {
                Ok(ids) => Response::ModulesRegistered {
                    module_ids: ids.iter().map(|id| id.as_str().to_string()).collect(),
                },
                Err(e) => Response::from_error(&e),
            }
        }

        // -- mailbox --
        Request::MailboxList => Response::Mailbox {
            queued: daemon.hub.queued_messages(),
            pending_callbacks: daemon.hub.pending_callback_ids(),
        },
        Request::MailboxClear => Response::Cleared { count: daemon.hub.clear_queue() },

        // -- checkpoints --
        Request::CheckpointCreate { workflow_id } => {
            match daemon.workflows.create_checkpoint(&workflow_id) {
                Ok(id) => Response::CheckpointCreated { checkpoint_id: id.to_string() },
                Err(e) => Response::from_error(&e),
            }
        }
        Request::CheckpointGet { id } => match daemon.workflows.load_checkpoint(&id) {
            Ok(Some(checkpoint)) => Response::Checkpoint { checkpoint },
            Ok(None) => not_found("checkpoint", &id),
            Err(e) => Response::from_error(&e),
        },
        Request::CheckpointLatest { session_id } => {
            match daemon.workflows.find_latest_checkpoint(&session_id) {
                Ok(Some(checkpoint)) => Response::Checkpoint { checkpoint },
                Ok(None) => not_found("checkpoint for session", &session_id),
                Err(e) => Response::from_error(&e),
            }
        }
        Request::ResumeFromCheckpoint { session_id } => {
            match daemon.workflows.find_latest_checkpoint(&session_id) {
                Ok(Some(checkpoint)) => {
                    let resume = daemon.workflows.build_resume_context(&checkpoint);
                    Response::Resume { resume }
                }
                Ok(None) => not_found("checkpoint for session", &session_id),
                Err(e) => Response::from_error(&e),
            }
        }

        // -- agent runtime --
        Request::AgentCatalog { layer } => Response::Catalog {
            entries: daemon
                .agent_block
                .catalog(layer.as_deref().map(CatalogLayer::parse).unwrap_or_default()),
        },
        Request::AgentTemplates => {
            Response::Templates { templates: daemon.agent_block.list_startup_templates() }
        }
        Request::AgentDeploy { agent_id, instance_count, module_id, session_id } => {
            match daemon.agent_block.deploy(DeployRequest {
                agent_id,
                module_id,
                instance_count,
                session_id,
                ..Default::default()
            }) {
                Ok(instances) => Response::Deployed { instances },
                Err(e) => Response::from_error(&e),
            }
        }
        Request::AgentDispatch {
            source_agent_id,
            target_agent_id,
            task,
            session_id,
            workflow_id,
            blocking,
            queue_on_busy,
        } => {
            match daemon
                .agent_block
                .dispatch(DispatchRequest {
                    source_agent_id,
                    target_agent_id,
                    task,
                    session_id,
                    workflow_id,
                    blocking,
                    queue_on_busy,
                    assignment: None,
                })
                .await
            {
                Ok(result) => Response::Dispatched { result },
                Err(e) => Response::from_error(&e),
            }
        }
        Request::RuntimeView => Response::RuntimeView { agents: daemon.agent_block.runtime_view() },

        // -- input locks --
        Request::LockAcquire { session_id, client_id } => {
            let acquired = daemon.locks.acquire(&session_id, &client_id);
            Response::Lock { acquired, state: daemon.locks.state(&session_id) }
        }
        Request::LockHeartbeat { session_id, client_id } => {
            let acquired = daemon.locks.heartbeat(&session_id, &client_id);
            Response::Lock { acquired, state: daemon.locks.state(&session_id) }
        }
        Request::LockRelease { session_id, client_id } => {
            let released = daemon.locks.release(&session_id, &client_id);
            Response::Lock { acquired: !released, state: daemon.locks.state(&session_id) }
        }
        Request::LockSetTyping { session_id, client_id, typing } => {
            let changed = daemon.locks.set_typing(&session_id, &client_id, typing);
            if changed {
                Response::Lock { acquired: true, state: daemon.locks.state(&session_id) }
            } else {
                Response::Error { code: 400, message: "not the lock holder".into() }
            }
        }

        Request::Shutdown => Response::ShuttingDown,
    }
}

fn not_found(what: &str, id: &str) -> Response {
    Response::from_error(&FingerError::InvalidArgument(format!("unknown {what}: {id}")))
}
