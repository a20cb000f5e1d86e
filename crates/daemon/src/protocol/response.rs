// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fg_core::event::Event;
use fg_core::message::HubMessage;
use fg_core::workflow::Workflow;
use fg_runtime::{
    AgentInstance, AgentView, CatalogEntry, DispatchResult, Grant, LockState, SessionMessage,
    SessionRecord, StartupTemplate,
};
use fg_storage::{Checkpoint, ResumeContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the tool listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub policy: String,
    pub authorization_required: bool,
}

/// Workflow FSM state slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStateView {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub status: String,
}

/// Response from the daemon to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic acknowledgement
    Ok,

    Pong,

    Health { status: String, timestamp_ms: u64, version: String },

    /// Failure with a protocol status code
    Error { code: u16, message: String },

    // -- events --
    Events { events: Vec<Event> },
    EventTypes { types: Vec<String> },
    EventGroups { groups: Vec<String> },
    SubscribeConfirmed { groups: Vec<String> },
    UnsubscribeConfirmed,
    /// One streamed event frame (after SubscribeConfirmed)
    Event { event: Event },

    // -- sessions --
    Session { session: SessionRecord },
    Sessions { sessions: Vec<SessionRecord> },
    SessionMessages { messages: Vec<SessionMessage> },
    Deleted { deleted: bool },

    // -- targeted message --
    MessageResult {
        message_id: String,
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    // -- workflows --
    Workflows { workflows: Vec<Workflow> },
    Workflow { workflow: Workflow },
    WorkflowState { state: WorkflowStateView },

    // -- tools --
    Tools { tools: Vec<ToolInfo> },
    Grant { grant: Grant },
    Grants { grants: Vec<Grant> },
    ToolResult { result: Value },
    AgentPolicy {
        agent_id: String,
        whitelist: Vec<String>,
        blacklist: Vec<String>,
    },

    // -- module registry --
    ModulesRegistered { module_ids: Vec<String> },

    // -- mailbox --
    Mailbox {
        queued: Vec<HubMessage>,
        pending_callbacks: Vec<String>,
    },
    Cleared { count: usize },

    // -- checkpoints --
    CheckpointCreated { checkpoint_id: String },
    Checkpoint { checkpoint: Checkpoint },
    Resume { resume: ResumeContext },

    // -- agent runtime --
    Catalog { entries: Vec<CatalogEntry> },
    Templates { templates: Vec<StartupTemplate> },
    Deployed { instances: Vec<AgentInstance> },
    Dispatched { result: DispatchResult },
    RuntimeView { agents: Vec<AgentView> },

    // -- input locks --
    Lock { acquired: bool, state: LockState },

    /// Daemon is shutting down
    ShuttingDown,
}

impl Response {
    /// Build an error response from a kernel error.
    pub fn from_error(e: &fg_core::error::FingerError) -> Self {
        Response::Error { code: e.code(), message: e.to_string() }
    }
}
