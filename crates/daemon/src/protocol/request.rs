// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Request from a client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Daemon health summary
    Health,

    // -- events --
    /// Distinct event types seen in history
    EventTypes,

    /// Supported event groups
    EventGroups,

    /// Filtered event history
    EventHistory {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(default)]
        limit: usize,
    },

    /// Start streaming events of the given groups on this connection
    Subscribe { groups: Vec<String> },

    /// Stop streaming events on this connection
    Unsubscribe,

    // -- sessions --
    SessionCreate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    SessionList,
    SessionCurrent,
    SessionSetCurrent { id: String },
    SessionGet { id: String },
    SessionDelete { id: String },
    SessionPause { id: String },
    SessionResume { id: String },
    SessionMessages { id: String },

    // -- targeted message --
    /// Deliver a message into the hub, optionally blocking on the result
    Message {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        #[serde(default)]
        blocking: bool,
        message: Value,
    },

    // -- workflows --
    WorkflowList,
    WorkflowGet { id: String },
    WorkflowState { id: String },
    WorkflowPause { workflow_id: String },
    WorkflowResume { workflow_id: String },
    WorkflowInput { workflow_id: String, input: Value },

    // -- tools --
    ToolList,
    ToolSetPolicy { name: String, policy: String },
    ToolSetAuthorization { name: String, required: bool },
    ToolGrantIssue {
        agent_id: String,
        tool_name: String,
        issued_by: String,
        #[serde(default)]
        ttl_ms: u64,
        #[serde(default)]
        max_uses: u32,
    },
    ToolGrantRevoke { token: String },
    ToolGrantList,
    ToolExecute {
        agent_id: String,
        tool_name: String,
        #[serde(default)]
        input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization_token: Option<String>,
    },
    AgentPolicyGet { agent_id: String },
    AgentPolicySet {
        agent_id: String,
        #[serde(default)]
        whitelist: Vec<String>,
        #[serde(default)]
        blacklist: Vec<String>,
    },
    AgentToolGrant { agent_id: String, tool_name: String },
    AgentToolRevoke { agent_id: String, tool_name: String },
    AgentToolDeny { agent_id: String, tool_name: String },
    AgentToolAllow { agent_id: String, tool_name: String },

    // -- module registry --
    ModuleRegister { file_path: PathBuf },

    // -- mailbox --
    MailboxList,
    MailboxClear,

    // -- checkpoints --
    CheckpointCreate { workflow_id: String },
    CheckpointGet { id: String },
    CheckpointLatest { session_id: String },
    ResumeFromCheckpoint { session_id: String },

    // -- agent runtime --
    AgentCatalog {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        layer: Option<String>,
    },
    AgentTemplates,
    AgentDeploy {
        agent_id: String,
        #[serde(default)]
        instance_count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        module_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    AgentDispatch {
        source_agent_id: String,
        target_agent_id: String,
        #[serde(default)]
        task: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workflow_id: Option<String>,
        #[serde(default)]
        blocking: bool,
        #[serde(default)]
        queue_on_busy: bool,
    },
    RuntimeView,

    // -- input locks --
    LockAcquire { session_id: String, client_id: String },
    LockHeartbeat { session_id: String, client_id: String },
    LockRelease { session_id: String, client_id: String },
    LockSetTyping { session_id: String, client_id: String, typing: bool },

    /// Request daemon shutdown
    Shutdown,
}
