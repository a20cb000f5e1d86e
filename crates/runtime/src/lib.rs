// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fg-runtime: the orchestration kernel's moving parts.
//!
//! Tool registry with per-agent policy and one-shot grants, the retrying
//! error handler, the agent-runtime block (deploy/dispatch/queue/quota),
//! the workflow manager with checkpoints, FSM managers wiring state
//! machines to the event bus, session records, and input locks.

pub mod agents;
pub mod tools;

mod error_handler;
mod locks;
mod machines;
mod sessions;
mod workflow_manager;

pub use agents::{
    AgentInstance, AgentRuntimeBlock, AgentRuntimeConfig, AgentView, CatalogEntry, CatalogLayer,
    ControlAction, ControlRequest, DeployRequest, DispatchRequest, DispatchResult,
    DispatchStatus, InstanceStatus, InstanceView, NoopProviderRuntime, ProviderRuntime,
    StartupTemplate,
};
pub use error_handler::{ErrorDisposition, ErrorHandler, ModuleErrorState, RetryConfig};
pub use locks::{InputLockManager, LockState, DEFAULT_LEASE_MS};
pub use machines::FsmManager;
pub use sessions::{SessionManager, SessionMessage, SessionRecord, SessionStatus};
pub use tools::{
    tool_fn, AccessDecision, AgentPolicy, AgentToolAccess, AuthorizationManager, Grant,
    GrantSpec, GrantToken, ToolDef, ToolExecutor, ToolHandler, ToolPolicy, ToolRegistry,
};
pub use workflow_manager::{CreateWorkflow, WorkflowManager};
