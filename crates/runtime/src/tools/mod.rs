// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool surface: registry, per-agent access policy, authorization grants,
//! and the execution entry point that enforces all three.

mod access;
mod authorization;
mod executor;
mod registry;

pub use access::{AccessDecision, AgentPolicy, AgentToolAccess};
pub use authorization::{
    AuthorizationManager, Grant, GrantSpec, GrantToken, DEFAULT_GRANT_TTL_MS,
};
pub use executor::ToolExecutor;
pub use registry::{tool_fn, ToolDef, ToolHandler, ToolPolicy, ToolRegistry};
