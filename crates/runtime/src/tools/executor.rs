// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool execution entry point.
//!
//! Order of enforcement: per-agent access policy, then the authorization
//! requirement (token present, in scope, unexpired, with uses left), then
//! the registry's own policy and handler. Every attempt is audited as a
//! TOOL event; failures carry a humanised message alongside the raw error.

use crate::tools::access::AgentToolAccess;
use crate::tools::authorization::AuthorizationManager;
use crate::tools::registry::ToolRegistry;
use fg_core::error::{humanize_tool_failure, FingerError};
use fg_core::event::{EventDraft, EventGroup};
use fg_hub::EventBus;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct ToolExecutor {
    registry: ToolRegistry,
    access: AgentToolAccess,
    authorization: AuthorizationManager,
    bus: EventBus,
}

impl ToolExecutor {
    pub fn new(
        registry: ToolRegistry,
        access: AgentToolAccess,
        authorization: AuthorizationManager,
        bus: EventBus,
    ) -> Self {
        Self { registry, access, authorization, bus }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn access(&self) -> &AgentToolAccess {
        &self.access
    }

    pub fn authorization(&self) -> &AuthorizationManager {
        &self.authorization
    }

    /// Execute `tool_name` on behalf of `agent_id`.
    pub async fn execute(
        &self,
        agent_id: &str,
        tool_name: &str,
        input: Value,
        authorization_token: Option<&str>,
    ) -> Result<Value, FingerError> {
        let outcome = self.run(agent_id, tool_name, input, authorization_token).await;
        self.audit(agent_id, tool_name, &outcome);
        outcome
    }

    async fn run(
        &self,
        agent_id: &str,
        tool_name: &str,
        input: Value,
        authorization_token: Option<&str>,
    ) -> Result<Value, FingerError> {
        let decision = self.access.can_use(agent_id, tool_name);
        if !decision.allowed {
            return Err(FingerError::ToolDenied(format!("{tool_name}: {}", decision.reason)));
        }

        if self.authorization.is_required(tool_name) {
            let token = authorization_token
                .ok_or_else(|| FingerError::AuthorizationRequired(tool_name.to_string()))?;
            self.authorization.verify_and_consume(token, agent_id, tool_name)?;
        }

        self.registry.execute(tool_name, input).await
    }

    fn audit(&self, agent_id: &str, tool_name: &str, outcome: &Result<Value, FingerError>) {
        let payload = match outcome {
            Ok(_) => json!({"tool": tool_name, "outcome": "success"}),
            Err(e) => json!({
                "tool": tool_name,
                "outcome": "failure",
                "error": e.to_string(),
                "message": humanize_tool_failure(&e.to_string()),
            }),
        };
        self.bus.emit(
            EventDraft::new("tool_execution", EventGroup::Tool)
                .with_agent(agent_id)
                .with_payload(payload),
        );
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
