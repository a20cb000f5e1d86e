// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named tool table with per-tool allow/deny policy.
//!
//! The definition list is copy-on-write: readers grab an `Arc` snapshot and
//! never block behind a registration. Re-registering a name overwrites the
//! old definition with a warning and a telemetry event.

use async_trait::async_trait;
use fg_core::error::FingerError;
use fg_core::event::{EventDraft, EventGroup};
use fg_hub::EventBus;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Per-tool default policy. Unregistered names are implicitly denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolPolicy {
    #[default]
    Allow,
    Deny,
}

fg_core::simple_display! {
    ToolPolicy {
        Allow => "allow",
        Deny => "deny",
    }
}

/// Async tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, input: Value) -> Result<Value, FingerError>;
}

struct SyncTool<F>(F);

#[async_trait]
impl<F> ToolHandler for SyncTool<F>
where
    F: Fn(Value) -> Result<Value, FingerError> + Send + Sync,
{
    async fn call(&self, input: Value) -> Result<Value, FingerError> {
        (self.0)(input)
    }
}

/// Wrap a synchronous closure as a [`ToolHandler`].
pub fn tool_fn<F>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Value) -> Result<Value, FingerError> + Send + Sync + 'static,
{
    Arc::new(SyncTool(f))
}

/// One registered tool.
#[derive(Clone)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub policy: ToolPolicy,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDef {
    pub fn new(name: impl Into<String>, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: json!({"type": "object"}),
            policy: ToolPolicy::Allow,
            handler,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_policy(mut self, policy: ToolPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl std::fmt::Debug for ToolDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDef")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Copy-on-write tool registry.
#[derive(Clone)]
pub struct ToolRegistry {
    bus: EventBus,
    defs: Arc<RwLock<Arc<Vec<ToolDef>>>>,
}

impl ToolRegistry {
    pub fn new(bus: EventBus) -> Self {
        Self { bus, defs: Arc::new(RwLock::new(Arc::new(Vec::new()))) }
    }

    fn mutate(&self, f: impl FnOnce(&mut Vec<ToolDef>)) {
        let mut slot = self.defs.write();
        let mut next = (**slot).clone();
        f(&mut next);
        *slot = Arc::new(next);
    }

    /// Snapshot of the current definitions.
    pub fn snapshot(&self) -> Arc<Vec<ToolDef>> {
        Arc::clone(&self.defs.read())
    }

    /// Register a tool. Overwriting an existing name is permitted but
    /// warns and emits `tool_overwritten` telemetry.
    pub fn register(&self, def: ToolDef) {
        let name = def.name.clone();
        let mut overwrote = false;
        self.mutate(|defs| {
            if let Some(existing) = defs.iter_mut().find(|d| d.name == name) {
                *existing = def;
                overwrote = true;
            } else {
                defs.push(def);
            }
        });
        if overwrote {
            warn!(tool = %name, "tool definition overwritten");
            self.bus.emit(
                EventDraft::new("tool_overwritten", EventGroup::System)
                    .with_payload(json!({"tool": name})),
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<ToolDef> {
        self.snapshot().iter().find(|d| d.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Execute a tool by name, honoring its policy.
    pub async fn execute(&self, name: &str, input: Value) -> Result<Value, FingerError> {
        let def = self.get(name).ok_or_else(|| FingerError::ToolNotFound(name.to_string()))?;
        if def.policy == ToolPolicy::Deny {
            return Err(FingerError::ToolDenied(name.to_string()));
        }
        def.handler.call(input).await
    }

    /// Set one tool's policy. Unknown names error.
    pub fn set_policy(&self, name: &str, policy: ToolPolicy) -> Result<(), FingerError> {
        let mut found = false;
        self.mutate(|defs| {
            if let Some(def) = defs.iter_mut().find(|d| d.name == name) {
                def.policy = policy;
                found = true;
            }
        });
        if found {
            Ok(())
        } else {
            Err(FingerError::ToolNotFound(name.to_string()))
        }
    }

    pub fn allow_all(&self) {
        self.mutate(|defs| {
            for def in defs.iter_mut() {
                def.policy = ToolPolicy::Allow;
            }
        });
    }

    pub fn deny_all(&self) {
        self.mutate(|defs| {
            for def in defs.iter_mut() {
                def.policy = ToolPolicy::Deny;
            }
        });
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
