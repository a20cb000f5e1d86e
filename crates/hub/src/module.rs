// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module records and the handler trait.
//!
//! A module is a named handler of one of three kinds. Inputs accept
//! messages from outside (and may declare default routes), outputs deliver
//! messages somewhere, agents do work. All three share one async handler
//! shape; the kind decides which hub operations may target them.

use crate::hub::MessageHub;
use async_trait::async_trait;
use fg_core::error::FingerError;
use fg_core::message::{HubMessage, ModuleId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Module kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Input,
    Output,
    Agent,
}

fg_core::simple_display! {
    ModuleKind {
        Input => "input",
        Output => "output",
        Agent => "agent",
    }
}

/// Async message handler implemented by every module.
#[async_trait]
pub trait ModuleHandler: Send + Sync {
    async fn handle(&self, msg: HubMessage) -> Result<Value, FingerError>;

    /// Called once after registration, with the hub available for wiring.
    async fn initialize(&self, hub: &MessageHub) -> Result<(), FingerError> {
        let _ = hub;
        Ok(())
    }

    /// Called once before unregistration.
    async fn destroy(&self) -> Result<(), FingerError> {
        Ok(())
    }
}

struct SyncFn<F>(F);

#[async_trait]
impl<F> ModuleHandler for SyncFn<F>
where
    F: Fn(HubMessage) -> Result<Value, FingerError> + Send + Sync,
{
    async fn handle(&self, msg: HubMessage) -> Result<Value, FingerError> {
        (self.0)(msg)
    }
}

/// Wrap a synchronous closure as a [`ModuleHandler`].
pub fn handler_fn<F>(f: F) -> Arc<dyn ModuleHandler>
where
    F: Fn(HubMessage) -> Result<Value, FingerError> + Send + Sync + 'static,
{
    Arc::new(SyncFn(f))
}

/// A literal route an input module wants installed on registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultRoute {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A registered module.
#[derive(Clone)]
pub struct Module {
    pub id: ModuleId,
    pub kind: ModuleKind,
    pub name: String,
    pub version: String,
    pub metadata: Value,
    pub handler: Arc<dyn ModuleHandler>,
    pub default_routes: Vec<DefaultRoute>,
    pub capabilities: Vec<String>,
}

impl Module {
    /// Minimal module with just an id, kind, and handler.
    pub fn new(id: impl Into<ModuleId>, kind: ModuleKind, handler: Arc<dyn ModuleHandler>) -> Self {
        let id = id.into();
        Self {
            name: id.as_str().to_string(),
            id,
            kind,
            version: "0.0.0".to_string(),
            metadata: Value::Null,
            handler,
            default_routes: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_default_routes(mut self, routes: Vec<DefaultRoute>) -> Self {
        self.default_routes = routes;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
