// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module registry: lifecycle over the hub plus manifest loading.
//!
//! Registration validates the module, installs it in the hub, runs its
//! `initialize` hook, and (for inputs) installs the declared default routes
//! at low priority. Manifests are JSON files declaring one module or an
//! array of modules; each names a handler factory registered in-process at
//! startup; there is no runtime code loading.

use crate::hub::MessageHub;
use crate::module::{DefaultRoute, Module, ModuleHandler, ModuleKind};
use crate::route::{Pattern, RouteRule};
use fg_core::error::FingerError;
use fg_core::message::ModuleId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Priority given to default routes so explicit routes always win.
pub const DEFAULT_ROUTE_PRIORITY: i32 = -100;

/// Builds a handler for a manifest entry.
pub type HandlerFactory =
    Arc<dyn Fn(&ManifestModule) -> Result<Arc<dyn ModuleHandler>, FingerError> + Send + Sync>;

/// One module declaration in a manifest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestModule {
    pub id: String,
    pub kind: ModuleKind,
    /// Name of a registered handler factory.
    pub handler: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_routes: Vec<DefaultRoute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    Single(ManifestModule),
    Many(Vec<ManifestModule>),
}

/// Registry of named handlers over the hub.
#[derive(Clone)]
pub struct ModuleRegistry {
    hub: MessageHub,
    factories: Arc<Mutex<HashMap<String, HandlerFactory>>>,
    /// Route ids installed for each input module's default routes.
    default_route_ids: Arc<Mutex<HashMap<ModuleId, Vec<String>>>>,
}

impl ModuleRegistry {
    pub fn new(hub: MessageHub) -> Self {
        Self {
            hub,
            factories: Arc::new(Mutex::new(HashMap::new())),
            default_route_ids: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn hub(&self) -> &MessageHub {
        &self.hub
    }

    /// Register a handler factory manifests can reference by name.
    pub fn register_factory(&self, name: impl Into<String>, factory: HandlerFactory) {
        self.factories.lock().insert(name.into(), factory);
    }

    /// Register a module and run its lifecycle `initialize`.
    pub async fn register(&self, module: Module) -> Result<(), FingerError> {
        if module.id.as_str().is_empty() {
            return Err(FingerError::MissingField("module.id".into()));
        }
        let id = module.id.clone();
        let kind = module.kind;
        let handler = Arc::clone(&module.handler);
        let default_routes = module.default_routes.clone();

        self.hub.register_module(module)?;

        // Input modules get their default routes installed at low priority.
        if kind == ModuleKind::Input && !default_routes.is_empty() {
            let mut route_ids = Vec::with_capacity(default_routes.len());
            for route in default_routes {
                let mut rule = RouteRule::new(Pattern::literal(route.pattern), Arc::clone(&handler))
                    .priority(DEFAULT_ROUTE_PRIORITY);
                if let Some(desc) = route.description {
                    rule = rule.describe(desc);
                }
                route_ids.push(self.hub.add_route(rule));
            }
            self.default_route_ids.lock().insert(id.clone(), route_ids);
        }

        if let Err(e) = handler.initialize(&self.hub).await {
            // Roll back a module whose initialize failed.
            self.hub.unregister_module(id.as_str());
            self.remove_default_routes(&id);
            return Err(e);
        }

        info!(module = %id, kind = %kind, "module registered");
        Ok(())
    }

    /// Unregister a module, running its `destroy` hook. Idempotent.
    pub async fn unregister(&self, id: &str) -> Result<(), FingerError> {
        let Some(module) = self.hub.unregister_module(id) else {
            return Ok(());
        };
        self.remove_default_routes(&module.id);
        if let Err(e) = module.handler.destroy().await {
            warn!(module = %id, error = %e, "module destroy failed");
        }
        info!(module = %id, "module unregistered");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<Module>> {
        self.hub.get_module(id)
    }

    pub fn list(&self, kind: ModuleKind) -> Vec<Arc<Module>> {
        self.hub.modules_of_kind(kind)
    }

    /// Load module declarations from a JSON manifest file.
    ///
    /// The file holds one module object or an array of them; each names a
    /// registered handler factory. Returns the registered module ids.
    pub async fn load_from_file(&self, path: &Path) -> Result<Vec<ModuleId>, FingerError> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: ManifestFile = serde_json::from_str(&raw)
            .map_err(|e| FingerError::InvalidConfig(format!("{}: {e}", path.display())))?;
        let entries = match parsed {
            ManifestFile::Single(one) => vec![one],
            ManifestFile::Many(many) => many,
        };

        let mut registered = Vec::with_capacity(entries.len());
        for entry in entries {
            let factory = self
                .factories
                .lock()
                .get(&entry.handler)
                .cloned()
                .ok_or_else(|| {
                    FingerError::InvalidConfig(format!("unknown handler factory: {}", entry.handler))
                })?;
            let handler = factory(&entry)?;
            let module = Module {
                id: ModuleId::new(entry.id.clone()),
                kind: entry.kind,
                name: entry.name.clone().unwrap_or_else(|| entry.id.clone()),
                version: entry.version.clone().unwrap_or_else(|| "0.0.0".into()),
                metadata: entry.metadata.clone(),
                handler,
                default_routes: entry.default_routes.clone(),
                capabilities: entry.capabilities.clone(),
            };
            let id = module.id.clone();
            self.register(module).await?;
            registered.push(id);
        }
        Ok(registered)
    }

    fn remove_default_routes(&self, id: &ModuleId) {
        if let Some(route_ids) = self.default_route_ids.lock().remove(id) {
            for route_id in route_ids {
                self.hub.remove_route(&route_id);
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
