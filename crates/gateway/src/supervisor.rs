// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway supervisor: owns every gateway session and its hub module.
//!
//! Starting a gateway spawns its child and registers a module named after
//! the gateway, so routed messages reach the subprocess. Reload stops all
//! sessions, unregisters the modules, and reinstalls from the manifest
//! directory; manifests whose content hash is unchanged still restart
//! (reload is a full restart policy, not a diff).

use crate::envelope::DeliveryMode;
use crate::manifest::{self, GatewayManifest};
use crate::session::GatewaySession;
use async_trait::async_trait;
use fg_core::error::FingerError;
use fg_core::message::HubMessage;
use fg_hub::{Module, ModuleHandler, ModuleKind, ModuleRegistry};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Called when a gateway child exits on its own: `(gateway_id, code)`.
/// Non-zero exits should be reported to the error handler as
/// `module_crash`; zero is a normal shutdown.
pub type ExitCallback = Arc<dyn Fn(&str, Option<i32>) + Send + Sync>;

struct GatewayModuleHandler {
    session: Arc<GatewaySession>,
    mode: DeliveryMode,
}

#[async_trait]
impl ModuleHandler for GatewayModuleHandler {
    async fn handle(&self, msg: HubMessage) -> Result<Value, FingerError> {
        let message = serde_json::to_value(&msg)?;
        self.session.request(message, self.mode).await
    }
}

pub struct GatewaySupervisor {
    registry: ModuleRegistry,
    on_exit: ExitCallback,
    sessions: Mutex<HashMap<String, Arc<GatewaySession>>>,
    hashes: Mutex<HashMap<String, String>>,
}

impl GatewaySupervisor {
    pub fn new(registry: ModuleRegistry, on_exit: ExitCallback) -> Self {
        Self {
            registry,
            on_exit,
            sessions: Mutex::new(HashMap::new()),
            hashes: Mutex::new(HashMap::new()),
        }
    }

    /// Start one gateway: spawn its child and install its hub module.
    pub async fn start(&self, manifest: GatewayManifest) -> Result<(), FingerError> {
        if !manifest.enabled {
            return Ok(());
        }
        if self.sessions.lock().contains_key(&manifest.id) {
            return Err(FingerError::InvalidArgument(format!(
                "gateway already running: {}",
                manifest.id
            )));
        }

        let hash = manifest.content_hash();
        let session = GatewaySession::spawn(
            manifest.clone(),
            self.registry.hub().clone(),
            Arc::clone(&self.on_exit),
        )?;

        let kind = match manifest.direction {
            crate::manifest::GatewayDirection::Input => ModuleKind::Input,
            _ => ModuleKind::Output,
        };
        let handler = Arc::new(GatewayModuleHandler {
            session: Arc::clone(&session),
            mode: manifest.mode.default,
        });
        let module = Module::new(manifest.id.clone(), kind, handler)
            .with_name(format!("gateway:{}", manifest.id))
            .with_version("1".to_string());
        if let Err(e) = self.registry.register(module).await {
            session.stop();
            return Err(e);
        }

        self.sessions.lock().insert(manifest.id.clone(), session);
        self.hashes.lock().insert(manifest.id.clone(), hash);
        Ok(())
    }

    /// Start every enabled manifest in the directory.
    pub async fn start_all(&self, dir: &Path) -> Vec<String> {
        let mut started = Vec::new();
        for manifest in manifest::load_dir(dir) {
            let id = manifest.id.clone();
            match self.start(manifest).await {
                Ok(()) => started.push(id),
                Err(e) => warn!(gateway = %id, error = %e, "gateway failed to start"),
            }
        }
        started
    }

    /// Stop one gateway session and unregister its module. Idempotent.
    pub async fn stop(&self, id: &str) -> Result<(), FingerError> {
        let session = self.sessions.lock().remove(id);
        if let Some(session) = session {
            session.stop();
        }
        self.hashes.lock().remove(id);
        self.registry.unregister(id).await
    }

    /// Stop every session (daemon shutdown path).
    pub async fn stop_all(&self) {
        let ids: Vec<String> = self.sessions.lock().keys().cloned().collect();
        for id in ids {
            if let Err(e) = self.stop(&id).await {
                warn!(gateway = %id, error = %e, "gateway stop failed");
            }
        }
    }

    /// Restart policy: stop everything, then reinstall from the directory.
    pub async fn reload(&self, dir: &Path) -> Vec<String> {
        info!("reloading gateways");
        self.stop_all().await;
        self.start_all(dir).await
    }

    pub fn running(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn session(&self, id: &str) -> Option<Arc<GatewaySession>> {
        self.sessions.lock().get(id).cloned()
    }

    /// Manifest content hash recorded at start time (reload diagnostics).
    pub fn manifest_hash(&self, id: &str) -> Option<String> {
        self.hashes.lock().get(id).cloned()
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
