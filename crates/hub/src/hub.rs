// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message hub: pattern-matched routing with blocking and fire-and-forget
//! delivery, direct module dispatch, pending callbacks, and a bounded queue
//! for messages nothing routes yet.
//!
//! Locking: route/module tables sit behind one parking_lot mutex that is
//! never held across an await; matching snapshots the needed handlers
//! first, then runs them.

use crate::bus::EventBus;
use crate::module::{Module, ModuleHandler, ModuleKind};
use crate::route::{RouteRule, RouteSummary};
use fg_core::error::FingerError;
use fg_core::event::{EventDraft, EventGroup};
use fg_core::message::{HubMessage, ModuleId};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// What happened to a sent message.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// At least one route matched. Carries the first blocking handler's
    /// result, or `None` when every match was fire-and-forget.
    Delivered(Option<Value>),
    /// No route matched; the message waits in the queue.
    Queued,
}

type PendingCallback = Box<dyn FnOnce(Value) + Send>;

struct HubState {
    modules: HashMap<ModuleId, Arc<Module>>,
    routes: Vec<RouteRule>,
    pending: HashMap<String, PendingCallback>,
    queue: VecDeque<HubMessage>,
    route_seq: u64,
}

struct HubInner {
    bus: EventBus,
    queue_capacity: usize,
    state: Mutex<HubState>,
}

/// The in-process message hub. Cheap to clone.
#[derive(Clone)]
pub struct MessageHub {
    inner: Arc<HubInner>,
}

impl MessageHub {
    pub fn new(bus: EventBus) -> Self {
        Self::with_queue_capacity(bus, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(bus: EventBus, queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                bus,
                queue_capacity,
                state: Mutex::new(HubState {
                    modules: HashMap::new(),
                    routes: Vec::new(),
                    pending: HashMap::new(),
                    queue: VecDeque::new(),
                    route_seq: 0,
                }),
            }),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    // ── routes ──────────────────────────────────────────────────────────

    /// Install a route, keeping the table sorted by descending priority
    /// (insertion order breaks ties). Returns the route id.
    pub fn add_route(&self, rule: RouteRule) -> String {
        let mut state = self.inner.state.lock();
        let mut rule = rule;
        state.route_seq += 1;
        rule.seq = state.route_seq;
        let id = rule.id.clone();
        state.routes.push(rule);
        state.routes.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
        id
    }

    /// Remove a route by id. Returns whether anything was removed.
    pub fn remove_route(&self, route_id: &str) -> bool {
        let mut state = self.inner.state.lock();
        let before = state.routes.len();
        state.routes.retain(|r| r.id != route_id);
        state.routes.len() != before
    }

    pub fn routes(&self) -> Vec<RouteSummary> {
        self.inner
            .state
            .lock()
            .routes
            .iter()
            .map(|r| RouteSummary {
                id: r.id.clone(),
                priority: r.priority,
                blocking: r.blocking,
                description: r.description.clone(),
            })
            .collect()
    }

    // ── modules ─────────────────────────────────────────────────────────

    /// Register a module. Duplicate ids are an error.
    pub fn register_module(&self, module: Module) -> Result<(), FingerError> {
        let mut state = self.inner.state.lock();
        if state.modules.contains_key(module.id.as_str()) {
            return Err(FingerError::InvalidArgument(format!(
                "module already registered: {}",
                module.id
            )));
        }
        state.modules.insert(module.id.clone(), Arc::new(module));
        Ok(())
    }

    /// Remove a module. Idempotent; returns the module when present.
    pub fn unregister_module(&self, id: &str) -> Option<Arc<Module>> {
        self.inner.state.lock().modules.remove(id)
    }

    pub fn get_module(&self, id: &str) -> Option<Arc<Module>> {
        self.inner.state.lock().modules.get(id).cloned()
    }

    pub fn modules_of_kind(&self, kind: ModuleKind) -> Vec<Arc<Module>> {
        self.inner
            .state
            .lock()
            .modules
            .values()
            .filter(|m| m.kind == kind)
            .cloned()
            .collect()
    }

    // ── pending callbacks ───────────────────────────────────────────────

    pub fn register_callback(&self, callback_id: impl Into<String>, cb: impl FnOnce(Value) + Send + 'static) {
        self.inner.state.lock().pending.insert(callback_id.into(), Box::new(cb));
    }

    /// Resolve a pending callback with a value. Returns whether one existed.
    pub fn complete_callback(&self, callback_id: &str, value: Value) -> bool {
        let cb = self.inner.state.lock().pending.remove(callback_id);
        match cb {
            Some(cb) => {
                cb(value);
                true
            }
            None => false,
        }
    }

    pub fn pending_callback_ids(&self) -> Vec<String> {
        self.inner.state.lock().pending.keys().cloned().collect()
    }

    // ── send paths ──────────────────────────────────────────────────────

    /// Route a message.
    ///
    /// No match ⇒ queue (bounded; oldest dropped with telemetry).
    /// Matches ⇒ every matching handler runs exactly once: non-blocking
    /// matches are spawned fire-and-forget, blocking matches run in
    /// priority order and the first one's result is the outcome. The first
    /// blocking handler's error propagates; later failures only log.
    pub async fn send(&self, msg: HubMessage) -> Result<SendOutcome, FingerError> {
        let matched: Vec<(Arc<dyn ModuleHandler>, bool)> = {
            let state = self.inner.state.lock();
            state
                .routes
                .iter()
                .filter(|r| r.pattern.matches(&msg))
                .map(|r| (Arc::clone(&r.handler), r.blocking))
                .collect()
        };

        if matched.is_empty() {
            self.enqueue(msg);
            return Ok(SendOutcome::Queued);
        }

        let mut first_result: Option<Value> = None;
        let mut first_seen = false;
        for (handler, blocking) in matched {
            if blocking {
                if !first_seen {
                    first_seen = true;
                    first_result = Some(handler.handle(msg.clone()).await?);
                } else if let Err(e) = handler.handle(msg.clone()).await {
                    self.report_handler_error(&msg, &e);
                }
            } else {
                let hub = self.clone();
                let msg = msg.clone();
                tokio::spawn(async move {
                    if let Err(e) = handler.handle(msg.clone()).await {
                        hub.report_handler_error(&msg, &e);
                    }
                });
            }
        }

        Ok(SendOutcome::Delivered(first_result))
    }

    /// [`send`](Self::send) variant invoking `callback` with the blocking
    /// result when one is produced.
    pub async fn send_with_callback(
        &self,
        msg: HubMessage,
        callback: impl FnOnce(&Value) + Send,
    ) -> Result<SendOutcome, FingerError> {
        let outcome = self.send(msg).await?;
        if let SendOutcome::Delivered(Some(value)) = &outcome {
            callback(value);
        }
        Ok(outcome)
    }

    /// Direct dispatch to a registered input or output module, bypassing
    /// routes.
    pub async fn send_to_module(&self, id: &str, msg: HubMessage) -> Result<Value, FingerError> {
        let module = self
            .get_module(id)
            .ok_or_else(|| FingerError::ModuleNotFound(id.to_string()))?;
        let handler = Arc::clone(&module.handler);
        handler.handle(msg).await
    }

    /// Direct dispatch to an output-kind module, awaiting its result.
    pub async fn route_to_output(&self, id: &str, msg: HubMessage) -> Result<Value, FingerError> {
        let module = self
            .get_module(id)
            .ok_or_else(|| FingerError::ModuleNotFound(id.to_string()))?;
        if module.kind != ModuleKind::Output {
            return Err(FingerError::InvalidArgument(format!(
                "module {id} is {}, not an output",
                module.kind
            )));
        }
        let handler = Arc::clone(&module.handler);
        handler.handle(msg).await
    }

    /// Re-run `send` on every queued message, draining those that now
    /// match. Returns the drained count.
    pub async fn process_queue(&self) -> usize {
        let queued: Vec<HubMessage> = {
            let mut state = self.inner.state.lock();
            state.queue.drain(..).collect()
        };

        let mut drained = 0;
        for msg in queued {
            match self.send(msg).await {
                Ok(SendOutcome::Delivered(_)) => drained += 1,
                Ok(SendOutcome::Queued) => {} // re-queued by send
                Err(e) => {
                    // Handler failure still counts as delivery.
                    debug!(error = %e, "queued message handler failed");
                    drained += 1;
                }
            }
        }
        drained
    }

    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn queued_messages(&self) -> Vec<HubMessage> {
        self.inner.state.lock().queue.iter().cloned().collect()
    }

    pub fn clear_queue(&self) -> usize {
        let mut state = self.inner.state.lock();
        let n = state.queue.len();
        state.queue.clear();
        n
    }

    fn enqueue(&self, msg: HubMessage) {
        let dropped = {
            let mut state = self.inner.state.lock();
            let dropped = if state.queue.len() >= self.inner.queue_capacity {
                state.queue.pop_front()
            } else {
                None
            };
            state.queue.push_back(msg);
            dropped
        };
        if let Some(old) = dropped {
            warn!(message_type = %old.message_type, "hub queue full, dropping oldest message");
            self.inner.bus.emit(
                EventDraft::new("hub_queue_overflow", EventGroup::System)
                    .with_payload(json!({"dropped_type": old.message_type})),
            );
        }
    }

    fn report_handler_error(&self, msg: &HubMessage, error: &FingerError) {
        warn!(message_type = %msg.message_type, error = %error, "non-first handler failed");
        self.inner.bus.emit(
            EventDraft::new("handler_error", EventGroup::System)
                .with_payload(json!({"message_type": msg.message_type, "error": error.to_string()})),
        );
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
