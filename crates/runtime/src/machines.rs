// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FSM manager: a keyed set of machines wired to the event bus.
//!
//! Every applied transition is published as a `phase_transition` PHASE
//! event carrying `{from, to, trigger, round}`. Rejected triggers emit
//! nothing (and leave the machine untouched), matching the no-op contract
//! of the machine engine.

use fg_core::clock::EpochMillis;
use fg_core::event::{EventDraft, EventGroup};
use fg_core::fsm::{FsmContext, Machine, PhaseTransition};
use fg_hub::EventBus;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type MachineFactory = Arc<dyn Fn(&str) -> Machine + Send + Sync>;

/// Holds one machine per key (workflow id, orchestrator name, agent id),
/// building them on demand from a factory.
#[derive(Clone)]
pub struct FsmManager {
    name: &'static str,
    factory: MachineFactory,
    now: Arc<dyn EpochMillis>,
    bus: EventBus,
    machines: Arc<Mutex<HashMap<String, Machine>>>,
}

impl FsmManager {
    pub fn new(
        name: &'static str,
        now: Arc<dyn EpochMillis>,
        bus: EventBus,
        factory: impl Fn(&str) -> Machine + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            factory: Arc::new(factory),
            now,
            bus,
            machines: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fire a trigger on the keyed machine (created on first use).
    ///
    /// Returns the applied transition, if any, after publishing it.
    pub fn trigger(
        &self,
        key: &str,
        trigger: &str,
        ctx_update: Option<Value>,
    ) -> Option<PhaseTransition> {
        let now_ms = self.now.epoch_ms();
        let applied = {
            let mut machines = self.machines.lock();
            let machine =
                machines.entry(key.to_string()).or_insert_with(|| (self.factory)(key));
            machine.trigger(trigger, ctx_update, now_ms)
        };

        match &applied {
            Some(transition) => {
                self.bus.emit(
                    EventDraft::new("phase_transition", EventGroup::Phase).with_payload(json!({
                        "machine": self.name,
                        "key": key,
                        "from": transition.from,
                        "to": transition.to,
                        "trigger": transition.trigger,
                        "round": transition.round,
                    })),
                );
            }
            None => {
                debug!(machine = self.name, key, trigger, "transition rejected");
            }
        }
        applied
    }

    pub fn state(&self, key: &str) -> Option<String> {
        self.machines.lock().get(key).map(|m| m.state().to_string())
    }

    /// Run a closure against the keyed machine's context.
    pub fn with_context<T>(&self, key: &str, f: impl FnOnce(&FsmContext) -> T) -> Option<T> {
        self.machines.lock().get(key).map(|m| f(m.context()))
    }

    /// Restore a machine to a persisted state (resume path).
    pub fn restore(&self, key: &str, state: &str, context: FsmContext) {
        let mut machines = self.machines.lock();
        let machine = machines.entry(key.to_string()).or_insert_with(|| (self.factory)(key));
        let history = machine.history().to_vec();
        machine.restore(state, context, history);
    }

    pub fn remove(&self, key: &str) -> bool {
        self.machines.lock().remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.machines.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
#[path = "machines_tests.rs"]
mod tests;
