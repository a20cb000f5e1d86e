// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative finite-state machine engine.
//!
//! A [`Machine`] holds a current state, a JSON context, a transition table,
//! and a history of applied transitions. Triggers with no matching rule are
//! no-ops: the state is untouched and no phase transition is reported.
//!
//! Rules may use a wildcard `from` (apply in any state) and a wildcard `to`
//! (the action must pick the next state via [`ActionScope::set_next_state`],
//! otherwise the transition is rejected).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Mutable JSON context a machine carries between transitions.
pub type FsmContext = serde_json::Map<String, Value>;

/// Predicate over the context deciding whether a rule applies.
pub type Guard = Arc<dyn Fn(&FsmContext) -> bool + Send + Sync>;

/// Side effect run when a rule fires.
pub type Action = Arc<dyn Fn(&mut ActionScope<'_>) + Send + Sync>;

/// What an action can see and do while a transition is applied.
pub struct ActionScope<'a> {
    pub context: &'a mut FsmContext,
    pub history: &'a [HistoryEntry],
    next_state: Option<String>,
}

impl ActionScope<'_> {
    /// Choose the target state of a wildcard-`to` rule.
    pub fn set_next_state(&mut self, state: impl Into<String>) {
        self.next_state = Some(state.into());
    }
}

/// One declared transition rule.
#[derive(Clone)]
pub struct Transition {
    /// Source state; `None` matches any state.
    pub from: Option<&'static str>,
    /// Target state; `None` means the action decides.
    pub to: Option<&'static str>,
    pub trigger: &'static str,
    pub guard: Option<Guard>,
    pub action: Option<Action>,
}

impl Transition {
    pub fn new(from: &'static str, trigger: &'static str, to: &'static str) -> Self {
        Self { from: Some(from), to: Some(to), trigger, guard: None, action: None }
    }

    /// Rule applying from any state.
    pub fn from_any(trigger: &'static str, to: &'static str) -> Self {
        Self { from: None, to: Some(to), trigger, guard: None, action: None }
    }

    /// Rule whose action picks the target state.
    pub fn dynamic(from: &'static str, trigger: &'static str) -> Self {
        Self { from: Some(from), to: None, trigger, guard: None, action: None }
    }

    pub fn with_guard(
        mut self,
        guard: impl Fn(&FsmContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn with_action(
        mut self,
        action: impl Fn(&mut ActionScope<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.action = Some(Arc::new(action));
        self
    }
}

/// Record of one applied transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub from: String,
    pub to: String,
    pub trigger: String,
    pub at_ms: u64,
}

/// Successful transition summary, emitted as a `phase_transition` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: String,
    pub to: String,
    pub trigger: String,
    /// 1-based count of transitions applied so far, this one included.
    pub round: u32,
}

/// A running state machine instance.
pub struct Machine {
    name: String,
    current_state: String,
    context: FsmContext,
    history: Vec<HistoryEntry>,
    transitions: Vec<Transition>,
}

impl Machine {
    pub fn new(
        name: impl Into<String>,
        initial_state: &str,
        transitions: Vec<Transition>,
    ) -> Self {
        Self {
            name: name.into(),
            current_state: initial_state.to_string(),
            context: FsmContext::new(),
            history: Vec::new(),
            transitions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &str {
        &self.current_state
    }

    pub fn context(&self) -> &FsmContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut FsmContext {
        &mut self.context
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Restore a persisted machine to a known state without a transition.
    pub fn restore(&mut self, state: &str, context: FsmContext, history: Vec<HistoryEntry>) {
        self.current_state = state.to_string();
        self.context = context;
        self.history = history;
    }

    /// Merge a context update, then apply the first matching rule.
    ///
    /// Returns the applied transition, or `None` when no rule matched
    /// (state unchanged, merge kept).
    pub fn trigger(
        &mut self,
        trigger: &str,
        ctx_update: Option<Value>,
        now_ms: u64,
    ) -> Option<PhaseTransition> {
        if let Some(Value::Object(update)) = ctx_update {
            for (k, v) in update {
                self.context.insert(k, v);
            }
        }

        let idx = self.transitions.iter().position(|t| {
            t.trigger == trigger
                && t.from.map_or(true, |f| f == self.current_state)
                && t.guard.as_ref().map_or(true, |g| g(&self.context))
        })?;

        let snapshot = self.context.clone();
        let Machine { transitions, context, history, current_state, .. } = self;
        let rule = &transitions[idx];

        let mut scope = ActionScope { context: &mut *context, history: &*history, next_state: None };
        if let Some(action) = &rule.action {
            action(&mut scope);
        }

        let to = match rule.to {
            Some(to) => to.to_string(),
            None => match scope.next_state {
                Some(next) => next,
                None => {
                    // Wildcard target with no state chosen: reject and roll
                    // back whatever the action touched.
                    *context = snapshot;
                    return None;
                }
            },
        };

        let applied = HistoryEntry {
            from: current_state.clone(),
            to: to.clone(),
            trigger: trigger.to_string(),
            at_ms: now_ms,
        };
        history.push(applied);
        *current_state = to;

        let last = &self.history[self.history.len() - 1];
        Some(PhaseTransition {
            from: last.from.clone(),
            to: last.to.clone(),
            trigger: last.trigger.clone(),
            round: self.history.len() as u32,
        })
    }
}

/// Read a string field out of a machine context.
pub fn ctx_str<'a>(ctx: &'a FsmContext, key: &str) -> Option<&'a str> {
    ctx.get(key).and_then(Value::as_str)
}

/// Read a nested string out of a machine context (one level deep).
pub fn ctx_nested_str<'a>(ctx: &'a FsmContext, key: &str, inner: &str) -> Option<&'a str> {
    ctx.get(key).and_then(|v| v.get(inner)).and_then(Value::as_str)
}

#[cfg(test)]
#[path = "fsm_tests.rs"]
mod tests;
