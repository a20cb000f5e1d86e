// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error handler: classification, exponential backoff, module pausing.
//!
//! Recoverable categories retry with `min(base * multiplier^n, max)` delay
//! until `max_retries`, then the module is paused and stays paused until an
//! explicit resume (which resets the counter). Unrecoverable categories
//! pause immediately.

use fg_core::error::ErrorCategory;
use fg_core::event::{EventDraft, EventGroup};
use fg_hub::EventBus;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Backoff configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { base_delay_ms: 1_000, multiplier: 2.0, max_delay_ms: 60_000, max_retries: 10 }
    }
}

/// Retry bookkeeping for one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModuleErrorState {
    pub retry_count: u32,
    pub is_paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_reason: Option<String>,
}

/// What the handler decided to do with an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDisposition {
    /// A retry is scheduled after `delay_ms` for attempt number `attempt`.
    Retry { attempt: u32, delay_ms: u64 },
    /// The module was paused with the given reason.
    Paused { reason: String },
    /// The module was already paused; nothing scheduled.
    AlreadyPaused,
}

type RetryHook = Arc<dyn Fn(&str, u32) + Send + Sync>;

#[derive(Clone)]
pub struct ErrorHandler {
    config: RetryConfig,
    bus: EventBus,
    states: Arc<Mutex<HashMap<String, ModuleErrorState>>>,
    on_retry: Arc<Mutex<Option<RetryHook>>>,
}

impl ErrorHandler {
    pub fn new(bus: EventBus) -> Self {
        Self::with_config(bus, RetryConfig::default())
    }

    pub fn with_config(bus: EventBus, config: RetryConfig) -> Self {
        Self {
            config,
            bus,
            states: Arc::new(Mutex::new(HashMap::new())),
            on_retry: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> RetryConfig {
        self.config
    }

    /// Hook invoked before each retry attempt: `(module_id, attempt)`.
    pub fn set_on_retry(&self, hook: impl Fn(&str, u32) + Send + Sync + 'static) {
        *self.on_retry.lock() = Some(Arc::new(hook));
    }

    /// Backoff delay for the given (0-based) retry count.
    pub fn delay_for(&self, retry_count: u32) -> u64 {
        let exp = self.config.multiplier.powi(retry_count as i32);
        let delay = (self.config.base_delay_ms as f64 * exp) as u64;
        delay.min(self.config.max_delay_ms)
    }

    /// Classify an error and decide the next step. Does not sleep; use
    /// [`handle_error`](Self::handle_error) to also schedule the retry.
    pub fn classify(&self, module_id: &str, category: ErrorCategory) -> ErrorDisposition {
        let mut states = self.states.lock();
        let state = states.entry(module_id.to_string()).or_default();

        if state.is_paused {
            return ErrorDisposition::AlreadyPaused;
        }

        if !category.is_recoverable() {
            state.is_paused = true;
            state.pause_reason = Some(category.to_string());
            return ErrorDisposition::Paused { reason: category.to_string() };
        }

        if state.retry_count >= self.config.max_retries {
            state.is_paused = true;
            state.pause_reason = Some("max_retries_exceeded".into());
            return ErrorDisposition::Paused { reason: "max_retries_exceeded".into() };
        }

        let delay_ms = self.delay_for(state.retry_count);
        state.retry_count += 1;
        ErrorDisposition::Retry { attempt: state.retry_count, delay_ms }
    }

    /// Handle an error: classify, emit telemetry, and (for retries) spawn
    /// the delayed retry invoking the hook and then `retry`.
    pub fn handle_error<F, Fut>(
        &self,
        module_id: &str,
        category: ErrorCategory,
        message: &str,
        retry: F,
    ) -> ErrorDisposition
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let disposition = self.classify(module_id, category);
        match &disposition {
            ErrorDisposition::Retry { attempt, delay_ms } => {
                info!(module = module_id, attempt, delay_ms, error = message, "scheduling retry");
                self.bus.emit(
                    EventDraft::new("module_retry_scheduled", EventGroup::System).with_payload(
                        json!({"module": module_id, "attempt": attempt, "delay_ms": delay_ms}),
                    ),
                );
                let hook = self.on_retry.lock().clone();
                let module = module_id.to_string();
                let attempt = *attempt;
                let delay = Duration::from_millis(*delay_ms);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(hook) = hook {
                        hook(&module, attempt);
                    }
                    retry().await;
                });
            }
            ErrorDisposition::Paused { reason } => {
                warn!(module = module_id, reason = %reason, error = message, "module paused");
                self.bus.emit(
                    EventDraft::new("module_paused", EventGroup::System)
                        .with_payload(json!({"module": module_id, "reason": reason})),
                );
            }
            ErrorDisposition::AlreadyPaused => {}
        }
        disposition
    }

    /// Record a success, clearing the retry counter.
    pub fn record_success(&self, module_id: &str) {
        if let Some(state) = self.states.lock().get_mut(module_id) {
            if !state.is_paused {
                state.retry_count = 0;
            }
        }
    }

    /// Explicitly resume a paused module, resetting its retry count.
    pub fn resume(&self, module_id: &str) {
        let mut states = self.states.lock();
        let state = states.entry(module_id.to_string()).or_default();
        state.is_paused = false;
        state.pause_reason = None;
        state.retry_count = 0;
        drop(states);
        self.bus.emit(
            EventDraft::new("module_resumed", EventGroup::System)
                .with_payload(json!({"module": module_id})),
        );
    }

    pub fn state(&self, module_id: &str) -> ModuleErrorState {
        self.states.lock().get(module_id).cloned().unwrap_or_default()
    }

    pub fn is_paused(&self, module_id: &str) -> bool {
        self.state(module_id).is_paused
    }
}

#[cfg(test)]
#[path = "error_handler_tests.rs"]
mod tests;
