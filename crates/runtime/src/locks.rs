// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input lock manager: per-session typing/turn leases.
//!
//! One client at a time holds a session's input lock. The lease expires
//! shortly after the last heartbeat; expiry publishes `input_lock_changed`
//! with a null holder. The typing indicator is a separate holder-only flag.

use fg_core::clock::EpochMillis;
use fg_core::event::{EventDraft, EventGroup};
use fg_hub::EventBus;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Default lease length: one second.
pub const DEFAULT_LEASE_MS: u64 = 1_000;

/// Lock state for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LockState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub typing: bool,
}

#[derive(Clone)]
pub struct InputLockManager {
    lease_ms: u64,
    now: Arc<dyn EpochMillis>,
    bus: EventBus,
    locks: Arc<Mutex<HashMap<String, LockState>>>,
}

impl InputLockManager {
    pub fn new(now: Arc<dyn EpochMillis>, bus: EventBus) -> Self {
        Self::with_lease(now, bus, DEFAULT_LEASE_MS)
    }

    pub fn with_lease(now: Arc<dyn EpochMillis>, bus: EventBus, lease_ms: u64) -> Self {
        Self { lease_ms, now, bus, locks: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Acquire or renew the session lock. Succeeds when unheld, expired,
    /// or already held by this client.
    pub fn acquire(&self, session_id: &str, client_id: &str) -> bool {
        let now = self.now.epoch_ms();
        let mut locks = self.locks.lock();
        let state = locks.entry(session_id.to_string()).or_default();

        let held_by_other = state
            .locked_by
            .as_deref()
            .is_some_and(|holder| holder != client_id && state.expires_at.is_some_and(|e| e > now));
        if held_by_other {
            return false;
        }

        let fresh = state.locked_by.as_deref() != Some(client_id);
        state.locked_by = Some(client_id.to_string());
        if fresh {
            state.locked_at = Some(now);
            state.typing = false;
        }
        state.last_heartbeat_at = Some(now);
        state.expires_at = Some(now + self.lease_ms);
        drop(locks);

        if fresh {
            self.publish(session_id, Some(client_id));
        }
        true
    }

    /// Refresh the lease. Holder only.
    pub fn heartbeat(&self, session_id: &str, client_id: &str) -> bool {
        let now = self.now.epoch_ms();
        let mut locks = self.locks.lock();
        match locks.get_mut(session_id) {
            Some(state) if state.locked_by.as_deref() == Some(client_id) => {
                state.last_heartbeat_at = Some(now);
                state.expires_at = Some(now + self.lease_ms);
                true
            }
            _ => false,
        }
    }

    /// Release the lock. Holder only.
    pub fn release(&self, session_id: &str, client_id: &str) -> bool {
        let released = {
            let mut locks = self.locks.lock();
            match locks.get_mut(session_id) {
                Some(state) if state.locked_by.as_deref() == Some(client_id) => {
                    *state = LockState::default();
                    true
                }
                _ => false,
            }
        };
        if released {
            self.publish(session_id, None);
        }
        released
    }

    /// Drop every session lock held by a client (disconnect path).
    pub fn force_release(&self, client_id: &str) -> Vec<String> {
        let mut released = Vec::new();
        {
            let mut locks = self.locks.lock();
            for (session_id, state) in locks.iter_mut() {
                if state.locked_by.as_deref() == Some(client_id) {
                    *state = LockState::default();
                    released.push(session_id.clone());
                }
            }
        }
        for session_id in &released {
            self.publish(session_id, None);
        }
        released
    }

    /// Set the typing indicator. Holder only.
    pub fn set_typing(&self, session_id: &str, client_id: &str, typing: bool) -> bool {
        let mut locks = self.locks.lock();
        match locks.get_mut(session_id) {
            Some(state) if state.locked_by.as_deref() == Some(client_id) => {
                state.typing = typing;
                true
            }
            _ => false,
        }
    }

    /// Expire overdue leases, publishing a change event per expiry.
    /// Returns the sessions released. Driven by the daemon's sweep tick.
    pub fn sweep_expired(&self) -> Vec<String> {
        let now = self.now.epoch_ms();
        let mut expired = Vec::new();
        {
            let mut locks = self.locks.lock();
            for (session_id, state) in locks.iter_mut() {
                if state.locked_by.is_some() && state.expires_at.is_some_and(|e| e <= now) {
                    *state = LockState::default();
                    expired.push(session_id.clone());
                }
            }
        }
        for session_id in &expired {
            self.publish(session_id, None);
        }
        expired
    }

    pub fn state(&self, session_id: &str) -> LockState {
        self.locks.lock().get(session_id).cloned().unwrap_or_default()
    }

    fn publish(&self, session_id: &str, locked_by: Option<&str>) {
        self.bus.emit(
            EventDraft::new("input_lock_changed", EventGroup::Session)
                .with_session(session_id)
                .with_payload(json!({"locked_by": locked_by})),
        );
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
