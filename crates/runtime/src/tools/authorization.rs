// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short-lived authorization grants for sensitive tools.
//!
//! A tool marked as requiring authorization can only execute with a live
//! grant scoped to one `(agent, tool)` pair. Grants are one-shot by
//! default; consuming the last use deletes them, and any denial evicts
//! grants that are already expired or exhausted.

use fg_core::clock::EpochMillis;
use fg_core::error::FingerError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

fg_core::define_id! {
    /// Opaque grant token handed to the caller.
    pub struct GrantToken("grt-");
}

/// Default grant lifetime: five minutes.
pub const DEFAULT_GRANT_TTL_MS: u64 = 5 * 60 * 1000;

/// One issued grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub token: GrantToken,
    pub agent_id: String,
    pub tool_name: String,
    pub issued_by: String,
    pub issued_at_ms: u64,
    pub expires_at_ms: u64,
    pub max_uses: u32,
    pub remaining_uses: u32,
}

/// Issue parameters. `ttl_ms = 0` is invalid and falls back to the
/// default; `max_uses` defaults to one.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantSpec {
    pub ttl_ms: u64,
    pub max_uses: u32,
}

#[derive(Default)]
struct AuthzState {
    required: BTreeSet<String>,
    grants: HashMap<GrantToken, Grant>,
}

/// Grant issuance and verification.
#[derive(Clone)]
pub struct AuthorizationManager {
    now: Arc<dyn EpochMillis>,
    state: Arc<Mutex<AuthzState>>,
}

impl AuthorizationManager {
    pub fn new(now: Arc<dyn EpochMillis>) -> Self {
        Self { now, state: Arc::new(Mutex::new(AuthzState::default())) }
    }

    /// Mark (or unmark) a tool as requiring a grant.
    pub fn set_tool_required(&self, tool_name: &str, required: bool) {
        let mut state = self.state.lock();
        if required {
            state.required.insert(tool_name.to_string());
        } else {
            state.required.remove(tool_name);
        }
    }

    pub fn is_required(&self, tool_name: &str) -> bool {
        self.state.lock().required.contains(tool_name)
    }

    /// Issue a grant for one `(agent, tool)` pair.
    pub fn issue(
        &self,
        agent_id: &str,
        tool_name: &str,
        issued_by: &str,
        spec: GrantSpec,
    ) -> Grant {
        let now_ms = self.now.epoch_ms();
        let ttl_ms = if spec.ttl_ms == 0 { DEFAULT_GRANT_TTL_MS } else { spec.ttl_ms };
        let max_uses = if spec.max_uses == 0 { 1 } else { spec.max_uses };
        let grant = Grant {
            token: GrantToken::new(),
            agent_id: agent_id.to_string(),
            tool_name: tool_name.to_string(),
            issued_by: issued_by.to_string(),
            issued_at_ms: now_ms,
            expires_at_ms: now_ms + ttl_ms,
            max_uses,
            remaining_uses: max_uses,
        };
        self.state.lock().grants.insert(grant.token, grant.clone());
        grant
    }

    /// Revoke a grant by token. Returns whether one existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.state.lock().grants.remove(token).is_some()
    }

    /// Check a token against the caller's scope and consume one use.
    ///
    /// Any denial evicts grants that are expired or exhausted so the table
    /// never accumulates dead entries.
    pub fn verify_and_consume(
        &self,
        token: &str,
        agent_id: &str,
        tool_name: &str,
    ) -> Result<(), FingerError> {
        let now_ms = self.now.epoch_ms();
        let mut state = self.state.lock();

        let checked = match state.grants.get_mut(token) {
            None => Err(FingerError::AuthorizationExpired("unknown or consumed token".into())),
            Some(grant) if grant.agent_id != agent_id || grant.tool_name != tool_name => {
                Err(FingerError::AuthorizationScopeMismatch(format!(
                    "grant is scoped to ({}, {})",
                    grant.agent_id, grant.tool_name
                )))
            }
            Some(grant) if now_ms >= grant.expires_at_ms => {
                Err(FingerError::AuthorizationExpired("grant expired".into()))
            }
            Some(grant) if grant.remaining_uses == 0 => {
                Err(FingerError::AuthorizationExpired("grant exhausted".into()))
            }
            Some(grant) => {
                grant.remaining_uses -= 1;
                Ok(grant.remaining_uses == 0)
            }
        };

        match checked {
            Ok(spent) => {
                if spent {
                    debug!(token, "grant fully consumed");
                    state.grants.remove(token);
                }
                Ok(())
            }
            Err(e) => {
                // Dead grants never linger past a denial.
                state
                    .grants
                    .retain(|_, g| g.remaining_uses > 0 && g.expires_at_ms > now_ms);
                Err(e)
            }
        }
    }

    /// Live grants, for the introspection endpoint.
    pub fn grants(&self) -> Vec<Grant> {
        let mut grants: Vec<Grant> = self.state.lock().grants.values().cloned().collect();
        grants.sort_by_key(|g| g.issued_at_ms);
        grants
    }
}

#[cfg(test)]
#[path = "authorization_tests.rs"]
mod tests;
