// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session records: user-visible conversation threads with a message log.
//!
//! Dispatches persist their user-visible task text here (role `user`,
//! type `dispatch`), best-effort: empty content is skipped.

use fg_core::clock::EpochMillis;
use fg_core::message::SessionId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Paused,
    Closed,
}

fg_core::simple_display! {
    SessionStatus {
        Active => "active",
        Paused => "paused",
        Closed => "closed",
    }
}

/// One logged message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub content: String,
    pub timestamp_ms: u64,
}

/// One conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub status: SessionStatus,
    pub created_at: u64,
    pub messages: Vec<SessionMessage>,
}

/// In-memory session table with a current-session pointer.
#[derive(Clone)]
pub struct SessionManager {
    now: Arc<dyn EpochMillis>,
    state: Arc<Mutex<SessionState>>,
}

#[derive(Default)]
struct SessionState {
    sessions: HashMap<SessionId, SessionRecord>,
    current: Option<SessionId>,
}

impl SessionManager {
    pub fn new(now: Arc<dyn EpochMillis>) -> Self {
        Self { now, state: Arc::new(Mutex::new(SessionState::default())) }
    }

    /// Create a session (id chosen by the caller or generated). Creating
    /// the first session makes it current.
    pub fn create(&self, id: Option<SessionId>) -> SessionRecord {
        let id = id.unwrap_or_else(|| SessionId::new(format!("ses-{}", nanoid::nanoid!(12))));
        let record = SessionRecord {
            id: id.clone(),
            status: SessionStatus::Active,
            created_at: self.now.epoch_ms(),
            messages: Vec::new(),
        };
        let mut state = self.state.lock();
        let record = state.sessions.entry(id.clone()).or_insert(record).clone();
        if state.current.is_none() {
            state.current = Some(id);
        }
        record
    }

    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        self.state.lock().sessions.get(id).cloned()
    }

    pub fn list(&self) -> Vec<SessionRecord> {
        let mut sessions: Vec<SessionRecord> =
            self.state.lock().sessions.values().cloned().collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    pub fn current(&self) -> Option<SessionRecord> {
        let state = self.state.lock();
        state.current.as_ref().and_then(|id| state.sessions.get(id.as_str()).cloned())
    }

    /// Point the current-session marker at an existing session.
    pub fn set_current(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        if state.sessions.contains_key(id) {
            state.current = Some(SessionId::new(id));
            true
        } else {
            false
        }
    }

    pub fn delete(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        let removed = state.sessions.remove(id).is_some();
        if state.current.as_ref().map(|c| c.as_str()) == Some(id) {
            state.current = None;
        }
        removed
    }

    pub fn set_status(&self, id: &str, status: SessionStatus) -> bool {
        let mut state = self.state.lock();
        match state.sessions.get_mut(id) {
            Some(session) => {
                session.status = status;
                true
            }
            None => false,
        }
    }

    /// Append a message. Empty content is skipped (best-effort logging).
    pub fn append_message(&self, id: &str, role: &str, message_type: &str, content: &str) -> bool {
        if content.is_empty() {
            return false;
        }
        let now = self.now.epoch_ms();
        let mut state = self.state.lock();
        match state.sessions.get_mut(id) {
            Some(session) => {
                session.messages.push(SessionMessage {
                    role: role.to_string(),
                    message_type: message_type.to_string(),
                    content: content.to_string(),
                    timestamp_ms: now,
                });
                true
            }
            None => false,
        }
    }

    pub fn messages(&self, id: &str) -> Vec<SessionMessage> {
        self.get(id).map(|s| s.messages).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
