// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hub message and the free-form identifier types that ride on it.
//!
//! `AgentId` and `ModuleId` are caller-chosen names (from agent configs and
//! module registrations), not generated ids, so they wrap a plain `String`.
//! `SessionId` likewise: sessions may be created with client-supplied ids.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::fmt;

/// Logical agent name, e.g. `executor-a`. Chosen by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create a new AgentId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value of this AgentId.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Registered module name. Unique within the hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// User-visible conversation thread id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A message travelling through the hub.
///
/// Routing patterns match on `type` and `route`; everything else is
/// payload for the receiving handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HubMessage {
    #[serde(rename = "type")]
    pub message_type: String,

    /// Explicit route name, matched by literal patterns alongside `type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    /// Target module id for direct dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Module or agent that produced the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,

    /// Correlates a deferred reply with a pending hub callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl HubMessage {
    /// Create a message with just a type.
    pub fn of_type(message_type: impl Into<String>) -> Self {
        Self { message_type: message_type.into(), ..Default::default() }
    }

    /// Create a message with a type and payload.
    pub fn with_payload(message_type: impl Into<String>, payload: Value) -> Self {
        Self { message_type: message_type.into(), payload, ..Default::default() }
    }

    /// Stable serialization used by regex route patterns.
    ///
    /// Keys are emitted in sorted order (serde_json maps are BTree-backed)
    /// and absent optional fields are omitted entirely, so the same message
    /// always yields the same string.
    pub fn stable_json(&self) -> String {
        match serde_json::to_value(self) {
            Ok(v) => v.to_string(),
            // Serialization of a plain data struct cannot fail in practice.
            Err(_) => String::new(),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
