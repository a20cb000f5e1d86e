// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire envelopes exchanged with gateway children.
//!
//! One JSON object per line, UTF-8. Outbound carries `request`; inbound
//! may be `ack`, `result`, `input` (child-initiated message into the hub),
//! or `event` (telemetry).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sync waits for a result; async resolves on ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    #[default]
    Sync,
    Async,
}

fg_core::simple_display! {
    DeliveryMode {
        Sync => "sync",
        Async => "async",
    }
}

/// All envelope shapes, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Daemon → child: deliver a message.
    Request {
        request_id: String,
        delivery_mode: DeliveryMode,
        message: Value,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        metadata: Value,
    },

    /// Child → daemon: request received (or refused).
    Ack {
        request_id: String,
        accepted: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Child → daemon: terminal outcome of a sync request. Also
    /// daemon → child: reply to a blocking inbound `input`.
    Result {
        request_id: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Child → daemon: message the child wants routed into the hub.
    Input {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<String>,
        #[serde(default)]
        blocking: bool,
        message: Value,
    },

    /// Child → daemon: named telemetry event.
    Event {
        name: String,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        payload: Value,
    },
}

impl Envelope {
    /// Serialize as one newline-terminated line.
    pub fn to_line(&self) -> Result<String, fg_core::error::FingerError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parse one line.
    pub fn from_line(line: &str) -> Result<Self, fg_core::error::FingerError> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
