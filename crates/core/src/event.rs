// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events streamed to subscribers.
//!
//! Events are immutable once emitted. The bus assigns the id and both
//! timestamp forms; producers only describe what happened via [`EventDraft`].

use crate::message::{AgentId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier assigned to every emitted event.
    pub struct EventId("evt-");
}

/// Fixed set of event groups a subscriber can select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventGroup {
    Session,
    Task,
    Tool,
    Dialog,
    Progress,
    Phase,
    HumanInLoop,
    System,
}

impl EventGroup {
    /// All supported groups, in declaration order.
    pub const ALL: [EventGroup; 8] = [
        EventGroup::Session,
        EventGroup::Task,
        EventGroup::Tool,
        EventGroup::Dialog,
        EventGroup::Progress,
        EventGroup::Phase,
        EventGroup::HumanInLoop,
        EventGroup::System,
    ];

    /// Parse a group name as it appears on the wire.
    pub fn parse(s: &str) -> Option<EventGroup> {
        match s {
            "SESSION" => Some(EventGroup::Session),
            "TASK" => Some(EventGroup::Task),
            "TOOL" => Some(EventGroup::Tool),
            "DIALOG" => Some(EventGroup::Dialog),
            "PROGRESS" => Some(EventGroup::Progress),
            "PHASE" => Some(EventGroup::Phase),
            "HUMAN_IN_LOOP" => Some(EventGroup::HumanInLoop),
            "SYSTEM" => Some(EventGroup::System),
            _ => None,
        }
    }
}

crate::simple_display! {
    EventGroup {
        Session => "SESSION",
        Task => "TASK",
        Tool => "TOOL",
        Dialog => "DIALOG",
        Progress => "PROGRESS",
        Phase => "PHASE",
        HumanInLoop => "HUMAN_IN_LOOP",
        System => "SYSTEM",
    }
}

/// A stored event. Immutable after emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp_ms: u64,
    /// ISO-8601 companion of `timestamp_ms`.
    pub timestamp_iso: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub group: EventGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// What a producer hands to the bus. Id and timestamps are assigned at emit.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub event_type: String,
    pub group: Option<EventGroup>,
    pub session_id: Option<SessionId>,
    pub agent_id: Option<AgentId>,
    pub payload: Value,
}

impl EventDraft {
    pub fn new(event_type: impl Into<String>, group: EventGroup) -> Self {
        Self { event_type: event_type.into(), group: Some(group), ..Default::default() }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Finalize into a stored event at the given timestamp.
    pub fn into_event(self, timestamp_ms: u64) -> Event {
        Event {
            id: EventId::new(),
            timestamp_ms,
            timestamp_iso: iso_from_epoch_ms(timestamp_ms),
            event_type: self.event_type,
            group: self.group.unwrap_or(EventGroup::System),
            session_id: self.session_id,
            agent_id: self.agent_id,
            payload: self.payload,
        }
    }
}

/// Render epoch milliseconds as an ISO-8601 UTC timestamp.
pub fn iso_from_epoch_ms(ms: u64) -> String {
    match chrono::DateTime::from_timestamp_millis(ms as i64) {
        Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
