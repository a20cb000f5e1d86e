// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route rules and pattern matching.
//!
//! Three pattern flavors: a literal matches the message `type` or `route`
//! field, a regex is tested against the stable sorted-key serialization of
//! the whole message, and a predicate runs arbitrary inspection. Rules are
//! kept sorted by descending priority with insertion order breaking ties.

use crate::module::ModuleHandler;
use fg_core::message::HubMessage;
use std::fmt;
use std::sync::Arc;

/// Pattern a route matches messages with.
#[derive(Clone)]
pub enum Pattern {
    /// Matches `message.type` or `message.route` exactly.
    Literal(String),
    /// Tested against the stable JSON serialization of the message.
    Regex(regex::Regex),
    /// Arbitrary predicate over the message.
    Predicate(Arc<dyn Fn(&HubMessage) -> bool + Send + Sync>),
}

impl Pattern {
    pub fn literal(s: impl Into<String>) -> Self {
        Pattern::Literal(s.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, fg_core::error::FingerError> {
        regex::Regex::new(pattern)
            .map(Pattern::Regex)
            .map_err(|e| fg_core::error::FingerError::InvalidArgument(e.to_string()))
    }

    pub fn predicate(f: impl Fn(&HubMessage) -> bool + Send + Sync + 'static) -> Self {
        Pattern::Predicate(Arc::new(f))
    }

    pub fn matches(&self, msg: &HubMessage) -> bool {
        match self {
            Pattern::Literal(lit) => {
                msg.message_type == *lit || msg.route.as_deref() == Some(lit.as_str())
            }
            Pattern::Regex(re) => re.is_match(&msg.stable_json()),
            Pattern::Predicate(f) => f(msg),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(s) => write!(f, "Literal({s:?})"),
            Pattern::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
            Pattern::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

/// One routing rule.
#[derive(Clone)]
pub struct RouteRule {
    pub id: String,
    pub pattern: Pattern,
    pub handler: Arc<dyn ModuleHandler>,
    pub blocking: bool,
    pub priority: i32,
    pub description: Option<String>,
    /// Insertion sequence, breaking priority ties (earlier wins).
    pub(crate) seq: u64,
}

impl RouteRule {
    pub fn new(pattern: Pattern, handler: Arc<dyn ModuleHandler>) -> Self {
        Self {
            id: format!("rt-{}", nanoid::nanoid!(10)),
            pattern,
            handler,
            blocking: false,
            priority: 0,
            description: None,
            seq: 0,
        }
    }

    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Route rule facts exposed by introspection endpoints.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RouteSummary {
    pub id: String,
    pub priority: i32,
    pub blocking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
#[path = "route_tests.rs"]
mod tests;
