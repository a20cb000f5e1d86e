// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assignment record carried by dispatch lifecycle events.
//!
//! The phase only ever moves forward within an attempt; a `retry` closes the
//! attempt and the next dispatch starts a fresh one with `attempt + 1`.

use serde::{Deserialize, Serialize};

/// Phase of an assignment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPhase {
    #[default]
    Assigned,
    Queued,
    Started,
    Reviewing,
    Passed,
    Failed,
    Retry,
    Closed,
}

crate::simple_display! {
    AssignmentPhase {
        Assigned => "assigned",
        Queued => "queued",
        Started => "started",
        Reviewing => "reviewing",
        Passed => "passed",
        Failed => "failed",
        Retry => "retry",
        Closed => "closed",
    }
}

/// Review verdict a child result may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Pass,
    Retry,
    Reject,
}

impl ReviewDecision {
    pub fn parse(s: &str) -> Option<ReviewDecision> {
        match s {
            "pass" => Some(ReviewDecision::Pass),
            "retry" => Some(ReviewDecision::Retry),
            "reject" => Some(ReviewDecision::Reject),
            _ => None,
        }
    }

    /// Phase the assignment lands in for this verdict.
    pub fn phase(&self) -> AssignmentPhase {
        match self {
            ReviewDecision::Pass => AssignmentPhase::Passed,
            ReviewDecision::Retry => AssignmentPhase::Retry,
            ReviewDecision::Reject => AssignmentPhase::Failed,
        }
    }
}

/// Who asked whom to do what, and how far along it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub assigner_agent_id: String,
    pub assignee_agent_id: String,
    #[serde(default = "first_attempt")]
    pub attempt: u32,
    #[serde(default)]
    pub phase: AssignmentPhase,
}

fn first_attempt() -> u32 {
    1
}

impl Assignment {
    pub fn new(assigner: impl Into<String>, assignee: impl Into<String>) -> Self {
        Self {
            epic_id: None,
            task_id: None,
            assigner_agent_id: assigner.into(),
            assignee_agent_id: assignee.into(),
            attempt: 1,
            phase: AssignmentPhase::Assigned,
        }
    }

    /// Advance the phase. Backwards moves are ignored: the phase is
    /// monotonic within an attempt.
    pub fn advance(&mut self, phase: AssignmentPhase) -> bool {
        if phase >= self.phase {
            self.phase = phase;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "assignment_tests.rs"]
mod tests;
