// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent execution state machine.

use crate::fsm::{Machine, Transition};
use serde::{Deserialize, Serialize};

/// States an agent instance moves through while holding a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    #[default]
    Idle,
    Reserved,
    Running,
    Error,
    Released,
}

crate::simple_display! {
    AgentPhase {
        Idle => "idle",
        Reserved => "reserved",
        Running => "running",
        Error => "error",
        Released => "released",
    }
}

/// Build the agent lifecycle machine.
///
/// `agent_step_completed` self-loops in `running`: step progress is
/// observable in history without changing state.
pub fn agent_machine(agent_id: &str) -> Machine {
    Machine::new(
        format!("agent:{agent_id}"),
        "idle",
        vec![
            Transition::new("idle", "dispatch_ack", "reserved"),
            Transition::new("reserved", "task_execution_started", "running"),
            Transition::new("running", "agent_step_completed", "running"),
            Transition::new("running", "task_execution_result_success", "released"),
            Transition::new("running", "task_execution_result_failure", "error"),
            Transition::new("error", "recover_or_reset", "idle"),
            Transition::new("released", "recover_or_reset", "idle"),
        ],
    )
}

#[cfg(test)]
#[path = "agent_fsm_tests.rs"]
mod tests;
