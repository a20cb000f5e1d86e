// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: build the component graph, recover persisted state,
//! start gateways, bind the control socket.

use super::{acquire_pid_lock, system_clock, Config, Daemon, LifecycleError};
use crate::env;
use fg_core::error::ErrorCategory;
use fg_core::orchestrator::orchestrator_machine;
use fg_core::workflow_fsm::workflow_machine;
use fg_gateway::GatewaySupervisor;
use fg_hub::{EventBus, MessageHub, ModuleRegistry};
use fg_runtime::{
    AgentRuntimeBlock, AgentToolAccess, AuthorizationManager, ErrorHandler, FsmManager,
    InputLockManager, NoopProviderRuntime, SessionManager, ToolExecutor, ToolRegistry,
    WorkflowManager,
};
use fg_core::clock::EpochMillis;
use fg_core::error::FingerError;
use fg_runtime::{tool_fn, ToolDef};
use fg_storage::{
    write_focus_slot, CheckpointStore, FocusInsert, Ledger, LedgerCaller, LedgerQuery,
    LedgerScope, WorkflowStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// What startup hands back to `main`.
pub struct StartupOutcome {
    pub daemon: Arc<Daemon>,
    pub socket: UnixListener,
}

/// Build and start the daemon.
pub async fn startup(config: &Config) -> Result<StartupOutcome, LifecycleError> {
    config.home.ensure_layout()?;
    let pid_lock = acquire_pid_lock(&config.lock_path)?;

    let clock = system_clock();
    let bus = EventBus::new();
    let hub = MessageHub::new(bus.clone());
    let registry = ModuleRegistry::new(hub.clone());

    let tool_registry = ToolRegistry::new(bus.clone());
    let access = AgentToolAccess::new();
    let authorization = AuthorizationManager::new(Arc::clone(&clock));
    let tools = ToolExecutor::new(tool_registry, access.clone(), authorization, bus.clone());

    let errors = ErrorHandler::new(bus.clone());
    let sessions = SessionManager::new(Arc::clone(&clock));
    let locks = InputLockManager::new(Arc::clone(&clock), bus.clone());

    let store = WorkflowStore::new(config.home.workflows_dir());
    let checkpoints = CheckpointStore::new(config.home.checkpoints_dir());
    let workflows = WorkflowManager::new(Arc::clone(&clock), bus.clone(), store.clone(), checkpoints);

    let workflow_fsms =
        FsmManager::new("workflow", Arc::clone(&clock), bus.clone(), workflow_machine);
    let orchestrators =
        FsmManager::new("orchestrator", Arc::clone(&clock), bus.clone(), orchestrator_machine);

    let configs_dir = env::agent_config_dir().unwrap_or_else(|| config.home.agents_dir());
    let agent_block = AgentRuntimeBlock::new(
        hub.clone(),
        sessions.clone(),
        access,
        Arc::new(NoopProviderRuntime),
    )
    .with_configs_dir(configs_dir);

    // Gateway children report non-zero exits as module crashes.
    let gateways = {
        let errors = errors.clone();
        Arc::new(GatewaySupervisor::new(
            registry.clone(),
            Arc::new(move |gateway_id: &str, code: Option<i32>| {
                if code.unwrap_or(0) != 0 {
                    errors.classify(gateway_id, ErrorCategory::ModuleCrash);
                }
            }),
        ))
    };
    let started = gateways.start_all(&config.home.gateways_dir()).await;
    if !started.is_empty() {
        info!(gateways = ?started, "gateways started");
    }

    // Recover non-terminal workflows from disk.
    let resumable = store.scan_resumable();
    if !resumable.is_empty() {
        info!(count = resumable.len(), "recovered resumable workflows");
        for workflow in resumable {
            workflows.adopt(workflow);
        }
    }

    // Bind the control socket, replacing a stale one from a dead daemon.
    if config.socket_path.exists() {
        warn!(path = %config.socket_path.display(), "removing stale control socket");
        std::fs::remove_file(&config.socket_path)?;
    }
    let socket = UnixListener::bind(&config.socket_path)?;
    info!(path = %config.socket_path.display(), "control socket bound");

    let ledger = Ledger::new(config.home.sessions_dir());
    register_ledger_tools(&tools, &ledger, &clock);

    let daemon = Arc::new(Daemon {
        home: config.home.clone(),
        bus,
        hub,
        registry,
        tools,
        errors,
        sessions,
        locks,
        workflows,
        workflow_fsms,
        orchestrators,
        agent_block,
        gateways,
        ledger,
        clock,
        _pid_lock: pid_lock,
    });

    Ok(StartupOutcome { daemon, socket })
}

/// Install the context-ledger tools and allow the capability agent to
/// call them.
fn register_ledger_tools(tools: &ToolExecutor, ledger: &Ledger, clock: &Arc<dyn EpochMillis>) {
    let registry = tools.registry();

    let insert_ledger = ledger.clone();
    let insert_clock = Arc::clone(clock);
    registry.register(
        ToolDef::new(
            "context_ledger_insert",
            tool_fn(move |input| {
                let scope = scope_from(&input)?;
                let insert = FocusInsert {
                    text: input.get("text").and_then(Value::as_str).map(str::to_string),
                    since_ms: input.get("since_ms").and_then(Value::as_u64),
                    until_ms: input.get("until_ms").and_then(Value::as_u64),
                    append: input.get("append").and_then(Value::as_bool).unwrap_or(false),
                    focus_max_chars: input
                        .get("focus_max_chars")
                        .and_then(Value::as_u64)
                        .unwrap_or(0) as usize,
                };
                let written =
                    write_focus_slot(&insert_ledger, &scope, &insert, insert_clock.epoch_ms())?;
                Ok(json!({"written_chars": written}))
            }),
        )
        .describe("write the agent's focus slot, journalling a focus_insert"),
    );

    let query_ledger = ledger.clone();
    registry.register(
        ToolDef::new(
            "context_ledger_query",
            tool_fn(move |input| {
                let scope = scope_from(&input)?;
                let caller = LedgerCaller {
                    agent_id: input
                        .get("caller_agent_id")
                        .and_then(Value::as_str)
                        .unwrap_or(&scope.agent_id)
                        .to_string(),
                    can_read_all: input
                        .get("can_read_all")
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                    readable_agents: string_list(&input, "readable_agents"),
                };
                let query = LedgerQuery {
                    contains: input.get("contains").and_then(Value::as_str).map(str::to_string),
                    fuzzy: input.get("fuzzy").and_then(Value::as_bool).unwrap_or(false),
                    event_types: string_list(&input, "event_types"),
                    since_ms: input.get("since_ms").and_then(Value::as_u64),
                    until_ms: input.get("until_ms").and_then(Value::as_u64),
                    limit: input.get("limit").and_then(Value::as_u64).unwrap_or(0) as usize,
                    detail: input.get("detail").and_then(Value::as_bool).unwrap_or(false),
                };
                let outcome = query_ledger.query(&scope, &caller, &query)?;
                Ok(json!({
                    "strategy": outcome.strategy,
                    "entries": outcome.entries,
                    "compact_hits": outcome.compact_hits,
                    "next_query_hint": outcome.next_query_hint,
                }))
            }),
        )
        .describe("search the context ledger, compact-first on fuzzy misses"),
    );

    for tool in ["context_ledger_insert", "context_ledger_query"] {
        tools.access().grant(&env::capability_agent_id(), tool);
    }
}

fn scope_from(input: &Value) -> Result<LedgerScope, FingerError> {
    let session_id = input
        .get("session_id")
        .and_then(Value::as_str)
        .ok_or_else(|| FingerError::MissingField("session_id".into()))?;
    let agent_id = input
        .get("agent_id")
        .and_then(Value::as_str)
        .ok_or_else(|| FingerError::MissingField("agent_id".into()))?;
    let mode = input.get("mode").and_then(Value::as_str).unwrap_or("default");
    Ok(LedgerScope::new(session_id, agent_id, mode))
}

fn string_list(input: &Value, key: &str) -> Vec<String> {
    input
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items.iter().filter_map(Value::as_str).map(str::to_string).collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
