// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-agent context ledger with compact-first fuzzy search.
//!
//! One `context-ledger.jsonl` per `<session>/<agent>/<mode>` directory,
//! one JSON object per line. Appends preserve arrival order; readers
//! tolerate a torn final line. Search filters out anything that looks like
//! a prompt block so system prompts never leak through memory queries.

use crate::compact::{CompactHit, CompactStore};
use crate::fuzzy::{fuzzy_matches, FUZZY_THRESHOLD};
use fg_core::error::FingerError;
use fg_core::event::EventId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

pub const LEDGER_FILE: &str = "context-ledger.jsonl";

/// One appended ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EventId,
    pub timestamp_ms: u64,
    pub session_id: String,
    pub agent_id: String,
    pub mode: String,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// Which agent-mode directory a ledger call operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerScope {
    pub session_id: String,
    pub agent_id: String,
    pub mode: String,
}

impl LedgerScope {
    pub fn new(
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        mode: impl Into<String>,
    ) -> Self {
        Self { session_id: session_id.into(), agent_id: agent_id.into(), mode: mode.into() }
    }
}

/// Caller identity for the cross-agent read permission gate.
#[derive(Debug, Clone, Default)]
pub struct LedgerCaller {
    pub agent_id: String,
    pub can_read_all: bool,
    pub readable_agents: Vec<String>,
}

impl LedgerCaller {
    /// Self-reads are always permitted; others need `can_read_all` or an
    /// explicit `readable_agents` entry.
    pub fn may_read(&self, target_agent: &str) -> bool {
        self.agent_id == target_agent
            || self.can_read_all
            || self.readable_agents.iter().any(|a| a == target_agent)
    }
}

/// Query parameters for [`Ledger::query`].
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    pub contains: Option<String>,
    pub fuzzy: bool,
    pub event_types: Vec<String>,
    pub since_ms: Option<u64>,
    pub until_ms: Option<u64>,
    pub limit: usize,
    pub detail: bool,
}

/// Which strategy produced a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStrategy {
    Direct,
    CompactFirst,
}

/// Narrowed follow-up query suggested by a compact-first result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextQueryHint {
    pub detail: bool,
    pub since_ms: u64,
    pub until_ms: u64,
}

/// Result of a ledger query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub strategy: QueryStrategy,
    pub entries: Vec<LedgerEntry>,
    pub compact_hits: Vec<CompactHit>,
    pub next_query_hint: Option<NextQueryHint>,
}

/// Ledger files rooted at the sessions directory.
#[derive(Debug, Clone)]
pub struct Ledger {
    sessions_dir: PathBuf,
}

impl Ledger {
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self { sessions_dir: sessions_dir.into() }
    }

    pub fn scope_dir(&self, scope: &LedgerScope) -> PathBuf {
        self.sessions_dir.join(&scope.session_id).join(&scope.agent_id).join(&scope.mode)
    }

    fn ledger_path(&self, scope: &LedgerScope) -> PathBuf {
        self.scope_dir(scope).join(LEDGER_FILE)
    }

    /// Compact-memory store colocated with this scope's ledger.
    pub fn compact_store(&self, scope: &LedgerScope) -> CompactStore {
        CompactStore::new(self.scope_dir(scope))
    }

    /// Append one entry as a single JSONL line.
    pub fn append(&self, scope: &LedgerScope, entry: &LedgerEntry) -> Result<(), FingerError> {
        let dir = self.scope_dir(scope);
        fs::create_dir_all(&dir)?;
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file =
            fs::OpenOptions::new().create(true).append(true).open(self.ledger_path(scope))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// All entries in append order. Torn final lines are ignored.
    pub fn read_all(&self, scope: &LedgerScope) -> Result<Vec<LedgerEntry>, FingerError> {
        let path = self.ledger_path(scope);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(path)?;
        let lines: Vec<&str> = raw.lines().collect();
        let mut out = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(entry) => out.push(entry),
                Err(e) if i + 1 == lines.len() => {
                    warn!(error = %e, "ignoring torn final ledger line");
                }
                Err(e) => {
                    warn!(line = i + 1, error = %e, "skipping corrupt ledger line");
                }
            }
        }
        Ok(out)
    }

    /// Query the ledger.
    ///
    /// Direct strategy scans entries with time/type/substring filters
    /// (falling back to fuzzy matching when `fuzzy` is set). When a fuzzy
    /// query with `contains` finds no precise hit, the compact index is
    /// consulted instead and the result carries a narrowed
    /// [`NextQueryHint`] pointing at the top hit's source range.
    pub fn query(
        &self,
        scope: &LedgerScope,
        caller: &LedgerCaller,
        query: &LedgerQuery,
    ) -> Result<QueryOutcome, FingerError> {
        if !caller.may_read(&scope.agent_id) {
            return Err(FingerError::ToolDenied(format!(
                "agent {} may not read ledger of {}",
                caller.agent_id, scope.agent_id
            )));
        }

        let entries = self.read_all(scope)?;
        let mut precise: Vec<LedgerEntry> = Vec::new();
        let mut fuzzy_pool: Vec<LedgerEntry> = Vec::new();

        for entry in entries {
            if !within_time(&entry, query) || !type_matches(&entry, query) {
                continue;
            }
            if is_prompt_block(&entry) {
                continue;
            }
            match &query.contains {
                None => precise.push(entry),
                Some(needle) => {
                    let hay = haystack(&entry);
                    if hay.to_lowercase().contains(&needle.to_lowercase()) {
                        precise.push(entry);
                    } else if query.fuzzy && fuzzy_matches(needle, &hay) {
                        fuzzy_pool.push(entry);
                    }
                }
            }
        }

        // Compact-first: fuzzy + contains + nothing precise.
        if query.fuzzy && precise.is_empty() {
            if let Some(needle) = &query.contains {
                let hits = self.compact_store(scope).search(needle, FUZZY_THRESHOLD)?;
                if !hits.is_empty() {
                    let top = &hits[0].record;
                    let hint = NextQueryHint {
                        detail: true,
                        since_ms: top.source_time_start,
                        until_ms: top.source_time_end,
                    };
                    let entries = if query.detail {
                        let mut narrowed = LedgerQuery {
                            since_ms: Some(hint.since_ms),
                            until_ms: Some(hint.until_ms),
                            ..query.clone()
                        };
                        narrowed.fuzzy = false;
                        narrowed.contains = None;
                        self.query(scope, caller, &narrowed)?.entries
                    } else {
                        Vec::new()
                    };
                    return Ok(QueryOutcome {
                        strategy: QueryStrategy::CompactFirst,
                        entries,
                        compact_hits: hits,
                        next_query_hint: Some(hint),
                    });
                }
            }
        }

        let mut found = precise;
        found.extend(fuzzy_pool);
        if query.limit > 0 && found.len() > query.limit {
            found.truncate(query.limit);
        }
        Ok(QueryOutcome {
            strategy: QueryStrategy::Direct,
            entries: found,
            compact_hits: Vec::new(),
            next_query_hint: None,
        })
    }
}

fn within_time(entry: &LedgerEntry, query: &LedgerQuery) -> bool {
    if let Some(since) = query.since_ms {
        if entry.timestamp_ms < since {
            return false;
        }
    }
    if let Some(until) = query.until_ms {
        if entry.timestamp_ms > until {
            return false;
        }
    }
    true
}

fn type_matches(entry: &LedgerEntry, query: &LedgerQuery) -> bool {
    query.event_types.is_empty() || query.event_types.iter().any(|t| t == &entry.event_type)
}

fn haystack(entry: &LedgerEntry) -> String {
    format!("{} {}", entry.event_type, entry.payload)
}

/// Prompt-block filter: serialized payloads carrying system prompt markup
/// are invisible to search.
fn is_prompt_block(entry: &LedgerEntry) -> bool {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        let pattern =
            r"(?i)<\s*/?\s*(system_message|system_prompt|tool_instruction|assistant_instruction)\b";
        match regex::Regex::new(pattern) {
            Ok(re) => re,
            // Literal pattern, cannot fail to parse.
            Err(_) => unreachable!("prompt-block pattern is valid"),
        }
    });
    re.is_match(&entry.payload.to_string())
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
