// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Focus slot: a small tail-kept scratch file per agent-mode directory.
//!
//! The slot holds whatever the agent most recently chose to keep in focus,
//! capped in characters (not bytes) with the tail preserved. Every insert
//! is journalled as exactly one `focus_insert` ledger event.

use crate::ledger::{Ledger, LedgerEntry, LedgerScope};
use fg_core::error::FingerError;
use fg_core::event::EventId;
use serde_json::json;
use std::fs;

pub const FOCUS_FILE: &str = "focus-slot.txt";
const DEFAULT_FOCUS_MAX_CHARS: usize = 4000;

/// Parameters for a focus insert.
#[derive(Debug, Clone, Default)]
pub struct FocusInsert {
    /// Explicit text; when absent it is synthesized from ledger entries in
    /// the `[since_ms, until_ms]` range.
    pub text: Option<String>,
    pub since_ms: Option<u64>,
    pub until_ms: Option<u64>,
    pub append: bool,
    /// Character cap for the slot file; 0 uses the default.
    pub focus_max_chars: usize,
}

/// Write (or append to) the focus slot, journalling the insert.
///
/// Returns the character count of the slot after the write. Fails with
/// `MissingField` when neither text nor any in-range ledger entries exist.
pub fn write_focus_slot(
    ledger: &Ledger,
    scope: &LedgerScope,
    insert: &FocusInsert,
    now_ms: u64,
) -> Result<usize, FingerError> {
    let max_chars = if insert.focus_max_chars == 0 {
        DEFAULT_FOCUS_MAX_CHARS
    } else {
        insert.focus_max_chars
    };

    let text = match &insert.text {
        Some(text) if !text.is_empty() => text.clone(),
        _ => synthesize(ledger, scope, insert)?,
    };

    let dir = ledger.scope_dir(scope);
    fs::create_dir_all(&dir)?;
    let path = dir.join(FOCUS_FILE);

    let mut combined = if insert.append {
        match fs::read_to_string(&path) {
            Ok(existing) if !existing.is_empty() => format!("{existing}\n{text}"),
            _ => text,
        }
    } else {
        text
    };
    combined = keep_tail(&combined, max_chars);
    fs::write(&path, &combined)?;

    let written = combined.chars().count();
    ledger.append(
        scope,
        &LedgerEntry {
            id: EventId::new(),
            timestamp_ms: now_ms,
            session_id: scope.session_id.clone(),
            agent_id: scope.agent_id.clone(),
            mode: scope.mode.clone(),
            event_type: "focus_insert".into(),
            payload: json!({"chars": written, "append": insert.append}),
        },
    )?;
    Ok(written)
}

/// Build focus text from ledger entries in the requested time range.
fn synthesize(
    ledger: &Ledger,
    scope: &LedgerScope,
    insert: &FocusInsert,
) -> Result<String, FingerError> {
    let entries = ledger.read_all(scope)?;
    let lines: Vec<String> = entries
        .iter()
        .filter(|e| {
            insert.since_ms.map_or(true, |s| e.timestamp_ms >= s)
                && insert.until_ms.map_or(true, |u| e.timestamp_ms <= u)
        })
        .map(|e| format!("[{}] {} {}", e.timestamp_ms, e.event_type, e.payload))
        .collect();
    if lines.is_empty() {
        return Err(FingerError::MissingField("text".into()));
    }
    Ok(lines.join("\n"))
}

/// Keep at most `max_chars` characters, preferring the tail.
fn keep_tail(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    text.chars().skip(total - max_chars).collect()
}

#[cfg(test)]
#[path = "focus_tests.rs"]
mod tests;
