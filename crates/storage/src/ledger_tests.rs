// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::compact::CompactRecord;
use serde_json::json;
use std::io::Write as _;

fn scope() -> LedgerScope {
    LedgerScope::new("ses-1", "exec-a", "work")
}

fn self_caller() -> LedgerCaller {
    LedgerCaller { agent_id: "exec-a".into(), ..Default::default() }
}

fn entry(ts: u64, event_type: &str, payload: serde_json::Value) -> LedgerEntry {
    LedgerEntry {
        id: EventId::new(),
        timestamp_ms: ts,
        session_id: "ses-1".into(),
        agent_id: "exec-a".into(),
        mode: "work".into(),
        event_type: event_type.into(),
        payload,
    }
}

fn ledger() -> (tempfile::TempDir, Ledger) {
    let tmp = tempfile::tempdir().unwrap();
    let ledger = Ledger::new(tmp.path().join("sessions"));
    (tmp, ledger)
}

#[test]
fn append_preserves_arrival_order() {
    let (_tmp, ledger) = ledger();
    let scope = scope();
    for ts in [1, 2, 3] {
        ledger.append(&scope, &entry(ts, "tool_call", json!({"n": ts}))).unwrap();
    }
    let all = ledger.read_all(&scope).unwrap();
    assert_eq!(all.iter().map(|e| e.timestamp_ms).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn torn_final_line_is_tolerated() {
    let (_tmp, ledger) = ledger();
    let scope = scope();
    ledger.append(&scope, &entry(1, "tool_call", json!({}))).unwrap();

    let path = ledger.scope_dir(&scope).join(LEDGER_FILE);
    let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(b"{\"id\":\"evt-truncat").unwrap();

    assert_eq!(ledger.read_all(&scope).unwrap().len(), 1);
}

#[test]
fn direct_query_filters_time_type_and_substring() {
    let (_tmp, ledger) = ledger();
    let scope = scope();
    ledger.append(&scope, &entry(10, "tool_call", json!({"tool": "grep"}))).unwrap();
    ledger.append(&scope, &entry(20, "tool_call", json!({"tool": "apply_patch"}))).unwrap();
    ledger.append(&scope, &entry(30, "dialog", json!({"text": "hello"}))).unwrap();

    let out = ledger
        .query(
            &scope,
            &self_caller(),
            &LedgerQuery {
                contains: Some("GREP".into()),
                event_types: vec!["tool_call".into()],
                since_ms: Some(5),
                until_ms: Some(25),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(out.strategy, QueryStrategy::Direct);
    assert_eq!(out.entries.len(), 1);
    assert_eq!(out.entries[0].timestamp_ms, 10);
}

#[test]
fn prompt_blocks_are_invisible_to_search() {
    let (_tmp, ledger) = ledger();
    let scope = scope();
    ledger
        .append(&scope, &entry(1, "dialog", json!({"text": "<system_message>secret</system_message>"})))
        .unwrap();
    ledger.append(&scope, &entry(2, "dialog", json!({"text": "normal"}))).unwrap();

    let out = ledger.query(&scope, &self_caller(), &LedgerQuery::default()).unwrap();
    assert_eq!(out.entries.len(), 1);
    assert_eq!(out.entries[0].timestamp_ms, 2);
}

#[test]
fn compact_first_fires_on_fuzzy_miss() {
    let (_tmp, ledger) = ledger();
    let scope = scope();
    ledger.append(&scope, &entry(100, "tool_call", json!({"tool": "ls"}))).unwrap();
    ledger.append(&scope, &entry(200, "tool_call", json!({"tool": "cat"}))).unwrap();
    ledger
        .compact_store(&scope)
        .append(&CompactRecord {
            id: "cmp-1".into(),
            summary: "Filesystem listing".into(),
            source_time_start: 100,
            source_time_end: 200,
            created_at: 300,
        })
        .unwrap();

    let out = ledger
        .query(
            &scope,
            &self_caller(),
            &LedgerQuery {
                contains: Some("filesytem listng".into()),
                fuzzy: true,
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(out.strategy, QueryStrategy::CompactFirst);
    assert!(out.entries.is_empty());
    assert!(!out.compact_hits.is_empty());
    let hint = out.next_query_hint.unwrap();
    assert!(hint.detail);
    assert_eq!(hint.since_ms, 100);
    assert_eq!(hint.until_ms, 200);
}

#[test]
fn compact_first_with_detail_pulls_source_entries() {
    let (_tmp, ledger) = ledger();
    let scope = scope();
    ledger.append(&scope, &entry(100, "tool_call", json!({"tool": "ls"}))).unwrap();
    ledger.append(&scope, &entry(999, "tool_call", json!({"tool": "out-of-range"}))).unwrap();
    ledger
        .compact_store(&scope)
        .append(&CompactRecord {
            id: "cmp-1".into(),
            summary: "Filesystem listing".into(),
            source_time_start: 50,
            source_time_end: 150,
            created_at: 300,
        })
        .unwrap();

    let out = ledger
        .query(
            &scope,
            &self_caller(),
            &LedgerQuery {
                contains: Some("filesytem listng".into()),
                fuzzy: true,
                detail: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(out.strategy, QueryStrategy::CompactFirst);
    assert_eq!(out.entries.len(), 1);
    assert_eq!(out.entries[0].timestamp_ms, 100);
}

#[test]
fn fuzzy_with_no_compact_content_falls_back_to_direct() {
    let (_tmp, ledger) = ledger();
    let scope = scope();
    ledger.append(&scope, &entry(1, "tool_call", json!({"tool": "ls"}))).unwrap();

    let out = ledger
        .query(
            &scope,
            &self_caller(),
            &LedgerQuery { contains: Some("zzz".into()), fuzzy: true, ..Default::default() },
        )
        .unwrap();
    assert_eq!(out.strategy, QueryStrategy::Direct);
    assert!(out.compact_hits.is_empty());
}

#[test]
fn cross_agent_reads_need_permission() {
    let (_tmp, ledger) = ledger();
    let scope = scope();
    ledger.append(&scope, &entry(1, "tool_call", json!({}))).unwrap();

    let stranger = LedgerCaller { agent_id: "other".into(), ..Default::default() };
    assert!(ledger.query(&scope, &stranger, &LedgerQuery::default()).is_err());

    let reader = LedgerCaller {
        agent_id: "other".into(),
        readable_agents: vec!["exec-a".into()],
        ..Default::default()
    };
    assert!(ledger.query(&scope, &reader, &LedgerQuery::default()).is_ok());

    let admin = LedgerCaller { agent_id: "other".into(), can_read_all: true, ..Default::default() };
    assert!(ledger.query(&scope, &admin, &LedgerQuery::default()).is_ok());
}

#[test]
fn limit_truncates_results() {
    let (_tmp, ledger) = ledger();
    let scope = scope();
    for ts in 1..=5 {
        ledger.append(&scope, &entry(ts, "tool_call", json!({}))).unwrap();
    }
    let out = ledger
        .query(&scope, &self_caller(), &LedgerQuery { limit: 2, ..Default::default() })
        .unwrap();
    assert_eq!(out.entries.len(), 2);
}
