// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fuzzy::FUZZY_THRESHOLD;

fn record(id: &str, summary: &str) -> CompactRecord {
    CompactRecord {
        id: id.into(),
        summary: summary.into(),
        source_time_start: 1,
        source_time_end: 2,
        created_at: 3,
    }
}

#[test]
fn append_writes_jsonl_and_index() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CompactStore::new(tmp.path());
    store.append(&record("cmp-1", "Filesystem listing")).unwrap();
    store.append(&record("cmp-2", "Network probe")).unwrap();

    assert!(tmp.path().join(COMPACT_FILE).exists());
    assert!(tmp.path().join(COMPACT_INDEX_FILE).exists());
    assert_eq!(store.load().unwrap().len(), 2);
}

#[test]
fn load_falls_back_to_jsonl_when_index_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CompactStore::new(tmp.path());
    store.append(&record("cmp-1", "Filesystem listing")).unwrap();
    std::fs::write(tmp.path().join(COMPACT_INDEX_FILE), "not json").unwrap();

    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn search_ranks_best_match_first() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CompactStore::new(tmp.path());
    store.append(&record("cmp-1", "Filesystem listing")).unwrap();
    store.append(&record("cmp-2", "Completely unrelated topic")).unwrap();

    let hits = store.search("filesytem listng", FUZZY_THRESHOLD).unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].record.id, "cmp-1");
}

#[test]
fn search_with_no_match_returns_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CompactStore::new(tmp.path());
    store.append(&record("cmp-1", "Filesystem listing")).unwrap();

    assert!(store.search("qqqqqq", FUZZY_THRESHOLD).unwrap().is_empty());
}

#[test]
fn empty_store_loads_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CompactStore::new(tmp.path());
    assert!(store.load().unwrap().is_empty());
}
