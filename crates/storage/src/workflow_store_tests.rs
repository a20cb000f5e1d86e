// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fg_core::test_support::task_with_deps;
use fg_core::workflow::WorkflowStatus;
use fg_core::WorkflowBuilder;

fn store() -> (tempfile::TempDir, WorkflowStore) {
    let tmp = tempfile::tempdir().unwrap();
    let store = WorkflowStore::new(tmp.path().join("workflows"));
    (tmp, store)
}

#[test]
fn save_then_load_round_trips_modulo_updated_at() {
    let (_tmp, store) = store();
    let mut wf = WorkflowBuilder::default().user_task("build the thing").build();
    let task = task_with_deps("tsk-a", &[]);
    wf.tasks.insert(task.id, task);

    store.save(&wf).unwrap();
    let loaded = store.load(wf.id.as_str()).unwrap().unwrap();
    assert!(loaded.same_shape(&wf));
}

#[test]
fn load_missing_returns_none() {
    let (_tmp, store) = store();
    assert!(store.load("wfl-nope").unwrap().is_none());
}

#[test]
fn save_replaces_previous_snapshot() {
    let (_tmp, store) = store();
    let mut wf = WorkflowBuilder::default().build();
    store.save(&wf).unwrap();
    wf.status = WorkflowStatus::Executing;
    store.save(&wf).unwrap();
    let loaded = store.load(wf.id.as_str()).unwrap().unwrap();
    assert_eq!(loaded.status, WorkflowStatus::Executing);
}

#[test]
fn resume_scan_skips_terminal_workflows() {
    let (_tmp, store) = store();
    let active = WorkflowBuilder::default().status(WorkflowStatus::Executing).build();
    let done = WorkflowBuilder::default().status(WorkflowStatus::Completed).build();
    let failed = WorkflowBuilder::default().status(WorkflowStatus::Failed).build();
    for wf in [&active, &done, &failed] {
        store.save(wf).unwrap();
    }

    let found = store.scan_resumable();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, active.id);
}

#[test]
fn resume_scan_skips_corrupt_snapshots() {
    let (tmp, store) = store();
    store.save(&WorkflowBuilder::default().build()).unwrap();
    std::fs::write(tmp.path().join("workflows").join("wfl-bad.json"), "{not json").unwrap();

    assert_eq!(store.scan_resumable().len(), 1);
}

#[test]
fn delete_is_idempotent() {
    let (_tmp, store) = store();
    let wf = WorkflowBuilder::default().build();
    store.save(&wf).unwrap();
    store.delete(wf.id.as_str()).unwrap();
    store.delete(wf.id.as_str()).unwrap();
    assert!(store.load(wf.id.as_str()).unwrap().is_none());
}
