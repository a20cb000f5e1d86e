// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fg_core::clock::FakeClock;
use fg_core::test_support::task_with_deps;
use fg_core::workflow::WorkflowId;

struct Fixture {
    manager: WorkflowManager,
    store: WorkflowStore,
    _tmp: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let store = WorkflowStore::new(tmp.path().join("workflows"));
    let checkpoints = CheckpointStore::new(tmp.path().join("checkpoints"));
    let manager = WorkflowManager::new(
        Arc::new(FakeClock::new()),
        EventBus::new(),
        store.clone(),
        checkpoints,
    );
    Fixture { manager, store, _tmp: tmp }
}

fn dag_workflow(manager: &WorkflowManager) -> WorkflowId {
    let wf = manager.create_workflow(CreateWorkflow {
        session_id: Some(fg_core::message::SessionId::new("ses-1")),
        user_task: "three step plan".into(),
        ..Default::default()
    });
    manager.add_task(wf.id.as_str(), task_with_deps("tsk-a", &[])).unwrap();
    manager.add_task(wf.id.as_str(), task_with_deps("tsk-b", &["tsk-a"])).unwrap();
    manager.add_task(wf.id.as_str(), task_with_deps("tsk-c", &["tsk-a", "tsk-b"])).unwrap();
    wf.id
}

#[test]
fn create_workflow_is_idempotent_on_id() {
    let f = fixture();
    let id = WorkflowId::new();
    let first = f.manager.create_workflow(CreateWorkflow {
        id: Some(id),
        user_task: "original".into(),
        ..Default::default()
    });
    let second = f.manager.create_workflow(CreateWorkflow {
        id: Some(id),
        user_task: "different".into(),
        ..Default::default()
    });
    assert_eq!(first.user_task, second.user_task);
    assert_eq!(f.manager.list().len(), 1);
}

#[test]
fn add_task_wires_dependents_and_settles_status() {
    let f = fixture();
    let id = dag_workflow(&f.manager);
    let wf = f.manager.get(id.as_str()).unwrap();

    assert_eq!(wf.tasks.get("tsk-a").unwrap().status, TaskStatus::Ready);
    assert_eq!(wf.tasks.get("tsk-b").unwrap().status, TaskStatus::Blocked);
    assert_eq!(wf.tasks.get("tsk-c").unwrap().status, TaskStatus::Blocked);

    let a = wf.tasks.get("tsk-a").unwrap();
    assert_eq!(a.dependents.len(), 2);
    let b = wf.tasks.get("tsk-b").unwrap();
    assert_eq!(b.dependents, vec![fg_core::task::TaskId::from("tsk-c")]);
}

#[test]
fn dag_unblocks_in_dependency_order() {
    let f = fixture();
    let id = dag_workflow(&f.manager);

    let ready: Vec<String> =
        f.manager.get_ready_tasks(id.as_str()).iter().map(|t| t.id.to_string()).collect();
    assert_eq!(ready, vec!["tsk-a".to_string()]);

    let unblocked = f.manager.update_task_status(id.as_str(), "tsk-a", TaskStatus::Done).unwrap();
    assert_eq!(unblocked, vec![fg_core::task::TaskId::from("tsk-b")]);
    // C still blocked: B not finished yet.
    let ready: Vec<String> =
        f.manager.get_ready_tasks(id.as_str()).iter().map(|t| t.id.to_string()).collect();
    assert_eq!(ready, vec!["tsk-b".to_string()]);

    let unblocked = f.manager.update_task_status(id.as_str(), "tsk-b", TaskStatus::Done).unwrap();
    assert_eq!(unblocked, vec![fg_core::task::TaskId::from("tsk-c")]);
}

#[test]
fn terminal_transition_releases_the_assignee() {
    let f = fixture();
    let id = dag_workflow(&f.manager);
    f.manager.register_agent("exec-1", "executor");
    f.manager.register_agent("exec-2", "executor");

    f.manager.assign_task(id.as_str(), "tsk-a", "exec-1");
    f.manager.update_task_status(id.as_str(), "tsk-a", TaskStatus::Running).unwrap();
    assert!(f.manager.is_busy("exec-1"));
    assert_eq!(f.manager.get_available_agents("executor"), vec!["exec-2".to_string()]);

    f.manager.update_task_status(id.as_str(), "tsk-a", TaskStatus::Done).unwrap();
    assert!(!f.manager.is_busy("exec-1"));
    assert_eq!(
        f.manager.get_available_agents("executor"),
        vec!["exec-1".to_string(), "exec-2".to_string()]
    );
}

#[test]
fn timestamps_track_start_and_completion() {
    let f = fixture();
    let id = dag_workflow(&f.manager);
    f.manager.update_task_status(id.as_str(), "tsk-a", TaskStatus::Running).unwrap();
    let wf = f.manager.get(id.as_str()).unwrap();
    assert!(wf.tasks.get("tsk-a").unwrap().started_at.is_some());
    assert!(wf.tasks.get("tsk-a").unwrap().completed_at.is_none());

    f.manager.update_task_status(id.as_str(), "tsk-a", TaskStatus::ExecutionSucceeded).unwrap();
    let wf = f.manager.get(id.as_str()).unwrap();
    assert!(wf.tasks.get("tsk-a").unwrap().completed_at.is_some());
}

#[test]
fn every_mutation_persists_a_snapshot() {
    let f = fixture();
    let id = dag_workflow(&f.manager);
    f.manager.update_task_status(id.as_str(), "tsk-a", TaskStatus::Done).unwrap();

    let on_disk = f.store.load(id.as_str()).unwrap().unwrap();
    assert_eq!(on_disk.tasks.get("tsk-a").unwrap().status, TaskStatus::Done);
    assert_eq!(on_disk.tasks.get("tsk-b").unwrap().status, TaskStatus::Ready);
}

#[test]
fn unknown_workflow_or_task_errors() {
    let f = fixture();
    assert!(f.manager.add_task("wfl-ghost", task_with_deps("tsk-x", &[])).is_err());
    let id = dag_workflow(&f.manager);
    assert!(f.manager.update_task_status(id.as_str(), "tsk-ghost", TaskStatus::Done).is_err());
}

#[test]
fn checkpoint_round_trip_builds_resume_context() {
    let f = fixture();
    let id = dag_workflow(&f.manager);
    f.manager.update_task_status(id.as_str(), "tsk-a", TaskStatus::Done).unwrap();

    let ck_id = f.manager.create_checkpoint(id.as_str()).unwrap();
    let ck = f.manager.load_checkpoint(ck_id.as_str()).unwrap().unwrap();
    assert_eq!(ck.workflow_id, id);

    let resume = f.manager.build_resume_context(&ck);
    assert_eq!(resume.completed_task_ids, vec!["tsk-a".to_string()]);
    assert_eq!(resume.pending_task_ids.len(), 2);
    assert!(resume.failed_task_ids.is_empty());
    assert!((resume.estimated_progress - 1.0 / 3.0).abs() < 1e-9);

    let latest = f.manager.find_latest_checkpoint("ses-1").unwrap().unwrap();
    assert_eq!(latest.id, ck_id);
}

#[test]
fn workflow_status_updates_persist() {
    let f = fixture();
    let id = dag_workflow(&f.manager);
    assert!(f.manager.set_workflow_status(id.as_str(), WorkflowStatus::Executing));
    assert_eq!(f.store.load(id.as_str()).unwrap().unwrap().status, WorkflowStatus::Executing);
    assert!(!f.manager.set_workflow_status("wfl-ghost", WorkflowStatus::Failed));
}
