// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow checkpoints for session resume.
//!
//! A checkpoint is a self-contained serialization of one workflow (tasks
//! flattened to a list), zstd-compressed on disk. Terminal workflows are
//! never offered for resume.

use fg_core::error::FingerError;
use fg_core::message::SessionId;
use fg_core::task::TaskNode;
use fg_core::workflow::{Workflow, WorkflowId, WorkflowStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

fg_core::define_id! {
    /// Unique identifier for a checkpoint.
    pub struct CheckpointId("ckp-");
}

/// Serialized workflow state at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub workflow_id: WorkflowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub user_task: String,
    /// Tasks as a list; map form is rebuilt on restore.
    #[serde(default)]
    pub tasks: Vec<TaskNode>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    pub created_at: u64,
}

impl Checkpoint {
    pub fn of(workflow: &Workflow, now_ms: u64) -> Self {
        let mut tasks: Vec<TaskNode> = workflow.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Self {
            id: CheckpointId::new(),
            workflow_id: workflow.id,
            session_id: workflow.session_id.clone(),
            status: workflow.status,
            user_task: workflow.user_task.clone(),
            tasks,
            context: workflow.context.clone(),
            created_at: now_ms,
        }
    }
}

/// Replayable summary handed to the orchestrator on resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeContext {
    pub checkpoint_id: CheckpointId,
    pub workflow_id: WorkflowId,
    pub completed_task_ids: Vec<String>,
    pub pending_task_ids: Vec<String>,
    pub failed_task_ids: Vec<String>,
    /// Fraction of tasks terminally succeeded, 0.0 when empty.
    pub estimated_progress: f64,
}

/// Build the resume summary for a checkpoint.
pub fn build_resume_context(ck: &Checkpoint) -> ResumeContext {
    let mut completed = Vec::new();
    let mut pending = Vec::new();
    let mut failed = Vec::new();
    for task in &ck.tasks {
        use fg_core::task::TaskStatus::*;
        let id = task.id.as_str().to_string();
        match task.status {
            Done | ExecutionSucceeded => completed.push(id),
            DispatchFailed | ExecutionFailed => failed.push(id),
            _ => pending.push(id),
        }
    }
    let total = ck.tasks.len();
    let estimated_progress =
        if total == 0 { 0.0 } else { completed.len() as f64 / total as f64 };
    ResumeContext {
        checkpoint_id: ck.id,
        workflow_id: ck.workflow_id,
        completed_task_ids: completed,
        pending_task_ids: pending,
        failed_task_ids: failed,
        estimated_progress,
    }
}

/// zstd-compressed checkpoint files under `checkpoints/`.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

const ZSTD_LEVEL: i32 = 3;

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json.zst"))
    }

    /// Serialize and store a checkpoint of the workflow, returning its id.
    pub fn create(&self, workflow: &Workflow, now_ms: u64) -> Result<CheckpointId, FingerError> {
        fs::create_dir_all(&self.dir)?;
        let ck = Checkpoint::of(workflow, now_ms);
        let raw = serde_json::to_vec(&ck)?;
        let compressed = zstd::encode_all(raw.as_slice(), ZSTD_LEVEL)
            .map_err(|e| FingerError::Io(e.to_string()))?;
        fs::write(self.path_for(ck.id.as_str()), compressed)?;
        Ok(ck.id)
    }

    pub fn load(&self, id: &str) -> Result<Option<Checkpoint>, FingerError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let compressed = fs::read(path)?;
        let raw = zstd::decode_all(compressed.as_slice())
            .map_err(|e| FingerError::Io(e.to_string()))?;
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// Most recent non-terminal checkpoint for a session.
    pub fn find_latest(&self, session_id: &str) -> Result<Option<Checkpoint>, FingerError> {
        let mut latest: Option<Checkpoint> = None;
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(None),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(".json.zst"))
            {
                continue;
            }
            let ck = match self.read_file(&path) {
                Ok(ck) => ck,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping corrupt checkpoint");
                    continue;
                }
            };
            if ck.status.is_terminal() {
                continue;
            }
            if ck.session_id.as_ref().map(|s| s.as_str()) != Some(session_id) {
                continue;
            }
            if latest.as_ref().map_or(true, |best| ck.created_at > best.created_at) {
                latest = Some(ck);
            }
        }
        Ok(latest)
    }

    fn read_file(&self, path: &std::path::Path) -> Result<Checkpoint, FingerError> {
        let compressed = fs::read(path)?;
        let raw = zstd::decode_all(compressed.as_slice())
            .map_err(|e| FingerError::Io(e.to_string()))?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
