// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-replace workflow snapshots.
//!
//! One JSON file per workflow under `workflows/`. Writes go to a temp file
//! in the same directory followed by a rename, so readers never observe a
//! torn snapshot. The in-memory workflow stays authoritative: a failed
//! persist is logged by the caller and retried on the next mutation.

use fg_core::error::FingerError;
use fg_core::workflow::Workflow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct WorkflowStore {
    dir: PathBuf,
}

impl WorkflowStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, workflow_id: &str) -> PathBuf {
        self.dir.join(format!("{workflow_id}.json"))
    }

    /// Persist a snapshot, replacing any previous one.
    pub fn save(&self, workflow: &Workflow) -> Result<(), FingerError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(workflow.id.as_str());
        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_vec_pretty(workflow)?;
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn load(&self, workflow_id: &str) -> Result<Option<Workflow>, FingerError> {
        let path = self.path_for(workflow_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn delete(&self, workflow_id: &str) -> Result<(), FingerError> {
        let path = self.path_for(workflow_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// All non-terminal workflows on disk, oldest first.
    ///
    /// Corrupt snapshots are skipped with a warning rather than aborting
    /// the resume scan.
    pub fn scan_resumable(&self) -> Vec<Workflow> {
        let mut found = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return found,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_snapshot(&path) {
                Ok(wf) if !wf.status.is_terminal() => found.push(wf),
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping corrupt workflow snapshot");
                }
            }
        }
        found.sort_by_key(|wf| wf.created_at);
        found
    }
}

fn read_snapshot(path: &Path) -> Result<Workflow, FingerError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
#[path = "workflow_store_tests.rs"]
mod tests;
