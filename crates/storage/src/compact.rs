// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compact memory: summarised ledger slices used as a fast fuzzy index.
//!
//! Two files per agent-mode directory: `compact-memory.jsonl` holds the
//! summary records append-only, `compact-memory-index.json` is an optional
//! materialized array of the same records for one-read loading. Readers
//! prefer the index and fall back to scanning the JSONL.

use crate::fuzzy::fuzzy_score;
use fg_core::error::FingerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const COMPACT_FILE: &str = "compact-memory.jsonl";
pub const COMPACT_INDEX_FILE: &str = "compact-memory-index.json";

/// One summarised slice of ledger history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactRecord {
    pub id: String,
    pub summary: String,
    /// Time range of the source ledger entries.
    pub source_time_start: u64,
    pub source_time_end: u64,
    pub created_at: u64,
}

/// A compact record that matched a fuzzy query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactHit {
    pub record: CompactRecord,
    pub score: f64,
}

/// Reader/writer for one directory's compact memory.
#[derive(Debug, Clone)]
pub struct CompactStore {
    dir: PathBuf,
}

impl CompactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn jsonl_path(&self) -> PathBuf {
        self.dir.join(COMPACT_FILE)
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(COMPACT_INDEX_FILE)
    }

    /// Append a summary record and refresh the index file.
    pub fn append(&self, record: &CompactRecord) -> Result<(), FingerError> {
        fs::create_dir_all(&self.dir)?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = fs::OpenOptions::new().create(true).append(true).open(self.jsonl_path())?;
        file.write_all(line.as_bytes())?;

        let mut records = self.load()?;
        records.push(record.clone());
        fs::write(self.index_path(), serde_json::to_vec(&records)?)?;
        Ok(())
    }

    /// Load all records, preferring the index file.
    pub fn load(&self) -> Result<Vec<CompactRecord>, FingerError> {
        let index = self.index_path();
        if index.exists() {
            let raw = fs::read_to_string(index)?;
            match serde_json::from_str(&raw) {
                Ok(records) => return Ok(records),
                Err(e) => {
                    warn!(error = %e, "compact index unreadable, rescanning jsonl");
                }
            }
        }
        self.scan_jsonl()
    }

    fn scan_jsonl(&self) -> Result<Vec<CompactRecord>, FingerError> {
        let path = self.jsonl_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(read_jsonl_lines(&path)?)
    }

    /// Fuzzy-score every summary against the query, best first.
    pub fn search(&self, contains: &str, threshold: f64) -> Result<Vec<CompactHit>, FingerError> {
        let mut hits: Vec<CompactHit> = self
            .load()?
            .into_iter()
            .filter_map(|record| {
                let score = fuzzy_score(contains, &record.summary);
                (score >= threshold).then_some(CompactHit { record, score })
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(hits)
    }
}

/// Parse a JSONL file line by line, tolerating a torn final line.
fn read_jsonl_lines(path: &Path) -> Result<Vec<CompactRecord>, FingerError> {
    let raw = fs::read_to_string(path)?;
    let lines: Vec<&str> = raw.lines().collect();
    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => out.push(record),
            Err(e) if i + 1 == lines.len() => {
                // Partial last line from an interrupted writer.
                warn!(error = %e, "ignoring torn final compact record");
            }
            Err(e) => {
                warn!(line = i + 1, error = %e, "skipping corrupt compact record");
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "compact_tests.rs"]
mod tests;
