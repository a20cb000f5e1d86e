// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fuzzy text scoring for ledger and compact-memory search.
//!
//! Dice coefficient over character trigrams, with a bigram fallback for
//! short inputs so a two-word query still scores against its typo'd form.

use std::collections::HashSet;

/// Minimum score for a fuzzy hit.
pub const FUZZY_THRESHOLD: f64 = 0.18;

fn ngrams(text: &str, n: usize) -> HashSet<Vec<char>> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < n {
        let mut set = HashSet::new();
        if !chars.is_empty() {
            set.insert(chars);
        }
        return set;
    }
    chars.windows(n).map(|w| w.to_vec()).collect()
}

fn dice(a: &HashSet<Vec<char>>, b: &HashSet<Vec<char>>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    (2.0 * inter as f64) / (a.len() + b.len()) as f64
}

/// Score `query` against `candidate`, case-insensitive, in `[0, 1]`.
pub fn fuzzy_score(query: &str, candidate: &str) -> f64 {
    let q = query.to_lowercase();
    let c = candidate.to_lowercase();
    if q.is_empty() || c.is_empty() {
        return 0.0;
    }
    if c.contains(&q) {
        return 1.0;
    }
    let n = if q.chars().count() < 6 { 2 } else { 3 };
    dice(&ngrams(&q, n), &ngrams(&c, n))
}

/// True when the candidate clears [`FUZZY_THRESHOLD`].
pub fn fuzzy_matches(query: &str, candidate: &str) -> bool {
    fuzzy_score(query, candidate) >= FUZZY_THRESHOLD
}

#[cfg(test)]
#[path = "fuzzy_tests.rs"]
mod tests;
