// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn exact_substring_scores_one() {
    assert_eq!(fuzzy_score("listing", "Filesystem listing"), 1.0);
}

#[test]
fn case_is_ignored() {
    assert_eq!(fuzzy_score("LISTING", "filesystem listing"), 1.0);
}

#[test]
fn typo_still_clears_threshold() {
    let score = fuzzy_score("filesytem listng", "Filesystem listing");
    assert!(score >= FUZZY_THRESHOLD, "score {score} below threshold");
}

#[parameterized(
    empty_query = { "", "anything" },
    empty_candidate = { "anything", "" },
)]
fn empty_inputs_score_zero(q: &str, c: &str) {
    assert_eq!(fuzzy_score(q, c), 0.0);
}

#[test]
fn unrelated_text_scores_low() {
    assert!(fuzzy_score("filesystem", "quarterly revenue report") < FUZZY_THRESHOLD);
}

#[test]
fn short_queries_use_bigrams() {
    // A dropped letter in a short query leaves few shared trigrams;
    // bigrams keep the match alive.
    assert!(fuzzy_score("lser", "laser") >= FUZZY_THRESHOLD);
}
