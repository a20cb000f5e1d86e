// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_quota_is_last_resort() {
    let policy = QuotaPolicy::default();
    assert_eq!(policy.effective(None), (1, QuotaSource::Default));
    assert_eq!(policy.effective(Some("wfl-x")), (1, QuotaSource::Default));
}

#[test]
fn workflow_scope_wins_over_project() {
    let mut policy = QuotaPolicy { default_quota: 2, project_quota: Some(4), ..Default::default() };
    policy.workflow_quota.insert("wfl-a".into(), 8);

    assert_eq!(policy.effective(Some("wfl-a")), (8, QuotaSource::Workflow));
    assert_eq!(policy.effective(Some("wfl-other")), (4, QuotaSource::Project));
    assert_eq!(policy.effective(None), (4, QuotaSource::Project));
}

#[test]
fn merge_overlays_narrower_scopes() {
    let mut base = QuotaPolicy::default();
    let mut overlay = QuotaPolicy { default_quota: 3, project_quota: Some(5), ..Default::default() };
    overlay.workflow_quota.insert("wfl-a".into(), 2);

    base.merge(&overlay);
    assert_eq!(base.default_quota, 3);
    assert_eq!(base.project_quota, Some(5));
    assert_eq!(base.effective(Some("wfl-a")), (2, QuotaSource::Workflow));
}

#[test]
fn merge_ignores_zero_default() {
    let mut base = QuotaPolicy { default_quota: 4, ..Default::default() };
    base.merge(&QuotaPolicy { default_quota: 0, ..Default::default() });
    assert_eq!(base.default_quota, 4);
}
