// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn empty_whitelist_denies_everything() {
    let access = AgentToolAccess::new();
    access.set_whitelist("exec-a", Vec::new());
    let decision = access.can_use("exec-a", "read_file");
    assert!(!decision.allowed);
    assert_eq!(decision.reason, "whitelist is empty");
}

#[test]
fn unknown_agent_is_denied() {
    let access = AgentToolAccess::new();
    assert!(!access.can_use("stranger", "read_file").allowed);
}

#[test]
fn whitelist_membership_allows() {
    let access = AgentToolAccess::new();
    access.grant("exec-a", "read_file");
    assert!(access.can_use("exec-a", "read_file").allowed);
    assert!(!access.can_use("exec-a", "write_file").allowed);
}

#[test]
fn blacklist_wins_over_whitelist() {
    let access = AgentToolAccess::new();
    access.grant("exec-a", "rm");
    access.deny("exec-a", "rm");
    let decision = access.can_use("exec-a", "rm");
    assert!(!decision.allowed);
    assert_eq!(decision.reason, "tool is blacklisted");

    access.allow("exec-a", "rm");
    assert!(access.can_use("exec-a", "rm").allowed);
}

#[test]
fn mutations_are_idempotent() {
    let access = AgentToolAccess::new();
    access.grant("exec-a", "read_file");
    access.grant("exec-a", "read_file");
    access.deny("exec-a", "rm");
    access.deny("exec-a", "rm");
    access.revoke("exec-a", "never-granted");
    access.allow("exec-a", "never-denied");

    let policy = access.policy("exec-a");
    assert_eq!(policy.whitelist.len(), 1);
    assert_eq!(policy.blacklist.len(), 1);
}

#[test]
fn allowed_tools_subtracts_blacklist() {
    let access = AgentToolAccess::new();
    access.set_whitelist("exec-a", vec!["a".to_string(), "b".to_string()]);
    access.deny("exec-a", "b");
    assert_eq!(access.allowed_tools("exec-a"), vec!["a".to_string()]);
}
