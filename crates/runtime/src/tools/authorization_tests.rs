// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fg_core::clock::FakeClock;
use std::sync::Arc;

fn manager() -> (AuthorizationManager, FakeClock) {
    let clock = FakeClock::new();
    (AuthorizationManager::new(Arc::new(clock.clone())), clock)
}

#[test]
fn required_flag_toggles() {
    let (authz, _clock) = manager();
    assert!(!authz.is_required("apply_patch"));
    authz.set_tool_required("apply_patch", true);
    assert!(authz.is_required("apply_patch"));
    authz.set_tool_required("apply_patch", false);
    assert!(!authz.is_required("apply_patch"));
}

#[test]
fn one_shot_grant_allows_once_then_expires() {
    let (authz, _clock) = manager();
    let grant = authz.issue("executor-a", "apply_patch", "operator", GrantSpec::default());
    assert_eq!(grant.max_uses, 1);

    authz.verify_and_consume(grant.token.as_str(), "executor-a", "apply_patch").unwrap();
    let second = authz.verify_and_consume(grant.token.as_str(), "executor-a", "apply_patch");
    assert!(matches!(second, Err(FingerError::AuthorizationExpired(_))));
    assert!(authz.grants().is_empty());
}

#[test]
fn multi_use_grant_counts_down() {
    let (authz, _clock) = manager();
    let grant = authz.issue("a", "t", "op", GrantSpec { ttl_ms: 5_000, max_uses: 3 });
    for _ in 0..3 {
        authz.verify_and_consume(grant.token.as_str(), "a", "t").unwrap();
    }
    assert!(authz.verify_and_consume(grant.token.as_str(), "a", "t").is_err());
}

#[test]
fn scope_mismatch_is_reported() {
    let (authz, _clock) = manager();
    let grant = authz.issue("a", "t", "op", GrantSpec::default());

    let wrong_agent = authz.verify_and_consume(grant.token.as_str(), "b", "t");
    assert!(matches!(wrong_agent, Err(FingerError::AuthorizationScopeMismatch(_))));

    let wrong_tool = authz.verify_and_consume(grant.token.as_str(), "a", "other");
    assert!(matches!(wrong_tool, Err(FingerError::AuthorizationScopeMismatch(_))));

    // Scope mismatch does not consume the grant.
    authz.verify_and_consume(grant.token.as_str(), "a", "t").unwrap();
}

#[test]
fn expiry_denies_and_evicts() {
    let (authz, clock) = manager();
    let grant = authz.issue("a", "t", "op", GrantSpec { ttl_ms: 1_000, max_uses: 1 });
    clock.advance_ms(1_001);

    let err = authz.verify_and_consume(grant.token.as_str(), "a", "t");
    assert!(matches!(err, Err(FingerError::AuthorizationExpired(_))));
    assert!(authz.grants().is_empty());
}

#[test]
fn zero_ttl_falls_back_to_default() {
    let (authz, _clock) = manager();
    let grant = authz.issue("a", "t", "op", GrantSpec { ttl_ms: 0, max_uses: 1 });
    assert_eq!(grant.expires_at_ms - grant.issued_at_ms, DEFAULT_GRANT_TTL_MS);
}

#[test]
fn revoke_removes_grant() {
    let (authz, _clock) = manager();
    let grant = authz.issue("a", "t", "op", GrantSpec::default());
    assert!(authz.revoke(grant.token.as_str()));
    assert!(!authz.revoke(grant.token.as_str()));
    assert!(authz.verify_and_consume(grant.token.as_str(), "a", "t").is_err());
}
