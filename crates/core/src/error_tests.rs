// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    network = { "network", true },
    timeout = { "timeout", true },
    rate_limit = { "rate_limit", true },
    resource_exhausted = { "resource_exhausted", true },
    auth_failed = { "auth_failed", false },
    invalid_config = { "invalid_config", false },
    module_crash = { "module_crash", false },
    unknown = { "unknown", false },
    garbage = { "garbage", false },
)]
fn category_recoverability(name: &str, recoverable: bool) {
    assert_eq!(ErrorCategory::parse(name).is_recoverable(), recoverable);
}

#[test]
fn unknown_category_is_conservative() {
    assert_eq!(ErrorCategory::parse("weird"), ErrorCategory::Unknown);
    assert!(!ErrorCategory::Unknown.is_recoverable());
}

#[test]
fn codes_bucket_by_kind() {
    assert_eq!(FingerError::MissingField("target".into()).code(), 400);
    assert_eq!(FingerError::ToolDenied("rm".into()).code(), 400);
    assert_eq!(FingerError::DispatchDeadlock("exec-a".into()).code(), 409);
    assert_eq!(FingerError::GatewayAckTimeout("gw".into()).code(), 500);
    assert_eq!(FingerError::ModuleCrash("m".into()).code(), 500);
}

#[test]
fn gateway_timeouts_classify_recoverable() {
    assert!(FingerError::GatewayResultTimeout("gw".into()).category().is_recoverable());
    assert!(!FingerError::ModuleCrash("m".into()).category().is_recoverable());
}

#[parameterized(
    enoent = { "spawn failed: ENOENT", "未找到可执行命令" },
    eacces = { "EACCES opening file", "权限不足" },
    timeout = { "operation timed out", "执行超时" },
)]
fn humanized_failures(raw: &str, expected: &str) {
    assert_eq!(humanize_tool_failure(raw), expected);
}

#[test]
fn humanized_fallback_includes_raw_text() {
    assert_eq!(humanize_tool_failure("boom"), "工具执行失败：boom");
}

#[test]
fn error_serializes_with_kind_tag() {
    let e = FingerError::ToolNotFound("grep".into());
    let v = serde_json::to_value(&e).unwrap();
    assert_eq!(v["kind"], "tool_not_found");
    assert_eq!(v["detail"], "grep");
}
