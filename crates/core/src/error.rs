// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the workspace.
//!
//! Every failure surfaced to a caller is one of these kinds. The split
//! matters operationally: validation/authorization/lookup errors are caller
//! mistakes and never retried, external errors feed the retry machinery,
//! fatal errors pause the originating module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds surfaced by the orchestration kernel.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FingerError {
    // -- validation --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    // -- authorization --
    #[error("tool denied: {0}")]
    ToolDenied(String),

    #[error("authorization required for tool: {0}")]
    AuthorizationRequired(String),

    #[error("authorization expired: {0}")]
    AuthorizationExpired(String),

    #[error("authorization scope mismatch: {0}")]
    AuthorizationScopeMismatch(String),

    // -- lookup --
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("agent not started: {0}")]
    AgentNotStarted(String),

    #[error("gateway not found: {0}")]
    GatewayNotFound(String),

    // -- contention --
    #[error("dispatch queued for: {0}")]
    DispatchQueued(String),

    #[error("dispatch deadlock: {0}")]
    DispatchDeadlock(String),

    // -- external --
    #[error("gateway ack timeout: {0}")]
    GatewayAckTimeout(String),

    #[error("gateway result timeout: {0}")]
    GatewayResultTimeout(String),

    #[error("provider failure: {0}")]
    ProviderFailure(String),

    // -- fatal --
    #[error("module crash: {0}")]
    ModuleCrash(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("auth failed: {0}")]
    AuthFailed(String),

    // -- cancellation --
    #[error("dispatch cancelled: {0}")]
    DispatchCancelled(String),

    #[error("gateway cancelled: {0}")]
    GatewayCancelled(String),

    // -- plumbing --
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(String),
}

impl FingerError {
    /// Status code bucket for protocol responses.
    pub fn code(&self) -> u16 {
        match self {
            FingerError::InvalidArgument(_)
            | FingerError::MissingField(_)
            | FingerError::ToolDenied(_)
            | FingerError::AuthorizationRequired(_)
            | FingerError::AuthorizationExpired(_)
            | FingerError::AuthorizationScopeMismatch(_)
            | FingerError::ModuleNotFound(_)
            | FingerError::ToolNotFound(_)
            | FingerError::AgentNotStarted(_)
            | FingerError::GatewayNotFound(_) => 400,
            FingerError::DispatchQueued(_) | FingerError::DispatchDeadlock(_) => 409,
            FingerError::DispatchCancelled(_) | FingerError::GatewayCancelled(_) => 499,
            FingerError::GatewayAckTimeout(_)
            | FingerError::GatewayResultTimeout(_)
            | FingerError::ProviderFailure(_)
            | FingerError::ModuleCrash(_)
            | FingerError::InvalidConfig(_)
            | FingerError::AuthFailed(_)
            | FingerError::Io(_)
            | FingerError::Serde(_) => 500,
        }
    }

    /// Category used by the error handler's retry classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FingerError::GatewayAckTimeout(_) | FingerError::GatewayResultTimeout(_) => {
                ErrorCategory::Timeout
            }
            FingerError::ProviderFailure(_) => ErrorCategory::Network,
            FingerError::ModuleCrash(_) => ErrorCategory::ModuleCrash,
            FingerError::InvalidConfig(_) => ErrorCategory::InvalidConfig,
            FingerError::AuthFailed(_) => ErrorCategory::AuthFailed,
            _ => ErrorCategory::Unknown,
        }
    }
}

impl From<std::io::Error> for FingerError {
    fn from(e: std::io::Error) -> Self {
        FingerError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for FingerError {
    fn from(e: serde_json::Error) -> Self {
        FingerError::Serde(e.to_string())
    }
}

/// Error categories for retry classification.
///
/// Unknown defaults to unrecoverable: a failure we cannot classify is not
/// worth hammering on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Timeout,
    RateLimit,
    ResourceExhausted,
    AuthFailed,
    InvalidConfig,
    ModuleCrash,
    Unknown,
}

impl ErrorCategory {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::RateLimit
                | ErrorCategory::ResourceExhausted
        )
    }

    pub fn parse(s: &str) -> ErrorCategory {
        match s {
            "network" => ErrorCategory::Network,
            "timeout" => ErrorCategory::Timeout,
            "rate_limit" => ErrorCategory::RateLimit,
            "resource_exhausted" => ErrorCategory::ResourceExhausted,
            "auth_failed" => ErrorCategory::AuthFailed,
            "invalid_config" => ErrorCategory::InvalidConfig,
            "module_crash" => ErrorCategory::ModuleCrash,
            _ => ErrorCategory::Unknown,
        }
    }
}

crate::simple_display! {
    ErrorCategory {
        Network => "network",
        Timeout => "timeout",
        RateLimit => "rate_limit",
        ResourceExhausted => "resource_exhausted",
        AuthFailed => "auth_failed",
        InvalidConfig => "invalid_config",
        ModuleCrash => "module_crash",
        Unknown => "unknown",
    }
}

/// User-visible failure text for tool execution.
pub fn humanize_tool_failure(raw: &str) -> String {
    if raw.contains("ENOENT") {
        "未找到可执行命令".to_string()
    } else if raw.contains("EACCES") {
        "权限不足".to_string()
    } else if raw.contains("timeout") || raw.contains("timed out") {
        "执行超时".to_string()
    } else {
        format!("工具执行失败：{raw}")
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
