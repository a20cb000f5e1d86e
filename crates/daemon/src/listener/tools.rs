// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool-surface request handlers.

use crate::lifecycle::Daemon;
use crate::protocol::{Request, Response, ToolInfo};
use fg_runtime::{GrantSpec, ToolPolicy};

pub(crate) async fn handle(daemon: &Daemon, request: Request) -> Response {
    let tools = &daemon.tools;
    match request {
        Request::ToolList => {
            let infos = tools
                .registry()
                .snapshot()
                .iter()
                .map(|def| ToolInfo {
                    name: def.name.clone(),
                    description: def.description.clone(),
                    policy: def.policy.to_string(),
                    authorization_required: tools.authorization().is_required(&def.name),
                })
                .collect();
            Response::Tools { tools: infos }
        }
        Request::ToolSetPolicy { name, policy } => {
            let policy = match policy.as_str() {
                "allow" => ToolPolicy::Allow,
                "deny" => ToolPolicy::Deny,
                other => {
                    return Response::Error {
                        code: 400,
                        message: format!("unknown policy: {other}"),
                    }
                }
            };
            match tools.registry().set_policy(&name, policy) {
                Ok(()) => Response::Ok,
                Err(e) => Response::from_error(&e),
            }
        }
        Request::ToolSetAuthorization { name, required } => {
            tools.authorization().set_tool_required(&name, required);
            Response::Ok
        }
        Request::ToolGrantIssue { agent_id, tool_name, issued_by, ttl_ms, max_uses } => {
            let grant = tools.authorization().issue(
                &agent_id,
                &tool_name,
                &issued_by,
                GrantSpec { ttl_ms, max_uses },
            );
            Response::Grant { grant }
        }
        Request::ToolGrantRevoke { token } => {
            if tools.authorization().revoke(&token) {
                Response::Ok
            } else {
                Response::Error { code: 400, message: format!("unknown token: {token}") }
            }
        }
        Request::ToolGrantList => Response::Grants { grants: tools.authorization().grants() },
        Request::ToolExecute { agent_id, tool_name, input, authorization_token } => {
            match tools
                .execute(&agent_id, &tool_name, input, authorization_token.as_deref())
                .await
            {
                Ok(result) => Response::ToolResult { result },
                Err(e) => Response::from_error(&e),
            }
        }
        Request::AgentPolicyGet { agent_id } => {
            let policy = tools.access().policy(&agent_id);
            Response::AgentPolicy {
                agent_id,
                whitelist: policy.whitelist.into_iter().collect(),
                blacklist: policy.blacklist.into_iter().collect(),
            }
        }
        Request::AgentPolicySet { agent_id, whitelist, blacklist } => {
            tools.access().set_whitelist(&agent_id, whitelist);
            for tool in blacklist {
                tools.access().deny(&agent_id, &tool);
            }
            Response::Ok
        }
        Request::AgentToolGrant { agent_id, tool_name } => {
            tools.access().grant(&agent_id, &tool_name);
            Response::Ok
        }
        Request::AgentToolRevoke { agent_id, tool_name } => {
            tools.access().revoke(&agent_id, &tool_name);
            Response::Ok
        }
        Request::AgentToolDeny { agent_id, tool_name } => {
            tools.access().deny(&agent_id, &tool_name);
            Response::Ok
        }
        Request::AgentToolAllow { agent_id, tool_name } => {
            tools.access().allow(&agent_id, &tool_name);
            Response::Ok
        }
        other => Response::Error {
            code: 400,
            message: format!("not a tool request: {other:?}"),
        },
    }
}
