// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One live gateway child process.
//!
//! A session owns the child's stdio: one framing reader task over stdout,
//! one writer mutex over stdin, and a watcher that reports process exit.
//! Requests correlate by id through a pending map; stopping the session
//! resolves every in-flight request with `GatewayCancelled`.

use crate::envelope::{DeliveryMode, Envelope};
use crate::manifest::GatewayManifest;
use fg_core::error::FingerError;
use fg_core::event::{EventDraft, EventGroup};
use fg_core::message::HubMessage;
use fg_hub::MessageHub;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Called when the child exits: `(gateway_id, exit_code)`.
pub(crate) type ExitFn = Arc<dyn Fn(&str, Option<i32>) + Send + Sync>;

struct AckReply {
    accepted: bool,
    message: Option<String>,
}

struct ResultReply {
    success: bool,
    output: Option<Value>,
    error: Option<String>,
}

#[derive(Default)]
struct Pending {
    acks: HashMap<String, oneshot::Sender<AckReply>>,
    results: HashMap<String, oneshot::Sender<ResultReply>>,
}

pub struct GatewaySession {
    manifest: GatewayManifest,
    stdin: tokio::sync::Mutex<ChildStdin>,
    pending: Arc<Mutex<Pending>>,
    cancel: CancellationToken,
}

impl GatewaySession {
    /// Spawn the child and start its reader/watcher tasks.
    pub fn spawn(
        manifest: GatewayManifest,
        hub: MessageHub,
        on_exit: ExitFn,
    ) -> Result<Arc<Self>, FingerError> {
        let spec = &manifest.process;
        let mut command = Command::new(&spec.command);
        command
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        for (k, v) in &spec.env {
            command.env(k, v);
        }

        let mut child = command
            .spawn()
            .map_err(|e| FingerError::GatewayNotFound(format!("{}: {e}", manifest.id)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FingerError::ModuleCrash(format!("{}: no stdin", manifest.id)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FingerError::ModuleCrash(format!("{}: no stdout", manifest.id)))?;
        let stderr = child.stderr.take();

        let session = Arc::new(Self {
            manifest,
            stdin: tokio::sync::Mutex::new(stdin),
            pending: Arc::new(Mutex::new(Pending::default())),
            cancel: CancellationToken::new(),
        });

        session.clone().start_reader(hub, stdout);
        session.clone().start_watcher(child, on_exit);
        if let Some(stderr) = stderr {
            let id = session.manifest.id.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(gateway = %id, "stderr: {line}");
                }
            });
        }

        info!(gateway = %session.manifest.id, "gateway session started");
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn manifest(&self) -> &GatewayManifest {
        &self.manifest
    }

    /// Send a request envelope and await the protocol outcome.
    ///
    /// Every request must be acked within `ack_timeout_ms`; sync requests
    /// must then produce a result within `request_timeout_ms`. Async
    /// requests resolve on the ack.
    pub async fn request(&self, message: Value, mode: DeliveryMode) -> Result<Value, FingerError> {
        let request_id = format!("gwr-{}", nanoid::nanoid!(12));
        let (ack_tx, ack_rx) = oneshot::channel();
        let (result_tx, result_rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock();
            pending.acks.insert(request_id.clone(), ack_tx);
            pending.results.insert(request_id.clone(), result_tx);
        }

        let envelope = Envelope::Request {
            request_id: request_id.clone(),
            delivery_mode: mode,
            message,
            metadata: Value::Null,
        };
        if let Err(e) = self.write_envelope(&envelope).await {
            self.forget(&request_id);
            return Err(e);
        }

        let ack_timeout = Duration::from_millis(self.manifest.process.ack_timeout_ms);
        let ack = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.forget(&request_id);
                return Err(FingerError::GatewayCancelled(self.manifest.id.clone()));
            }
            outcome = tokio::time::timeout(ack_timeout, ack_rx) => match outcome {
                Err(_) => {
                    self.forget(&request_id);
                    return Err(FingerError::GatewayAckTimeout(self.manifest.id.clone()));
                }
                Ok(Err(_)) => {
                    // Sender dropped: session stopped underneath us.
                    return Err(FingerError::GatewayCancelled(self.manifest.id.clone()));
                }
                Ok(Ok(ack)) => ack,
            },
        };

        if !ack.accepted {
            self.forget(&request_id);
            return Err(FingerError::ProviderFailure(
                ack.message.unwrap_or_else(|| format!("{} refused request", self.manifest.id)),
            ));
        }

        if mode == DeliveryMode::Async {
            self.forget(&request_id);
            return Ok(json!({"accepted": true, "request_id": request_id}));
        }

        let result_timeout = Duration::from_millis(self.manifest.process.request_timeout_ms);
        let reply = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.forget(&request_id);
                return Err(FingerError::GatewayCancelled(self.manifest.id.clone()));
            }
            outcome = tokio::time::timeout(result_timeout, result_rx) => match outcome {
                Err(_) => {
                    self.forget(&request_id);
                    return Err(FingerError::GatewayResultTimeout(self.manifest.id.clone()));
                }
                Ok(Err(_)) => return Err(FingerError::GatewayCancelled(self.manifest.id.clone())),
                Ok(Ok(reply)) => reply,
            },
        };

        if reply.success {
            Ok(reply.output.unwrap_or(Value::Null))
        } else {
            Err(FingerError::ProviderFailure(
                reply.error.unwrap_or_else(|| format!("{} reported failure", self.manifest.id)),
            ))
        }
    }

    /// Stop the session: cancel in-flight requests and kill the child.
    pub fn stop(&self) {
        self.cancel.cancel();
        let mut pending = self.pending.lock();
        pending.acks.clear();
        pending.results.clear();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn write_envelope(&self, envelope: &Envelope) -> Result<(), FingerError> {
        let line = envelope.to_line()?;
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    fn forget(&self, request_id: &str) {
        let mut pending = self.pending.lock();
        pending.acks.remove(request_id);
        pending.results.remove(request_id);
    }

    fn start_reader(self: Arc<Self>, hub: MessageHub, stdout: tokio::process::ChildStdout) {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                let line = tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    line = lines.next_line() => line,
                };
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) | Err(_) => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                let envelope = match Envelope::from_line(&line) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!(gateway = %self.manifest.id, error = %e, "bad envelope line");
                        continue;
                    }
                };
                self.dispatch_inbound(&hub, envelope);
            }
        });
    }

    fn dispatch_inbound(self: &Arc<Self>, hub: &MessageHub, envelope: Envelope) {
        match envelope {
            Envelope::Ack { request_id, accepted, message } => {
                let tx = self.pending.lock().acks.remove(&request_id);
                if let Some(tx) = tx {
                    let _ = tx.send(AckReply { accepted, message });
                }
            }
            Envelope::Result { request_id, success, output, error } => {
                let tx = self.pending.lock().results.remove(&request_id);
                if let Some(tx) = tx {
                    let _ = tx.send(ResultReply { success, output, error });
                }
            }
            Envelope::Input { request_id, target, sender, blocking, message } => {
                let session = Arc::clone(self);
                let hub = hub.clone();
                tokio::spawn(async move {
                    session.handle_input(hub, request_id, target, sender, blocking, message).await;
                });
            }
            Envelope::Event { name, payload } => {
                hub.bus().emit(
                    EventDraft::new(name, EventGroup::System).with_payload(
                        json!({"gateway": self.manifest.id, "payload": payload}),
                    ),
                );
            }
            Envelope::Request { .. } => {
                warn!(gateway = %self.manifest.id, "child sent a request envelope, ignoring");
            }
        }
    }

    /// Route a child-initiated `input` envelope into the hub; when the
    /// child asked for a blocking round-trip, write the result back keyed
    /// by the inbound request id.
    async fn handle_input(
        self: Arc<Self>,
        hub: MessageHub,
        request_id: Option<String>,
        target: Option<String>,
        sender: Option<String>,
        blocking: bool,
        message: Value,
    ) {
        let mut msg: HubMessage = match serde_json::from_value(message.clone()) {
            Ok(msg) => msg,
            Err(_) => HubMessage::with_payload("gateway_input", message),
        };
        if msg.source.is_none() {
            msg.source = sender.or_else(|| Some(self.manifest.id.clone()));
        }

        let target = target.or_else(|| self.manifest.default_target.clone());
        let outcome = match target {
            Some(target) => hub.send_to_module(&target, msg).await,
            None => match hub.send(msg).await {
                Ok(fg_hub::SendOutcome::Delivered(v)) => Ok(v.unwrap_or(Value::Null)),
                Ok(fg_hub::SendOutcome::Queued) => Ok(json!({"queued": true})),
                Err(e) => Err(e),
            },
        };

        if !blocking {
            if let Err(e) = &outcome {
                warn!(gateway = %self.manifest.id, error = %e, "inbound input failed");
            }
            return;
        }

        let Some(request_id) = request_id else {
            warn!(gateway = %self.manifest.id, "blocking input without request_id");
            return;
        };
        let reply = match outcome {
            Ok(output) => Envelope::Result {
                request_id,
                success: true,
                output: Some(output),
                error: None,
            },
            Err(e) => Envelope::Result {
                request_id,
                success: false,
                output: None,
                error: Some(e.to_string()),
            },
        };
        if let Err(e) = self.write_envelope(&reply).await {
            warn!(gateway = %self.manifest.id, error = %e, "failed to answer blocking input");
        }
    }

    fn start_watcher(self: Arc<Self>, mut child: Child, on_exit: ExitFn) {
        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status.ok(),
                _ = self.cancel.cancelled() => {
                    let _ = child.kill().await;
                    child.wait().await.ok()
                }
            };
            // Drop any remaining waiters so they observe cancellation.
            {
                let mut pending = self.pending.lock();
                pending.acks.clear();
                pending.results.clear();
            }
            let code = status.and_then(|s| s.code());
            if !self.cancel.is_cancelled() {
                info!(gateway = %self.manifest.id, exit_code = ?code, "gateway child exited");
                on_exit(&self.manifest.id, code);
            }
            self.cancel.cancel();
        });
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
