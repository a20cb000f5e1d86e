// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The listener accepts Unix-socket connections and serves framed
//! request/response exchanges without blocking the rest of the daemon.
//! A `Subscribe` request switches the connection into streaming mode:
//! matching events are pushed as frames until `Unsubscribe` or EOF.

mod handlers;
mod tools;

use crate::lifecycle::Daemon;
use crate::protocol::{read_message, write_message, Request, Response};
use fg_core::event::EventGroup;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Listener over the daemon's control socket.
pub struct Listener {
    unix: UnixListener,
    daemon: Arc<Daemon>,
    shutdown: CancellationToken,
}

impl Listener {
    pub fn new(unix: UnixListener, daemon: Arc<Daemon>, shutdown: CancellationToken) -> Self {
        Self { unix, daemon, shutdown }
    }

    /// Accept connections until shutdown, one task per connection.
    pub async fn run(self) {
        info!("listener started");
        loop {
            let accepted = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.unix.accept() => accepted,
            };
            match accepted {
                Ok((stream, _)) => {
                    let daemon = Arc::clone(&self.daemon);
                    let shutdown = self.shutdown.clone();
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, daemon, shutdown).await {
                            debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => error!(error = %e, "accept failed"),
            }
        }
        info!("listener stopped");
    }
}

/// Serve one connection.
///
/// All frames leave through one writer task fed by a channel, so streamed
/// events never race a request frame mid-read; the request loop itself
/// reads sequentially and only selects against shutdown between frames.
pub(crate) async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    daemon: Arc<Daemon>,
    shutdown: CancellationToken,
) -> Result<(), crate::protocol::ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Response>();
    let writer_task = tokio::spawn(async move {
        while let Some(response) = out_rx.recv().await {
            if write_message(&mut writer, &response).await.is_err() {
                break;
            }
        }
    });

    let subscription: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    let mut subscribed_groups: Vec<EventGroup> = Vec::new();

    loop {
        let incoming = tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = out_tx.send(Response::ShuttingDown);
                break;
            }
            incoming = read_message::<Request, _>(&mut reader) => incoming,
        };
        let Some(request) = incoming? else { break };

        let response = match request {
            Request::Subscribe { groups } => {
                let parsed: Vec<EventGroup> =
                    groups.iter().filter_map(|g| EventGroup::parse(g)).collect();
                install_subscription(&daemon, &parsed, &subscribed_groups, &subscription, &out_tx);
                for group in &parsed {
                    if !subscribed_groups.contains(group) {
                        subscribed_groups.push(*group);
                    }
                }
                subscription.store(true, Ordering::SeqCst);
                Response::SubscribeConfirmed {
                    groups: parsed.iter().map(|g| g.to_string()).collect(),
                }
            }
            Request::Unsubscribe => {
                subscription.store(false, Ordering::SeqCst);
                Response::UnsubscribeConfirmed
            }
            other => handlers::handle(&daemon, other).await,
        };

        let is_shutdown = matches!(response, Response::ShuttingDown);
        if out_tx.send(response).is_err() {
            break;
        }
        if is_shutdown {
            shutdown.cancel();
            break;
        }
    }

    subscription.store(false, Ordering::SeqCst);
    drop(out_tx);
    let _ = writer_task.await;
    Ok(())
}

/// Register bus subscribers forwarding matching events into this
/// connection's outbound channel. Groups already installed are skipped so
/// a repeated subscribe does not duplicate frames.
fn install_subscription(
    daemon: &Daemon,
    groups: &[EventGroup],
    already: &[EventGroup],
    active: &Arc<AtomicBool>,
    tx: &mpsc::UnboundedSender<Response>,
) {
    for group in groups {
        if already.contains(group) {
            continue;
        }
        let active = Arc::clone(active);
        let tx = tx.clone();
        daemon.bus.subscribe_by_group(*group, move |event| {
            if active.load(Ordering::SeqCst) {
                let _ = tx.send(Response::Event { event: event.clone() });
            }
            Ok(())
        });
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
