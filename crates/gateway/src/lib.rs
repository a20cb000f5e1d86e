// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fg-gateway: external subprocess gateways speaking line-delimited JSON.
//!
//! Each enabled gateway manifest gets one long-lived child process. The
//! supervisor keeps the children healthy, registers a hub module per
//! gateway so routed messages reach the child, and forwards inbound
//! envelopes from the child back into the hub.

mod envelope;
mod manifest;
mod session;
mod supervisor;

pub use envelope::{DeliveryMode, Envelope};
pub use manifest::{load_dir, GatewayDirection, GatewayManifest, GatewayMode, ProcessSpec};
pub use session::GatewaySession;
pub use supervisor::{ExitCallback, GatewaySupervisor};
