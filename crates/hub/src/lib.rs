// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fg-hub: in-process message hub, module registry, and event bus.
//!
//! The hub is the daemon's switchboard: modules register handlers, route
//! rules pattern-match messages to them, and the event bus fans lifecycle
//! events out to subscribers with a bounded history.

mod bus;
mod hub;
mod module;
mod registry;
mod route;

pub use bus::{EventBus, HistoryFilter, DEFAULT_HISTORY_CAPACITY};
pub use hub::{MessageHub, SendOutcome, DEFAULT_QUEUE_CAPACITY};
pub use module::{handler_fn, DefaultRoute, Module, ModuleHandler, ModuleKind};
pub use registry::{HandlerFactory, ManifestModule, ModuleRegistry};
pub use route::{Pattern, RouteRule, RouteSummary};
