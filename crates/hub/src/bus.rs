// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus: typed emission, grouped subscription, bounded history.
//!
//! Handlers run sequentially per event, outside the bus lock so they may
//! emit further events. A failing handler is logged and isolated: it
//! suppresses neither the other handlers nor the history store.

use fg_core::clock::SystemClock;
use fg_core::error::FingerError;
use fg_core::event::{Event, EventDraft, EventGroup};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

type Subscriber = Arc<dyn Fn(&Event) -> Result<(), FingerError> + Send + Sync>;

struct BusState {
    history: VecDeque<Event>,
    by_type: Vec<(String, Subscriber)>,
    by_group: Vec<(EventGroup, Subscriber)>,
}

struct BusInner {
    capacity: usize,
    now_ms: Box<dyn Fn() -> u64 + Send + Sync>,
    state: Mutex<BusState>,
}

/// Process-wide event bus. Cheap to clone.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

/// History query filter; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub event_type: Option<String>,
    pub group: Option<EventGroup>,
    pub session_id: Option<String>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        use fg_core::clock::Clock;
        let clock = SystemClock;
        Self::with_now_fn(capacity, move || clock.epoch_ms())
    }

    /// Inject the time source (tests pair this with `FakeClock`).
    pub fn with_now_fn(capacity: usize, now_ms: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(BusInner {
                capacity,
                now_ms: Box::new(now_ms),
                state: Mutex::new(BusState {
                    history: VecDeque::with_capacity(capacity.min(64)),
                    by_type: Vec::new(),
                    by_group: Vec::new(),
                }),
            }),
        }
    }

    /// Emit an event: store it (evicting the oldest past capacity), then run
    /// matching subscribers sequentially. Returns the stored event.
    pub fn emit(&self, draft: EventDraft) -> Event {
        let event = draft.into_event((self.inner.now_ms)());

        let subscribers: Vec<Subscriber> = {
            let mut state = self.inner.state.lock();
            if state.history.len() >= self.inner.capacity {
                state.history.pop_front();
            }
            state.history.push_back(event.clone());

            state
                .by_type
                .iter()
                .filter(|(t, _)| *t == event.event_type)
                .map(|(_, s)| Arc::clone(s))
                .chain(
                    state
                        .by_group
                        .iter()
                        .filter(|(g, _)| *g == event.group)
                        .map(|(_, s)| Arc::clone(s)),
                )
                .collect()
        };

        for subscriber in subscribers {
            if let Err(e) = subscriber(&event) {
                warn!(event_type = %event.event_type, error = %e, "event subscriber failed");
            }
        }
        event
    }

    pub fn subscribe_by_type(
        &self,
        event_type: impl Into<String>,
        handler: impl Fn(&Event) -> Result<(), FingerError> + Send + Sync + 'static,
    ) {
        self.inner.state.lock().by_type.push((event_type.into(), Arc::new(handler)));
    }

    pub fn subscribe_by_group(
        &self,
        group: EventGroup,
        handler: impl Fn(&Event) -> Result<(), FingerError> + Send + Sync + 'static,
    ) {
        self.inner.state.lock().by_group.push((group, Arc::new(handler)));
    }

    /// Stored events matching the filter, oldest first, capped at `limit`
    /// (0 = no cap).
    pub fn history(&self, filter: &HistoryFilter, limit: usize) -> Vec<Event> {
        let state = self.inner.state.lock();
        let mut out: Vec<Event> = state
            .history
            .iter()
            .filter(|e| {
                filter.event_type.as_ref().map_or(true, |t| *t == e.event_type)
                    && filter.group.map_or(true, |g| g == e.group)
                    && filter
                        .session_id
                        .as_ref()
                        .map_or(true, |s| e.session_id.as_ref().map(|x| x.as_str()) == Some(s))
            })
            .cloned()
            .collect();
        if limit > 0 && out.len() > limit {
            // Keep the most recent `limit` events.
            out.drain(..out.len() - limit);
        }
        out
    }

    pub fn history_len(&self) -> usize {
        self.inner.state.lock().history.len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
