// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_returns_increasing_time() {
    let clock = SystemClock;
    let t1 = clock.now();
    std::thread::sleep(Duration::from_millis(1));
    let t2 = clock.now();
    assert!(t2 > t1);
}

#[test]
fn fake_clock_advances_instant_and_epoch_together() {
    let clock = FakeClock::new();
    let e1 = Clock::epoch_ms(&clock);
    let t1 = clock.now();
    clock.advance(Duration::from_secs(60));
    assert!(clock.now().duration_since(t1) >= Duration::from_secs(60));
    assert_eq!(Clock::epoch_ms(&clock), e1 + 60_000);
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    clock2.advance_ms(30_000);
    assert_eq!(Clock::epoch_ms(&clock1), 1_000_000 + 30_000);
}

#[test]
fn fake_clock_set_epoch_ms() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(5);
    assert_eq!(Clock::epoch_ms(&clock), 5);
}

#[test]
fn epoch_millis_is_object_safe() {
    let shared: std::sync::Arc<dyn EpochMillis> = std::sync::Arc::new(FakeClock::new());
    assert_eq!(shared.epoch_ms(), 1_000_000);
}
