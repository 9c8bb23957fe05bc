// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_starts_at_known_epoch() {
    let clock = FakeClock::new();
    assert_eq!(clock.epoch_ms(), 1_000_000);
}

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    clock.advance(Duration::from_secs(2));
    assert_eq!(clock.epoch_ms(), 1_002_000);
    clock.advance_ms(500);
    assert_eq!(clock.epoch_ms(), 1_002_500);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.set_epoch_ms(5_000_000);
    assert_eq!(other.epoch_ms(), 5_000_000);
}

#[test]
fn system_clock_is_past_2020() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 1_577_836_800_000);
}
