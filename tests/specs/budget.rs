// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S6 — budget refusal at exactly the daily cap.

use super::support::{harness_with, Harness};
use gaffer_core::{BudgetCapKind, Config, CoreError, Cost, ModelPrice};

/// "test-model" priced at 1.0 per million input tokens: one input token
/// costs exactly one micro-unit of currency.
fn capped_harness(daily_cap_micros: i64) -> Harness {
    let mut config = Config::default();
    config.prices.insert(
        "test-model".to_string(),
        ModelPrice { input: Cost::from_micros(1_000_000), ..ModelPrice::default() },
    );
    config.budgets.team_daily_cap = Some(Cost::from_micros(daily_cap_micros));
    harness_with(config)
}

#[test]
fn s6_budget_refusal_at_exactly_the_cap() {
    let h = capped_harness(1_000_000); // daily cap = 1.000000

    // Sessions totalling 0.999999.
    let session = h.ledger.start_session(h.engineer.id, None, None).unwrap();
    h.ledger.record_usage(session.id, 999_999, 0, 0, 0).unwrap();
    h.ledger.end_session(session.id, None).unwrap();

    // One millionth below the cap: StartSession succeeds.
    let session = h.ledger.start_session(h.engineer.id, None, None).unwrap();

    // Usage pushes the total to exactly 1.000000.
    h.ledger.record_usage(session.id, 1, 0, 0, 0).unwrap();
    h.ledger.end_session(session.id, None).unwrap();

    // Next StartSession refuses, naming the spend and the limit.
    let err = h.ledger.start_session(h.engineer.id, None, None).unwrap_err();
    match err {
        CoreError::BudgetExceeded { cap, spent, limit } => {
            assert_eq!(cap, BudgetCapKind::TeamDaily);
            assert_eq!(spent.to_string(), "1.000000");
            assert_eq!(limit.to_string(), "1.000000");
        }
        other => panic!("expected BudgetExceeded, got {other}"),
    }

    // The refusal is recorded for observability.
    assert_eq!(h.store.events_of_type("agent.budget_exceeded", None).len(), 1);
    // And the whole team is refused, not just the spending agent.
    assert!(h.ledger.start_session(h.reviewer.id, None, None).is_err());
}

#[test]
fn session_counters_match_usage_deltas() {
    let h = capped_harness(1_000_000_000);
    let session = h.ledger.start_session(h.engineer.id, None, None).unwrap();
    let deltas = [(100, 10, 5, 1), (200, 20, 0, 0), (1, 2, 3, 4)];
    for (a, b, c, d) in deltas {
        h.ledger.record_usage(session.id, a, b, c, d).unwrap();
    }
    let session = h.ledger.end_session(session.id, None).unwrap();
    assert_eq!(session.usage.input, 301);
    assert_eq!(session.usage.output, 32);
    assert_eq!(session.usage.cache_read, 8);
    assert_eq!(session.usage.cache_write, 5);
    // Cost equals the sum of the per-delta costs (input-only pricing).
    assert_eq!(session.cost, Cost::from_micros(301));

    // Cost was monotonically non-decreasing across the usage events.
    let mut last = Cost::ZERO;
    for event in h.store.events_of_type("session.usage_recorded", None) {
        if let gaffer_core::EventBody::SessionUsageRecorded { cost_total, .. } = event.body() {
            assert!(cost_total >= last);
            last = cost_total;
        }
    }
}

#[test]
fn one_open_session_per_agent() {
    let h = capped_harness(1_000_000_000);
    h.ledger.start_session(h.engineer.id, None, None).unwrap();
    assert!(matches!(
        h.ledger.start_session(h.engineer.id, None, None),
        Err(CoreError::Conflict(_))
    ));
}
