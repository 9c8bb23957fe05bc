// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

#[parameterized(
    whole = { "1", 1_000_000 },
    fractional = { "0.5", 500_000 },
    six_digits = { "1.000000", 1_000_000 },
    one_micro = { "0.000001", 1 },
    bare_fraction = { ".25", 250_000 },
    zero = { "0", 0 },
)]
fn parse_accepts(input: &str, micros: i64) {
    assert_eq!(Cost::parse(input).unwrap(), Cost::from_micros(micros));
}

#[parameterized(
    negative = { "-1" },
    seven_digits = { "0.0000001" },
    garbage = { "abc" },
    double_dot = { "1.2.3" },
)]
fn parse_rejects(input: &str) {
    assert!(Cost::parse(input).is_err());
}

#[test]
fn display_pads_six_digits() {
    assert_eq!(Cost::from_micros(1).to_string(), "0.000001");
    assert_eq!(Cost::from_micros(1_500_000).to_string(), "1.500000");
    assert_eq!(Cost::ZERO.to_string(), "0.000000");
}

#[test]
fn serde_round_trips_as_string() {
    let cost = Cost::from_micros(2_250_001);
    let json = serde_json::to_string(&cost).unwrap();
    assert_eq!(json, "\"2.250001\"");
    let back: Cost = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cost);
}

#[test]
fn deserializes_from_toml_float() {
    #[derive(serde::Deserialize)]
    struct Wrap {
        cap: Cost,
    }
    let w: Wrap = toml::from_str("cap = 1.5").unwrap();
    assert_eq!(w.cap, Cost::from_micros(1_500_000));
    let w: Wrap = toml::from_str("cap = 2").unwrap();
    assert_eq!(w.cap, Cost::from_micros(2_000_000));
}

#[test]
fn remaining_until_clamps_at_zero() {
    let spent = Cost::from_micros(1_200_000);
    let cap = Cost::from_micros(1_000_000);
    assert_eq!(spent.remaining_until(cap), Cost::ZERO);
    assert_eq!(cap.remaining_until(spent), Cost::from_micros(200_000));
}

#[test]
fn cost_of_rounds_toward_positive_infinity() {
    // 1 token at 1 micro per million tokens is far below one micro,
    // but record-time rounding is a ceiling.
    let price = ModelPrice { input: Cost::from_micros(1), ..ModelPrice::default() };
    let usage = TokenUsage { input: 1, ..TokenUsage::default() };
    assert_eq!(price.cost_of(&usage), Cost::from_micros(1));
}

#[test]
fn cost_of_exact_multiple_does_not_round_up() {
    // 3.00 per million input tokens, exactly one million tokens.
    let price = ModelPrice { input: Cost::from_micros(3_000_000), ..ModelPrice::default() };
    let usage = TokenUsage { input: 1_000_000, ..TokenUsage::default() };
    assert_eq!(price.cost_of(&usage), Cost::from_micros(3_000_000));
}

#[test]
fn cost_of_sums_all_components_before_rounding() {
    let price = ModelPrice {
        input: Cost::from_micros(1),
        output: Cost::from_micros(1),
        cache_read: Cost::from_micros(1),
        cache_write: Cost::from_micros(1),
    };
    let usage = TokenUsage { input: 250_000, output: 250_000, cache_read: 250_000, cache_write: 250_000 };
    // Four quarters of a micro sum to one micro exactly; a per-component
    // ceiling would have produced four.
    assert_eq!(price.cost_of(&usage), Cost::from_micros(1));
}

#[test]
fn zero_price_costs_nothing() {
    let usage = TokenUsage { input: 1_000_000, output: 1_000_000, ..TokenUsage::default() };
    assert_eq!(ModelPrice::default().cost_of(&usage), Cost::ZERO);
}

#[test]
fn accumulate_adds_componentwise() {
    let mut usage = TokenUsage { input: 1, output: 2, cache_read: 3, cache_write: 4 };
    usage.accumulate(&TokenUsage { input: 10, output: 20, cache_read: 30, cache_write: 40 });
    assert_eq!(usage, TokenUsage { input: 11, output: 22, cache_read: 33, cache_write: 44 });
    assert_eq!(usage.total(), 110);
}

proptest! {
    #[test]
    fn parse_display_round_trip(micros in 0i64..10_000_000_000) {
        let cost = Cost::from_micros(micros);
        prop_assert_eq!(Cost::parse(&cost.to_string()).unwrap(), cost);
    }

    #[test]
    fn cost_never_undercounts(tokens in 0u64..100_000_000, rate in 0i64..100_000_000) {
        let price = ModelPrice { input: Cost::from_micros(rate), ..ModelPrice::default() };
        let usage = TokenUsage { input: tokens, ..TokenUsage::default() };
        let exact = tokens as i128 * rate as i128;
        let charged = price.cost_of(&usage).micros() as i128 * 1_000_000;
        prop_assert!(charged >= exact);
        // Ceiling overshoots by less than one micro-unit.
        prop_assert!(charged - exact < 1_000_000);
    }
}
