// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-point cost arithmetic and per-model price schedules.
//!
//! Costs carry six fractional digits (micro-currency). Token prices are
//! expressed in currency per million tokens; a usage delta is priced by
//! summing the exact per-component products and rounding the total toward
//! positive infinity once, at record time.

use serde::{Deserialize, Serialize};
use std::fmt;

const MICROS_PER_UNIT: i64 = 1_000_000;

/// A currency amount with six fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Cost(i64);

impl Cost {
    pub const ZERO: Cost = Cost(0);

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn micros(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Cost) -> Cost {
        Cost(self.0.saturating_add(other.0))
    }

    /// Difference clamped at zero (used for "remaining budget" displays).
    pub fn remaining_until(self, cap: Cost) -> Cost {
        Cost((cap.0 - self.0).max(0))
    }

    /// Parse a decimal currency string such as `"1.000000"` or `"0.5"`.
    ///
    /// At most six fractional digits are accepted; negative amounts are
    /// rejected.
    pub fn parse(s: &str) -> Result<Cost, String> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(format!("negative cost: {s:?}"));
        }
        let (units_str, frac_str) = match s.split_once('.') {
            Some((u, f)) => (u, f),
            None => (s, ""),
        };
        if frac_str.len() > 6 {
            return Err(format!("more than six fractional digits: {s:?}"));
        }
        let units: i64 = if units_str.is_empty() {
            0
        } else {
            units_str.parse().map_err(|_| format!("invalid cost: {s:?}"))?
        };
        let mut frac: i64 = 0;
        if !frac_str.is_empty() {
            frac = frac_str.parse().map_err(|_| format!("invalid cost: {s:?}"))?;
            for _ in frac_str.len()..6 {
                frac *= 10;
            }
        }
        units
            .checked_mul(MICROS_PER_UNIT)
            .and_then(|m| m.checked_add(frac))
            .map(Cost)
            .ok_or_else(|| format!("cost out of range: {s:?}"))
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:06}", sign, abs / MICROS_PER_UNIT as u64, abs % MICROS_PER_UNIT as u64)
    }
}

impl Serialize for Cost {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cost {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct CostVisitor;

        impl serde::de::Visitor<'_> for CostVisitor {
            type Value = Cost;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a currency amount as a string or number")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Cost, E> {
                Cost::parse(v).map_err(E::custom)
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Cost, E> {
                if !v.is_finite() || v < 0.0 {
                    return Err(E::custom(format!("invalid cost: {v}")));
                }
                Ok(Cost((v * MICROS_PER_UNIT as f64).round() as i64))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Cost, E> {
                (v as i64)
                    .checked_mul(MICROS_PER_UNIT)
                    .map(Cost)
                    .ok_or_else(|| E::custom(format!("cost out of range: {v}")))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Cost, E> {
                if v < 0 {
                    return Err(E::custom(format!("negative cost: {v}")));
                }
                self.visit_u64(v as u64)
            }
        }

        deserializer.deserialize_any(CostVisitor)
    }
}

/// Token counters for one session or one usage delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
}

impl TokenUsage {
    pub fn accumulate(&mut self, delta: &TokenUsage) {
        self.input += delta.input;
        self.output += delta.output;
        self.cache_read += delta.cache_read;
        self.cache_write += delta.cache_write;
    }

    pub fn total(&self) -> u64 {
        self.input + self.output + self.cache_read + self.cache_write
    }
}

/// Per-model token rates, in currency per million tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    #[serde(default)]
    pub input: Cost,
    #[serde(default)]
    pub output: Cost,
    #[serde(default)]
    pub cache_read: Cost,
    #[serde(default)]
    pub cache_write: Cost,
}

impl ModelPrice {
    /// Price a usage delta: exact micro-products summed, one ceiling at the end.
    pub fn cost_of(&self, usage: &TokenUsage) -> Cost {
        let exact: i128 = component(self.input, usage.input)
            + component(self.output, usage.output)
            + component(self.cache_read, usage.cache_read)
            + component(self.cache_write, usage.cache_write);
        Cost(ceil_div(exact, MICROS_PER_UNIT as i128) as i64)
    }
}

fn component(rate: Cost, tokens: u64) -> i128 {
    rate.micros() as i128 * tokens as i128
}

fn ceil_div(n: i128, d: i128) -> i128 {
    debug_assert!(d > 0);
    if n >= 0 {
        (n + d - 1) / d
    } else {
        n / d
    }
}

#[cfg(test)]
#[path = "cost_tests.rs"]
mod tests;
