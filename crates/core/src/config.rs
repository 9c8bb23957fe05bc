// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recognized configuration options, loadable from TOML.

use crate::cost::{Cost, ModelPrice};
use crate::error::CoreError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub human_loop: HumanLoopConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub budgets: BudgetsConfig,
    /// Price schedule keyed by model name.
    #[serde(default)]
    pub prices: BTreeMap<String, ModelPrice>,
    #[serde(default)]
    pub branching: BranchingConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Config, CoreError> {
        toml::from_str(s).map_err(|e| CoreError::Validation(format!("config: {e}")))
    }

    /// Rate card for a model; `None` when the model is unpriced.
    pub fn price_for(&self, model: &str) -> Option<&ModelPrice> {
        self.prices.get(model)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatcherConfig {
    #[serde(default = "default_max_concurrent_turns")]
    pub max_concurrent_turns: usize,
    #[serde(default = "default_fallback_poll_interval")]
    pub fallback_poll_interval_seconds: u64,
    #[serde(default = "default_turn_timeout")]
    pub turn_timeout_seconds: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_turns: default_max_concurrent_turns(),
            fallback_poll_interval_seconds: default_fallback_poll_interval(),
            turn_timeout_seconds: default_turn_timeout(),
        }
    }
}

impl DispatcherConfig {
    pub fn fallback_poll_interval(&self) -> Duration {
        Duration::from_secs(self.fallback_poll_interval_seconds)
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HumanLoopConfig {
    #[serde(default = "default_expiry_poll_interval")]
    pub expiry_poll_interval_seconds: u64,
}

impl Default for HumanLoopConfig {
    fn default() -> Self {
        Self { expiry_poll_interval_seconds: default_expiry_poll_interval() }
    }
}

impl HumanLoopConfig {
    pub fn expiry_poll_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_poll_interval_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    #[serde(default = "default_merge_job_timeout")]
    pub job_timeout_seconds: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { job_timeout_seconds: default_merge_job_timeout() }
    }
}

impl MergeConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_seconds)
    }
}

/// Default budget caps; absent means unlimited. Team settings override these.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetsConfig {
    #[serde(default)]
    pub team_daily_cap: Option<Cost>,
    #[serde(default)]
    pub per_task_cap: Option<Cost>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchingConfig {
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_slug_max_length")]
    pub slug_max_length: usize,
}

impl Default for BranchingConfig {
    fn default() -> Self {
        Self { prefix: String::new(), slug_max_length: default_slug_max_length() }
    }
}

fn default_max_concurrent_turns() -> usize {
    32
}

fn default_fallback_poll_interval() -> u64 {
    30
}

fn default_turn_timeout() -> u64 {
    3600
}

fn default_expiry_poll_interval() -> u64 {
    60
}

fn default_merge_job_timeout() -> u64 {
    600
}

fn default_slug_max_length() -> usize {
    50
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
