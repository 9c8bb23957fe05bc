// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process environment: config resolution.

use gaffer_core::{Config, CoreError};
use std::path::PathBuf;

const CONFIG_ENV: &str = "GAFFERD_CONFIG";

/// Resolve the config path: `--config <path>` beats `$GAFFERD_CONFIG`.
pub fn config_path(args: &[String]) -> Option<PathBuf> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            return iter.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    std::env::var_os(CONFIG_ENV).map(PathBuf::from)
}

/// Load config from the resolved path, or defaults when none is given.
pub fn load_config(args: &[String]) -> Result<Config, CoreError> {
    match config_path(args) {
        Some(path) => {
            let text = std::fs::read_to_string(&path).map_err(|e| {
                CoreError::Validation(format!("cannot read config {}: {e}", path.display()))
            })?;
            Config::from_toml_str(&text)
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
