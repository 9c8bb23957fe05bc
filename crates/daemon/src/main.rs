// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gafferd: the Gaffer worker process.

use async_trait::async_trait;
use gaffer_adapters::{AdapterRegistry, GitError, GitService, MergeOutcome};
use gaffer_core::MergeStrategy;
use gaffer_daemon::{env, Daemon, DaemonDeps};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Placeholder until the deployment wires a real git collaborator. Every
/// operation fails cleanly, which the core records as `merge.failed` and
/// recovers from.
struct UnconfiguredGit;

#[async_trait]
impl GitService for UnconfiguredGit {
    async fn create_worktree(&self, _repo: &str, _branch: &str) -> Result<PathBuf, GitError> {
        Err(GitError::Failed("git service not configured".to_string()))
    }

    async fn remove_worktree(&self, _repo: &str, _branch: &str) -> Result<(), GitError> {
        Err(GitError::Failed("git service not configured".to_string()))
    }

    async fn diff(&self, _repo: &str, _branch: &str) -> Result<String, GitError> {
        Err(GitError::Failed("git service not configured".to_string()))
    }

    async fn push(&self, _repo: &str, _branch: &str) -> Result<(), GitError> {
        Err(GitError::Failed("git service not configured".to_string()))
    }

    async fn open_pr(&self, _repo: &str, _branch: &str, _title: &str) -> Result<String, GitError> {
        Err(GitError::Failed("git service not configured".to_string()))
    }

    async fn merge(
        &self,
        _repo: &str,
        _branch: &str,
        _strategy: MergeStrategy,
    ) -> Result<MergeOutcome, GitError> {
        Err(GitError::Failed("git service not configured".to_string()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match env::load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let registry = Arc::new(AdapterRegistry::new());
    if registry.is_empty() {
        tracing::warn!("no agent adapters registered; turns will fail until the deployment wires them");
    }
    let daemon = Daemon::new(config, DaemonDeps { registry, git: Arc::new(UnconfiguredGit) });

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received");
            signal_token.cancel();
        }
    });

    daemon.run(cancel).await;
    ExitCode::SUCCESS
}
