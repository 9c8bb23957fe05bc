// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording fakes for tests.

use crate::agent::{AdapterError, AgentAdapter, TurnOutput, TurnRequest};
use crate::git::{GitError, GitService, MergeOutcome};
use async_trait::async_trait;
use gaffer_core::{MergeStrategy, TokenUsage};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::time::Duration;

/// Agent adapter that sleeps, records every request, and answers with a
/// fixed usage delta. `fail_times(n)` scripts the next `n` turns to error.
#[derive(Debug)]
pub struct FakeAgent {
    delay: Duration,
    usage: TokenUsage,
    calls: Mutex<Vec<TurnRequest>>,
    failures_left: Mutex<u32>,
}

impl Default for FakeAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAgent {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            usage: TokenUsage { input: 100, output: 50, cache_read: 0, cache_write: 0 },
            calls: Mutex::new(Vec::new()),
            failures_left: Mutex::new(0),
        }
    }

    /// Sleep this long on every turn (simulates a slow runner).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Script the next `n` turns to fail with a process error.
    pub fn fail_times(self, n: u32) -> Self {
        *self.failures_left.lock() = n;
        self
    }

    pub fn calls(&self) -> Vec<TurnRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl AgentAdapter for FakeAgent {
    async fn run_turn(&self, request: TurnRequest) -> Result<TurnOutput, AdapterError> {
        let agent_id = request.agent_id;
        // Record before the sleep so tests can observe an in-flight turn.
        self.calls.lock().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        {
            let mut failures = self.failures_left.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(AdapterError::ProcessFailed("scripted failure".to_string()));
            }
        }
        Ok(TurnOutput { output: format!("ack from {agent_id}"), usage: self.usage })
    }
}

/// Git service that records merges and mints deterministic commit hashes.
/// `fail_merges(n)` scripts the next `n` merges to conflict.
pub struct FakeGit {
    merges: Mutex<Vec<(String, String, MergeStrategy)>>,
    failures_left: Mutex<u32>,
}

impl Default for FakeGit {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGit {
    pub fn new() -> Self {
        Self { merges: Mutex::new(Vec::new()), failures_left: Mutex::new(0) }
    }

    /// Script the next `n` merges to fail with a conflict.
    pub fn fail_merges(self, n: u32) -> Self {
        *self.failures_left.lock() = n;
        self
    }

    pub fn merges(&self) -> Vec<(String, String, MergeStrategy)> {
        self.merges.lock().clone()
    }
}

#[async_trait]
impl GitService for FakeGit {
    async fn create_worktree(&self, repo: &str, branch: &str) -> Result<PathBuf, GitError> {
        Ok(PathBuf::from(format!("/tmp/worktrees/{repo}/{branch}")))
    }

    async fn remove_worktree(&self, _repo: &str, _branch: &str) -> Result<(), GitError> {
        Ok(())
    }

    async fn diff(&self, _repo: &str, _branch: &str) -> Result<String, GitError> {
        Ok(String::new())
    }

    async fn push(&self, _repo: &str, _branch: &str) -> Result<(), GitError> {
        Ok(())
    }

    async fn open_pr(&self, repo: &str, branch: &str, _title: &str) -> Result<String, GitError> {
        Ok(format!("https://example.test/{repo}/pr/{branch}"))
    }

    async fn merge(
        &self,
        repo: &str,
        branch: &str,
        strategy: MergeStrategy,
    ) -> Result<MergeOutcome, GitError> {
        {
            let mut failures = self.failures_left.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(GitError::Conflict("scripted conflict".to_string()));
            }
        }
        let mut merges = self.merges.lock();
        merges.push((repo.to_string(), branch.to_string(), strategy));
        Ok(MergeOutcome { commit: format!("deadbeef{:08}", merges.len()) })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
