// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git mechanics behind a narrow seam.

use async_trait::async_trait;
use gaffer_core::MergeStrategy;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git operation failed: {0}")]
    Failed(String),
    #[error("merge conflict: {0}")]
    Conflict(String),
}

/// Result of a merge: the commit that landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub commit: String,
}

/// Worktree, diff, push, PR, and merge operations the core delegates.
///
/// `repo` is the repository name as registered with the core; resolving it
/// to a path or remote is the implementation's concern.
#[async_trait]
pub trait GitService: Send + Sync + 'static {
    async fn create_worktree(&self, repo: &str, branch: &str) -> Result<PathBuf, GitError>;

    async fn remove_worktree(&self, repo: &str, branch: &str) -> Result<(), GitError>;

    async fn diff(&self, repo: &str, branch: &str) -> Result<String, GitError>;

    async fn push(&self, repo: &str, branch: &str) -> Result<(), GitError>;

    async fn open_pr(&self, repo: &str, branch: &str, title: &str) -> Result<String, GitError>;

    /// Merge `branch` into the repository's default branch.
    async fn merge(
        &self,
        repo: &str,
        branch: &str,
        strategy: MergeStrategy,
    ) -> Result<MergeOutcome, GitError>;
}
