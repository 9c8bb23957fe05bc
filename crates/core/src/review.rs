// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reviews, review comments, and merge jobs.

use crate::id::{CommentId, MergeJobId, RepoId, ReviewId, TaskId};
use crate::tenant::Participant;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    RequestChanges,
    Reject,
}

crate::simple_display! {
    Verdict {
        Approve => "approve",
        RequestChanges => "request_changes",
        Reject => "reject",
    }
}

/// One review attempt for a task. `attempt` is 1-based and unique per task;
/// `verdict` is null while the review is pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub task_id: TaskId,
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at_ms: Option<u64>,
}

impl Review {
    pub fn is_pending(&self) -> bool {
        self.verdict.is_none()
    }
}

/// A comment on a review, optionally anchored to a file and line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub id: CommentId,
    pub review_id: ReviewId,
    pub author: Participant,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    pub created_at_ms: u64,
}

impl ReviewComment {
    /// Render the `file:line — content` form used in feedback messages.
    pub fn feedback_line(&self) -> String {
        match (&self.file_path, self.line_number) {
            (Some(file), Some(line)) => format!("{}:{} \u{2014} {}", file, line, self.content),
            (Some(file), None) => format!("{} \u{2014} {}", file, self.content),
            _ => self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    Rebase,
    Merge,
    Squash,
}

impl Default for MergeStrategy {
    fn default() -> Self {
        MergeStrategy::Squash
    }
}

crate::simple_display! {
    MergeStrategy {
        Rebase => "rebase",
        Merge => "merge",
        Squash => "squash",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeJobStatus {
    Queued,
    Running,
    Success,
    Failed,
}

crate::simple_display! {
    MergeJobStatus {
        Queued => "queued",
        Running => "running",
        Success => "success",
        Failed => "failed",
    }
}

/// One merge of a task branch into one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeJob {
    pub id: MergeJobId,
    pub task_id: TaskId,
    pub repo_id: RepoId,
    pub status: MergeJobStatus,
    pub strategy: MergeStrategy,
    /// Merge commit hash, recorded on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
}
