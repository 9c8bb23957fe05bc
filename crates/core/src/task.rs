// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task entity and state machine.

use crate::id::{AgentId, RepoId, TaskId, TeamId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Status of a task. Transitions are restricted to [`TaskStatus::allowed_targets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    InApproval,
    Merging,
    Done,
    Cancelled,
}

crate::simple_display! {
    TaskStatus {
        Todo => "todo",
        InProgress => "in_progress",
        InReview => "in_review",
        InApproval => "in_approval",
        Merging => "merging",
        Done => "done",
        Cancelled => "cancelled",
    }
}

impl TaskStatus {
    /// The transition table. Terminal statuses have no targets.
    pub fn allowed_targets(&self) -> &'static [TaskStatus] {
        use TaskStatus::*;
        match self {
            Todo => &[InProgress, Cancelled],
            InProgress => &[InReview, Todo, Cancelled],
            InReview => &[InApproval, InProgress, Cancelled],
            InApproval => &[Merging, InProgress, Cancelled],
            Merging => &[Done, InProgress],
            Done => &[],
            Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        self.allowed_targets().contains(&to)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

crate::simple_display! {
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// A unit of work routed to agents.
///
/// Mutated only by the task engine; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub team_id: TeamId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    /// Directly responsible individual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dri: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<AgentId>,
    /// Ordered set of tasks that must reach `done` before this one may start.
    #[serde(default)]
    pub depends_on: IndexSet<TaskId>,
    #[serde(default)]
    pub repo_ids: Vec<RepoId>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Derived once at creation, stable thereafter.
    pub branch: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
}

impl Task {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Derive a branch slug from a title.
///
/// Lowercases, replaces each run of characters outside `[a-z0-9]` with a
/// single `-`, truncates to `max_len` bytes, and strips leading/trailing `-`.
pub fn slug(title: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_run = false;
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    // Output is ASCII at this point, so byte truncation is char-safe.
    out.truncate(max_len);
    out.trim_matches('-').to_string()
}

/// Derive the branch name for a task: `{prefix}task-{id}-{slug}`.
///
/// An empty slug (e.g. an all-punctuation title) omits the trailing segment.
pub fn branch_name(prefix: &str, id: TaskId, title: &str, slug_max_len: usize) -> String {
    let s = slug(title, slug_max_len);
    if s.is_empty() {
        format!("{prefix}task-{id}")
    } else {
        format!("{prefix}task-{id}-{s}")
    }
}

crate::builder! {
    pub struct TaskBuilder => Task {
        into {
            title: String = "test task",
            description: String = "",
            branch: String = "task-1-test-task",
        }
        set {
            id: TaskId = TaskId(1),
            team_id: TeamId = TeamId::from_string("team-test"),
            status: TaskStatus = TaskStatus::Todo,
            priority: Priority = Priority::Medium,
            depends_on: IndexSet<TaskId> = IndexSet::new(),
            repo_ids: Vec<RepoId> = Vec::new(),
            tags: BTreeSet<String> = BTreeSet::new(),
            metadata: BTreeMap<String, serde_json::Value> = BTreeMap::new(),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            dri: AgentId = None,
            assignee: AgentId = None,
            completed_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
