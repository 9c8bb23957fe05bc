// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed error taxonomy surfaced by the core.
//!
//! Every operation returns one of these; the API collaborator maps each
//! variant to a transport code. `External` never carries collaborator error
//! text verbatim to end users; the engine records it as an event first.

use crate::cost::Cost;
use crate::id::TaskId;
use crate::task::TaskStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A dependency blocking the transition to `in_progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedDep {
    pub task_id: TaskId,
    /// `None` when the referenced task does not exist.
    pub status: Option<TaskStatus>,
}

impl std::fmt::Display for UnresolvedDep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}@{}", self.task_id, status),
            None => write!(f, "{}@missing", self.task_id),
        }
    }
}

/// Which budget cap refused a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCapKind {
    TeamDaily,
    PerTask,
}

crate::simple_display! {
    BudgetCapKind {
        TeamDaily => "team_daily",
        PerTask => "per_task",
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("dependencies unresolved: {}", format_deps(.0))]
    DependenciesUnresolved(Vec<UnresolvedDep>),

    #[error("budget exceeded ({cap}): spent {spent}, limit {limit}")]
    BudgetExceeded { cap: BudgetCapKind, spent: Cost, limit: Cost },

    #[error("validation: {0}")]
    Validation(String),

    #[error("concurrency: {0}")]
    Concurrency(String),

    #[error("external: {0}")]
    External(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound { entity, id: id.to_string() }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CoreError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn invalid_transition(from: TaskStatus, to: TaskStatus) -> Self {
        CoreError::Conflict(format!("invalid transition: {from} -> {to}"))
    }

    /// Transient errors that are safe to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Concurrency(_))
    }
}

fn format_deps(deps: &[UnresolvedDep]) -> String {
    let parts: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
    parts.join(", ")
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
