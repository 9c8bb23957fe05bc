// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-originated requests for human input.

use crate::id::{AgentId, RequestId, TaskId, TeamId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Question,
    Approval,
    Review,
}

crate::simple_display! {
    RequestKind {
        Question => "question",
        Approval => "approval",
        Review => "review",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Resolved,
    Expired,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

crate::simple_display! {
    RequestStatus {
        Pending => "pending",
        Resolved => "resolved",
        Expired => "expired",
    }
}

/// A pending question, approval, or review request addressed to humans.
///
/// Exactly one terminal transition: pending → resolved or pending → expired.
/// `response` is non-null iff status is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanRequest {
    pub id: RequestId,
    pub team_id: TeamId,
    pub agent_id: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub kind: RequestKind,
    pub question: String,
    /// Enumerated choices, when the agent offers them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_at_ms: Option<u64>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at_ms: Option<u64>,
}

impl HumanRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn is_past_timeout(&self, now_ms: u64) -> bool {
        self.timeout_at_ms.is_some_and(|t| t <= now_ms)
    }
}
