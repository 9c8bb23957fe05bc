// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent work sessions and their accumulated usage.

use crate::cost::{Cost, TokenUsage};
use crate::id::{AgentId, SessionId, TaskId};
use serde::{Deserialize, Serialize};

/// One bounded unit of agent work.
///
/// At most one open session (null `ended_at_ms`) exists per agent; cost is
/// monotonically non-decreasing until the session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub agent_id: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<u64>,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.ended_at_ms.is_none()
    }
}
