// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable inbox messages.

use crate::id::{MessageId, TaskId, TeamId};
use crate::tenant::Participant;
use serde::{Deserialize, Serialize};

/// One entry in a recipient's inbox.
///
/// Never deleted. Timestamps are set in order:
/// `delivered_at_ms` on insert, `seen_at_ms` when the recipient reads the
/// inbox, `processed_at_ms` when the recipient declares the message handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub team_id: TeamId,
    pub sender: Participant,
    pub recipient: Participant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub content: String,
    pub delivered_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seen_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at_ms: Option<u64>,
}

impl Message {
    pub fn is_processed(&self) -> bool {
        self.processed_at_ms.is_some()
    }
}
