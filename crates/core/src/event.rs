// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event taxonomy and record shape for the append-only log.
//!
//! Bodies serialize as internally tagged JSON (`{"type": "task.created", ...}`).
//! Records persist the serialized value verbatim, so payloads carrying fields
//! this build does not know about survive a round trip untouched; decoding an
//! unknown type tag yields [`EventBody::Unknown`].

use crate::cost::Cost;
use crate::error::BudgetCapKind;
use crate::human::RequestKind;
use crate::id::{
    AgentId, CommentId, EventId, MergeJobId, MessageId, RepoId, RequestId, ReviewId, SessionId,
    TaskId, TeamId,
};
use crate::review::{MergeStrategy, Verdict};
use crate::task::{Priority, TaskStatus};
use crate::tenant::Participant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifies the causal history an event belongs to, e.g. `task:42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    pub fn task(id: TaskId) -> Self {
        Self(format!("task:{id}"))
    }

    pub fn team(id: TeamId) -> Self {
        Self(format!("team:{id}"))
    }

    pub fn agent(id: AgentId) -> Self {
        Self(format!("agent:{id}"))
    }

    pub fn review(id: ReviewId) -> Self {
        Self(format!("review:{id}"))
    }

    pub fn session(id: SessionId) -> Self {
        Self(format!("session:{id}"))
    }

    pub fn request(id: RequestId) -> Self {
        Self(format!("request:{id}"))
    }

    pub fn merge(id: MergeJobId) -> Self {
        Self(format!("merge:{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who caused an event, and which request chain it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
}

impl EventMeta {
    pub fn actor(actor: impl Into<String>) -> Self {
        Self { actor: Some(actor.into()), ..Self::default() }
    }
}

/// Typed event payloads.
///
/// Serializes with `{"type": "task.created", ...fields}` format.
/// Unknown type tags deserialize to `Unknown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventBody {
    // -- task --
    #[serde(rename = "task.created")]
    TaskCreated {
        task_id: TaskId,
        team_id: TeamId,
        title: String,
        branch: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        depends_on: Vec<TaskId>,
        priority: Priority,
    },

    #[serde(rename = "task.updated")]
    TaskUpdated {
        task_id: TaskId,
        /// Only the fields that changed, by name.
        changed: BTreeMap<String, serde_json::Value>,
    },

    #[serde(rename = "task.assigned")]
    TaskAssigned {
        task_id: TaskId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<AgentId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<AgentId>,
    },

    #[serde(rename = "task.status_changed")]
    TaskStatusChanged {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor: Option<String>,
    },

    #[serde(rename = "task.comment_added")]
    TaskCommentAdded { task_id: TaskId, author: Participant, content: String },

    // -- message --
    #[serde(rename = "message.sent")]
    MessageSent {
        message_id: MessageId,
        team_id: TeamId,
        sender: Participant,
        recipient: Participant,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<TaskId>,
    },

    // -- session --
    #[serde(rename = "session.started")]
    SessionStarted {
        session_id: SessionId,
        agent_id: AgentId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<TaskId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },

    #[serde(rename = "session.usage_recorded")]
    SessionUsageRecorded {
        session_id: SessionId,
        tokens_in: u64,
        tokens_out: u64,
        cache_read: u64,
        cache_write: u64,
        /// Cost of this delta alone.
        cost_delta: Cost,
        /// Accumulated session cost after this delta.
        cost_total: Cost,
    },

    #[serde(rename = "session.ended")]
    SessionEnded {
        session_id: SessionId,
        agent_id: AgentId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "agent.budget_exceeded")]
    AgentBudgetExceeded {
        agent_id: AgentId,
        team_id: TeamId,
        cap: BudgetCapKind,
        spent: Cost,
        limit: Cost,
    },

    #[serde(rename = "cost.unknown_model")]
    CostUnknownModel { session_id: SessionId, model: String },

    // -- human loop --
    #[serde(rename = "human_request.created")]
    HumanRequestCreated {
        request_id: RequestId,
        agent_id: AgentId,
        kind: RequestKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<TaskId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_at_ms: Option<u64>,
    },

    #[serde(rename = "human_request.resolved")]
    HumanRequestResolved { request_id: RequestId, agent_id: AgentId, responder: String },

    #[serde(rename = "human_request.expired")]
    HumanRequestExpired { request_id: RequestId, agent_id: AgentId },

    // -- review --
    #[serde(rename = "review.created")]
    ReviewCreated {
        review_id: ReviewId,
        task_id: TaskId,
        attempt: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reviewer: Option<Participant>,
    },

    #[serde(rename = "review.comment_added")]
    ReviewCommentAdded {
        review_id: ReviewId,
        comment_id: CommentId,
        author: Participant,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line_number: Option<u32>,
    },

    #[serde(rename = "review.verdict")]
    ReviewVerdict { review_id: ReviewId, task_id: TaskId, verdict: Verdict, reviewer: String },

    #[serde(rename = "review.feedback_sent")]
    ReviewFeedbackSent {
        review_id: ReviewId,
        task_id: TaskId,
        message_id: MessageId,
        recipient: AgentId,
    },

    // -- merge --
    #[serde(rename = "merge.queued")]
    MergeQueued { job_id: MergeJobId, task_id: TaskId, repo_id: RepoId, strategy: MergeStrategy },

    #[serde(rename = "merge.started")]
    MergeStarted { job_id: MergeJobId, task_id: TaskId },

    #[serde(rename = "merge.completed")]
    MergeCompleted { job_id: MergeJobId, task_id: TaskId, commit: String },

    #[serde(rename = "merge.failed")]
    MergeFailed { job_id: MergeJobId, task_id: TaskId, error: String },

    // -- settings --
    #[serde(rename = "settings.updated")]
    SettingsUpdated { team_id: TeamId, changed: BTreeMap<String, serde_json::Value> },

    /// Catch-all for unknown event types (forward compatibility).
    #[serde(other, skip_serializing)]
    Unknown,
}

impl EventBody {
    /// The type tag this body serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            EventBody::TaskCreated { .. } => "task.created",
            EventBody::TaskUpdated { .. } => "task.updated",
            EventBody::TaskAssigned { .. } => "task.assigned",
            EventBody::TaskStatusChanged { .. } => "task.status_changed",
            EventBody::TaskCommentAdded { .. } => "task.comment_added",
            EventBody::MessageSent { .. } => "message.sent",
            EventBody::SessionStarted { .. } => "session.started",
            EventBody::SessionUsageRecorded { .. } => "session.usage_recorded",
            EventBody::SessionEnded { .. } => "session.ended",
            EventBody::AgentBudgetExceeded { .. } => "agent.budget_exceeded",
            EventBody::CostUnknownModel { .. } => "cost.unknown_model",
            EventBody::HumanRequestCreated { .. } => "human_request.created",
            EventBody::HumanRequestResolved { .. } => "human_request.resolved",
            EventBody::HumanRequestExpired { .. } => "human_request.expired",
            EventBody::ReviewCreated { .. } => "review.created",
            EventBody::ReviewCommentAdded { .. } => "review.comment_added",
            EventBody::ReviewVerdict { .. } => "review.verdict",
            EventBody::ReviewFeedbackSent { .. } => "review.feedback_sent",
            EventBody::MergeQueued { .. } => "merge.queued",
            EventBody::MergeStarted { .. } => "merge.started",
            EventBody::MergeCompleted { .. } => "merge.completed",
            EventBody::MergeFailed { .. } => "merge.failed",
            EventBody::SettingsUpdated { .. } => "settings.updated",
            EventBody::Unknown => "unknown",
        }
    }
}

/// One persisted entry of the append-only log.
///
/// Once committed, a record is never updated, deleted, or reordered; the
/// records sharing a stream id, read in id order, are the authoritative
/// causal history of that entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub stream_id: StreamId,
    /// The serialized body, kept verbatim.
    pub data: serde_json::Value,
    #[serde(default)]
    pub metadata: EventMeta,
    pub created_at_ms: u64,
}

impl EventRecord {
    /// The type tag, read straight off the payload.
    pub fn kind(&self) -> &str {
        self.data.get("type").and_then(|v| v.as_str()).unwrap_or("unknown")
    }

    /// Decode the payload into the typed taxonomy.
    ///
    /// Unknown type tags decode to [`EventBody::Unknown`]; the raw payload
    /// stays available in `data`.
    pub fn body(&self) -> EventBody {
        serde_json::from_value(self.data.clone()).unwrap_or(EventBody::Unknown)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
