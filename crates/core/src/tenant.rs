// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tenant hierarchy: organizations, teams, agents, repositories.
//!
//! These records are created by administrative operations and are immutable
//! except for agent status and team settings.

use crate::cost::Cost;
use crate::id::{AgentId, OrgId, RepoId, TeamId, WebhookId};
use crate::review::MergeStrategy;
use serde::{Deserialize, Serialize};

/// An actor that can send or receive messages: an agent or a human user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub kind: ParticipantKind,
    pub id: String,
}

impl Participant {
    pub fn agent(id: AgentId) -> Self {
        Self { kind: ParticipantKind::Agent, id: id.as_str().to_string() }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self { kind: ParticipantKind::User, id: id.into() }
    }

    /// The agent id, when this participant is an agent.
    pub fn agent_id(&self) -> Option<AgentId> {
        match self.kind {
            ParticipantKind::Agent => Some(AgentId::from_string(&self.id)),
            ParticipantKind::User => None,
        }
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Agent,
    User,
}

crate::simple_display! {
    ParticipantKind {
        Agent => "agent",
        User => "user",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    pub created_at_ms: u64,
}

/// Per-team policy knobs. Budget caps here override the config defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_cap: Option<Cost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_task_cap: Option<Cost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(default)]
    pub auto_merge: bool,
    #[serde(default)]
    pub merge_strategy: MergeStrategy,
    /// Prepended to derived branch names; falls back to the config value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_prefix: Option<String>,
    /// Prefer an agent reviewer when a review is requested without one.
    #[serde(default)]
    pub prefer_agent_review: bool,
    /// Free-form team conventions handed to agents with each turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conventions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub org_id: OrgId,
    pub name: String,
    pub settings: TeamSettings,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Manager,
    Engineer,
    Reviewer,
}

crate::simple_display! {
    AgentRole {
        Manager => "manager",
        Engineer => "engineer",
        Reviewer => "reviewer",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Working,
    Paused,
    Error,
}

impl AgentStatus {
    /// Whether the dispatcher may hand this agent a turn.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, AgentStatus::Idle | AgentStatus::Working)
    }
}

crate::simple_display! {
    AgentStatus {
        Idle => "idle",
        Working => "working",
        Paused => "paused",
        Error => "error",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub team_id: TeamId,
    pub name: String,
    pub role: AgentRole,
    pub status: AgentStatus,
    /// Tag naming the external runner (e.g. "claude", "codex").
    pub adapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepoId,
    pub team_id: TeamId,
    pub name: String,
    pub default_branch: String,
    pub created_at_ms: u64,
}

/// A webhook delivery recorded by the ingestion layer; the core only lists these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: WebhookId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    /// Origin system, e.g. "github".
    pub source: String,
    /// Event name as reported by the origin.
    pub event: String,
    pub payload: serde_json::Value,
    pub received_at_ms: u64,
}
