// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed tables and per-entity sequences.

use gaffer_core::{
    Agent, AgentId, AgentRole, AgentStatus, CommentId, CoreError, HumanRequest, MergeJob,
    MergeJobId, MergeJobStatus, Message, MessageId, Organization, OrgId, Participant, RepoId,
    Repository, RequestId, RequestStatus, Review, ReviewId, Session, SessionId, Task, TaskId,
    Team, TeamId, WebhookDelivery,
};
use gaffer_core::review::ReviewComment;
use std::collections::{BTreeMap, HashMap};

/// All persisted entity state. Cloned wholesale by transactions, so every
/// field must stay cheap-ish to clone; the event log lives outside.
#[derive(Debug, Default, Clone)]
pub struct Tables {
    pub orgs: HashMap<OrgId, Organization>,
    pub teams: HashMap<TeamId, Team>,
    pub agents: HashMap<AgentId, Agent>,
    pub repos: HashMap<RepoId, Repository>,
    pub webhook_deliveries: Vec<WebhookDelivery>,
    pub tasks: BTreeMap<TaskId, Task>,
    pub messages: BTreeMap<MessageId, Message>,
    pub human_requests: BTreeMap<RequestId, HumanRequest>,
    pub sessions: BTreeMap<SessionId, Session>,
    pub reviews: BTreeMap<ReviewId, Review>,
    pub review_comments: BTreeMap<CommentId, ReviewComment>,
    pub merge_jobs: BTreeMap<MergeJobId, MergeJob>,
    pub(crate) seqs: Sequences,
}

/// Per-entity insert counters. The next assigned id is `counter + 1`,
/// so id 0 never appears.
#[derive(Debug, Default, Clone)]
pub(crate) struct Sequences {
    pub task: u64,
    pub message: u64,
    pub request: u64,
    pub session: u64,
    pub review: u64,
    pub comment: u64,
    pub merge_job: u64,
}

impl Tables {
    // ── Lookups ──────────────────────────────────────────────────────────

    pub fn require_team(&self, id: TeamId) -> Result<&Team, CoreError> {
        self.teams.get(&id).ok_or_else(|| CoreError::not_found("team", id))
    }

    pub fn require_agent(&self, id: AgentId) -> Result<&Agent, CoreError> {
        self.agents.get(&id).ok_or_else(|| CoreError::not_found("agent", id))
    }

    pub fn require_agent_mut(&mut self, id: AgentId) -> Result<&mut Agent, CoreError> {
        self.agents.get_mut(&id).ok_or_else(|| CoreError::not_found("agent", id))
    }

    pub fn require_repo(&self, id: RepoId) -> Result<&Repository, CoreError> {
        self.repos.get(&id).ok_or_else(|| CoreError::not_found("repository", id))
    }

    pub fn require_task(&self, id: TaskId) -> Result<&Task, CoreError> {
        self.tasks.get(&id).ok_or_else(|| CoreError::not_found("task", id))
    }

    pub fn require_task_mut(&mut self, id: TaskId) -> Result<&mut Task, CoreError> {
        self.tasks.get_mut(&id).ok_or_else(|| CoreError::not_found("task", id))
    }

    pub fn require_message_mut(&mut self, id: MessageId) -> Result<&mut Message, CoreError> {
        self.messages.get_mut(&id).ok_or_else(|| CoreError::not_found("message", id))
    }

    pub fn require_request(&self, id: RequestId) -> Result<&HumanRequest, CoreError> {
        self.human_requests.get(&id).ok_or_else(|| CoreError::not_found("human request", id))
    }

    pub fn require_request_mut(&mut self, id: RequestId) -> Result<&mut HumanRequest, CoreError> {
        self.human_requests.get_mut(&id).ok_or_else(|| CoreError::not_found("human request", id))
    }

    pub fn require_session(&self, id: SessionId) -> Result<&Session, CoreError> {
        self.sessions.get(&id).ok_or_else(|| CoreError::not_found("session", id))
    }

    pub fn require_session_mut(&mut self, id: SessionId) -> Result<&mut Session, CoreError> {
        self.sessions.get_mut(&id).ok_or_else(|| CoreError::not_found("session", id))
    }

    pub fn require_review(&self, id: ReviewId) -> Result<&Review, CoreError> {
        self.reviews.get(&id).ok_or_else(|| CoreError::not_found("review", id))
    }

    pub fn require_review_mut(&mut self, id: ReviewId) -> Result<&mut Review, CoreError> {
        self.reviews.get_mut(&id).ok_or_else(|| CoreError::not_found("review", id))
    }

    pub fn require_merge_job_mut(&mut self, id: MergeJobId) -> Result<&mut MergeJob, CoreError> {
        self.merge_jobs.get_mut(&id).ok_or_else(|| CoreError::not_found("merge job", id))
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Inbox of a recipient, FIFO by message id.
    pub fn inbox_of(
        &self,
        recipient: &Participant,
        unprocessed_only: bool,
        limit: Option<usize>,
    ) -> Vec<Message> {
        self.messages
            .values()
            .filter(|m| &m.recipient == recipient)
            .filter(|m| !unprocessed_only || !m.is_processed())
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// The open session for an agent, if any.
    pub fn open_session_of(&self, agent_id: AgentId) -> Option<&Session> {
        self.sessions.values().find(|s| s.agent_id == agent_id && s.is_open())
    }

    pub fn agents_of_team(&self, team_id: TeamId) -> impl Iterator<Item = &Agent> {
        self.agents.values().filter(move |a| a.team_id == team_id)
    }

    /// An idle reviewer agent on the team, lowest id first for determinism.
    pub fn idle_reviewer_of_team(&self, team_id: TeamId) -> Option<&Agent> {
        let mut reviewers: Vec<&Agent> = self
            .agents
            .values()
            .filter(|a| {
                a.team_id == team_id
                    && a.role == AgentRole::Reviewer
                    && a.status == AgentStatus::Idle
            })
            .collect();
        reviewers.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        reviewers.into_iter().next()
    }

    /// Reviews for a task, ascending by attempt.
    pub fn reviews_of_task(&self, task_id: TaskId) -> Vec<&Review> {
        let mut reviews: Vec<&Review> =
            self.reviews.values().filter(|r| r.task_id == task_id).collect();
        reviews.sort_by_key(|r| r.attempt);
        reviews
    }

    /// The highest attempt number recorded for a task (0 when none).
    pub fn latest_attempt_of_task(&self, task_id: TaskId) -> u32 {
        self.reviews_of_task(task_id).last().map(|r| r.attempt).unwrap_or(0)
    }

    pub fn comments_of_review(&self, review_id: ReviewId) -> Vec<&ReviewComment> {
        self.review_comments.values().filter(|c| c.review_id == review_id).collect()
    }

    /// Pending human requests whose timeout has passed.
    pub fn expirable_requests(&self, now_ms: u64) -> Vec<RequestId> {
        self.human_requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending && r.is_past_timeout(now_ms))
            .map(|r| r.id)
            .collect()
    }

    /// The oldest queued merge job, if any.
    pub fn next_queued_merge_job(&self) -> Option<&MergeJob> {
        self.merge_jobs.values().find(|j| j.status == MergeJobStatus::Queued)
    }

    // ── Sequences ────────────────────────────────────────────────────────

    pub fn next_task_id(&mut self) -> TaskId {
        self.seqs.task += 1;
        TaskId(self.seqs.task)
    }

    pub fn next_message_id(&mut self) -> MessageId {
        self.seqs.message += 1;
        MessageId(self.seqs.message)
    }

    pub fn next_request_id(&mut self) -> RequestId {
        self.seqs.request += 1;
        RequestId(self.seqs.request)
    }

    pub fn next_session_id(&mut self) -> SessionId {
        self.seqs.session += 1;
        SessionId(self.seqs.session)
    }

    pub fn next_review_id(&mut self) -> ReviewId {
        self.seqs.review += 1;
        ReviewId(self.seqs.review)
    }

    pub fn next_comment_id(&mut self) -> CommentId {
        self.seqs.comment += 1;
        CommentId(self.seqs.comment)
    }

    pub fn next_merge_job_id(&mut self) -> MergeJobId {
        self.seqs.merge_job += 1;
        MergeJobId(self.seqs.merge_job)
    }
}
