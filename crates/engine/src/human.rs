// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-loop: lifecycle of agent-originated requests for human input.

use gaffer_core::{
    AgentId, Clock, Config, CoreError, EventBody, EventMeta, HumanRequest, RequestId, RequestKind,
    RequestStatus, StreamId, TaskId, TeamId,
};
use gaffer_storage::{Channel, Store};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const MINUTE_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub team_id: TeamId,
    pub agent_id: AgentId,
    pub kind: RequestKind,
    pub question: String,
    pub options: Vec<String>,
    pub task_id: Option<TaskId>,
    pub timeout_minutes: Option<u64>,
}

impl NewRequest {
    pub fn question(team_id: TeamId, agent_id: AgentId, question: impl Into<String>) -> Self {
        Self {
            team_id,
            agent_id,
            kind: RequestKind::Question,
            question: question.into(),
            options: Vec::new(),
            task_id: None,
            timeout_minutes: None,
        }
    }

    pub fn with_timeout_minutes(mut self, minutes: u64) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }
}

#[derive(Clone)]
pub struct HumanLoop<C: Clock> {
    store: Store,
    clock: C,
    config: Arc<Config>,
}

impl<C: Clock> HumanLoop<C> {
    pub fn new(store: Store, clock: C, config: Arc<Config>) -> Self {
        Self { store, clock, config }
    }

    pub fn create_request(&self, new: NewRequest) -> Result<HumanRequest, CoreError> {
        let question = new.question.trim().to_string();
        if question.is_empty() {
            return Err(CoreError::validation("question must not be empty"));
        }
        self.store.transact(self.clock.epoch_ms(), |txn| {
            txn.tables.require_team(new.team_id)?;
            txn.tables.require_agent(new.agent_id)?;
            if let Some(task_id) = new.task_id {
                txn.tables.require_task(task_id)?;
            }
            let id = txn.tables.next_request_id();
            let timeout_at_ms = new.timeout_minutes.map(|m| txn.now_ms() + m * MINUTE_MS);
            let request = HumanRequest {
                id,
                team_id: new.team_id,
                agent_id: new.agent_id,
                task_id: new.task_id,
                kind: new.kind,
                question: question.clone(),
                options: new.options.clone(),
                status: RequestStatus::Pending,
                response: None,
                responder: None,
                timeout_at_ms,
                created_at_ms: txn.now_ms(),
                resolved_at_ms: None,
            };
            txn.tables.human_requests.insert(id, request.clone());
            txn.append(
                StreamId::request(id),
                &EventBody::HumanRequestCreated {
                    request_id: id,
                    agent_id: new.agent_id,
                    kind: new.kind,
                    task_id: new.task_id,
                    timeout_at_ms,
                },
                EventMeta::default(),
            )?;
            Ok(request)
        })
    }

    /// Resolve a pending request. The waiting agent is re-dispatched via
    /// the `human_request_resolved` channel.
    pub fn respond(
        &self,
        request_id: RequestId,
        response: &str,
        responder: &str,
    ) -> Result<HumanRequest, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let request = txn.tables.require_request_mut(request_id)?;
            if request.status != RequestStatus::Pending {
                return Err(CoreError::Conflict(format!(
                    "human request {request_id} is already {}",
                    request.status
                )));
            }
            request.status = RequestStatus::Resolved;
            request.response = Some(response.to_string());
            request.responder = Some(responder.to_string());
            request.resolved_at_ms = Some(now);
            let request = request.clone();
            txn.append(
                StreamId::request(request_id),
                &EventBody::HumanRequestResolved {
                    request_id,
                    agent_id: request.agent_id,
                    responder: responder.to_string(),
                },
                EventMeta::actor(responder),
            )?;
            txn.notify(Channel::HumanRequestResolved, request.agent_id.as_str());
            Ok(request)
        })
    }

    /// Expire a pending request whose timeout has passed.
    ///
    /// Returns `Ok(false)` without an event when the request is already
    /// terminal, so poller races are harmless. A pending request whose
    /// timeout has not passed is a conflict.
    pub fn expire(&self, request_id: RequestId) -> Result<bool, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let request = txn.tables.require_request_mut(request_id)?;
            if request.status.is_terminal() {
                return Ok(false);
            }
            if !request.is_past_timeout(now) {
                return Err(CoreError::Conflict(format!(
                    "human request {request_id} has not passed its timeout"
                )));
            }
            request.status = RequestStatus::Expired;
            request.resolved_at_ms = Some(now);
            let agent_id = request.agent_id;
            txn.append(
                StreamId::request(request_id),
                &EventBody::HumanRequestExpired { request_id, agent_id },
                EventMeta::default(),
            )?;
            txn.notify(Channel::HumanRequestResolved, agent_id.as_str());
            Ok(true)
        })
    }

    /// Read one request by id. Direct keyed lookup so subprocess adapters
    /// can poll cheaply regardless of how many requests are pending.
    pub fn get(&self, request_id: RequestId) -> Result<HumanRequest, CoreError> {
        self.store.read(|t| t.require_request(request_id).cloned())
    }

    pub fn list(
        &self,
        team_id: TeamId,
        status: Option<RequestStatus>,
        agent_id: Option<AgentId>,
        task_id: Option<TaskId>,
    ) -> Vec<HumanRequest> {
        self.store.read(|t| {
            t.human_requests
                .values()
                .filter(|r| r.team_id == team_id)
                .filter(|r| status.is_none_or(|s| r.status == s))
                .filter(|r| agent_id.is_none_or(|a| r.agent_id == a))
                .filter(|r| task_id.is_none_or(|t| r.task_id == Some(t)))
                .cloned()
                .collect()
        })
    }

    /// Expire everything past its timeout. Returns the expired ids.
    pub fn expire_due(&self) -> Vec<RequestId> {
        let due = self.store.read(|t| t.expirable_requests(self.clock.epoch_ms()));
        let mut expired = Vec::new();
        for id in due {
            match self.expire(id) {
                Ok(true) => expired.push(id),
                Ok(false) => {}
                Err(e) => tracing::warn!(request = %id, error = %e, "expiry failed"),
            }
        }
        expired
    }

    /// Background loop expiring timed-out requests at the configured cadence.
    pub async fn run_expiry_poller(&self, cancel: CancellationToken) {
        let mut tick = tokio::time::interval(self.config.human_loop.expiry_poll_interval());
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    let expired = self.expire_due();
                    if !expired.is_empty() {
                        tracing::info!(count = expired.len(), "expired human requests");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "human_tests.rs"]
mod tests;
