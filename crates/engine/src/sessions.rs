// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session ledger: per-agent work units, cost accrual, and budget gating.

use gaffer_core::{
    AgentId, AgentStatus, BudgetCapKind, Clock, Config, CoreError, Cost, EventBody, EventMeta,
    EventRecord, Session, SessionId, StreamId, TaskId, TeamId, TokenUsage,
};
use gaffer_storage::{Store, Tables};
use serde::Serialize;
use std::sync::Arc;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Snapshot returned by `check_budget`.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub daily_cap: Option<Cost>,
    pub daily_spent: Cost,
    pub daily_remaining: Option<Cost>,
    pub task_cap: Option<Cost>,
    pub task_spent: Option<Cost>,
    pub over_budget: bool,
}

/// Aggregate spend for a team over a trailing window of days.
#[derive(Debug, Clone, Serialize)]
pub struct CostSummary {
    pub team_id: TeamId,
    pub days: u32,
    pub total_cost: Cost,
    pub usage: TokenUsage,
    pub sessions: usize,
}

#[derive(Clone)]
pub struct SessionLedger<C: Clock> {
    store: Store,
    clock: C,
    config: Arc<Config>,
}

impl<C: Clock> SessionLedger<C> {
    pub fn new(store: Store, clock: C, config: Arc<Config>) -> Self {
        Self { store, clock, config }
    }

    /// Open a session, refusing with `BudgetExceeded` when a cap is already
    /// reached. The refusal itself commits an `agent.budget_exceeded` event.
    pub fn start_session(
        &self,
        agent_id: AgentId,
        task_id: Option<TaskId>,
        model: Option<String>,
    ) -> Result<Session, CoreError> {
        let opened = self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let agent = txn.tables.require_agent(agent_id)?.clone();
            let team = txn.tables.require_team(agent.team_id)?.clone();
            if let Some(open) = txn.tables.open_session_of(agent_id) {
                return Err(CoreError::Conflict(format!(
                    "agent {agent_id} already has open session {}",
                    open.id
                )));
            }
            if let Some(task_id) = task_id {
                txn.tables.require_task(task_id)?;
            }

            let daily_cap = team.settings.daily_cap.or(self.config.budgets.team_daily_cap);
            if let Some(cap) = daily_cap {
                let spent = daily_spend(txn.tables, txn.committed_events(), team.id, now);
                if spent >= cap {
                    txn.append(
                        StreamId::agent(agent_id),
                        &EventBody::AgentBudgetExceeded {
                            agent_id,
                            team_id: team.id,
                            cap: BudgetCapKind::TeamDaily,
                            spent,
                            limit: cap,
                        },
                        EventMeta::default(),
                    )?;
                    return Ok(Err(CoreError::BudgetExceeded {
                        cap: BudgetCapKind::TeamDaily,
                        spent,
                        limit: cap,
                    }));
                }
            }
            let per_task_cap = team.settings.per_task_cap.or(self.config.budgets.per_task_cap);
            if let (Some(task_id), Some(cap)) = (task_id, per_task_cap) {
                let spent = task_spend(txn.tables, txn.committed_events(), task_id);
                if spent >= cap {
                    txn.append(
                        StreamId::agent(agent_id),
                        &EventBody::AgentBudgetExceeded {
                            agent_id,
                            team_id: team.id,
                            cap: BudgetCapKind::PerTask,
                            spent,
                            limit: cap,
                        },
                        EventMeta::default(),
                    )?;
                    return Ok(Err(CoreError::BudgetExceeded {
                        cap: BudgetCapKind::PerTask,
                        spent,
                        limit: cap,
                    }));
                }
            }

            let model = model.or(agent.model.clone()).or(team.settings.default_model.clone());
            let id = txn.tables.next_session_id();
            let session = Session {
                id,
                agent_id,
                task_id,
                model: model.clone(),
                started_at_ms: now,
                ended_at_ms: None,
                usage: TokenUsage::default(),
                cost: Cost::ZERO,
                error: None,
            };
            txn.tables.sessions.insert(id, session.clone());
            txn.tables.require_agent_mut(agent_id)?.status = AgentStatus::Working;
            txn.append(
                StreamId::session(id),
                &EventBody::SessionStarted { session_id: id, agent_id, task_id, model },
                EventMeta::default(),
            )?;
            Ok(Ok(session))
        })?;
        opened
    }

    /// Add a usage delta and recompute cost. Negative deltas are rejected;
    /// an unpriced model records at zero cost plus a `cost.unknown_model`
    /// event, never failing the record.
    pub fn record_usage(
        &self,
        session_id: SessionId,
        tokens_in: i64,
        tokens_out: i64,
        cache_read: i64,
        cache_write: i64,
    ) -> Result<Session, CoreError> {
        let delta = usage_from_signed(tokens_in, tokens_out, cache_read, cache_write)?;
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let session = txn.tables.require_session(session_id)?.clone();
            if !session.is_open() {
                return Err(CoreError::Conflict(format!("session {session_id} already ended")));
            }
            let price = session.model.as_deref().and_then(|m| self.config.price_for(m));
            let cost_delta = match price {
                Some(price) => price.cost_of(&delta),
                None => {
                    txn.append(
                        StreamId::session(session_id),
                        &EventBody::CostUnknownModel {
                            session_id,
                            model: session.model.clone().unwrap_or_default(),
                        },
                        EventMeta::default(),
                    )?;
                    Cost::ZERO
                }
            };
            let record = txn.tables.require_session_mut(session_id)?;
            record.usage.accumulate(&delta);
            record.cost = record.cost.saturating_add(cost_delta);
            let record = record.clone();
            txn.append(
                StreamId::session(session_id),
                &EventBody::SessionUsageRecorded {
                    session_id,
                    tokens_in: delta.input,
                    tokens_out: delta.output,
                    cache_read: delta.cache_read,
                    cache_write: delta.cache_write,
                    cost_delta,
                    cost_total: record.cost,
                },
                EventMeta::default(),
            )?;
            Ok(record)
        })
    }

    /// Close a session and restore the agent to idle (or error).
    pub fn end_session(
        &self,
        session_id: SessionId,
        error: Option<String>,
    ) -> Result<Session, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let session = txn.tables.require_session_mut(session_id)?;
            if !session.is_open() {
                return Err(CoreError::Conflict(format!("session {session_id} already ended")));
            }
            session.ended_at_ms = Some(now);
            session.error = error.clone();
            let session = session.clone();
            let agent = txn.tables.require_agent_mut(session.agent_id)?;
            agent.status =
                if error.is_some() { AgentStatus::Error } else { AgentStatus::Idle };
            txn.append(
                StreamId::session(session_id),
                &EventBody::SessionEnded { session_id, agent_id: session.agent_id, error },
                EventMeta::default(),
            )?;
            Ok(session)
        })
    }

    /// End whatever session the agent has open, if any. Used by the
    /// dispatcher to clean up after an abandoned (timed-out) turn.
    pub fn end_open_session(
        &self,
        agent_id: AgentId,
        error: &str,
    ) -> Result<Option<Session>, CoreError> {
        let open = self.store.read(|t| t.open_session_of(agent_id).map(|s| s.id));
        match open {
            Some(id) => self.end_session(id, Some(error.to_string())).map(Some),
            None => Ok(None),
        }
    }

    /// Non-mutating view of the caps and spend `start_session` would see.
    pub fn check_budget(
        &self,
        agent_id: AgentId,
        task_id: Option<TaskId>,
    ) -> Result<BudgetStatus, CoreError> {
        // A no-op transaction gives a consistent view of tables and events.
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let agent = txn.tables.require_agent(agent_id)?.clone();
            let team = txn.tables.require_team(agent.team_id)?.clone();
            let daily_cap = team.settings.daily_cap.or(self.config.budgets.team_daily_cap);
            let per_task_cap = team.settings.per_task_cap.or(self.config.budgets.per_task_cap);
            let daily_spent = daily_spend(txn.tables, txn.committed_events(), team.id, now);
            let task_spent =
                task_id.map(|id| task_spend(txn.tables, txn.committed_events(), id));
            let over_daily = daily_cap.is_some_and(|cap| daily_spent >= cap);
            let over_task = match (task_spent, per_task_cap) {
                (Some(spent), Some(cap)) => spent >= cap,
                _ => false,
            };
            Ok(BudgetStatus {
                daily_cap,
                daily_spent,
                daily_remaining: daily_cap.map(|cap| daily_spent.remaining_until(cap)),
                task_cap: per_task_cap,
                task_spent,
                over_budget: over_daily || over_task,
            })
        })
    }

    pub fn get_session(&self, session_id: SessionId) -> Result<Session, CoreError> {
        self.store.read(|t| t.require_session(session_id).cloned())
    }

    /// Team spend over the trailing `days` window.
    pub fn cost_summary(&self, team_id: TeamId, days: u32) -> Result<CostSummary, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            txn.tables.require_team(team_id)?;
            let window_start = txn.now_ms().saturating_sub(u64::from(days) * DAY_MS);
            let mut total_cost = Cost::ZERO;
            let mut usage = TokenUsage::default();
            for event in txn.committed_events() {
                if event.created_at_ms <= window_start {
                    continue;
                }
                if let EventBody::SessionUsageRecorded {
                    session_id,
                    tokens_in,
                    tokens_out,
                    cache_read,
                    cache_write,
                    cost_delta,
                    ..
                } = event.body()
                {
                    if session_team(txn.tables, session_id) == Some(team_id) {
                        total_cost = total_cost.saturating_add(cost_delta);
                        usage.accumulate(&TokenUsage {
                            input: tokens_in,
                            output: tokens_out,
                            cache_read,
                            cache_write,
                        });
                    }
                }
            }
            let sessions = txn
                .tables
                .sessions
                .values()
                .filter(|s| s.started_at_ms > window_start)
                .filter(|s| {
                    txn.tables.agents.get(&s.agent_id).map(|a| a.team_id) == Some(team_id)
                })
                .count();
            Ok(CostSummary { team_id, days, total_cost, usage, sessions })
        })
    }
}

fn usage_from_signed(
    tokens_in: i64,
    tokens_out: i64,
    cache_read: i64,
    cache_write: i64,
) -> Result<TokenUsage, CoreError> {
    let field = |v: i64, name: &str| -> Result<u64, CoreError> {
        u64::try_from(v)
            .map_err(|_| CoreError::Validation(format!("negative usage delta: {name} = {v}")))
    };
    Ok(TokenUsage {
        input: field(tokens_in, "tokens_in")?,
        output: field(tokens_out, "tokens_out")?,
        cache_read: field(cache_read, "cache_read")?,
        cache_write: field(cache_write, "cache_write")?,
    })
}

fn session_team(tables: &Tables, session_id: SessionId) -> Option<TeamId> {
    let session = tables.sessions.get(&session_id)?;
    tables.agents.get(&session.agent_id).map(|a| a.team_id)
}

/// Sum of usage-event cost deltas for the team's agents over the trailing
/// 24 hours, judged by event commit time.
fn daily_spend(tables: &Tables, events: &[EventRecord], team_id: TeamId, now_ms: u64) -> Cost {
    let window_start = now_ms.saturating_sub(DAY_MS);
    let mut spent = Cost::ZERO;
    for event in events {
        if event.created_at_ms <= window_start {
            continue;
        }
        if let EventBody::SessionUsageRecorded { session_id, cost_delta, .. } = event.body() {
            if session_team(tables, session_id) == Some(team_id) {
                spent = spent.saturating_add(cost_delta);
            }
        }
    }
    spent
}

/// Lifetime spend attributed to one task, across all its sessions.
fn task_spend(tables: &Tables, events: &[EventRecord], task_id: TaskId) -> Cost {
    let mut spent = Cost::ZERO;
    for event in events {
        if let EventBody::SessionUsageRecorded { session_id, cost_delta, .. } = event.body() {
            let session_task = tables.sessions.get(&session_id).and_then(|s| s.task_id);
            if session_task == Some(task_id) {
                spent = spent.saturating_add(cost_delta);
            }
        }
    }
    spent
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
