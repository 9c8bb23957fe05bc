// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher: notifications in, bounded agent turns out.

use crate::runner::TurnRunner;
use crate::sessions::SessionLedger;
use gaffer_core::{AgentId, Clock, Config, CoreError, TaskId};
use gaffer_storage::{Channel, Notification, Store};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Long-lived worker that converts store notifications into agent turns.
///
/// Guarantees: at most `max_concurrent_turns` turns in flight; at most one
/// turn per agent (the turn mutex); a notification for an agent already in
/// turn is coalesced, relying on the runner's inbox re-read; lost
/// notifications are recovered by the fallback poll.
pub struct Dispatcher<C: Clock> {
    store: Store,
    config: Arc<Config>,
    runner: Arc<TurnRunner<C>>,
    ledger: SessionLedger<C>,
    inflight: Arc<Mutex<HashSet<AgentId>>>,
    limiter: Arc<Semaphore>,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(
        store: Store,
        config: Arc<Config>,
        runner: Arc<TurnRunner<C>>,
        ledger: SessionLedger<C>,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.dispatcher.max_concurrent_turns));
        Self {
            store,
            config,
            runner,
            ledger,
            inflight: Arc::new(Mutex::new(HashSet::new())),
            limiter,
        }
    }

    /// Run until cancelled, then drain in-flight turns within the grace
    /// period.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut rx = self.store.subscribe();
        let mut poll = tokio::time::interval(self.config.dispatcher.fallback_poll_interval());
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                notification = rx.recv() => match notification {
                    Ok(n) => self.handle_notification(n),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "notification backlog dropped, fallback poll will recover");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = poll.tick() => self.poll_pending(),
            }
        }
        self.drain().await;
    }

    /// True when no turn is in flight (drain completion).
    pub fn is_idle(&self) -> bool {
        self.inflight.lock().is_empty()
    }

    /// Explicitly request a turn (the API surface calls this).
    ///
    /// Returns the transient `Concurrency` error while the agent's turn
    /// mutex is held; the caller may retry once the running turn finishes.
    pub fn request_turn(&self, agent_id: AgentId) -> Result<(), CoreError> {
        if self.inflight.lock().contains(&agent_id) {
            return Err(CoreError::Concurrency(format!(
                "turn already in flight for agent {agent_id}"
            )));
        }
        self.try_dispatch(agent_id);
        Ok(())
    }

    fn handle_notification(&self, notification: Notification) {
        let agent_id = match notification.channel {
            // Payload is the recipient id; only agent recipients dispatch
            // (user recipients have no turns).
            Channel::NewMessage | Channel::HumanRequestResolved => notification
                .payload
                .starts_with(AgentId::PREFIX)
                .then(|| AgentId::from_string(&notification.payload)),
            // Payload is the task id; the assignee makes progress.
            Channel::TaskStatusChanged => notification
                .payload
                .parse::<u64>()
                .ok()
                .and_then(|id| self.store.read(|t| t.tasks.get(&TaskId(id)).and_then(|task| task.assignee))),
        };
        if let Some(agent_id) = agent_id {
            self.try_dispatch(agent_id);
        }
    }

    /// Scan for agents with unprocessed inbox entries and no in-flight
    /// turn. Makes notification loss non-fatal.
    fn poll_pending(&self) {
        let candidates: Vec<AgentId> = self.store.read(|t| {
            let mut seen = HashSet::new();
            t.messages
                .values()
                .filter(|m| !m.is_processed())
                .filter_map(|m| m.recipient.agent_id())
                .filter(|id| seen.insert(*id))
                .collect()
        });
        for agent_id in candidates {
            self.try_dispatch(agent_id);
        }
    }

    /// Start a turn worker for the agent unless one is already in flight.
    fn try_dispatch(&self, agent_id: AgentId) {
        let dispatchable = self
            .store
            .read(|t| t.agents.get(&agent_id).map(|a| a.status.is_dispatchable()));
        match dispatchable {
            Some(true) => {}
            Some(false) => {
                tracing::debug!(agent = %agent_id, "not dispatchable, skipping");
                return;
            }
            None => return,
        }
        {
            let mut inflight = self.inflight.lock();
            if !inflight.insert(agent_id) {
                // Coalesced: the running turn re-reads the inbox on exit.
                tracing::trace!(agent = %agent_id, "turn already in flight, coalescing");
                return;
            }
        }

        let runner = Arc::clone(&self.runner);
        let ledger = self.ledger.clone();
        let inflight = Arc::clone(&self.inflight);
        let limiter = Arc::clone(&self.limiter);
        let turn_timeout = self.config.dispatcher.turn_timeout();
        tokio::spawn(async move {
            let permit = match limiter.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    inflight.lock().remove(&agent_id);
                    return;
                }
            };
            let outcome =
                tokio::time::timeout(turn_timeout, runner.run_agent_turns(agent_id)).await;
            match outcome {
                Ok(Ok(stats)) => {
                    tracing::debug!(
                        agent = %agent_id,
                        turns = stats.turns,
                        messages = stats.messages_processed,
                        "turn worker finished"
                    );
                }
                Ok(Err(e)) => {
                    // The runner already recorded session.ended with the
                    // error; messages stay unprocessed for retry.
                    tracing::error!(agent = %agent_id, error = %e, "turn failed");
                }
                Err(_) => {
                    tracing::error!(agent = %agent_id, "turn timed out, abandoning");
                    if let Err(e) = ledger.end_open_session(agent_id, "turn timed out") {
                        tracing::error!(agent = %agent_id, error = %e, "session cleanup failed");
                    }
                }
            }
            drop(permit);
            inflight.lock().remove(&agent_id);
        });
    }

    /// Wait for in-flight turns to finish, up to the grace period.
    async fn drain(&self) {
        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
        while !self.is_idle() {
            if tokio::time::Instant::now() >= deadline {
                let abandoned = self.inflight.lock().len();
                tracing::warn!(abandoned, "shutdown grace elapsed, abandoning turns");
                break;
            }
            tokio::time::sleep(DRAIN_POLL).await;
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
