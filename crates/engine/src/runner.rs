// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One agent turn: budget gate, inbox, adapter invocation, accounting.

use crate::messages::MessageBus;
use crate::sessions::SessionLedger;
use gaffer_adapters::{AdapterRegistry, TurnRequest};
use gaffer_core::{AgentId, Clock, CoreError, Message, Participant};
use gaffer_storage::Store;
use std::sync::Arc;

/// What a call to [`TurnRunner::run_agent_turns`] accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnStats {
    /// Completed adapter invocations.
    pub turns: usize,
    pub messages_processed: usize,
    /// True when a budget cap refused the (first or a later) turn.
    pub skipped_budget: bool,
}

/// Executes turns for one agent at a time. The dispatcher owns concurrency
/// and per-agent exclusion; the runner owns the shape of a single turn.
pub struct TurnRunner<C: Clock> {
    store: Store,
    bus: MessageBus<C>,
    ledger: SessionLedger<C>,
    registry: Arc<AdapterRegistry>,
}

impl<C: Clock> TurnRunner<C> {
    pub fn new(
        store: Store,
        bus: MessageBus<C>,
        ledger: SessionLedger<C>,
        registry: Arc<AdapterRegistry>,
    ) -> Self {
        Self { store, bus, ledger, registry }
    }

    /// Drain the agent's inbox in bounded turns.
    ///
    /// Loops until the inbox is empty, so messages arriving while a turn is
    /// running are handled without another dispatch (notification
    /// coalescing relies on this). Each iteration: open a session (budget
    /// gate), mark the batch seen, run the adapter, record usage, mark the
    /// batch processed, end the session. A failed turn ends its session
    /// with the error and leaves its messages unprocessed for retry.
    pub async fn run_agent_turns(&self, agent_id: AgentId) -> Result<TurnStats, CoreError> {
        let mut stats = TurnStats::default();
        loop {
            let agent = self.store.read(|t| t.require_agent(agent_id).cloned())?;
            let recipient = Participant::agent(agent_id);
            let inbox = self.bus.inbox(&recipient, true, None);
            if inbox.is_empty() {
                break;
            }
            let task_hint = inbox.iter().find_map(|m| m.task_id);

            let session = match self.ledger.start_session(agent_id, task_hint, None) {
                Ok(session) => session,
                Err(CoreError::BudgetExceeded { cap, spent, limit }) => {
                    // The refusal already committed agent.budget_exceeded;
                    // leave the inbox untouched.
                    tracing::warn!(
                        agent = %agent_id, %cap, %spent, %limit,
                        "turn skipped: budget exceeded"
                    );
                    stats.skipped_budget = true;
                    break;
                }
                Err(e) => return Err(e),
            };

            for message in &inbox {
                self.bus.mark_seen(message.id)?;
            }

            let adapter = match self.registry.get(&agent.adapter) {
                Ok(adapter) => adapter,
                Err(e) => {
                    self.ledger.end_session(session.id, Some(e.to_string()))?;
                    return Err(CoreError::External(e.to_string()));
                }
            };
            let request = TurnRequest {
                agent_id,
                prompt: render_inbox(&inbox),
                model: session.model.clone(),
                task_id: task_hint,
                worktree: None,
            };
            match adapter.run_turn(request).await {
                Ok(output) => {
                    self.ledger.record_usage(
                        session.id,
                        output.usage.input as i64,
                        output.usage.output as i64,
                        output.usage.cache_read as i64,
                        output.usage.cache_write as i64,
                    )?;
                    for message in &inbox {
                        self.bus.mark_processed(message.id)?;
                    }
                    self.ledger.end_session(session.id, None)?;
                    stats.turns += 1;
                    stats.messages_processed += inbox.len();
                }
                Err(e) => {
                    self.ledger.end_session(session.id, Some(e.to_string()))?;
                    return Err(CoreError::External(e.to_string()));
                }
            }
        }
        Ok(stats)
    }
}

/// Render an inbox batch into one adapter prompt.
fn render_inbox(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        match message.task_id {
            Some(task_id) => {
                out.push_str(&format!("[{} re task {}] ", message.sender, task_id));
            }
            None => out.push_str(&format!("[{}] ", message.sender)),
        }
        out.push_str(&message.content);
    }
    out
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
