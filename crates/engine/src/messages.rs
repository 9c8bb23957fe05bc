// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message bus: durable recipient-keyed inboxes.

use gaffer_core::{
    Clock, CoreError, EventBody, EventMeta, Message, MessageId, Participant, ParticipantKind,
    StreamId, TaskId, TeamId,
};
use gaffer_storage::{Channel, Store, Txn};

#[derive(Debug, Clone)]
pub struct SendMessage {
    pub team_id: TeamId,
    pub sender: Participant,
    pub recipient: Participant,
    pub task_id: Option<TaskId>,
    pub content: String,
}

impl SendMessage {
    pub fn new(
        team_id: TeamId,
        sender: Participant,
        recipient: Participant,
        content: impl Into<String>,
    ) -> Self {
        Self { team_id, sender, recipient, task_id: None, content: content.into() }
    }

    pub fn about_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }
}

#[derive(Clone)]
pub struct MessageBus<C: Clock> {
    store: Store,
    clock: C,
}

impl<C: Clock> MessageBus<C> {
    pub fn new(store: Store, clock: C) -> Self {
        Self { store, clock }
    }

    /// Insert a message, append `message.sent`, and publish on `new_message`.
    pub fn send(&self, msg: SendMessage) -> Result<Message, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| send_in(txn, msg))
    }

    /// Inbox of a recipient, FIFO by message id.
    pub fn inbox(
        &self,
        recipient: &Participant,
        unprocessed_only: bool,
        limit: Option<usize>,
    ) -> Vec<Message> {
        self.store.read(|t| t.inbox_of(recipient, unprocessed_only, limit))
    }

    /// Stamp `seen_at`. Idempotent; no event.
    pub fn mark_seen(&self, message_id: MessageId) -> Result<Message, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let msg = txn.tables.require_message_mut(message_id)?;
            if msg.seen_at_ms.is_none() {
                msg.seen_at_ms = Some(now);
            }
            Ok(msg.clone())
        })
    }

    /// Stamp `processed_at` (and `seen_at`, if the recipient never read the
    /// inbox — processed implies seen). Idempotent; no event.
    pub fn mark_processed(&self, message_id: MessageId) -> Result<Message, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let msg = txn.tables.require_message_mut(message_id)?;
            if msg.processed_at_ms.is_none() {
                msg.processed_at_ms = Some(now);
                if msg.seen_at_ms.is_none() {
                    msg.seen_at_ms = Some(now);
                }
            }
            Ok(msg.clone())
        })
    }
}

/// Insert a message inside an open transaction.
///
/// Shared with the review coordinator, whose feedback and review-request
/// messages must land in the same transaction as their events.
pub(crate) fn send_in(txn: &mut Txn<'_>, msg: SendMessage) -> Result<Message, CoreError> {
    if msg.content.is_empty() {
        return Err(CoreError::validation("message content must not be empty"));
    }
    txn.tables.require_team(msg.team_id)?;
    for participant in [&msg.sender, &msg.recipient] {
        if participant.kind == ParticipantKind::Agent {
            txn.tables.require_agent(gaffer_core::AgentId::from_string(&participant.id))?;
        }
    }
    if let Some(task_id) = msg.task_id {
        txn.tables.require_task(task_id)?;
    }
    let id = txn.tables.next_message_id();
    let message = Message {
        id,
        team_id: msg.team_id,
        sender: msg.sender.clone(),
        recipient: msg.recipient.clone(),
        task_id: msg.task_id,
        content: msg.content,
        delivered_at_ms: txn.now_ms(),
        seen_at_ms: None,
        processed_at_ms: None,
    };
    txn.tables.messages.insert(id, message.clone());
    txn.append(
        StreamId::team(msg.team_id),
        &EventBody::MessageSent {
            message_id: id,
            team_id: msg.team_id,
            sender: msg.sender,
            recipient: msg.recipient.clone(),
            task_id: msg.task_id,
        },
        EventMeta::default(),
    )?;
    txn.notify(Channel::NewMessage, msg.recipient.id);
    Ok(message)
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
