// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit-bound notification channels.

/// The closed set of notification channels the core publishes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Payload: recipient id of the inserted message.
    NewMessage,
    /// Payload: id of the agent whose request reached a terminal state.
    HumanRequestResolved,
    /// Payload: task id.
    TaskStatusChanged,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::NewMessage => "new_message",
            Channel::HumanRequestResolved => "human_request_resolved",
            Channel::TaskStatusChanged => "task_status_changed",
        }
    }
}

gaffer_core::simple_display! {
    Channel {
        NewMessage => "new_message",
        HumanRequestResolved => "human_request_resolved",
        TaskStatusChanged => "task_status_changed",
    }
}

/// A minimal notification payload. Consumers re-read state from the store;
/// the payload only says where to look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: Channel,
    pub payload: String,
}

impl Notification {
    pub fn new(channel: Channel, payload: impl Into<String>) -> Self {
        Self { channel, payload: payload.into() }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
