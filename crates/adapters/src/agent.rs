// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coding-agent adapters: one turn in, output and usage back.

use async_trait::async_trait;
use gaffer_core::{AgentId, TaskId, TokenUsage};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("no adapter registered for tag {0:?}")]
    UnknownAdapter(String),
    #[error("adapter process failed: {0}")]
    ProcessFailed(String),
    #[error("adapter turn cancelled")]
    Cancelled,
}

/// One turn handed to an external runner.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub agent_id: AgentId,
    /// Rendered inbox content the agent should act on.
    pub prompt: String,
    pub model: Option<String>,
    /// Task the turn is attributed to, when the inbox names one.
    pub task_id: Option<TaskId>,
    /// Worktree path, when the runner needs a checkout.
    pub worktree: Option<std::path::PathBuf>,
}

/// What a completed turn produced.
#[derive(Debug, Clone, Default)]
pub struct TurnOutput {
    pub output: String,
    pub usage: TokenUsage,
}

/// Adapter for one kind of external coding-agent runner.
#[async_trait]
pub trait AgentAdapter: std::fmt::Debug + Send + Sync + 'static {
    /// Run one bounded turn. Implementations own subprocess mechanics;
    /// cancellation arrives as future drop.
    async fn run_turn(&self, request: TurnRequest) -> Result<TurnOutput, AdapterError>;
}

/// Adapter lookup by tag (each agent record names its runner).
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn AgentAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: impl Into<String>, adapter: Arc<dyn AgentAdapter>) {
        let tag = tag.into();
        tracing::debug!(tag = %tag, "registered agent adapter");
        self.adapters.insert(tag, adapter);
    }

    pub fn get(&self, tag: &str) -> Result<Arc<dyn AgentAdapter>, AdapterError> {
        self.adapters
            .get(tag)
            .cloned()
            .ok_or_else(|| AdapterError::UnknownAdapter(tag.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
