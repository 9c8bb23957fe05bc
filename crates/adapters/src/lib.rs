// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gaffer-adapters: narrow interfaces to external collaborators.
//!
//! The core never talks to a coding-agent subprocess, a git tree, or a
//! dashboard socket directly; it goes through the traits here. Production
//! implementations live with the deployment; the fakes behind the
//! `test-support` feature drive every test.

pub mod agent;
pub mod git;
pub mod realtime;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use agent::{AdapterError, AdapterRegistry, AgentAdapter, TurnOutput, TurnRequest};
pub use git::{GitError, GitService, MergeOutcome};
pub use realtime::{NoopPublisher, RealtimePublisher};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgent, FakeGit};
