// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures for other crates' tests.
//!
//! Entity builders live next to their types (see `Task::builder()`); this
//! module holds the free-standing constructors tests reach for most.

use crate::cost::Cost;
use crate::id::{AgentId, OrgId, TeamId};
use crate::tenant::{Agent, AgentRole, AgentStatus, Team, TeamSettings};

/// A team with default settings and a fixed id.
pub fn team(id: impl AsRef<str>) -> Team {
    Team {
        id: TeamId::from_string(id.as_ref()),
        org_id: OrgId::from_string("org-test"),
        name: "test team".to_string(),
        settings: TeamSettings::default(),
        created_at_ms: 1_000_000,
    }
}

/// A team whose settings cap daily spend.
pub fn team_with_daily_cap(id: impl AsRef<str>, cap: Cost) -> Team {
    let mut t = team(id);
    t.settings.daily_cap = Some(cap);
    t
}

/// An idle engineer on the given team.
pub fn engineer(team_id: TeamId, id: impl AsRef<str>) -> Agent {
    Agent {
        id: AgentId::from_string(id.as_ref()),
        team_id,
        name: "test engineer".to_string(),
        role: AgentRole::Engineer,
        status: AgentStatus::Idle,
        adapter: "fake".to_string(),
        model: None,
        created_at_ms: 1_000_000,
    }
}

/// An idle reviewer on the given team.
pub fn reviewer(team_id: TeamId, id: impl AsRef<str>) -> Agent {
    let mut a = engineer(team_id, id);
    a.role = AgentRole::Reviewer;
    a.name = "test reviewer".to_string();
    a
}
