// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Administrative operations: tenant hierarchy and team settings.
//!
//! Tenant records are outside the state⇔event invariant (they are
//! administrative, not work-tracking); only settings updates append an
//! event, since downstream policy depends on them.

use gaffer_core::{
    Agent, AgentId, AgentRole, AgentStatus, Clock, CoreError, EventBody, EventMeta, Organization,
    OrgId, RepoId, Repository, StreamId, Team, TeamId, TeamSettings, WebhookDelivery, WebhookId,
};
use gaffer_storage::Store;
use std::collections::BTreeMap;

/// Parameters for team creation. Creating a team atomically creates its
/// manager agent.
#[derive(Debug, Clone)]
pub struct NewTeam {
    pub org_id: OrgId,
    pub name: String,
    pub settings: TeamSettings,
    /// Adapter tag the manager agent runs on.
    pub manager_adapter: String,
}

#[derive(Debug, Clone)]
pub struct NewAgent {
    pub team_id: TeamId,
    pub name: String,
    pub role: AgentRole,
    pub adapter: String,
    pub model: Option<String>,
}

#[derive(Clone)]
pub struct Admin<C: Clock> {
    store: Store,
    clock: C,
}

impl<C: Clock> Admin<C> {
    pub fn new(store: Store, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn create_org(&self, name: &str) -> Result<Organization, CoreError> {
        let name = non_empty(name, "organization name")?;
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let org = Organization { id: OrgId::new(), name, created_at_ms: txn.now_ms() };
            txn.tables.orgs.insert(org.id, org.clone());
            Ok(org)
        })
    }

    /// Create a team and its manager agent in one transaction.
    pub fn create_team(&self, new: NewTeam) -> Result<(Team, Agent), CoreError> {
        let name = non_empty(&new.name, "team name")?;
        self.store.transact(self.clock.epoch_ms(), |txn| {
            if !txn.tables.orgs.contains_key(&new.org_id) {
                return Err(CoreError::not_found("organization", new.org_id));
            }
            let team = Team {
                id: TeamId::new(),
                org_id: new.org_id,
                name: name.clone(),
                settings: new.settings.clone(),
                created_at_ms: txn.now_ms(),
            };
            let manager = Agent {
                id: AgentId::new(),
                team_id: team.id,
                name: format!("{name}-manager"),
                role: AgentRole::Manager,
                status: AgentStatus::Idle,
                adapter: new.manager_adapter.clone(),
                model: None,
                created_at_ms: txn.now_ms(),
            };
            txn.tables.teams.insert(team.id, team.clone());
            txn.tables.agents.insert(manager.id, manager.clone());
            tracing::info!(team = %team.id, manager = %manager.id, "team created");
            Ok((team, manager))
        })
    }

    pub fn create_agent(&self, new: NewAgent) -> Result<Agent, CoreError> {
        let name = non_empty(&new.name, "agent name")?;
        self.store.transact(self.clock.epoch_ms(), |txn| {
            txn.tables.require_team(new.team_id)?;
            let agent = Agent {
                id: AgentId::new(),
                team_id: new.team_id,
                name,
                role: new.role,
                status: AgentStatus::Idle,
                adapter: new.adapter.clone(),
                model: new.model.clone(),
                created_at_ms: txn.now_ms(),
            };
            txn.tables.agents.insert(agent.id, agent.clone());
            Ok(agent)
        })
    }

    pub fn create_repo(
        &self,
        team_id: TeamId,
        name: &str,
        default_branch: &str,
    ) -> Result<Repository, CoreError> {
        let name = non_empty(name, "repository name")?;
        let default_branch = non_empty(default_branch, "default branch")?;
        self.store.transact(self.clock.epoch_ms(), |txn| {
            txn.tables.require_team(team_id)?;
            let repo = Repository {
                id: RepoId::new(),
                team_id,
                name,
                default_branch,
                created_at_ms: txn.now_ms(),
            };
            txn.tables.repos.insert(repo.id, repo.clone());
            Ok(repo)
        })
    }

    /// Replace a team's settings, appending `settings.updated` with only the
    /// fields that changed.
    pub fn update_settings(
        &self,
        team_id: TeamId,
        settings: TeamSettings,
    ) -> Result<Team, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let old = txn.tables.require_team(team_id)?.settings.clone();
            let changed = diff_settings(&old, &settings)?;
            let team = match txn.tables.teams.get_mut(&team_id) {
                Some(t) => t,
                None => return Err(CoreError::not_found("team", team_id)),
            };
            team.settings = settings.clone();
            let team = team.clone();
            if !changed.is_empty() {
                txn.append(
                    StreamId::team(team_id),
                    &EventBody::SettingsUpdated { team_id, changed },
                    EventMeta::default(),
                )?;
            }
            Ok(team)
        })
    }

    /// Pause an agent: the dispatcher stops handing it turns. Any in-flight
    /// turn completes normally.
    pub fn pause_agent(&self, agent_id: AgentId) -> Result<Agent, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let agent = txn.tables.require_agent_mut(agent_id)?;
            if agent.status == AgentStatus::Paused {
                return Ok(agent.clone());
            }
            agent.status = AgentStatus::Paused;
            Ok(agent.clone())
        })
    }

    /// Resume a paused (or errored) agent to idle.
    pub fn resume_agent(&self, agent_id: AgentId) -> Result<Agent, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let agent = txn.tables.require_agent_mut(agent_id)?;
            match agent.status {
                AgentStatus::Paused | AgentStatus::Error => agent.status = AgentStatus::Idle,
                AgentStatus::Idle | AgentStatus::Working => {}
            }
            Ok(agent.clone())
        })
    }

    /// Record a delivery from the (external) webhook ingestion layer.
    pub fn record_webhook_delivery(
        &self,
        team_id: Option<TeamId>,
        source: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<WebhookDelivery, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let delivery = WebhookDelivery {
                id: WebhookId::new(),
                team_id,
                source: source.to_string(),
                event: event.to_string(),
                payload,
                received_at_ms: txn.now_ms(),
            };
            txn.tables.webhook_deliveries.push(delivery.clone());
            Ok(delivery)
        })
    }

    pub fn list_webhook_deliveries(&self, team_id: Option<TeamId>) -> Vec<WebhookDelivery> {
        self.store.read(|t| {
            t.webhook_deliveries
                .iter()
                .filter(|d| team_id.is_none() || d.team_id == team_id)
                .cloned()
                .collect()
        })
    }

    pub fn get_team(&self, team_id: TeamId) -> Result<Team, CoreError> {
        self.store.read(|t| t.require_team(team_id).cloned())
    }

    pub fn get_agent(&self, agent_id: AgentId) -> Result<Agent, CoreError> {
        self.store.read(|t| t.require_agent(agent_id).cloned())
    }
}

fn non_empty(s: &str, what: &str) -> Result<String, CoreError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Field-level diff of two settings records, as `name → new value`.
/// Fields dropped entirely (e.g. a cap removed) map to JSON null.
fn diff_settings(
    old: &TeamSettings,
    new: &TeamSettings,
) -> Result<BTreeMap<String, serde_json::Value>, CoreError> {
    let to_map = |s: &TeamSettings| -> Result<serde_json::Map<String, serde_json::Value>, CoreError> {
        match serde_json::to_value(s) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(CoreError::Validation("settings did not serialize to an object".into())),
            Err(e) => Err(CoreError::Validation(format!("unserializable settings: {e}"))),
        }
    };
    let old_map = to_map(old)?;
    let new_map = to_map(new)?;
    let mut changed = BTreeMap::new();
    for (key, new_value) in &new_map {
        if old_map.get(key) != Some(new_value) {
            changed.insert(key.clone(), new_value.clone());
        }
    }
    for key in old_map.keys() {
        if !new_map.contains_key(key) {
            changed.insert(key.clone(), serde_json::Value::Null);
        }
    }
    Ok(changed)
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
