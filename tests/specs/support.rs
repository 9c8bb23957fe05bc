// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the spec scenarios.

use gaffer_adapters::{AdapterRegistry, AgentAdapter};
use gaffer_core::{Agent, AgentRole, Config, FakeClock, Repository, Team, TeamSettings};
use gaffer_engine::{
    Admin, Dispatcher, HumanLoop, MessageBus, NewAgent, NewTeam, ReviewCoordinator,
    SessionLedger, TaskEngine, TurnRunner,
};
use gaffer_storage::Store;
use std::sync::Arc;

pub struct Harness {
    pub store: Store,
    pub clock: FakeClock,
    pub config: Arc<Config>,
    pub admin: Admin<FakeClock>,
    pub tasks: TaskEngine<FakeClock>,
    pub bus: MessageBus<FakeClock>,
    pub human: HumanLoop<FakeClock>,
    pub reviews: ReviewCoordinator<FakeClock>,
    pub ledger: SessionLedger<FakeClock>,
    pub team: Team,
    pub engineer: Agent,
    pub reviewer: Agent,
    pub repo: Repository,
}

pub fn harness() -> Harness {
    harness_with(Config::default())
}

pub fn harness_with(config: Config) -> Harness {
    let store = Store::new();
    let clock = FakeClock::new();
    let config = Arc::new(config);
    let admin = Admin::new(store.clone(), clock.clone());
    let org = admin.create_org("acme").unwrap();
    let (team, _manager) = admin
        .create_team(NewTeam {
            org_id: org.id,
            name: "T".to_string(),
            settings: TeamSettings::default(),
            manager_adapter: "fake".to_string(),
        })
        .unwrap();
    let engineer = admin
        .create_agent(NewAgent {
            team_id: team.id,
            name: "E1".to_string(),
            role: AgentRole::Engineer,
            adapter: "fake".to_string(),
            model: Some("test-model".to_string()),
        })
        .unwrap();
    let reviewer = admin
        .create_agent(NewAgent {
            team_id: team.id,
            name: "R1".to_string(),
            role: AgentRole::Reviewer,
            adapter: "fake".to_string(),
            model: Some("test-model".to_string()),
        })
        .unwrap();
    let repo = admin.create_repo(team.id, "api", "main").unwrap();

    Harness {
        tasks: TaskEngine::new(store.clone(), clock.clone(), Arc::clone(&config)),
        bus: MessageBus::new(store.clone(), clock.clone()),
        human: HumanLoop::new(store.clone(), clock.clone(), Arc::clone(&config)),
        reviews: ReviewCoordinator::new(store.clone(), clock.clone()),
        ledger: SessionLedger::new(store.clone(), clock.clone(), Arc::clone(&config)),
        admin,
        store,
        clock,
        config,
        team,
        engineer,
        reviewer,
        repo,
    }
}

impl Harness {
    /// Event kinds on a stream, in id order.
    pub fn stream_kinds(&self, stream: &gaffer_core::StreamId) -> Vec<String> {
        self.store
            .events_for_stream(stream, gaffer_core::EventId(0), None)
            .iter()
            .map(|e| e.kind().to_string())
            .collect()
    }

    /// A dispatcher wired to the harness services with the adapter
    /// registered under the "fake" tag.
    pub fn dispatcher(&self, adapter: Arc<dyn AgentAdapter>) -> Arc<Dispatcher<FakeClock>> {
        let mut registry = AdapterRegistry::new();
        registry.register("fake", adapter);
        let runner = Arc::new(TurnRunner::new(
            self.store.clone(),
            self.bus.clone(),
            self.ledger.clone(),
            Arc::new(registry),
        ));
        Arc::new(Dispatcher::new(
            self.store.clone(),
            Arc::clone(&self.config),
            runner,
            self.ledger.clone(),
        ))
    }
}
