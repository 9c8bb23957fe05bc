// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for the engine test suites.

use crate::admin::{Admin, NewAgent, NewTeam};
use crate::human::HumanLoop;
use crate::messages::MessageBus;
use crate::reviews::ReviewCoordinator;
use crate::runner::TurnRunner;
use crate::sessions::SessionLedger;
use crate::tasks::{NewTask, TaskEngine};
use gaffer_adapters::{AdapterRegistry, AgentAdapter};
use gaffer_core::{
    Agent, AgentRole, Config, FakeClock, Organization, Repository, StreamId, Task, TaskStatus,
    Team, TeamSettings,
};
use gaffer_storage::Store;
use std::sync::Arc;

pub struct Fixture {
    pub store: Store,
    pub clock: FakeClock,
    pub config: Arc<Config>,
    pub admin: Admin<FakeClock>,
    pub tasks: TaskEngine<FakeClock>,
    pub bus: MessageBus<FakeClock>,
    pub human: HumanLoop<FakeClock>,
    pub reviews: ReviewCoordinator<FakeClock>,
    pub ledger: SessionLedger<FakeClock>,
    pub org: Organization,
    pub team: Team,
    pub manager: Agent,
    pub engineer: Agent,
    pub reviewer: Agent,
    pub repo: Repository,
}

pub fn fixture() -> Fixture {
    fixture_with(Config::default())
}

pub fn fixture_with(config: Config) -> Fixture {
    let store = Store::new();
    let clock = FakeClock::new();
    let config = Arc::new(config);
    let admin = Admin::new(store.clone(), clock.clone());
    let org = admin.create_org("acme").unwrap();
    let (team, manager) = admin
        .create_team(NewTeam {
            org_id: org.id,
            name: "platform".to_string(),
            settings: TeamSettings::default(),
            manager_adapter: "fake".to_string(),
        })
        .unwrap();
    let engineer = admin
        .create_agent(NewAgent {
            team_id: team.id,
            name: "e1".to_string(),
            role: AgentRole::Engineer,
            adapter: "fake".to_string(),
            model: Some("test-model".to_string()),
        })
        .unwrap();
    let reviewer = admin
        .create_agent(NewAgent {
            team_id: team.id,
            name: "r1".to_string(),
            role: AgentRole::Reviewer,
            adapter: "fake".to_string(),
            model: Some("test-model".to_string()),
        })
        .unwrap();
    let repo = admin.create_repo(team.id, "api", "main").unwrap();

    Fixture {
        tasks: TaskEngine::new(store.clone(), clock.clone(), Arc::clone(&config)),
        bus: MessageBus::new(store.clone(), clock.clone()),
        human: HumanLoop::new(store.clone(), clock.clone(), Arc::clone(&config)),
        reviews: ReviewCoordinator::new(store.clone(), clock.clone()),
        ledger: SessionLedger::new(store.clone(), clock.clone(), Arc::clone(&config)),
        admin,
        store,
        clock,
        config,
        org,
        team,
        manager,
        engineer,
        reviewer,
        repo,
    }
}

impl Fixture {
    pub fn new_task(&self, title: &str) -> Task {
        self.tasks.create_task(NewTask::new(self.team.id, title)).unwrap()
    }

    /// A task assigned to the engineer, with the repo attached, driven to
    /// the given status along the forward path.
    pub fn task_in_status(&self, title: &str, status: TaskStatus) -> Task {
        let mut spec = NewTask::new(self.team.id, title);
        spec.assignee = Some(self.engineer.id);
        spec.repo_ids = vec![self.repo.id];
        let task = self.tasks.create_task(spec).unwrap();
        let path = [
            TaskStatus::InProgress,
            TaskStatus::InReview,
            TaskStatus::InApproval,
            TaskStatus::Merging,
            TaskStatus::Done,
        ];
        let mut current = task;
        for step in path {
            if current.status == status {
                break;
            }
            current = self.tasks.change_status(current.id, step, None).unwrap();
        }
        assert_eq!(current.status, status);
        current
    }

    /// Event kinds on a stream, in id order.
    pub fn stream_kinds(&self, stream: &StreamId) -> Vec<String> {
        self.store
            .events_for_stream(stream, gaffer_core::EventId(0), None)
            .iter()
            .map(|e| e.kind().to_string())
            .collect()
    }

    /// A runner wired to the fixture services with the given adapter
    /// registered under the "fake" tag.
    pub fn runner(&self, adapter: Arc<dyn AgentAdapter>) -> Arc<TurnRunner<FakeClock>> {
        let mut registry = AdapterRegistry::new();
        registry.register("fake", adapter);
        Arc::new(TurnRunner::new(
            self.store.clone(),
            self.bus.clone(),
            self.ledger.clone(),
            Arc::new(registry),
        ))
    }
}
