// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! gaffer-daemon: one worker process around the orchestration core.
//!
//! Wires the store, services, and background loops together and runs them
//! until shutdown. The HTTP surface, webhook ingestion, and real adapter
//! implementations are deployment concerns layered on top of
//! [`Daemon::services`].

pub mod env;

use gaffer_adapters::{AdapterRegistry, GitService};
use gaffer_core::{Config, SystemClock};
use gaffer_engine::{
    Admin, Dispatcher, HumanLoop, MergeWorker, MessageBus, ReviewCoordinator, SessionLedger,
    TaskEngine, TurnRunner,
};
use gaffer_storage::Store;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// External collaborators the daemon cannot construct itself.
pub struct DaemonDeps {
    pub registry: Arc<AdapterRegistry>,
    pub git: Arc<dyn GitService>,
}

/// Every service handle, pre-wired to the shared store.
pub struct Services {
    pub admin: Admin<SystemClock>,
    pub tasks: TaskEngine<SystemClock>,
    pub bus: MessageBus<SystemClock>,
    pub human: HumanLoop<SystemClock>,
    pub reviews: ReviewCoordinator<SystemClock>,
    pub ledger: SessionLedger<SystemClock>,
}

pub struct Daemon {
    store: Store,
    config: Arc<Config>,
    services: Services,
    dispatcher: Arc<Dispatcher<SystemClock>>,
    merge_worker: Arc<MergeWorker<SystemClock>>,
}

impl Daemon {
    pub fn new(config: Config, deps: DaemonDeps) -> Self {
        let store = Store::new();
        let clock = SystemClock;
        let config = Arc::new(config);
        let bus = MessageBus::new(store.clone(), clock.clone());
        let ledger = SessionLedger::new(store.clone(), clock.clone(), Arc::clone(&config));
        let runner = Arc::new(TurnRunner::new(
            store.clone(),
            bus.clone(),
            ledger.clone(),
            Arc::clone(&deps.registry),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            Arc::clone(&config),
            runner,
            ledger.clone(),
        ));
        let merge_worker = Arc::new(MergeWorker::new(
            store.clone(),
            clock.clone(),
            Arc::clone(&config),
            deps.git,
        ));
        let services = Services {
            admin: Admin::new(store.clone(), clock.clone()),
            tasks: TaskEngine::new(store.clone(), clock.clone(), Arc::clone(&config)),
            human: HumanLoop::new(store.clone(), clock.clone(), Arc::clone(&config)),
            reviews: ReviewCoordinator::new(store.clone(), clock.clone()),
            bus,
            ledger,
        };
        Self { store, config, services, dispatcher, merge_worker }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the background loops until `cancel` fires, then wait for each to
    /// wind down.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            max_turns = self.config.dispatcher.max_concurrent_turns,
            poll_s = self.config.dispatcher.fallback_poll_interval_seconds,
            "daemon starting"
        );
        let dispatcher = Arc::clone(&self.dispatcher);
        let dispatch_token = cancel.clone();
        let dispatch = tokio::spawn(async move { dispatcher.run(dispatch_token).await });

        let merge_worker = Arc::clone(&self.merge_worker);
        let merge_token = cancel.clone();
        let merges = tokio::spawn(async move { merge_worker.run(merge_token).await });

        let human = self.services.human.clone();
        let expiry_token = cancel.clone();
        let expiry = tokio::spawn(async move { human.run_expiry_poller(expiry_token).await });

        cancel.cancelled().await;
        tracing::info!("shutdown requested, draining");
        for (name, handle) in [("dispatcher", dispatch), ("merge", merges), ("expiry", expiry)] {
            if let Err(e) = handle.await {
                tracing::error!(loop_name = name, error = %e, "background loop panicked");
            }
        }
        tracing::info!("daemon stopped");
    }
}
