// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S5 — dispatcher coalescing under a burst of messages.

use super::support::harness;
use gaffer_adapters::FakeAgent;
use gaffer_core::Participant;
use gaffer_engine::SendMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn wait_until(timeout_ms: u64, f: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if f() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    f()
}

#[tokio::test]
async fn s5_burst_coalesces_and_processes_everything() {
    let h = harness();
    let adapter = Arc::new(FakeAgent::new().with_delay(Duration::from_millis(200)));
    let dispatcher = h.dispatcher(adapter.clone());
    let cancel = CancellationToken::new();
    {
        let dispatcher = Arc::clone(&dispatcher);
        let token = cancel.clone();
        tokio::spawn(async move { dispatcher.run(token).await });
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Five messages within a few milliseconds.
    for i in 0..5 {
        h.bus
            .send(SendMessage::new(
                h.team.id,
                Participant::user("alice"),
                Participant::agent(h.engineer.id),
                format!("msg {i}"),
            ))
            .unwrap();
    }

    let recipient = Participant::agent(h.engineer.id);
    assert!(
        wait_until(5_000, || {
            h.bus.inbox(&recipient, true, None).is_empty()
        })
        .await,
        "inbox never drained"
    );

    // At most two adapter invocations: the first batch plus one pass for
    // messages that arrived after the first turn started.
    assert!(
        adapter.call_count() <= 2,
        "expected at most 2 turns, got {}",
        adapter.call_count()
    );

    // All five messages finished processed.
    let all = h.bus.inbox(&recipient, false, None);
    assert_eq!(all.len(), 5);
    assert!(all.iter().all(|m| m.processed_at_ms.is_some()));

    // One session per turn, none left open.
    let open = h.store.read(|t| t.open_session_of(h.engineer.id).cloned());
    assert!(open.is_none());
    cancel.cancel();
}

#[tokio::test]
async fn human_request_resolution_redispatches_the_agent() {
    let h = harness();
    let adapter = Arc::new(FakeAgent::new());
    let dispatcher = h.dispatcher(adapter.clone());
    let cancel = CancellationToken::new();
    {
        let dispatcher = Arc::clone(&dispatcher);
        let token = cancel.clone();
        tokio::spawn(async move { dispatcher.run(token).await });
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    // A message the agent will pick up once the human answers.
    // (Sent while the agent is paused so the notification is skipped.)
    h.admin.pause_agent(h.engineer.id).unwrap();
    h.bus
        .send(SendMessage::new(
            h.team.id,
            Participant::user("alice"),
            Participant::agent(h.engineer.id),
            "blocked on the human",
        ))
        .unwrap();
    let request = h
        .human
        .create_request(gaffer_engine::NewRequest::question(
            h.team.id,
            h.engineer.id,
            "which approach?",
        ))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(adapter.call_count(), 0);

    // Resolution publishes human_request_resolved; the unpaused agent runs.
    h.admin.resume_agent(h.engineer.id).unwrap();
    h.human.respond(request.id, "approach B", "alice").unwrap();
    let recipient = Participant::agent(h.engineer.id);
    assert!(wait_until(3_000, || h.bus.inbox(&recipient, true, None).is_empty()).await);
    assert!(adapter.call_count() >= 1);
    cancel.cancel();
}
