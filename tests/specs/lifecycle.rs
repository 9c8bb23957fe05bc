// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S1 — linear lifecycle, plus replay and ordering invariants.

use super::support::harness;
use gaffer_core::{EventBody, EventId, StreamId, TaskStatus};

#[test]
fn s1_linear_lifecycle() {
    let h = harness();
    let task = h
        .tasks
        .create_task(gaffer_engine::NewTask::new(h.team.id, "Fix login"))
        .unwrap();
    h.tasks.assign_task(task.id, Some(h.engineer.id), None).unwrap();
    for to in [
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::InApproval,
        TaskStatus::Merging,
        TaskStatus::Done,
    ] {
        h.tasks.change_status(task.id, to, None).unwrap();
    }

    let kinds = h.stream_kinds(&StreamId::task(task.id));
    assert_eq!(
        kinds,
        vec![
            "task.created",
            "task.assigned",
            "task.status_changed",
            "task.status_changed",
            "task.status_changed",
            "task.status_changed",
            "task.status_changed",
        ]
    );

    // The transitions trace the expected path, in order.
    let events = h.store.events_for_stream(&StreamId::task(task.id), EventId(0), None);
    let path: Vec<(TaskStatus, TaskStatus)> = events
        .iter()
        .filter_map(|e| match e.body() {
            EventBody::TaskStatusChanged { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        path,
        vec![
            (TaskStatus::Todo, TaskStatus::InProgress),
            (TaskStatus::InProgress, TaskStatus::InReview),
            (TaskStatus::InReview, TaskStatus::InApproval),
            (TaskStatus::InApproval, TaskStatus::Merging),
            (TaskStatus::Merging, TaskStatus::Done),
        ]
    );

    let task = h.tasks.get_task(task.id).unwrap();
    assert_eq!(task.status, TaskStatus::Done);
    assert!(task.completed_at_ms.is_some());
}

#[test]
fn done_rejects_further_transitions() {
    let h = harness();
    let task = h.tasks.create_task(gaffer_engine::NewTask::new(h.team.id, "t")).unwrap();
    for to in [
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::InApproval,
        TaskStatus::Merging,
        TaskStatus::Done,
    ] {
        h.tasks.change_status(task.id, to, None).unwrap();
    }
    for to in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Cancelled] {
        assert!(matches!(
            h.tasks.change_status(task.id, to, None),
            Err(gaffer_core::CoreError::Conflict(_))
        ));
    }
}

#[test]
fn depends_on_survives_the_whole_lifecycle() {
    let h = harness();
    let dep = h.tasks.create_task(gaffer_engine::NewTask::new(h.team.id, "dep")).unwrap();
    for to in [
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::InApproval,
        TaskStatus::Merging,
        TaskStatus::Done,
    ] {
        h.tasks.change_status(dep.id, to, None).unwrap();
    }
    let mut spec = gaffer_engine::NewTask::new(h.team.id, "main");
    spec.depends_on = vec![dep.id];
    let task = h.tasks.create_task(spec).unwrap();
    for to in [
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::InApproval,
        TaskStatus::Merging,
        TaskStatus::Done,
    ] {
        h.tasks.change_status(task.id, to, None).unwrap();
    }
    let task = h.tasks.get_task(task.id).unwrap();
    assert_eq!(task.status, TaskStatus::Done);
    assert_eq!(task.depends_on.iter().copied().collect::<Vec<_>>(), vec![dep.id]);
}

#[test]
fn event_payloads_round_trip_byte_for_byte() {
    let h = harness();
    let task = h.tasks.create_task(gaffer_engine::NewTask::new(h.team.id, "rt")).unwrap();
    h.tasks.change_status(task.id, TaskStatus::InProgress, Some("agt-x")).unwrap();

    for event in h.store.events_for_stream(&StreamId::task(task.id), EventId(0), None) {
        let body = event.body();
        let reserialized = serde_json::to_value(&body).unwrap();
        assert_eq!(reserialized, event.data);
    }
}

#[test]
fn messages_to_one_recipient_match_event_order() {
    let h = harness();
    let recipient = gaffer_core::Participant::agent(h.engineer.id);
    for content in ["a", "b", "c", "d"] {
        h.bus
            .send(gaffer_engine::SendMessage::new(
                h.team.id,
                gaffer_core::Participant::user("alice"),
                recipient.clone(),
                content,
            ))
            .unwrap();
    }
    let inbox = h.bus.inbox(&recipient, false, None);
    let inbox_ids: Vec<u64> = inbox.iter().map(|m| m.id.value()).collect();

    let event_ids: Vec<u64> = h
        .store
        .events_of_type("message.sent", None)
        .iter()
        .filter_map(|e| match e.body() {
            EventBody::MessageSent { message_id, recipient: r, .. } if r == recipient => {
                Some(message_id.value())
            }
            _ => None,
        })
        .collect();
    assert_eq!(inbox_ids, event_ids);
    assert!(inbox_ids.windows(2).all(|w| w[0] < w[1]));
}
