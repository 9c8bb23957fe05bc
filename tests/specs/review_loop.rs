// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S4 — the automated review feedback loop, and merge finalization.

use super::support::harness;
use gaffer_adapters::FakeGit;
use gaffer_core::{Participant, ParticipantKind, StreamId, TaskStatus, Verdict};
use gaffer_engine::{MergeWorker, NewTask};
use std::sync::Arc;

#[test]
fn s4_request_changes_feedback_loop() {
    let h = harness();
    let mut spec = NewTask::new(h.team.id, "Fix login");
    spec.assignee = Some(h.engineer.id);
    let task = h.tasks.create_task(spec).unwrap();
    h.tasks.change_status(task.id, TaskStatus::InProgress, None).unwrap();
    h.tasks.change_status(task.id, TaskStatus::InReview, None).unwrap();

    let review = h.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    h.reviews
        .add_comment(review.id, Participant::user("alice"), "rename", Some("a.py"), Some(10))
        .unwrap();
    let inbox_before = h.bus.inbox(&Participant::agent(h.engineer.id), true, None).len();
    h.reviews
        .set_verdict(review.id, Verdict::RequestChanges, "see below", "alice")
        .unwrap();

    // Task went back to in_progress.
    assert_eq!(h.tasks.get_task(task.id).unwrap().status, TaskStatus::InProgress);

    // Exactly one new message, containing the summary and the anchored comment.
    let inbox = h.bus.inbox(&Participant::agent(h.engineer.id), true, None);
    assert_eq!(inbox.len(), inbox_before + 1);
    let feedback = &inbox[inbox.len() - 1];
    assert!(feedback.content.contains("see below"));
    assert!(feedback.content.contains("a.py:10 \u{2014} rename"));
    assert_eq!(feedback.task_id, Some(task.id));

    // Both verdict and feedback events are on the review stream.
    let kinds = h.stream_kinds(&StreamId::review(review.id));
    assert!(kinds.contains(&"review.verdict".to_string()));
    assert!(kinds.contains(&"review.feedback_sent".to_string()));
}

#[tokio::test]
async fn approved_task_merges_and_completes() {
    let h = harness();
    let mut spec = NewTask::new(h.team.id, "Ship it");
    spec.assignee = Some(h.engineer.id);
    spec.repo_ids = vec![h.repo.id];
    let task = h.tasks.create_task(spec).unwrap();
    h.tasks.change_status(task.id, TaskStatus::InProgress, None).unwrap();
    h.tasks.change_status(task.id, TaskStatus::InReview, None).unwrap();

    let review = h.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    h.reviews.set_verdict(review.id, Verdict::Approve, "lgtm", "alice").unwrap();
    assert_eq!(h.tasks.get_task(task.id).unwrap().status, TaskStatus::InApproval);

    // Human approval pushes to merging; the worker does the rest.
    h.tasks.change_status(task.id, TaskStatus::Merging, Some("alice")).unwrap();
    let git = Arc::new(FakeGit::new());
    let worker = MergeWorker::new(
        h.store.clone(),
        h.clock.clone(),
        Arc::clone(&h.config),
        git.clone(),
    );
    worker.run_once().await.unwrap();

    let task = h.tasks.get_task(task.id).unwrap();
    assert_eq!(task.status, TaskStatus::Done);
    assert!(task.completed_at_ms.is_some());
    assert_eq!(git.merges().len(), 1);
    assert_eq!(git.merges()[0].1, task.branch);

    let job = h.store.read(|t| t.merge_jobs.values().next().cloned()).unwrap();
    assert_eq!(
        h.stream_kinds(&StreamId::merge(job.id)),
        vec!["merge.queued", "merge.started", "merge.completed"]
    );
}

#[tokio::test]
async fn failed_merge_reopens_the_task() {
    let h = harness();
    let mut spec = NewTask::new(h.team.id, "Conflicted");
    spec.assignee = Some(h.engineer.id);
    spec.repo_ids = vec![h.repo.id];
    let task = h.tasks.create_task(spec).unwrap();
    for to in [
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::InApproval,
        TaskStatus::Merging,
    ] {
        h.tasks.change_status(task.id, to, None).unwrap();
    }

    let git = Arc::new(FakeGit::new().fail_merges(1));
    let worker =
        MergeWorker::new(h.store.clone(), h.clock.clone(), Arc::clone(&h.config), git);
    worker.run_once().await.unwrap();

    assert_eq!(h.tasks.get_task(task.id).unwrap().status, TaskStatus::InProgress);
    assert_eq!(h.store.events_of_type("merge.failed", None).len(), 1);
}

#[test]
fn agent_reviewer_request_lands_in_its_inbox() {
    let h = harness();
    let mut spec = NewTask::new(h.team.id, "Review me");
    spec.assignee = Some(h.engineer.id);
    let task = h.tasks.create_task(spec).unwrap();
    h.tasks.change_status(task.id, TaskStatus::InProgress, None).unwrap();
    h.tasks.change_status(task.id, TaskStatus::InReview, None).unwrap();

    let review = h.reviews.request_review(task.id, None, ParticipantKind::Agent).unwrap();
    assert_eq!(review.reviewer, Some(Participant::agent(h.reviewer.id)));
    let inbox = h.bus.inbox(&Participant::agent(h.reviewer.id), true, None);
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].content.contains(&format!("please review task {}", task.id)));
}
