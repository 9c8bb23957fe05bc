// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::fixture;
use gaffer_core::{AgentStatus, EventId, ReviewId};

#[test]
fn attempts_count_up_from_one() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let first =
        fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    assert_eq!(first.attempt, 1);
    assert!(first.is_pending());

    fix.reviews.set_verdict(first.id, Verdict::Reject, "nope", "alice").unwrap();
    fix.tasks.change_status(task.id, TaskStatus::InReview, None).unwrap();
    let second = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    assert_eq!(second.attempt, 2);
}

#[test]
fn second_pending_review_is_conflict() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    let err = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[test]
fn agent_review_request_picks_idle_reviewer_and_messages_it() {
    let fix = fixture();
    let task = fix.task_in_status("Fix login", TaskStatus::InReview);
    let review =
        fix.reviews.request_review(task.id, None, ParticipantKind::Agent).unwrap();
    assert_eq!(review.reviewer, Some(Participant::agent(fix.reviewer.id)));

    let inbox = fix.bus.inbox(&Participant::agent(fix.reviewer.id), true, None);
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].content.contains(&format!("please review task {}", task.id)));
    assert_eq!(inbox[0].task_id, Some(task.id));
}

#[test]
fn busy_reviewers_are_not_picked() {
    let fix = fixture();
    fix.store
        .transact(fix.clock.epoch_ms(), |txn| {
            txn.tables.require_agent_mut(fix.reviewer.id)?.status = AgentStatus::Working;
            Ok(())
        })
        .unwrap();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let review =
        fix.reviews.request_review(task.id, None, ParticipantKind::Agent).unwrap();
    assert!(review.reviewer.is_none());
    assert!(fix.bus.inbox(&Participant::agent(fix.reviewer.id), true, None).is_empty());
}

#[test]
fn team_policy_can_prefer_agent_review() {
    let fix = fixture();
    let mut settings = fix.team.settings.clone();
    settings.prefer_agent_review = true;
    fix.admin.update_settings(fix.team.id, settings).unwrap();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let review = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    assert_eq!(review.reviewer, Some(Participant::agent(fix.reviewer.id)));
}

#[test]
fn comments_append_events_with_anchors() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let review = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    let comment = fix
        .reviews
        .add_comment(review.id, Participant::user("alice"), "rename", Some("a.py"), Some(10))
        .unwrap();
    assert_eq!(comment.file_path.as_deref(), Some("a.py"));
    assert_eq!(comment.line_number, Some(10));

    let events = fix.store.events_of_type("review.comment_added", None);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data["file_path"], "a.py");
    assert_eq!(events[0].data["line_number"], 10);
    assert_eq!(fix.reviews.list_comments(review.id).len(), 1);
}

#[test]
fn approve_moves_task_to_in_approval() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let review = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    let review = fix.reviews.set_verdict(review.id, Verdict::Approve, "lgtm", "alice").unwrap();
    assert_eq!(review.verdict, Some(Verdict::Approve));
    assert_eq!(fix.tasks.get_task(task.id).unwrap().status, TaskStatus::InApproval);
    // No merge yet.
    assert!(fix.store.read(|t| t.merge_jobs.is_empty()));
}

#[test]
fn reject_moves_task_back_to_in_progress() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let review = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    fix.reviews.set_verdict(review.id, Verdict::Reject, "wrong approach", "alice").unwrap();
    assert_eq!(fix.tasks.get_task(task.id).unwrap().status, TaskStatus::InProgress);
    assert!(fix.store.events_of_type("review.feedback_sent", None).is_empty());
}

#[test]
fn request_changes_sends_structured_feedback() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let review = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    fix.reviews
        .add_comment(review.id, Participant::user("alice"), "rename", Some("a.py"), Some(10))
        .unwrap();
    fix.reviews
        .add_comment(review.id, Participant::user("alice"), "tighten docs", None, None)
        .unwrap();
    fix.reviews.set_verdict(review.id, Verdict::RequestChanges, "see below", "alice").unwrap();

    assert_eq!(fix.tasks.get_task(task.id).unwrap().status, TaskStatus::InProgress);
    let inbox = fix.bus.inbox(&Participant::agent(fix.engineer.id), true, None);
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].content.contains("see below"));
    assert!(inbox[0].content.contains("a.py:10 \u{2014} rename"));
    assert!(inbox[0].content.contains("tighten docs"));

    let kinds = fix.stream_kinds(&StreamId::review(review.id));
    assert!(kinds.contains(&"review.verdict".to_string()));
    assert!(kinds.contains(&"review.feedback_sent".to_string()));
}

#[test]
fn request_changes_without_assignee_skips_message() {
    let fix = fixture();
    let task = fix.new_task("x");
    fix.tasks.change_status(task.id, TaskStatus::InProgress, None).unwrap();
    fix.tasks.change_status(task.id, TaskStatus::InReview, None).unwrap();
    let review = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    fix.reviews.set_verdict(review.id, Verdict::RequestChanges, "fix it", "alice").unwrap();

    assert_eq!(fix.tasks.get_task(task.id).unwrap().status, TaskStatus::InProgress);
    assert!(fix.store.events_of_type("review.feedback_sent", None).is_empty());
    assert!(!fix.store.events_of_type("review.verdict", None).is_empty());
}

#[test]
fn verdict_twice_is_conflict() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let review = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    fix.reviews.set_verdict(review.id, Verdict::Approve, "lgtm", "alice").unwrap();
    let err = fix.reviews.set_verdict(review.id, Verdict::Reject, "no", "bob").unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[test]
fn approve_past_in_review_records_without_transition() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let review = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    // A human already pushed the task onward.
    fix.tasks.change_status(task.id, TaskStatus::InApproval, None).unwrap();
    fix.tasks.change_status(task.id, TaskStatus::Merging, None).unwrap();

    let review = fix.reviews.set_verdict(review.id, Verdict::Approve, "lgtm", "alice").unwrap();
    assert_eq!(review.verdict, Some(Verdict::Approve));
    assert_eq!(fix.tasks.get_task(task.id).unwrap().status, TaskStatus::Merging);
}

#[test]
fn merge_readiness_consults_highest_attempt() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let first = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    fix.reviews.set_verdict(first.id, Verdict::Reject, "no", "alice").unwrap();
    fix.tasks.change_status(task.id, TaskStatus::InReview, None).unwrap();
    let second = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    fix.reviews.set_verdict(second.id, Verdict::Approve, "yes", "alice").unwrap();

    let latest = fix.reviews.merge_readiness(task.id).unwrap();
    assert_eq!(latest.id, second.id);
    assert_eq!(latest.verdict, Some(Verdict::Approve));
    assert_eq!(fix.reviews.list_reviews(task.id).len(), 2);
}

#[test]
fn review_events_read_in_order() {
    let fix = fixture();
    let task = fix.task_in_status("x", TaskStatus::InReview);
    let review = fix.reviews.request_review(task.id, None, ParticipantKind::User).unwrap();
    fix.reviews
        .add_comment(review.id, Participant::user("alice"), "one", Some("a.rs"), Some(1))
        .unwrap();
    fix.reviews.set_verdict(review.id, Verdict::Approve, "ok", "alice").unwrap();
    let events = fix.store.events_for_stream(&StreamId::review(review.id), EventId(0), None);
    let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec!["review.created", "review.comment_added", "review.verdict"]);
}

#[test]
fn unknown_review_is_not_found() {
    let fix = fixture();
    assert!(matches!(
        fix.reviews.set_verdict(ReviewId(42), Verdict::Approve, "", "a"),
        Err(CoreError::NotFound { .. })
    ));
}
