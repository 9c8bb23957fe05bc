// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review coordinator: attempts, comments, verdicts, and the automated
//! review → revision feedback loop.

use crate::messages::{send_in, SendMessage};
use crate::tasks::change_status_in;
use gaffer_core::review::ReviewComment;
use gaffer_core::{
    Clock, CoreError, EventBody, EventMeta, Participant, ParticipantKind, Review, ReviewId,
    StreamId, TaskId, TaskStatus, Verdict,
};
use gaffer_storage::{Store, Txn};

#[derive(Clone)]
pub struct ReviewCoordinator<C: Clock> {
    store: Store,
    clock: C,
}

impl<C: Clock> ReviewCoordinator<C> {
    pub fn new(store: Store, clock: C) -> Self {
        Self { store, clock }
    }

    /// Open the next review attempt for a task.
    ///
    /// When no reviewer is named and an agent reviewer is wanted (explicitly
    /// or by team policy), an idle reviewer agent is picked and a review
    /// request lands in its inbox within the same transaction.
    pub fn request_review(
        &self,
        task_id: TaskId,
        reviewer: Option<Participant>,
        reviewer_kind: ParticipantKind,
    ) -> Result<Review, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let task = txn.tables.require_task(task_id)?.clone();
            if task.is_terminal() {
                return Err(CoreError::Conflict(format!(
                    "task {task_id} is {} and cannot be reviewed",
                    task.status
                )));
            }
            if let Some(pending) = txn.tables.reviews_of_task(task_id).iter().find(|r| r.is_pending())
            {
                return Err(CoreError::Conflict(format!(
                    "review attempt {} for task {task_id} is still pending",
                    pending.attempt
                )));
            }
            let team = txn.tables.require_team(task.team_id)?.clone();
            let reviewer = match reviewer {
                Some(r) => Some(r),
                None if reviewer_kind == ParticipantKind::Agent
                    || team.settings.prefer_agent_review =>
                {
                    txn.tables.idle_reviewer_of_team(team.id).map(|a| Participant::agent(a.id))
                }
                None => None,
            };
            let attempt = txn.tables.latest_attempt_of_task(task_id) + 1;
            let id = txn.tables.next_review_id();
            let review = Review {
                id,
                task_id,
                attempt,
                reviewer: reviewer.clone(),
                verdict: None,
                summary: None,
                created_at_ms: txn.now_ms(),
                resolved_at_ms: None,
            };
            txn.tables.reviews.insert(id, review.clone());
            txn.append(
                StreamId::review(id),
                &EventBody::ReviewCreated { review_id: id, task_id, attempt, reviewer: reviewer.clone() },
                EventMeta::default(),
            )?;
            if let Some(agent_reviewer) =
                reviewer.as_ref().filter(|r| r.kind == ParticipantKind::Agent)
            {
                let content = format!(
                    "please review task {task_id} (attempt {attempt}): {}\nbranch: {}",
                    task.title, task.branch
                );
                send_in(
                    txn,
                    SendMessage::new(
                        team.id,
                        Participant::user("review-coordinator"),
                        agent_reviewer.clone(),
                        content,
                    )
                    .about_task(task_id),
                )?;
            }
            Ok(review)
        })
    }

    pub fn add_comment(
        &self,
        review_id: ReviewId,
        author: Participant,
        content: &str,
        file_path: Option<&str>,
        line_number: Option<u32>,
    ) -> Result<ReviewComment, CoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CoreError::validation("comment must not be empty"));
        }
        self.store.transact(self.clock.epoch_ms(), |txn| {
            txn.tables.require_review(review_id)?;
            let id = txn.tables.next_comment_id();
            let comment = ReviewComment {
                id,
                review_id,
                author: author.clone(),
                content: content.to_string(),
                file_path: file_path.map(str::to_string),
                line_number,
                created_at_ms: txn.now_ms(),
            };
            txn.tables.review_comments.insert(id, comment.clone());
            txn.append(
                StreamId::review(review_id),
                &EventBody::ReviewCommentAdded {
                    review_id,
                    comment_id: id,
                    author,
                    content: content.to_string(),
                    file_path: file_path.map(str::to_string),
                    line_number,
                },
                EventMeta::default(),
            )?;
            Ok(comment)
        })
    }

    /// Record the verdict and drive the task accordingly.
    ///
    /// approve: `in_review → in_approval` (recorded without a transition if
    /// the task is already past review). reject: `in_review → in_progress`.
    /// request_changes: `in_review → in_progress`, plus one structured
    /// feedback message to the assignee.
    pub fn set_verdict(
        &self,
        review_id: ReviewId,
        verdict: Verdict,
        summary: &str,
        reviewer: &str,
    ) -> Result<Review, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let review = txn.tables.require_review_mut(review_id)?;
            if !review.is_pending() {
                return Err(CoreError::Conflict(format!(
                    "review {review_id} already has a verdict"
                )));
            }
            review.verdict = Some(verdict);
            review.summary = Some(summary.to_string());
            review.resolved_at_ms = Some(now);
            let review = review.clone();
            let task_id = review.task_id;
            txn.append(
                StreamId::review(review_id),
                &EventBody::ReviewVerdict {
                    review_id,
                    task_id,
                    verdict,
                    reviewer: reviewer.to_string(),
                },
                EventMeta::actor(reviewer),
            )?;

            let task = txn.tables.require_task(task_id)?.clone();
            match verdict {
                Verdict::Approve => {
                    if task.status == TaskStatus::InReview {
                        change_status_in(txn, task_id, TaskStatus::InApproval, Some(reviewer))?;
                    }
                }
                Verdict::Reject => {
                    if task.status == TaskStatus::InReview {
                        change_status_in(txn, task_id, TaskStatus::InProgress, Some(reviewer))?;
                    }
                }
                Verdict::RequestChanges => {
                    if task.status == TaskStatus::InReview {
                        change_status_in(txn, task_id, TaskStatus::InProgress, Some(reviewer))?;
                    }
                    match task.assignee {
                        Some(assignee) => {
                            let content = feedback_content(txn, review_id, summary);
                            let message = send_in(
                                txn,
                                SendMessage::new(
                                    task.team_id,
                                    Participant::user(reviewer),
                                    Participant::agent(assignee),
                                    content,
                                )
                                .about_task(task_id),
                            )?;
                            txn.append(
                                StreamId::review(review_id),
                                &EventBody::ReviewFeedbackSent {
                                    review_id,
                                    task_id,
                                    message_id: message.id,
                                    recipient: assignee,
                                },
                                EventMeta::actor(reviewer),
                            )?;
                        }
                        None => {
                            tracing::warn!(
                                task = %task_id,
                                review = %review_id,
                                "request_changes on unassigned task, no feedback message"
                            );
                        }
                    }
                }
            }
            Ok(review)
        })
    }

    pub fn get_review(&self, review_id: ReviewId) -> Result<Review, CoreError> {
        self.store.read(|t| t.require_review(review_id).cloned())
    }

    /// Reviews of a task, ascending by attempt.
    pub fn list_reviews(&self, task_id: TaskId) -> Vec<Review> {
        self.store.read(|t| t.reviews_of_task(task_id).into_iter().cloned().collect())
    }

    pub fn list_comments(&self, review_id: ReviewId) -> Vec<ReviewComment> {
        self.store.read(|t| t.comments_of_review(review_id).into_iter().cloned().collect())
    }

    /// The verdict that decides merge readiness: the highest-attempt
    /// review's, pending or not.
    pub fn merge_readiness(&self, task_id: TaskId) -> Option<Review> {
        self.store.read(|t| t.reviews_of_task(task_id).last().map(|r| (*r).clone()))
    }
}

/// Render the structured feedback body: summary first, then one
/// `file:line — comment` line per comment, read from the review's event
/// stream (the audit log is the read model for the feedback loop).
fn feedback_content(txn: &Txn<'_>, review_id: ReviewId, summary: &str) -> String {
    let mut lines = vec![summary.to_string()];
    for event in txn.committed_stream(&StreamId::review(review_id)) {
        if let EventBody::ReviewCommentAdded { content, file_path, line_number, .. } = event.body()
        {
            lines.push(match (file_path, line_number) {
                (Some(file), Some(line)) => format!("{file}:{line} \u{2014} {content}"),
                (Some(file), None) => format!("{file} \u{2014} {content}"),
                _ => content,
            });
        }
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "reviews_tests.rs"]
mod tests;
