// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merge queue and the single-claimer merge worker.

use crate::tasks::change_status_in;
use gaffer_adapters::GitService;
use gaffer_core::{
    Clock, Config, CoreError, EventBody, EventMeta, MergeJob, MergeJobId, MergeJobStatus,
    StreamId, Task, TaskStatus,
};
use gaffer_storage::{Store, Txn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CLAIM_POLL: Duration = Duration::from_millis(500);

/// Enqueue one merge job per repository the task touches.
///
/// Called by the task engine inside the transaction that moves the task to
/// `merging`; the merge module owns all merge-job writes.
pub(crate) fn queue_jobs_in(txn: &mut Txn<'_>, task: &Task) -> Result<Vec<MergeJob>, CoreError> {
    let strategy = txn.tables.require_team(task.team_id)?.settings.merge_strategy;
    let mut jobs = Vec::with_capacity(task.repo_ids.len());
    for &repo_id in &task.repo_ids {
        txn.tables.require_repo(repo_id)?;
        let id = txn.tables.next_merge_job_id();
        let job = MergeJob {
            id,
            task_id: task.id,
            repo_id,
            status: MergeJobStatus::Queued,
            strategy,
            commit: None,
            error: None,
            created_at_ms: txn.now_ms(),
            started_at_ms: None,
            finished_at_ms: None,
        };
        txn.tables.merge_jobs.insert(id, job.clone());
        txn.append(
            StreamId::merge(id),
            &EventBody::MergeQueued { job_id: id, task_id: task.id, repo_id, strategy },
            EventMeta::default(),
        )?;
        jobs.push(job);
    }
    Ok(jobs)
}

/// A claimed job with everything the git call needs.
struct ClaimedJob {
    job_id: MergeJobId,
    task_id: gaffer_core::TaskId,
    repo_name: String,
    branch: String,
    strategy: gaffer_core::MergeStrategy,
}

/// Background worker draining the merge queue, one job at a time, in id
/// order, so a git tree never sees concurrent writers.
pub struct MergeWorker<C: Clock> {
    store: Store,
    clock: C,
    config: Arc<Config>,
    git: Arc<dyn GitService>,
}

impl<C: Clock> MergeWorker<C> {
    pub fn new(store: Store, clock: C, config: Arc<Config>, git: Arc<dyn GitService>) -> Self {
        Self { store, clock, config, git }
    }

    /// Run until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(CLAIM_POLL) => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!(error = %e, "merge worker pass failed");
                    }
                }
            }
        }
    }

    /// Drain everything currently queued. Returns the number of jobs that
    /// reached a terminal status.
    pub async fn run_once(&self) -> Result<usize, CoreError> {
        let mut finalized = 0;
        while let Some(claimed) = self.claim_next()? {
            self.execute(claimed).await?;
            finalized += 1;
        }
        Ok(finalized)
    }

    /// Claim the oldest queued job: mark it running and append
    /// `merge.started`. Jobs whose task already left `merging` (e.g. moved
    /// on manually) are finalized as failed without touching the task.
    fn claim_next(&self) -> Result<Option<ClaimedJob>, CoreError> {
        loop {
            let claimed = self.store.transact(self.clock.epoch_ms(), |txn| {
                let Some(job) = txn.tables.next_queued_merge_job().cloned() else {
                    return Ok(None);
                };
                let task = txn.tables.require_task(job.task_id)?.clone();
                if task.status != TaskStatus::Merging {
                    fail_job_in(txn, job.id, "task left merging before the merge ran")?;
                    // Signal the caller to look again.
                    return Ok(Some(None));
                }
                let repo_name = txn.tables.require_repo(job.repo_id)?.name.clone();
                let now = txn.now_ms();
                let record = txn.tables.require_merge_job_mut(job.id)?;
                record.status = MergeJobStatus::Running;
                record.started_at_ms = Some(now);
                txn.append(
                    StreamId::merge(job.id),
                    &EventBody::MergeStarted { job_id: job.id, task_id: job.task_id },
                    EventMeta::default(),
                )?;
                Ok(Some(Some(ClaimedJob {
                    job_id: job.id,
                    task_id: job.task_id,
                    repo_name,
                    branch: task.branch.clone(),
                    strategy: job.strategy,
                })))
            })?;
            match claimed {
                None => return Ok(None),
                Some(None) => continue,
                Some(Some(c)) => return Ok(Some(c)),
            }
        }
    }

    async fn execute(&self, claimed: ClaimedJob) -> Result<(), CoreError> {
        let merge = self.git.merge(&claimed.repo_name, &claimed.branch, claimed.strategy);
        let outcome = tokio::time::timeout(self.config.merge.job_timeout(), merge).await;
        match outcome {
            Ok(Ok(merged)) => self.finalize_success(&claimed, &merged.commit),
            Ok(Err(git_err)) => self.finalize_failure(&claimed, &git_err.to_string()),
            Err(_) => self.finalize_failure(
                &claimed,
                &format!(
                    "merge exceeded {}s timeout",
                    self.config.merge.job_timeout_seconds
                ),
            ),
        }
    }

    /// Record the commit, append `merge.completed`, and move the task to
    /// `done` when every one of its merge jobs has succeeded.
    fn finalize_success(&self, claimed: &ClaimedJob, commit: &str) -> Result<(), CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let job = txn.tables.require_merge_job_mut(claimed.job_id)?;
            job.status = MergeJobStatus::Success;
            job.commit = Some(commit.to_string());
            job.finished_at_ms = Some(now);
            txn.append(
                StreamId::merge(claimed.job_id),
                &EventBody::MergeCompleted {
                    job_id: claimed.job_id,
                    task_id: claimed.task_id,
                    commit: commit.to_string(),
                },
                EventMeta::default(),
            )?;
            let all_succeeded = txn
                .tables
                .merge_jobs
                .values()
                .filter(|j| j.task_id == claimed.task_id)
                .all(|j| j.status == MergeJobStatus::Success);
            let task = txn.tables.require_task(claimed.task_id)?;
            if all_succeeded && task.status == TaskStatus::Merging {
                change_status_in(txn, claimed.task_id, TaskStatus::Done, Some("merge-worker"))?;
            }
            tracing::info!(job = %claimed.job_id, task = %claimed.task_id, commit, "merge completed");
            Ok(())
        })
    }

    /// Record the error, append `merge.failed`, and send the task back to
    /// `in_progress` for another pass.
    fn finalize_failure(&self, claimed: &ClaimedJob, error: &str) -> Result<(), CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            fail_job_in(txn, claimed.job_id, error)?;
            let task = txn.tables.require_task(claimed.task_id)?;
            if task.status == TaskStatus::Merging {
                change_status_in(txn, claimed.task_id, TaskStatus::InProgress, Some("merge-worker"))?;
            }
            tracing::warn!(job = %claimed.job_id, task = %claimed.task_id, error, "merge failed");
            Ok(())
        })
    }
}

fn fail_job_in(txn: &mut Txn<'_>, job_id: MergeJobId, error: &str) -> Result<(), CoreError> {
    let now = txn.now_ms();
    let job = txn.tables.require_merge_job_mut(job_id)?;
    job.status = MergeJobStatus::Failed;
    job.error = Some(error.to_string());
    job.finished_at_ms = Some(now);
    let task_id = job.task_id;
    txn.append(
        StreamId::merge(job_id),
        &EventBody::MergeFailed { job_id, task_id, error: error.to_string() },
        EventMeta::default(),
    )
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
