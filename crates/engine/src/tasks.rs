// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task engine: creation, updates, assignment, the state machine, and
//! DAG-gated starts.

use crate::merge;
use gaffer_core::{
    branch_name, AgentId, Clock, Config, CoreError, EventBody, EventMeta, Participant, Priority,
    RepoId, StreamId, Task, TaskId, TaskStatus, TeamId, UnresolvedDep,
};
use gaffer_storage::{Channel, Store, Txn};
use indexmap::IndexSet;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Parameters for task creation.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub team_id: TeamId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub dri: Option<AgentId>,
    pub assignee: Option<AgentId>,
    pub depends_on: Vec<TaskId>,
    pub repo_ids: Vec<RepoId>,
    pub tags: BTreeSet<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl NewTask {
    pub fn new(team_id: TeamId, title: impl Into<String>) -> Self {
        Self {
            team_id,
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            dri: None,
            assignee: None,
            depends_on: Vec::new(),
            repo_ids: Vec::new(),
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Field updates; status is not updated here.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Option<BTreeSet<String>>,
}

/// One entry of a batch create. `depends_on_indices` reference other entries
/// of the same batch by 0-based position; they resolve to real ids after the
/// whole batch has been assigned ids.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub spec: NewTask,
    pub depends_on_indices: Vec<usize>,
}

impl BatchEntry {
    pub fn new(spec: NewTask) -> Self {
        Self { spec, depends_on_indices: Vec::new() }
    }

    pub fn depending_on(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.depends_on_indices = indices.into_iter().collect();
        self
    }
}

#[derive(Clone)]
pub struct TaskEngine<C: Clock> {
    store: Store,
    clock: C,
    config: Arc<Config>,
}

impl<C: Clock> TaskEngine<C> {
    pub fn new(store: Store, clock: C, config: Arc<Config>) -> Self {
        Self { store, clock, config }
    }

    /// Create a task. The branch name is derived here, once, and is stable
    /// for the task's whole life.
    pub fn create_task(&self, spec: NewTask) -> Result<Task, CoreError> {
        self.store
            .transact(self.clock.epoch_ms(), |txn| create_in(txn, &self.config, spec, None))
    }

    /// Create several tasks atomically. Ids are assigned in array order,
    /// then `depends_on_indices` resolve to those ids. Any invalid entry
    /// rolls the whole batch back.
    pub fn batch_create(&self, entries: Vec<BatchEntry>) -> Result<Vec<Task>, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            for (position, entry) in entries.iter().enumerate() {
                for &index in &entry.depends_on_indices {
                    if index >= entries.len() {
                        return Err(CoreError::Validation(format!(
                            "entry {position}: depends_on_indices[{index}] is out of range"
                        )));
                    }
                    if index == position {
                        return Err(CoreError::Validation(format!(
                            "entry {position}: task cannot depend on itself"
                        )));
                    }
                }
            }
            // First pass assigns ids so index references can point forward.
            let ids: Vec<TaskId> =
                entries.iter().map(|_| txn.tables.next_task_id()).collect();
            let mut tasks = Vec::with_capacity(entries.len());
            for (entry, &id) in entries.iter().zip(&ids) {
                let mut spec = entry.spec.clone();
                spec.depends_on
                    .extend(entry.depends_on_indices.iter().map(|&index| ids[index]));
                tasks.push(create_in(txn, &self.config, spec, Some(id))?);
            }
            Ok(tasks)
        })
    }

    /// Update title/description/priority/tags. Appends `task.updated` with
    /// only the fields that actually changed.
    pub fn update_task(&self, task_id: TaskId, update: TaskUpdate) -> Result<Task, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            let task = txn.tables.require_task_mut(task_id)?;
            if task.is_terminal() {
                return Err(CoreError::Conflict(format!(
                    "task {task_id} is {} and cannot be updated",
                    task.status
                )));
            }
            let mut changed = BTreeMap::new();
            if let Some(title) = update.title {
                let title = title.trim().to_string();
                if title.is_empty() {
                    return Err(CoreError::validation("title must not be empty"));
                }
                if title != task.title {
                    task.title = title.clone();
                    changed.insert("title".to_string(), serde_json::Value::String(title));
                }
            }
            if let Some(description) = update.description {
                if description != task.description {
                    task.description = description.clone();
                    changed
                        .insert("description".to_string(), serde_json::Value::String(description));
                }
            }
            if let Some(priority) = update.priority {
                if priority != task.priority {
                    task.priority = priority;
                    changed.insert("priority".to_string(), serde_json::json!(priority));
                }
            }
            if let Some(tags) = update.tags {
                if tags != task.tags {
                    changed.insert("tags".to_string(), serde_json::json!(tags));
                    task.tags = tags;
                }
            }
            if changed.is_empty() {
                return Ok(task.clone());
            }
            task.updated_at_ms = now;
            let task = task.clone();
            txn.append(
                StreamId::task(task_id),
                &EventBody::TaskUpdated { task_id, changed },
                EventMeta::default(),
            )?;
            Ok(task)
        })
    }

    /// Assign or unassign. A no-op assignment appends nothing.
    pub fn assign_task(
        &self,
        task_id: TaskId,
        to: Option<AgentId>,
        actor: Option<&str>,
    ) -> Result<Task, CoreError> {
        self.store.transact(self.clock.epoch_ms(), |txn| {
            let now = txn.now_ms();
            if let Some(agent_id) = to {
                let agent = txn.tables.require_agent(agent_id)?;
                let task = txn.tables.require_task(task_id)?;
                if agent.team_id != task.team_id {
                    return Err(CoreError::Validation(format!(
                        "agent {agent_id} is not on team {}",
                        task.team_id
                    )));
                }
            }
            let task = txn.tables.require_task_mut(task_id)?;
            if task.is_terminal() {
                return Err(CoreError::Conflict(format!(
                    "task {task_id} is {} and cannot be assigned",
                    task.status
                )));
            }
            let from = task.assignee;
            if from == to {
                return Ok(task.clone());
            }
            task.assignee = to;
            task.updated_at_ms = now;
            let task = task.clone();
            txn.append(
                StreamId::task(task_id),
                &EventBody::TaskAssigned { task_id, from, to },
                actor.map(EventMeta::actor).unwrap_or_default(),
            )?;
            Ok(task)
        })
    }

    /// Validate and perform a status transition.
    pub fn change_status(
        &self,
        task_id: TaskId,
        to: TaskStatus,
        actor: Option<&str>,
    ) -> Result<Task, CoreError> {
        self.store
            .transact(self.clock.epoch_ms(), |txn| change_status_in(txn, task_id, to, actor))
    }

    /// Append a free-form comment to the task's history.
    pub fn add_comment(
        &self,
        task_id: TaskId,
        author: Participant,
        content: &str,
    ) -> Result<(), CoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CoreError::validation("comment must not be empty"));
        }
        self.store.transact(self.clock.epoch_ms(), |txn| {
            txn.tables.require_task(task_id)?;
            txn.append(
                StreamId::task(task_id),
                &EventBody::TaskCommentAdded {
                    task_id,
                    author: author.clone(),
                    content: content.to_string(),
                },
                EventMeta::actor(author.to_string()),
            )
        })
    }

    pub fn get_task(&self, task_id: TaskId) -> Result<Task, CoreError> {
        self.store.read(|t| t.require_task(task_id).cloned())
    }

    /// Tasks of a team, in id order, optionally filtered.
    pub fn list_tasks(
        &self,
        team_id: TeamId,
        status: Option<TaskStatus>,
        assignee: Option<AgentId>,
    ) -> Vec<Task> {
        self.store.read(|t| {
            t.tasks
                .values()
                .filter(|task| task.team_id == team_id)
                .filter(|task| status.is_none_or(|s| task.status == s))
                .filter(|task| assignee.is_none_or(|a| task.assignee == Some(a)))
                .cloned()
                .collect()
        })
    }
}

/// Insert one task inside an open transaction. `preassigned` carries the id
/// when the caller (batch create) already drew it from the sequence.
fn create_in(
    txn: &mut Txn<'_>,
    config: &Config,
    spec: NewTask,
    preassigned: Option<TaskId>,
) -> Result<Task, CoreError> {
    let title = spec.title.trim().to_string();
    if title.is_empty() {
        return Err(CoreError::validation("title must not be empty"));
    }
    let team = txn.tables.require_team(spec.team_id)?.clone();
    for agent_id in spec.dri.iter().chain(spec.assignee.iter()) {
        txn.tables.require_agent(*agent_id)?;
    }
    for repo_id in &spec.repo_ids {
        txn.tables.require_repo(*repo_id)?;
    }
    let id = preassigned.unwrap_or_else(|| txn.tables.next_task_id());
    let depends_on: IndexSet<TaskId> = spec.depends_on.iter().copied().collect();
    if depends_on.contains(&id) {
        return Err(CoreError::validation("task cannot depend on itself"));
    }
    let prefix = team.settings.branch_prefix.as_deref().unwrap_or(&config.branching.prefix);
    let branch = branch_name(prefix, id, &title, config.branching.slug_max_length);
    let now = txn.now_ms();
    let task = Task {
        id,
        team_id: spec.team_id,
        title: title.clone(),
        description: spec.description,
        status: TaskStatus::Todo,
        priority: spec.priority,
        dri: spec.dri,
        assignee: spec.assignee,
        depends_on: depends_on.clone(),
        repo_ids: spec.repo_ids,
        tags: spec.tags,
        branch: branch.clone(),
        metadata: spec.metadata,
        created_at_ms: now,
        updated_at_ms: now,
        completed_at_ms: None,
    };
    txn.tables.tasks.insert(id, task.clone());
    txn.append(
        StreamId::task(id),
        &EventBody::TaskCreated {
            task_id: id,
            team_id: spec.team_id,
            title,
            branch,
            depends_on: depends_on.iter().copied().collect(),
            priority: spec.priority,
        },
        EventMeta::default(),
    )?;
    Ok(task)
}

/// Perform a status transition inside an open transaction.
///
/// Shared with the review coordinator (verdict-driven transitions) and the
/// merge worker (finalization), so every path through the state machine
/// enforces the same table, the same DAG gate, and the same events.
pub(crate) fn change_status_in(
    txn: &mut Txn<'_>,
    task_id: TaskId,
    to: TaskStatus,
    actor: Option<&str>,
) -> Result<Task, CoreError> {
    let now = txn.now_ms();
    let task = txn.tables.require_task(task_id)?;
    let from = task.status;
    if !from.can_transition_to(to) {
        return Err(CoreError::invalid_transition(from, to));
    }
    if to == TaskStatus::InProgress {
        let mut unresolved = Vec::new();
        for &dep in &task.depends_on {
            match txn.tables.tasks.get(&dep) {
                None => unresolved.push(UnresolvedDep { task_id: dep, status: None }),
                Some(d) if d.status != TaskStatus::Done => {
                    unresolved.push(UnresolvedDep { task_id: dep, status: Some(d.status) });
                }
                Some(_) => {}
            }
        }
        if !unresolved.is_empty() {
            return Err(CoreError::DependenciesUnresolved(unresolved));
        }
    }
    let task = txn.tables.require_task_mut(task_id)?;
    task.status = to;
    task.updated_at_ms = now;
    if to == TaskStatus::Done {
        task.completed_at_ms = Some(now);
    }
    let task = task.clone();
    txn.append(
        StreamId::task(task_id),
        &EventBody::TaskStatusChanged {
            task_id,
            from,
            to,
            actor: actor.map(str::to_string),
        },
        actor.map(EventMeta::actor).unwrap_or_default(),
    )?;
    txn.notify(Channel::TaskStatusChanged, task_id.to_string());
    if to == TaskStatus::Merging {
        merge::queue_jobs_in(txn, &task)?;
    }
    tracing::debug!(task = %task_id, %from, %to, "task status changed");
    Ok(task)
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
