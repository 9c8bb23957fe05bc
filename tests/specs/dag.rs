// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S2 — DAG gating; S3 — batch create with internal dependencies.

use super::support::harness;
use gaffer_core::{CoreError, TaskStatus, UnresolvedDep};
use gaffer_engine::{BatchEntry, NewTask};

#[test]
fn s2_dag_gating() {
    let h = harness();
    let a = h.tasks.create_task(NewTask::new(h.team.id, "A")).unwrap();
    let mut spec = NewTask::new(h.team.id, "B");
    spec.depends_on = vec![a.id];
    let b = h.tasks.create_task(spec).unwrap();

    // Blocked while A is todo, with the offending dep and its status listed.
    let err = h.tasks.change_status(b.id, TaskStatus::InProgress, None).unwrap_err();
    match err {
        CoreError::DependenciesUnresolved(deps) => {
            assert_eq!(
                deps,
                vec![UnresolvedDep { task_id: a.id, status: Some(TaskStatus::Todo) }]
            );
        }
        other => panic!("expected DependenciesUnresolved, got {other}"),
    }

    // Drive A to done, then the retry succeeds.
    for to in [
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::InApproval,
        TaskStatus::Merging,
        TaskStatus::Done,
    ] {
        h.tasks.change_status(a.id, to, None).unwrap();
    }
    let b = h.tasks.change_status(b.id, TaskStatus::InProgress, None).unwrap();
    assert_eq!(b.status, TaskStatus::InProgress);
}

#[test]
fn s3_batch_with_internal_deps() {
    let h = harness();
    let tasks = h
        .tasks
        .batch_create(vec![
            BatchEntry::new(NewTask::new(h.team.id, "X")),
            BatchEntry::new(NewTask::new(h.team.id, "Y")).depending_on([0]),
        ])
        .unwrap();
    let x = tasks[0].clone();
    let y = tasks[1].clone();
    assert_eq!(y.depends_on.iter().copied().collect::<Vec<_>>(), vec![x.id]);

    // Y first: blocked.
    let err = h.tasks.change_status(y.id, TaskStatus::InProgress, None).unwrap_err();
    assert!(matches!(err, CoreError::DependenciesUnresolved(_)));

    // X through to done, then Y starts.
    for to in [
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::InApproval,
        TaskStatus::Merging,
        TaskStatus::Done,
    ] {
        h.tasks.change_status(x.id, to, None).unwrap();
    }
    let y = h.tasks.change_status(y.id, TaskStatus::InProgress, None).unwrap();
    assert_eq!(y.status, TaskStatus::InProgress);
}

#[test]
fn batch_validation_failure_inserts_nothing() {
    let h = harness();
    let err = h
        .tasks
        .batch_create(vec![
            BatchEntry::new(NewTask::new(h.team.id, "ok")),
            BatchEntry::new(NewTask::new(h.team.id, "bad")).depending_on([9]),
        ])
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(h.tasks.list_tasks(h.team.id, None, None).is_empty());
    assert!(h.store.all_events().is_empty());
}
