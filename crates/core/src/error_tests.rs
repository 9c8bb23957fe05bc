// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn unresolved_dep_display() {
    let unfinished = UnresolvedDep { task_id: TaskId(42), status: Some(TaskStatus::Todo) };
    assert_eq!(unfinished.to_string(), "42@todo");
    let missing = UnresolvedDep { task_id: TaskId(7), status: None };
    assert_eq!(missing.to_string(), "7@missing");
}

#[test]
fn dependencies_unresolved_lists_every_dep() {
    let err = CoreError::DependenciesUnresolved(vec![
        UnresolvedDep { task_id: TaskId(1), status: Some(TaskStatus::InProgress) },
        UnresolvedDep { task_id: TaskId(2), status: None },
    ]);
    assert_eq!(err.to_string(), "dependencies unresolved: 1@in_progress, 2@missing");
}

#[test]
fn budget_exceeded_names_cap_and_amounts() {
    let err = CoreError::BudgetExceeded {
        cap: BudgetCapKind::TeamDaily,
        spent: Cost::from_micros(1_000_000),
        limit: Cost::from_micros(1_000_000),
    };
    assert_eq!(
        err.to_string(),
        "budget exceeded (team_daily): spent 1.000000, limit 1.000000"
    );
}

#[test]
fn invalid_transition_is_a_conflict() {
    let err = CoreError::invalid_transition(TaskStatus::Done, TaskStatus::Todo);
    assert!(matches!(err, CoreError::Conflict(_)));
    assert_eq!(err.to_string(), "conflict: invalid transition: done -> todo");
}

#[test]
fn only_concurrency_is_transient() {
    assert!(CoreError::Concurrency("turn in flight".into()).is_transient());
    assert!(!CoreError::conflict("x").is_transient());
    assert!(!CoreError::not_found("task", 1).is_transient());
}
