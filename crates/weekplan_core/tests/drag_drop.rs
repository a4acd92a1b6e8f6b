use chrono::NaiveDate;
use std::sync::Arc;
use weekplan_core::{
    BoardRow, DragDropCoordinator, DragPayload, EisenhowerQuad, ManualClock, NewTask, TaskKind,
    TaskManager, TaskStatus,
};

fn manager() -> TaskManager {
    TaskManager::with_clock(Arc::new(ManualClock::at_date(
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
    )))
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()
}

#[test]
fn drag_state_is_explicit_and_cleared_by_drop() {
    let mut manager = manager();
    let task = manager.add_task(NewTask::new("draggable", 30, TaskKind::Medium));
    let mut coordinator = DragDropCoordinator::new();

    assert!(!coordinator.is_dragging());
    coordinator.begin_drag();
    assert!(coordinator.is_dragging());

    coordinator.drop_on_grid(
        &mut manager,
        &DragPayload::new(task.id.to_string()),
        monday(),
        Some(BoardRow::Focus),
    );
    assert!(!coordinator.is_dragging());

    coordinator.begin_drag();
    coordinator.end_drag();
    assert!(!coordinator.is_dragging());
}

#[test]
fn matrix_drop_derives_kind_from_row() {
    let mut manager = manager();
    let task = manager.add_task(NewTask::new("promote me", 30, TaskKind::Low));
    let mut coordinator = DragDropCoordinator::new();

    coordinator.drop_on_grid(
        &mut manager,
        &DragPayload::new(task.id.to_string()),
        monday(),
        Some(BoardRow::Goal),
    );

    let held = &manager.get_tasks()[0];
    assert_eq!(held.status, TaskStatus::Scheduled);
    assert_eq!(held.due_date, Some(monday()));
    assert_eq!(held.assigned_row, Some(BoardRow::Goal));
    assert_eq!(held.kind, TaskKind::High);
}

#[test]
fn stacked_drop_derives_row_from_task_kind() {
    let mut manager = manager();
    let task = manager.add_task(NewTask::new("errands", 30, TaskKind::Chores));
    let mut coordinator = DragDropCoordinator::new();

    coordinator.drop_on_grid(
        &mut manager,
        &DragPayload::new(task.id.to_string()),
        monday(),
        None,
    );

    let held = &manager.get_tasks()[0];
    assert_eq!(held.assigned_row, Some(BoardRow::Chores));
    assert_eq!(held.kind, TaskKind::Chores);
}

#[test]
fn stacked_drop_coerces_backlog_to_medium_focus() {
    let mut manager = manager();
    let task = manager.add_task(NewTask::new("unsorted", 30, TaskKind::Backlog));
    let mut coordinator = DragDropCoordinator::new();

    coordinator.drop_on_grid(
        &mut manager,
        &DragPayload::new(task.id.to_string()),
        monday(),
        None,
    );

    let held = &manager.get_tasks()[0];
    assert_eq!(held.assigned_row, Some(BoardRow::Focus));
    assert_eq!(held.kind, TaskKind::Medium);
}

#[test]
fn sidebar_drop_unschedules() {
    let mut manager = manager();
    let task = manager.add_task(NewTask::new("back to backlog", 30, TaskKind::Medium));
    manager.schedule_task(task.id, monday(), BoardRow::Focus, None);
    let mut coordinator = DragDropCoordinator::new();

    coordinator.drop_on_sidebar(&mut manager, &DragPayload::new(task.id.to_string()));

    let held = &manager.get_tasks()[0];
    assert_eq!(held.status, TaskStatus::Unscheduled);
    assert_eq!(held.due_date, None);
}

#[test]
fn eisenhower_drop_sets_quadrant() {
    let mut manager = manager();
    let task = manager.add_task(NewTask::new("strategize", 30, TaskKind::High));
    manager.schedule_task(task.id, monday(), BoardRow::Goal, None);
    let mut coordinator = DragDropCoordinator::new();

    coordinator.drop_on_eisenhower(
        &mut manager,
        &DragPayload::new(task.id.to_string()),
        EisenhowerQuad::Do,
    );

    let held = &manager.get_tasks()[0];
    assert_eq!(held.eisenhower_quad, Some(EisenhowerQuad::Do));
    assert_eq!(held.status, TaskStatus::Unscheduled);
}

#[test]
fn malformed_payload_is_ignored() {
    let mut manager = manager();
    manager.add_task(NewTask::new("safe", 30, TaskKind::Medium));
    let mut coordinator = DragDropCoordinator::new();
    coordinator.begin_drag();

    coordinator.drop_on_grid(
        &mut manager,
        &DragPayload::new("not-a-uuid"),
        monday(),
        Some(BoardRow::Focus),
    );

    // Drop still ends the drag; task state untouched.
    assert!(!coordinator.is_dragging());
    assert_eq!(manager.get_tasks()[0].status, TaskStatus::Unscheduled);
}
