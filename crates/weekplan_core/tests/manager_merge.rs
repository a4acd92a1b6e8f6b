use chrono::NaiveDate;
use std::sync::Arc;
use weekplan_core::{
    BoardRow, ManualClock, NewTask, Task, TaskKind, TaskManager, TaskPatch, TaskStatus,
    GRACE_PERIOD_MS,
};
use uuid::Uuid;

fn manager() -> (TaskManager, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_date(
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
    ));
    (TaskManager::with_clock(clock.clone()), clock)
}

fn remote_copy(task: &Task, title: &str) -> Task {
    let mut remote = task.clone();
    remote.title = title.to_string();
    remote
}

#[test]
fn fresh_local_edit_survives_merge() {
    let (mut manager, _clock) = manager();
    let task = manager.add_task(NewTask::new("local title", 30, TaskKind::Medium));

    // Remote echo arrives moments after the local edit, inside the grace
    // window.
    manager.merge_tasks(vec![remote_copy(&task, "stale remote title")]);

    assert_eq!(manager.get_tasks()[0].title, "local title");
}

#[test]
fn remote_wins_after_grace_period() {
    let (mut manager, clock) = manager();
    let task = manager.add_task(NewTask::new("local title", 30, TaskKind::Medium));

    clock.advance_ms(GRACE_PERIOD_MS + 1_000);
    manager.merge_tasks(vec![remote_copy(&task, "authoritative remote title")]);

    assert_eq!(manager.get_tasks()[0].title, "authoritative remote title");
}

#[test]
fn update_task_refreshes_the_grace_window() {
    let (mut manager, clock) = manager();
    let task = manager.add_task(NewTask::new("v1", 30, TaskKind::Medium));

    clock.advance_ms(GRACE_PERIOD_MS + 1_000);
    manager.update_task(task.id, TaskPatch::new().title("v2"));

    // The update_task call re-stamped freshness, so remote loses again.
    clock.advance_ms(2_000);
    manager.merge_tasks(vec![remote_copy(&task, "remote")]);
    assert_eq!(manager.get_tasks()[0].title, "v2");
}

#[test]
fn merge_drops_stale_local_task_absent_from_remote() {
    let (mut manager, clock) = manager();
    let gone = manager.add_task(NewTask::new("deleted elsewhere", 10, TaskKind::Low));
    let kept = manager.add_task(NewTask::new("still remote", 10, TaskKind::Low));

    clock.advance_ms(GRACE_PERIOD_MS + 1_000);
    manager.merge_tasks(vec![kept.clone()]);

    let tasks = manager.get_tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, kept.id);
    assert!(tasks.iter().all(|task| task.id != gone.id));
}

#[test]
fn merge_keeps_fresh_task_even_when_absent_from_remote() {
    let (mut manager, _clock) = manager();
    let just_created = manager.add_task(NewTask::new("seconds old", 10, TaskKind::Low));

    // Remote fetch raced the push of the brand-new task: empty remote list
    // must not erase it.
    manager.merge_tasks(Vec::new());

    assert_eq!(manager.get_tasks().len(), 1);
    assert_eq!(manager.get_tasks()[0].id, just_created.id);
}

#[test]
fn merge_appends_tasks_created_elsewhere() {
    let (mut manager, clock) = manager();
    let local = manager.add_task(NewTask::new("local", 10, TaskKind::Low));
    clock.advance_ms(GRACE_PERIOD_MS + 1_000);

    let mut foreign = Task::new("from another device", 20, TaskKind::High);
    foreign.sort_order = 5;
    manager.merge_tasks(vec![local.clone(), foreign.clone()]);

    let tasks = manager.get_tasks();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().any(|task| task.id == foreign.id));
    // Merge re-densifies sort order.
    let orders: Vec<_> = tasks.iter().map(|task| task.sort_order).collect();
    assert_eq!(orders, vec![0, 1]);
}

#[test]
fn merge_repairs_missing_rows_idempotently() {
    let (mut manager, clock) = manager();
    clock.advance_ms(GRACE_PERIOD_MS + 1_000);

    let mut torn = Task::new("partial write", 30, TaskKind::High);
    torn.status = TaskStatus::Scheduled;
    torn.due_date = NaiveDate::from_ymd_opt(2024, 2, 5);
    torn.assigned_row = None;

    manager.merge_tasks(vec![torn.clone()]);
    let first_pass = manager.get_tasks();
    assert_eq!(first_pass[0].assigned_row, Some(BoardRow::Goal));

    manager.merge_tasks(vec![first_pass[0].clone()]);
    assert_eq!(manager.get_tasks(), first_pass);
}

#[test]
fn upsert_discards_remote_write_to_fresh_task() {
    let (mut manager, _clock) = manager();
    let task = manager.add_task(NewTask::new("mine", 10, TaskKind::Low));

    manager.upsert_task(remote_copy(&task, "echoed stale value"));

    assert_eq!(manager.get_tasks()[0].title, "mine");
}

#[test]
fn upsert_replaces_or_appends_after_grace_period() {
    let (mut manager, clock) = manager();
    let task = manager.add_task(NewTask::new("mine", 10, TaskKind::Low));
    clock.advance_ms(GRACE_PERIOD_MS + 1_000);

    manager.upsert_task(remote_copy(&task, "remote value"));
    assert_eq!(manager.get_tasks()[0].title, "remote value");

    let foreign = Task::new("new from remote", 20, TaskKind::High);
    manager.upsert_task(foreign.clone());
    let tasks = manager.get_tasks();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().any(|held| held.id == foreign.id));
}

#[test]
fn remove_task_ignores_freshness() {
    let (mut manager, _clock) = manager();
    let task = manager.add_task(NewTask::new("fresh but deleted remotely", 10, TaskKind::Low));

    manager.remove_task(task.id);

    assert!(manager.get_tasks().is_empty());
}

#[test]
fn deleted_id_reappearing_from_remote_is_treated_as_new() {
    let (mut manager, _clock) = manager();
    let task = manager.add_task(NewTask::new("short lived", 10, TaskKind::Low));

    // Local delete prunes freshness bookkeeping for the id, so a remote
    // copy arriving right afterwards is appended, not discarded.
    manager.delete_task(task.id);
    manager.upsert_task(task.clone());

    assert_eq!(manager.get_tasks().len(), 1);
    assert_eq!(manager.get_tasks()[0].id, task.id);
}

#[test]
fn reorder_protects_whole_order_from_inflight_merge() {
    let (mut manager, clock) = manager();
    let a = manager.add_task(NewTask::new("a", 10, TaskKind::Low));
    let b = manager.add_task(NewTask::new("b", 10, TaskKind::Low));
    let c = manager.add_task(NewTask::new("c", 10, TaskKind::Low));
    clock.advance_ms(GRACE_PERIOD_MS + 1_000);

    // Remote snapshot taken before the reorder.
    let stale_remote = manager.get_tasks();
    manager.reorder_tasks(c.id, a.id);
    manager.merge_tasks(stale_remote);

    let ids: Vec<_> = manager.get_tasks().iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![c.id, a.id, b.id]);
}

#[test]
fn set_tasks_hydrates_with_repair_and_dense_order() {
    let (mut manager, _clock) = manager();

    let mut first = Task::with_id(
        Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap(),
        "imported a",
        30,
        TaskKind::Medium,
    );
    first.status = TaskStatus::Scheduled;
    first.due_date = NaiveDate::from_ymd_opt(2024, 2, 5);
    first.sort_order = 40;

    let mut second = Task::with_id(
        Uuid::parse_str("00000000-0000-4000-8000-000000000002").unwrap(),
        "imported b",
        30,
        TaskKind::Low,
    );
    second.sort_order = 7;

    manager.set_tasks(vec![first.clone(), second.clone()]);

    let tasks = manager.get_tasks();
    assert_eq!(tasks[0].id, second.id);
    assert_eq!(tasks[0].sort_order, 0);
    assert_eq!(tasks[1].id, first.id);
    assert_eq!(tasks[1].sort_order, 1);
    assert_eq!(tasks[1].assigned_row, Some(BoardRow::Focus));
}
