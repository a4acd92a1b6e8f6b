//! Snapshot diffing for minimal remote writes.

use crate::model::task::{Task, TaskId};
use std::collections::HashMap;

/// Returns every task in `after` that is new or whose full value differs
/// from its `before` counterpart. This is the unit pushed upstream, keeping
/// remote writes minimal.
pub fn diff_tasks(before: &[Task], after: &[Task]) -> Vec<Task> {
    let before_by_id: HashMap<TaskId, &Task> =
        before.iter().map(|task| (task.id, task)).collect();

    after
        .iter()
        .filter(|task| match before_by_id.get(&task.id) {
            Some(previous) => *previous != *task,
            None => true,
        })
        .cloned()
        .collect()
}

/// Returns the ids present in `before` but absent from `after` (local
/// deletions to propagate).
pub fn deleted_ids(before: &[Task], after: &[Task]) -> Vec<TaskId> {
    before
        .iter()
        .map(|task| task.id)
        .filter(|id| !after.iter().any(|task| task.id == *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{deleted_ids, diff_tasks};
    use crate::model::task::{Task, TaskKind};

    #[test]
    fn diff_reports_new_and_changed_tasks_only() {
        let unchanged = Task::new("unchanged", 10, TaskKind::Low);
        let mut edited = Task::new("before", 20, TaskKind::Medium);
        let added = Task::new("added", 30, TaskKind::High);

        let before = vec![unchanged.clone(), edited.clone()];
        edited.title = "after".to_string();
        let after = vec![unchanged, edited.clone(), added.clone()];

        let changed = diff_tasks(&before, &after);
        assert_eq!(changed.len(), 2);
        assert!(changed.iter().any(|task| task.id == edited.id));
        assert!(changed.iter().any(|task| task.id == added.id));
    }

    #[test]
    fn deleted_ids_reports_removed_tasks() {
        let kept = Task::new("kept", 10, TaskKind::Low);
        let removed = Task::new("removed", 10, TaskKind::Low);

        let before = vec![kept.clone(), removed.clone()];
        let after = vec![kept];

        assert_eq!(deleted_ids(&before, &after), vec![removed.id]);
    }
}
