//! Authoritative task store and remote reconciliation.
//!
//! # Responsibility
//! - Sole mutator of the session's task list: add/update/delete, grid
//!   scheduling with fork-on-overdue, completion toggling, reordering.
//! - Arbitrate remote-origin writes against the local freshness window.
//! - Publish a defensive snapshot to subscribers after every mutation.
//!
//! # Invariants
//! - Mutations on unknown ids are silent no-ops; the engine never returns
//!   errors for normal operation.
//! - A remote write to an id edited locally within `GRACE_PERIOD_MS` is
//!   discarded, never applied.
//! - `sort_order` is a dense 0..n-1 sequence after every resort/merge.
//! - Forking an overdue task mints a new identity and keeps the original as
//!   a `Rescheduled` record with its historical date.

use crate::clock::{Clock, SystemClock};
use crate::model::patch::TaskPatch;
use crate::model::task::{
    BoardRow, EisenhowerQuad, Space, Task, TaskId, TaskKind, TaskStatus,
};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Window after a local edit during which remote writes to the same id are
/// discarded, so a stale store echo cannot visually revert the user's own
/// action.
pub const GRACE_PERIOD_MS: i64 = 10_000;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Request model for creating a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    /// Estimated minutes.
    pub duration: u32,
    pub kind: TaskKind,
    /// Caller-minted identity; generated when absent.
    pub id: Option<TaskId>,
    pub notes: Option<String>,
    pub parent_id: Option<TaskId>,
    pub space: Option<Space>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, duration: u32, kind: TaskKind) -> Self {
        Self {
            title: title.into(),
            duration,
            kind,
            id: None,
            notes: None,
            parent_id: None,
            space: None,
        }
    }

    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn in_space(mut self, space: Space) -> Self {
        self.space = Some(space);
        self
    }
}

type Listener = Box<dyn FnMut(&[Task])>;

/// Authoritative in-memory task store with freshness-window reconciliation.
///
/// One instance per session, passed by reference into the UI layer; there is
/// deliberately no global singleton so tests construct isolated managers.
pub struct TaskManager {
    tasks: Vec<Task>,
    /// Epoch-ms stamp of the most recent local edit per id. Pruned on
    /// delete so the map stays bounded by the live task count.
    last_local_update: HashMap<TaskId, i64>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    clock: Arc<dyn Clock>,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskManager {
    /// Creates an empty manager on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty manager on an injected clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Vec::new(),
            last_local_update: HashMap::new(),
            listeners: Vec::new(),
            next_subscription: 0,
            clock,
        }
    }

    /// Registers a listener and synchronously delivers the current snapshot
    /// to it before returning.
    pub fn subscribe(&mut self, mut listener: impl FnMut(&[Task]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        let snapshot = self.tasks.clone();
        listener(&snapshot);

        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    /// Returns a defensive copy of the task list.
    pub fn get_tasks(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Creates an unscheduled task at the end of the list and returns it so
    /// the caller can chain further actions.
    pub fn add_task(&mut self, request: NewTask) -> Task {
        let mut task = Task::with_id(
            request.id.unwrap_or_else(Uuid::new_v4),
            request.title,
            request.duration,
            request.kind,
        );
        task.notes = request.notes;
        task.parent_id = request.parent_id;
        if let Some(space) = request.space {
            task.space = space;
        }
        task.created_at = self.clock.now_ms();
        task.sort_order = self.tasks.len() as i64;

        self.mark_fresh(task.id);
        self.tasks.push(task.clone());
        self.notify();
        task
    }

    /// Applies an explicit field patch to the matching task.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("event=update_task module=manager status=skipped reason=unknown_id id={id}");
            return;
        };

        patch.apply(task);
        self.mark_fresh(id);
        self.notify();
    }

    /// Removes a task and its freshness entry.
    pub fn delete_task(&mut self, id: TaskId) {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            return;
        }

        self.last_local_update.remove(&id);
        self.notify();
    }

    /// Removes every task and all freshness bookkeeping.
    pub fn delete_all_tasks(&mut self) {
        self.tasks.clear();
        self.last_local_update.clear();
        self.notify();
    }

    /// Flips a task between completed and its prior effective state:
    /// scheduled when both date and row are present, unscheduled otherwise.
    /// Returns whether the task is now complete.
    pub fn toggle_task_complete(&mut self, id: TaskId) -> bool {
        let now = self.clock.now_ms();
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };

        let now_complete = if task.status == TaskStatus::Completed {
            task.completed_at = None;
            if task.due_date.is_some() && task.assigned_row.is_some() {
                task.status = TaskStatus::Scheduled;
            } else {
                task.clear_placement();
            }
            false
        } else {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(now);
            task.eisenhower_quad = None;
            true
        };

        self.mark_fresh(id);
        self.notify();
        now_complete
    }

    /// Places a task on `date`/`row`, forking overdue tasks instead of
    /// moving them.
    ///
    /// A task whose current due date is in the past (and which is not
    /// sitting in the sidebar) is not moved when dropped onto the present or
    /// future: the original is kept as a `Rescheduled` record with its
    /// historical date, and a clone with a fresh identity takes the new
    /// cell. Every other case is a plain in-place update.
    pub fn schedule_task(
        &mut self,
        id: TaskId,
        date: NaiveDate,
        row: BoardRow,
        kind: Option<TaskKind>,
    ) {
        let today = self.clock.today();
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("event=schedule_task module=manager status=skipped reason=unknown_id id={id}");
            return;
        };

        let overdue = self.tasks[index]
            .due_date
            .is_some_and(|due_date| due_date < today);
        let forks =
            overdue && self.tasks[index].status != TaskStatus::Unscheduled && date >= today;

        if forks {
            let original = &mut self.tasks[index];
            original.status = TaskStatus::Rescheduled;
            original.completed_at = None;

            let mut clone = original.clone();
            clone.id = Uuid::new_v4();
            clone.created_at = self.clock.now_ms();
            clone.sort_order = self.tasks.len() as i64;
            clone.status = TaskStatus::Scheduled;
            clone.due_date = Some(date);
            clone.assigned_row = Some(row);
            if let Some(kind) = kind {
                clone.kind = kind;
            }
            clone.eisenhower_quad = None;
            clone.is_frozen = false;

            info!(
                "event=task_fork module=manager status=ok original_id={id} clone_id={} new_due_date={date}",
                clone.id
            );

            self.mark_fresh(id);
            self.mark_fresh(clone.id);
            self.tasks.push(clone);
        } else {
            let task = &mut self.tasks[index];
            task.status = TaskStatus::Scheduled;
            task.due_date = Some(date);
            task.assigned_row = Some(row);
            if let Some(kind) = kind {
                task.kind = kind;
            }
            task.eisenhower_quad = None;
            task.completed_at = None;
            task.is_frozen = false;

            self.mark_fresh(id);
        }

        self.notify();
    }

    /// Returns a task to the sidebar, clearing every placement field.
    pub fn unschedule_task(&mut self, id: TaskId) {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return;
        };

        task.clear_placement();
        self.mark_fresh(id);
        self.notify();
    }

    /// Moves a task into an Eisenhower quadrant, which always pulls it off
    /// the grid.
    pub fn set_eisenhower_quad(&mut self, id: TaskId, quad: EisenhowerQuad) {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return;
        };

        task.clear_placement();
        task.eisenhower_quad = Some(quad);
        self.mark_fresh(id);
        self.notify();
    }

    /// Reinserts `source_id` immediately before `target_id` and renumbers
    /// the whole list.
    ///
    /// The entire order counts as one fresh local edit: every id is stamped
    /// so an in-flight remote merge cannot undo the reorder.
    pub fn reorder_tasks(&mut self, source_id: TaskId, target_id: TaskId) {
        if source_id == target_id {
            return;
        }
        let Some(source_index) = self.tasks.iter().position(|task| task.id == source_id) else {
            return;
        };
        if !self.tasks.iter().any(|task| task.id == target_id) {
            return;
        }

        let moved = self.tasks.remove(source_index);
        let target_index = self
            .tasks
            .iter()
            .position(|task| task.id == target_id)
            .unwrap_or(self.tasks.len());
        self.tasks.insert(target_index, moved);

        let now = self.clock.now_ms();
        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.sort_order = index as i64;
            self.last_local_update.insert(task.id, now);
        }
        self.notify();
    }

    /// Force-unschedules the overflow of an overloaded day.
    ///
    /// Walks tasks scheduled on `date` in list order, accumulating their
    /// durations; once the running total exceeds `capacity_minutes` every
    /// further task is pulled back to the sidebar with `is_frozen` set.
    /// Returns the number of tasks frozen.
    pub fn freeze_overloaded(&mut self, date: NaiveDate, capacity_minutes: u32) -> usize {
        let mut booked: u64 = 0;
        let mut frozen_ids = Vec::new();

        for task in &mut self.tasks {
            if task.status != TaskStatus::Scheduled || task.due_date != Some(date) {
                continue;
            }
            booked += u64::from(task.duration);
            if booked > u64::from(capacity_minutes) {
                task.clear_placement();
                task.is_frozen = true;
                frozen_ids.push(task.id);
            }
        }

        if frozen_ids.is_empty() {
            return 0;
        }

        for id in &frozen_ids {
            self.mark_fresh(*id);
        }
        info!(
            "event=freeze_overloaded module=manager status=ok date={date} frozen={}",
            frozen_ids.len()
        );
        self.notify();
        frozen_ids.len()
    }

    /// Drops every historical `Rescheduled` record.
    pub fn clear_rescheduled_tasks(&mut self) {
        let cleared: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Rescheduled)
            .map(|task| task.id)
            .collect();
        if cleared.is_empty() {
            return;
        }

        self.tasks
            .retain(|task| task.status != TaskStatus::Rescheduled);
        for id in cleared {
            self.last_local_update.remove(&id);
        }
        self.notify();
    }

    /// Re-publishes the current snapshot without mutating tasks. Baseline
    /// stat tracking lives outside the engine; this exists so subscribers
    /// re-render after it resets.
    pub fn reset_stats(&mut self) {
        self.notify();
    }

    /// Applies a remote-origin single-task write, subject to the freshness
    /// guard.
    pub fn upsert_task(&mut self, task: Task) {
        let now = self.clock.now_ms();
        if self.is_fresh(task.id, now) {
            info!(
                "event=remote_upsert module=manager status=discarded reason=fresh_local_edit id={}",
                task.id
            );
            return;
        }

        match self.tasks.iter().position(|held| held.id == task.id) {
            Some(index) => self.tasks[index] = task,
            None => self.tasks.push(task),
        }
        self.resort_and_renumber();
        self.notify();
    }

    /// Unconditionally removes a task in response to a remote delete event.
    pub fn remove_task(&mut self, id: TaskId) {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            return;
        }

        self.last_local_update.remove(&id);
        self.notify();
    }

    /// Reconciles the full local list against a freshly fetched remote list.
    ///
    /// Per id: a fresh local edit wins unconditionally; otherwise the remote
    /// copy wins, and a stale local task absent from the remote is dropped
    /// as a remote-side delete. Remote tasks unknown locally are appended in
    /// remote order.
    pub fn merge_tasks(&mut self, remote_tasks: Vec<Task>) {
        let now = self.clock.now_ms();

        let mut remote_order = Vec::with_capacity(remote_tasks.len());
        let mut remote_by_id: HashMap<TaskId, Task> = HashMap::with_capacity(remote_tasks.len());
        for task in remote_tasks {
            if !remote_by_id.contains_key(&task.id) {
                remote_order.push(task.id);
            }
            remote_by_id.insert(task.id, task);
        }

        let locals = std::mem::take(&mut self.tasks);
        let local_ids: HashSet<TaskId> = locals.iter().map(|task| task.id).collect();

        let mut kept_fresh = 0usize;
        let mut replaced = 0usize;
        let mut dropped = 0usize;
        let mut merged = Vec::with_capacity(locals.len());

        for local in locals {
            if self.is_fresh(local.id, now) {
                kept_fresh += 1;
                merged.push(local);
            } else if let Some(remote) = remote_by_id.remove(&local.id) {
                replaced += 1;
                merged.push(remote);
            } else {
                dropped += 1;
                self.last_local_update.remove(&local.id);
            }
        }

        let mut appended = 0usize;
        for id in remote_order {
            if local_ids.contains(&id) {
                continue;
            }
            if let Some(remote) = remote_by_id.remove(&id) {
                appended += 1;
                merged.push(remote);
            }
        }

        self.tasks = merged;
        self.repair_rows();
        self.resort_and_renumber();

        info!(
            "event=merge module=manager status=ok kept_fresh={kept_fresh} replaced={replaced} dropped={dropped} appended={appended}"
        );
        self.notify();
    }

    /// Replaces the whole list, healing rows and re-densifying order. Used
    /// when hydrating from a fresh fetch or import.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.repair_rows();
        self.resort_and_renumber();
        self.notify();
    }

    fn mark_fresh(&mut self, id: TaskId) {
        self.last_local_update.insert(id, self.clock.now_ms());
    }

    fn is_fresh(&self, id: TaskId, now: i64) -> bool {
        self.last_local_update
            .get(&id)
            .is_some_and(|stamp| now - stamp < GRACE_PERIOD_MS)
    }

    /// Assigns a row derived from `kind` to any scheduled, dated task that
    /// lost its row to a partial write or predates the row field.
    fn repair_rows(&mut self) {
        for task in &mut self.tasks {
            if task.status == TaskStatus::Scheduled
                && task.due_date.is_some()
                && task.assigned_row.is_none()
            {
                task.assigned_row = Some(BoardRow::for_kind(task.kind));
            }
        }
    }

    fn resort_and_renumber(&mut self) {
        self.tasks.sort_by_key(|task| task.sort_order);
        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.sort_order = index as i64;
        }
    }

    fn notify(&mut self) {
        let snapshot = self.tasks.clone();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&snapshot);
        }
    }
}
