//! Explicit update command for task mutations.
//!
//! # Responsibility
//! - Restrict partial updates to the known task fields.
//! - Distinguish "leave unchanged" from "set to null" for nullable fields.
//!
//! # Invariants
//! - Applying a patch never touches `id` or `created_at`.
//! - An empty (default) patch is a no-op.

use crate::model::task::{BoardRow, EisenhowerQuad, Space, Task, TaskId, TaskKind, TaskStatus};
use chrono::NaiveDate;

/// Field-level update command applied by `TaskManager::update_task`.
///
/// Outer `Option` means "change this field"; for nullable task fields the
/// inner `Option` carries the new value, so `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub duration: Option<u32>,
    pub kind: Option<TaskKind>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assigned_row: Option<Option<BoardRow>>,
    pub eisenhower_quad: Option<Option<EisenhowerQuad>>,
    pub notes: Option<Option<String>>,
    pub parent_id: Option<Option<TaskId>>,
    pub completed_at: Option<Option<i64>>,
    pub sort_order: Option<i64>,
    pub is_frozen: Option<bool>,
    pub space: Option<Space>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn duration(mut self, minutes: u32) -> Self {
        self.duration = Some(minutes);
        self
    }

    pub fn kind(mut self, kind: TaskKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn assigned_row(mut self, row: Option<BoardRow>) -> Self {
        self.assigned_row = Some(row);
        self
    }

    pub fn eisenhower_quad(mut self, quad: Option<EisenhowerQuad>) -> Self {
        self.eisenhower_quad = Some(quad);
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn space(mut self, space: Space) -> Self {
        self.space = Some(space);
        self
    }

    /// Returns whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies every set field onto `task`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(duration) = self.duration {
            task.duration = duration;
        }
        if let Some(kind) = self.kind {
            task.kind = kind;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(row) = self.assigned_row {
            task.assigned_row = row;
        }
        if let Some(quad) = self.eisenhower_quad {
            task.eisenhower_quad = quad;
        }
        if let Some(notes) = &self.notes {
            task.notes = notes.clone();
        }
        if let Some(parent_id) = self.parent_id {
            task.parent_id = parent_id;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(sort_order) = self.sort_order {
            task.sort_order = sort_order;
        }
        if let Some(is_frozen) = self.is_frozen {
            task.is_frozen = is_frozen;
        }
        if let Some(space) = self.space {
            task.space = space;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TaskPatch;
    use crate::model::task::{Task, TaskKind};

    #[test]
    fn empty_patch_changes_nothing() {
        let mut task = Task::new("inbox zero", 15, TaskKind::Chores);
        let before = task.clone();
        TaskPatch::new().apply(&mut task);
        assert_eq!(task, before);
        assert!(TaskPatch::new().is_empty());
    }

    #[test]
    fn some_none_clears_nullable_field() {
        let mut task = Task::new("read paper", 45, TaskKind::Medium);
        task.notes = Some("sections 1-3".to_string());

        TaskPatch::new().notes(None).apply(&mut task);
        assert_eq!(task.notes, None);
    }
}
