//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by the board, sync and storage.
//! - Encode the status/date/row coupling rules as a typed validation.
//! - Provide the bidirectional priority-kind to board-row mapping.
//!
//! # Invariants
//! - `id` is stable, non-nil and never reused for another task.
//! - `status == Unscheduled` exactly when `due_date` and `assigned_row` are
//!   both absent.
//! - `completed_at` is set exactly while `status == Completed`.
//! - An Eisenhower quadrant is only carried by unscheduled tasks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every task.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// Priority/category tag of a task.
///
/// Serialized as `type` on the wire to match the hosted schema naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Captured but not yet prioritized.
    Backlog,
    High,
    Medium,
    Low,
    Leisure,
    Chores,
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// In the sidebar backlog, not placed on the weekly grid.
    Unscheduled,
    /// Placed on a day cell of the weekly grid.
    Scheduled,
    /// Done; keeps its grid position for the completed view.
    Completed,
    /// Historical record left behind when an overdue task was forked onto a
    /// new date. Never shown as live work.
    Rescheduled,
}

/// Category lane a scheduled task occupies in the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardRow {
    Goal,
    Focus,
    Work,
    Leisure,
    Chores,
}

/// Eisenhower matrix quadrant. Mutually exclusive with grid placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EisenhowerQuad {
    Do,
    Decide,
    Delegate,
    Delete,
}

/// Optional work/private partition tag. Filter-only; never affects
/// reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    Work,
    Private,
}

impl BoardRow {
    /// Maps a task kind to its default board row.
    ///
    /// Backlog has no row of its own and lands in FOCUS, the same fallback
    /// used for data that predates the row field.
    pub fn for_kind(kind: TaskKind) -> Self {
        match kind {
            TaskKind::High => Self::Goal,
            TaskKind::Medium => Self::Focus,
            TaskKind::Low => Self::Work,
            TaskKind::Leisure => Self::Leisure,
            TaskKind::Chores => Self::Chores,
            TaskKind::Backlog => Self::Focus,
        }
    }

    /// Maps a board row back to the task kind it represents.
    pub fn default_kind(self) -> TaskKind {
        match self {
            Self::Goal => TaskKind::High,
            Self::Focus => TaskKind::Medium,
            Self::Work => TaskKind::Low,
            Self::Leisure => TaskKind::Leisure,
            Self::Chores => TaskKind::Chores,
        }
    }
}

/// Typed invariant violations for a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    /// `id` is the nil UUID.
    NilId,
    /// Unscheduled task still carries a due date or row.
    UnscheduledWithPlacement,
    /// Scheduled/rescheduled task has no due date.
    MissingDueDate,
    /// Eisenhower quadrant set on a task that is not unscheduled.
    QuadrantWhilePlaced,
    /// `completed_at` presence disagrees with `status == Completed`.
    CompletionTimestampMismatch,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be the nil uuid"),
            Self::UnscheduledWithPlacement => {
                write!(f, "unscheduled task must not carry due_date or assigned_row")
            }
            Self::MissingDueDate => {
                write!(f, "scheduled and rescheduled tasks require due_date")
            }
            Self::QuadrantWhilePlaced => {
                write!(f, "eisenhower_quad is only valid on unscheduled tasks")
            }
            Self::CompletionTimestampMismatch => {
                write!(f, "completed_at must be set exactly while status is completed")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
///
/// Field values the engine treats as opaque (`title`, `notes`) may arrive
/// pre-encrypted; decryption is a storage-boundary concern. Serde renames
/// follow the hosted camelCase schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Estimated minutes.
    pub duration: u32,
    /// Serialized as `type` to match the hosted schema naming.
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub status: TaskStatus,
    /// Present iff the task occupies a day cell.
    pub due_date: Option<NaiveDate>,
    /// Present for grid placement; absent rows are healed from `kind` by the
    /// manager's repair pass.
    pub assigned_row: Option<BoardRow>,
    pub eisenhower_quad: Option<EisenhowerQuad>,
    pub notes: Option<String>,
    /// Optional link to a parent task (subtask grouping).
    pub parent_id: Option<TaskId>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Set only while completed.
    pub completed_at: Option<i64>,
    /// Dense local ordering; renumbered 0..n-1 on every resort.
    pub sort_order: i64,
    /// Set by the freeze-overloaded bulk operation when a task was
    /// force-unscheduled off an overfull day.
    pub is_frozen: bool,
    pub space: Space,
}

impl Task {
    /// Creates an unscheduled task with a generated stable id.
    pub fn new(title: impl Into<String>, duration: u32, kind: TaskKind) -> Self {
        Self::with_id(Uuid::new_v4(), title, duration, kind)
    }

    /// Creates an unscheduled task with a caller-provided stable id.
    ///
    /// Used by import/sync paths where identity already exists externally.
    pub fn with_id(id: TaskId, title: impl Into<String>, duration: u32, kind: TaskKind) -> Self {
        Self {
            id,
            title: title.into(),
            duration,
            kind,
            status: TaskStatus::Unscheduled,
            due_date: None,
            assigned_row: None,
            eisenhower_quad: None,
            notes: None,
            parent_id: None,
            created_at: 0,
            completed_at: None,
            sort_order: 0,
            is_frozen: false,
            space: Space::Private,
        }
    }

    /// Checks the status/date/row coupling invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }

        match self.status {
            TaskStatus::Unscheduled => {
                if self.due_date.is_some() || self.assigned_row.is_some() {
                    return Err(TaskValidationError::UnscheduledWithPlacement);
                }
            }
            TaskStatus::Scheduled | TaskStatus::Rescheduled => {
                if self.due_date.is_none() {
                    return Err(TaskValidationError::MissingDueDate);
                }
            }
            // A task checked off from the sidebar is completed without ever
            // having held a grid cell, so no due date is required here.
            TaskStatus::Completed => {}
        }

        if self.eisenhower_quad.is_some() && self.status != TaskStatus::Unscheduled {
            return Err(TaskValidationError::QuadrantWhilePlaced);
        }

        let completed = self.status == TaskStatus::Completed;
        if completed != self.completed_at.is_some() {
            return Err(TaskValidationError::CompletionTimestampMismatch);
        }

        Ok(())
    }

    /// Returns whether the task occupies a grid cell (scheduled or completed
    /// with a date).
    pub fn is_placed(&self) -> bool {
        matches!(self.status, TaskStatus::Scheduled | TaskStatus::Completed)
            && self.due_date.is_some()
    }

    /// Clears every scheduling-related field back to sidebar state.
    pub(crate) fn clear_placement(&mut self) {
        self.status = TaskStatus::Unscheduled;
        self.due_date = None;
        self.assigned_row = None;
        self.eisenhower_quad = None;
        self.completed_at = None;
        self.is_frozen = false;
    }
}
