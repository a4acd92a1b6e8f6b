//! Drag/drop to scheduling-intent translation.
//!
//! # Responsibility
//! - Resolve a drop target (grid cell, sidebar, Eisenhower quadrant) into
//!   the matching `TaskManager` call.
//! - Derive the row/kind pairing when the drop target specifies only one of
//!   the two.
//!
//! # Invariants
//! - Drag progress is explicit coordinator state, not ambient global state;
//!   every drop ends the active drag.
//! - Unparseable drag payloads are logged and ignored, never surfaced as
//!   errors (stale-closure UI races must not crash the app).

use crate::manager::task_manager::TaskManager;
use crate::model::task::{BoardRow, EisenhowerQuad, TaskId, TaskKind};
use chrono::NaiveDate;
use log::{debug, warn};
use uuid::Uuid;

/// Opaque payload carried by a UI drag event. Holds the task id as the
/// string the drag library delivered it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    task_id: String,
}

impl DragPayload {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }

    fn parse_id(&self) -> Option<TaskId> {
        match Uuid::parse_str(self.task_id.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(
                    "event=drop module=board status=skipped reason=invalid_payload payload={}",
                    self.task_id
                );
                None
            }
        }
    }
}

/// Translates drop gestures into `TaskManager` calls and tracks whether a
/// drag is in progress so the UI can show drop-target affordances.
#[derive(Debug, Default)]
pub struct DragDropCoordinator {
    drag_active: bool,
}

impl DragDropCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a drag as started, regardless of which element initiated it.
    pub fn begin_drag(&mut self) {
        self.drag_active = true;
    }

    /// Marks the drag as finished without a drop (cancel/escape path).
    pub fn end_drag(&mut self) {
        self.drag_active = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_active
    }

    /// Handles a drop on a weekly grid cell.
    ///
    /// With a row (matrix layout) the kind is derived from the row. Without
    /// one (stacked layout) the row is derived from the task's existing
    /// kind, with backlog coerced to the medium/FOCUS pairing.
    pub fn drop_on_grid(
        &mut self,
        manager: &mut TaskManager,
        payload: &DragPayload,
        day: NaiveDate,
        row: Option<BoardRow>,
    ) {
        self.drag_active = false;
        let Some(id) = payload.parse_id() else {
            return;
        };

        let (row, kind) = match row {
            Some(row) => (row, Some(row.default_kind())),
            None => match self.resolve_stacked_target(manager, id) {
                Some(pairing) => pairing,
                None => return,
            },
        };

        debug!("event=drop module=board status=ok target=grid id={id} day={day}");
        manager.schedule_task(id, day, row, kind);
    }

    /// Handles a drop back onto the sidebar backlog.
    pub fn drop_on_sidebar(&mut self, manager: &mut TaskManager, payload: &DragPayload) {
        self.drag_active = false;
        let Some(id) = payload.parse_id() else {
            return;
        };

        debug!("event=drop module=board status=ok target=sidebar id={id}");
        manager.unschedule_task(id);
    }

    /// Handles a drop onto an Eisenhower quadrant.
    pub fn drop_on_eisenhower(
        &mut self,
        manager: &mut TaskManager,
        payload: &DragPayload,
        quad: EisenhowerQuad,
    ) {
        self.drag_active = false;
        let Some(id) = payload.parse_id() else {
            return;
        };

        debug!("event=drop module=board status=ok target=eisenhower id={id}");
        manager.set_eisenhower_quad(id, quad);
    }

    /// Derives the row/kind pairing for a stacked-layout drop from the
    /// task's own kind.
    fn resolve_stacked_target(
        &self,
        manager: &TaskManager,
        id: TaskId,
    ) -> Option<(BoardRow, Option<TaskKind>)> {
        let kind = manager
            .get_tasks()
            .iter()
            .find(|task| task.id == id)
            .map(|task| task.kind)?;

        if kind == TaskKind::Backlog {
            Some((BoardRow::Focus, Some(TaskKind::Medium)))
        } else {
            Some((BoardRow::for_kind(kind), Some(kind)))
        }
    }
}
