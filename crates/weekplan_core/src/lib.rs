//! Core task reconciliation and scheduling engine for the weekly planner.
//! This crate is the single source of truth for business invariants.

pub mod board;
pub mod clock;
pub mod db;
pub mod logging;
pub mod manager;
pub mod model;
pub mod repo;
pub mod sync;

pub use board::drag_drop::{DragDropCoordinator, DragPayload};
pub use clock::{Clock, ManualClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use manager::task_manager::{
    NewTask, SubscriptionId, TaskManager, GRACE_PERIOD_MS,
};
pub use model::patch::TaskPatch;
pub use model::task::{
    BoardRow, EisenhowerQuad, Space, Task, TaskId, TaskKind, TaskStatus, TaskValidationError,
};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use sync::adapter::{
    PushOutcome, RemoteStoreError, RemoteTaskEvent, RemoteTaskStore, SyncAdapter,
    SyncCycleOutcome,
};
pub use sync::diff::{deleted_ids, diff_tasks};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
