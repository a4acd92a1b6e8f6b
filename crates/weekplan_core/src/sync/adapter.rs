//! Remote store contract and sync driver.
//!
//! # Responsibility
//! - Define the narrow fetch/upsert/delete/replace contract the core
//!   consumes from a remote task store.
//! - Run fetch+merge reconciliation cycles and push locally changed tasks,
//!   diffed against the last pushed snapshot.
//! - Apply single-row push-channel events.
//!
//! # Invariants
//! - The adapter owns no task state beyond the last-seen snapshot used for
//!   diffing.
//! - A failing or unreachable remote never stalls or corrupts local state;
//!   the failed cycle is logged and retried on the next tick.
//! - Changes that arrive *from* the remote are absorbed into the last-seen
//!   snapshot so they are not echoed back upstream.

use crate::manager::task_manager::TaskManager;
use crate::model::task::{Task, TaskId};
use crate::sync::diff::{deleted_ids, diff_tasks};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Remote store failure taxonomy. All variants are recoverable: the local
/// session continues unaffected and the next cycle retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStoreError {
    /// Network-level failure or non-success response.
    Unavailable(String),
    /// The call exceeded the store implementation's deadline.
    Timeout,
    /// The store rejected the payload (schema/authorization).
    Rejected(String),
}

impl Display for RemoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "remote store unavailable: {details}"),
            Self::Timeout => write!(f, "remote store call timed out"),
            Self::Rejected(details) => write!(f, "remote store rejected request: {details}"),
        }
    }
}

impl Error for RemoteStoreError {}

/// Narrow remote persistence contract.
///
/// Implementations are expected to wrap their transport with a deadline so
/// a slow remote surfaces as `Timeout` instead of blocking the caller.
/// Field encryption and legacy id mapping happen inside implementations,
/// before tasks reach this boundary.
pub trait RemoteTaskStore {
    fn fetch_tasks(&self, user_id: &str) -> Result<Vec<Task>, RemoteStoreError>;
    fn upsert_tasks(&self, user_id: &str, tasks: &[Task]) -> Result<(), RemoteStoreError>;
    fn delete_task(&self, user_id: &str, id: TaskId) -> Result<(), RemoteStoreError>;
    fn replace_tasks(&self, user_id: &str, tasks: &[Task]) -> Result<(), RemoteStoreError>;
}

/// Single-row event delivered by the realtime push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteTaskEvent {
    Upserted(Task),
    Deleted(TaskId),
}

/// Result of one fetch+merge reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCycleOutcome {
    /// The fetch succeeded and `merge_tasks` ran over this many remote rows.
    Merged(usize),
    /// The remote was unreachable; local state stays authoritative.
    RemoteUnavailable,
}

/// Result of one local-change push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Changed tasks upserted and deletions propagated.
    Pushed { upserted: usize, deleted: usize },
    /// Nothing changed since the last successful push.
    Clean,
    /// The remote was unreachable; the pending changes stay queued for the
    /// next push.
    RemoteUnavailable,
}

/// Bridges a `TaskManager` to a remote task store.
pub struct SyncAdapter<R: RemoteTaskStore> {
    remote: R,
    user_id: String,
    /// Snapshot as of the last successful push or merge; the diffing
    /// baseline for `push_local_changes`.
    last_seen: Vec<Task>,
}

impl<R: RemoteTaskStore> SyncAdapter<R> {
    pub fn new(remote: R, user_id: impl Into<String>) -> Self {
        Self {
            remote,
            user_id: user_id.into(),
            last_seen: Vec::new(),
        }
    }

    /// Fetches the full remote list and reconciles it into the manager.
    ///
    /// Shared by the mount-time initial sync and the periodic re-fetch that
    /// guards against missed push events.
    pub fn run_cycle(&mut self, manager: &mut TaskManager) -> SyncCycleOutcome {
        let remote_tasks = match self.remote.fetch_tasks(&self.user_id) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!("event=sync_cycle module=sync status=error user={} error={err}", self.user_id);
                return SyncCycleOutcome::RemoteUnavailable;
            }
        };

        let count = remote_tasks.len();
        manager.merge_tasks(remote_tasks);
        self.last_seen = manager.get_tasks();

        info!(
            "event=sync_cycle module=sync status=ok user={} remote_count={count}",
            self.user_id
        );
        SyncCycleOutcome::Merged(count)
    }

    /// Pushes tasks that changed locally since the last successful push,
    /// plus deletions, keeping remote writes minimal.
    pub fn push_local_changes(&mut self, manager: &TaskManager) -> PushOutcome {
        let current = manager.get_tasks();
        let changed = diff_tasks(&self.last_seen, &current);
        let removed = deleted_ids(&self.last_seen, &current);

        if changed.is_empty() && removed.is_empty() {
            return PushOutcome::Clean;
        }

        if !changed.is_empty() {
            if let Err(err) = self.remote.upsert_tasks(&self.user_id, &changed) {
                warn!("event=sync_push module=sync status=error user={} error={err}", self.user_id);
                return PushOutcome::RemoteUnavailable;
            }
        }
        for id in &removed {
            if let Err(err) = self.remote.delete_task(&self.user_id, *id) {
                warn!("event=sync_push module=sync status=error user={} error={err}", self.user_id);
                return PushOutcome::RemoteUnavailable;
            }
        }

        info!(
            "event=sync_push module=sync status=ok user={} upserted={} deleted={}",
            self.user_id,
            changed.len(),
            removed.len()
        );
        self.last_seen = current;
        PushOutcome::Pushed {
            upserted: changed.len(),
            deleted: removed.len(),
        }
    }

    /// Applies a single-row push-channel event, bypassing the periodic
    /// fetch path.
    pub fn apply_remote_event(&mut self, manager: &mut TaskManager, event: RemoteTaskEvent) {
        match event {
            RemoteTaskEvent::Upserted(task) => manager.upsert_task(task),
            RemoteTaskEvent::Deleted(id) => manager.remove_task(id),
        }
        self.last_seen = manager.get_tasks();
    }

    /// Overwrites the full remote list with the local snapshot (export /
    /// migration path).
    pub fn replace_remote(&mut self, manager: &TaskManager) -> Result<(), RemoteStoreError> {
        let current = manager.get_tasks();
        self.remote.replace_tasks(&self.user_id, &current)?;
        self.last_seen = current;
        Ok(())
    }
}
