//! Canonical task domain model for the weekly planning board.
//!
//! # Responsibility
//! - Define the task entity and its status/field invariants.
//! - Keep the row/category derivation table in one place.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Scheduling state is encoded by `status` + `due_date` + `assigned_row`
//!   together; `Task::validate()` is the single authority on their coupling.

pub mod patch;
pub mod task;
