//! Task reconciliation engine.
//!
//! # Responsibility
//! - Own the single authoritative in-memory task list per session.
//! - Arbitrate local edits against asynchronously arriving remote state.
//!
//! # Invariants
//! - Every mutation leaves the list consistent and notifies subscribers
//!   exactly once, in mutation order.
//! - No caller ever holds a mutable reference into the live list.

pub mod task_manager;
