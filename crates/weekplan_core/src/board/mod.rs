//! Weekly board interaction layer.
//!
//! # Responsibility
//! - Translate UI drag gestures into scheduling intents against the task
//!   manager.
//!
//! # Invariants
//! - The board layer never mutates task state directly; every drop ends in
//!   exactly one manager call.

pub mod drag_drop;
