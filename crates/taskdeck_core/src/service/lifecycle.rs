//! Task status transition rules.
//!
//! # Invariants
//! - Entering `Completed` stamps `completed_at` once; re-entering keeps the
//!   original stamp.
//! - Leaving `Completed` always clears `completed_at`.
//! - Every transition is allowed.

use crate::model::task::{Task, TaskStatus};

/// Applies `status` to `task` and refreshes derived fields.
pub fn apply_status(task: &mut Task, status: TaskStatus, now_ms: i64) {
    task.status = status;
    task.completed_at = match status {
        TaskStatus::Completed => Some(task.completed_at.unwrap_or(now_ms)),
        _ => None,
    };
    task.updated_at = now_ms;
}
