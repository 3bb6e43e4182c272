//! Notification domain model.
//!
//! Notifications are created by the task rules only; callers may flip `read`
//! but never delete them directly.

use super::profile::ProfileId;
use super::task::TaskId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NotificationId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    TaskDueSoon,
    TaskOverdue,
    TaskReminder,
    RecurringTask,
}

impl NotificationKind {
    pub const ALL: [Self; 4] = [
        Self::TaskDueSoon,
        Self::TaskOverdue,
        Self::TaskReminder,
        Self::RecurringTask,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskDueSoon => "TASK_DUE_SOON",
            Self::TaskOverdue => "TASK_OVERDUE",
            Self::TaskReminder => "TASK_REMINDER",
            Self::RecurringTask => "RECURRING_TASK",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub task_id: TaskId,
    pub profile_id: ProfileId,
    /// Epoch milliseconds; the scheduler delivers once `scheduled_for <= now`.
    pub scheduled_for: i64,
    pub created_at: i64,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        task_id: TaskId,
        profile_id: ProfileId,
        title: impl Into<String>,
        message: impl Into<String>,
        scheduled_for: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            read: false,
            task_id,
            profile_id,
            scheduled_for,
            created_at: now_ms,
        }
    }
}
