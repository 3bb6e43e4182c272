//! Task domain model.
//!
//! # Responsibility
//! - Define the task record plus its closed enum fields.
//! - Provide create/patch request shapes used by the request channel.
//!
//! # Invariants
//! - `title` is non-blank.
//! - `due_date >= start_date` when both are set.
//! - Start and due dates lie within years 1..=9999.
//! - `completed_at.is_some()` iff `status == TaskStatus::Completed` once a
//!   record has passed through the lifecycle rules.

use super::profile::ProfileId;
use super::{deserialize_present, ValidationError, MAX_TASK_DATE_MS, MIN_TASK_DATE_MS};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.as_str() == value)
    }

    /// HIGH and URGENT count as high priority on the dashboard.
    pub fn is_high(self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

/// Task lifecycle state. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Archived,
}

impl TaskStatus {
    pub const ALL: [Self; 4] = [
        Self::Todo,
        Self::InProgress,
        Self::Completed,
        Self::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    Work,
    Personal,
    Health,
    Finance,
    Education,
    Shopping,
    Other,
}

impl TaskCategory {
    pub const ALL: [Self; 7] = [
        Self::Work,
        Self::Personal,
        Self::Health,
        Self::Finance,
        Self::Education,
        Self::Shopping,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "WORK",
            Self::Personal => "PERSONAL",
            Self::Health => "HEALTH",
            Self::Finance => "FINANCE",
            Self::Education => "EDUCATION",
            Self::Shopping => "SHOPPING",
            Self::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.as_str() == value)
    }
}

/// Recurrence marker. Only drives the recurring-task notification; no future
/// occurrences are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl RecurrencePattern {
    pub const ALL: [Self; 5] = [
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Yearly,
        Self::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
            Self::Custom => "CUSTOM",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.as_str() == value)
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    /// Epoch milliseconds.
    pub start_date: Option<i64>,
    /// Epoch milliseconds.
    pub due_date: Option<i64>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub profile_id: ProfileId,
    pub category: Option<TaskCategory>,
    pub recurrence: Option<RecurrencePattern>,
    pub notes: Option<String>,
    /// Set by the lifecycle rules, never by callers.
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    /// Creates a TODO task with a generated id and default priority.
    pub fn new(profile_id: ProfileId, title: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            start_date: None,
            due_date: None,
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
            profile_id,
            category: None,
            recurrence: None,
            notes: None,
            completed_at: None,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        for (field, value) in [("start_date", self.start_date), ("due_date", self.due_date)] {
            match value {
                Some(value) if !(MIN_TASK_DATE_MS..=MAX_TASK_DATE_MS).contains(&value) => {
                    return Err(ValidationError::DateOutOfRange { field, value });
                }
                _ => {}
            }
        }
        if let (Some(start_date), Some(due_date)) = (self.start_date, self.due_date) {
            if due_date < start_date {
                return Err(ValidationError::DueBeforeStart {
                    start_date,
                    due_date,
                });
            }
        }
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Input for `create-task`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub profile_id: ProfileId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<i64>,
    #[serde(default)]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub category: Option<TaskCategory>,
    #[serde(default)]
    pub recurrence: Option<RecurrencePattern>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTask {
    pub fn new(profile_id: ProfileId, title: impl Into<String>) -> Self {
        Self {
            profile_id,
            title: title.into(),
            description: None,
            start_date: None,
            due_date: None,
            priority: None,
            status: None,
            category: None,
            recurrence: None,
            notes: None,
        }
    }
}

/// Partial update for `update-task`.
///
/// Nullable fields use `Option<Option<T>>`: omitted keeps the stored value,
/// `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub id: TaskId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub start_date: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub due_date: Option<Option<i64>>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub category: Option<Option<TaskCategory>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub recurrence: Option<Option<RecurrencePattern>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub notes: Option<Option<String>>,
}

impl TaskPatch {
    pub fn for_task(id: TaskId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Applies every field except `status`, which goes through the lifecycle
    /// rules.
    pub fn apply_fields(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(start_date) = self.start_date {
            task.start_date = start_date;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(recurrence) = self.recurrence {
            task.recurrence = recurrence;
        }
        if let Some(notes) = &self.notes {
            task.notes = notes.clone();
        }
    }
}
