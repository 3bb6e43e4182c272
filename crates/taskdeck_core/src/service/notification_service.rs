//! Notification creation rules and read-state use-cases.
//!
//! # Responsibility
//! - Evaluate due-soon, overdue and recurring conditions for one task.
//! - Create custom reminders at caller-supplied times.
//! - List notifications and flip read state.
//!
//! # Invariants
//! - Rule-created notifications are scheduled for "now".
//! - Rules never deduplicate; evaluating twice inserts twice.
//! - Log events carry ids and kinds only, never titles or messages.

use super::ServiceResult;
use crate::clock::Clock;
use crate::model::notification::{Notification, NotificationId, NotificationKind};
use crate::model::profile::ProfileId;
use crate::model::task::Task;
use crate::repo::notification_repo::NotificationRepository;
use chrono::{Local, TimeZone};
use log::debug;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const DUE_SOON_WINDOW_HOURS: f64 = 24.0;

pub struct NotificationService<'c, R: NotificationRepository> {
    repo: R,
    clock: &'c dyn Clock,
}

impl<'c, R: NotificationRepository> NotificationService<'c, R> {
    pub fn new(repo: R, clock: &'c dyn Clock) -> Self {
        Self { repo, clock }
    }

    /// TASK_DUE_SOON when `0 < hours until due <= 24`.
    pub fn create_due_soon_notification(&self, task: &Task) -> ServiceResult<Option<Notification>> {
        let now_ms = self.clock.now_ms();
        let Some(due_date) = task.due_date else {
            return Ok(None);
        };

        let Some(ms_until_due) = due_date.checked_sub(now_ms) else {
            return Ok(None);
        };
        let hours_until_due = ms_until_due as f64 / MS_PER_HOUR as f64;
        if hours_until_due <= 0.0 || hours_until_due > DUE_SOON_WINDOW_HOURS {
            return Ok(None);
        }

        let message = format!(
            "\"{}\" is due in {}",
            task.title,
            format_hours(hours_until_due)
        );
        self.insert(task, NotificationKind::TaskDueSoon, "Task Due Soon", message, now_ms)
            .map(Some)
    }

    /// TASK_OVERDUE when the due date has passed and the task is not completed.
    pub fn create_overdue_notification(&self, task: &Task) -> ServiceResult<Option<Notification>> {
        let now_ms = self.clock.now_ms();
        let Some(due_date) = task.due_date else {
            return Ok(None);
        };
        if due_date >= now_ms || task.is_completed() {
            return Ok(None);
        }

        let message = format!("\"{}\" was due on {}", task.title, format_date(due_date));
        self.insert(task, NotificationKind::TaskOverdue, "Task Overdue", message, now_ms)
            .map(Some)
    }

    /// RECURRING_TASK when the task carries a recurrence pattern.
    pub fn create_recurring_task_notification(
        &self,
        task: &Task,
    ) -> ServiceResult<Option<Notification>> {
        let Some(recurrence) = task.recurrence else {
            return Ok(None);
        };

        let message = format!(
            "\"{}\" repeats {}",
            task.title,
            recurrence.as_str().to_lowercase()
        );
        let now_ms = self.clock.now_ms();
        self.insert(task, NotificationKind::RecurringTask, "Recurring Task", message, now_ms)
            .map(Some)
    }

    /// TASK_REMINDER scheduled for `scheduled_for`, past or future.
    pub fn create_custom_reminder(
        &self,
        task: &Task,
        scheduled_for: i64,
        message: Option<&str>,
    ) -> ServiceResult<Notification> {
        let message = match message.map(str::trim).filter(|text| !text.is_empty()) {
            Some(text) => text.to_string(),
            None => format!("Reminder: {}", task.title),
        };
        self.insert(
            task,
            NotificationKind::TaskReminder,
            "Task Reminder",
            message,
            scheduled_for,
        )
    }

    pub fn list_unread(&self, profile_id: ProfileId) -> ServiceResult<Vec<Notification>> {
        Ok(self.repo.list_notifications(profile_id, true)?)
    }

    pub fn list_all(&self, profile_id: ProfileId) -> ServiceResult<Vec<Notification>> {
        Ok(self.repo.list_notifications(profile_id, false)?)
    }

    pub fn mark_read(&self, id: NotificationId) -> ServiceResult<()> {
        Ok(self.repo.mark_read(id)?)
    }

    pub fn mark_all_read(&self, profile_id: ProfileId) -> ServiceResult<usize> {
        Ok(self.repo.mark_all_read(profile_id)?)
    }

    fn insert(
        &self,
        task: &Task,
        kind: NotificationKind,
        title: &str,
        message: String,
        scheduled_for: i64,
    ) -> ServiceResult<Notification> {
        let notification = Notification::new(
            kind,
            task.id,
            task.profile_id,
            title,
            message,
            scheduled_for,
            self.clock.now_ms(),
        );
        self.repo.create_notification(&notification)?;
        debug!(
            "event=notification_create module=service status=ok kind={} task_id={} notification_id={}",
            kind.as_str(),
            task.id,
            notification.id
        );
        Ok(notification)
    }
}

fn format_hours(hours: f64) -> String {
    let whole = hours.ceil() as i64;
    if whole == 1 {
        "1 hour".to_string()
    } else {
        format!("{whole} hours")
    }
}

fn format_date(epoch_ms: i64) -> String {
    match Local.timestamp_millis_opt(epoch_ms).single() {
        Some(moment) => moment.format("%Y-%m-%d %H:%M").to_string(),
        None => epoch_ms.to_string(),
    }
}
