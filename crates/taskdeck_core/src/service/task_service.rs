//! Task use-case service.
//!
//! # Responsibility
//! - Create, edit, re-status and delete tasks.
//! - Route every status change through [`super::lifecycle::apply_status`].
//! - Evaluate notification rules at each mutation call site.
//!
//! # Invariants
//! - `completed_at` is set iff the stored status is `Completed`.
//! - `updated_at` is refreshed on every mutation.
//! - Rule failures after a successful write are logged, not returned; the
//!   task write is not rolled back.
//! - A task stored as `Completed` never raises due-soon or overdue alerts.

use super::lifecycle::apply_status;
use super::notification_service::NotificationService;
use super::{ServiceError, ServiceResult};
use crate::clock::Clock;
use crate::model::notification::Notification;
use crate::model::profile::ProfileId;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::Entity;
use log::{info, warn};

pub struct TaskService<'c, T: TaskRepository, N: NotificationRepository> {
    tasks: T,
    notifications: NotificationService<'c, N>,
    clock: &'c dyn Clock,
}

impl<'c, T: TaskRepository, N: NotificationRepository> TaskService<'c, T, N> {
    pub fn new(tasks: T, notifications: NotificationService<'c, N>, clock: &'c dyn Clock) -> Self {
        Self {
            tasks,
            notifications,
            clock,
        }
    }

    pub fn get_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.tasks.get_task(id)?.ok_or(ServiceError::NotFound {
            entity: Entity::Task,
            id,
        })
    }

    pub fn list_tasks(&self, profile_id: ProfileId) -> ServiceResult<Vec<Task>> {
        Ok(self.tasks.list_tasks(profile_id)?)
    }

    /// Calendar query over start/due dates within `[from_ms, to_ms]`.
    pub fn list_tasks_in_range(
        &self,
        profile_id: ProfileId,
        from_ms: i64,
        to_ms: i64,
    ) -> ServiceResult<Vec<Task>> {
        if to_ms < from_ms {
            return Ok(Vec::new());
        }
        Ok(self.tasks.list_tasks_in_range(profile_id, from_ms, to_ms)?)
    }

    /// Creates a task, then evaluates due-soon, overdue and recurring rules.
    pub fn create_task(&self, input: NewTask) -> ServiceResult<Task> {
        let now_ms = self.clock.now_ms();
        let mut task = Task::new(input.profile_id, input.title.trim(), now_ms);
        task.description = input.description;
        task.start_date = input.start_date;
        task.due_date = input.due_date;
        task.priority = input.priority.unwrap_or_default();
        task.category = input.category;
        task.recurrence = input.recurrence;
        task.notes = input.notes;
        apply_status(&mut task, input.status.unwrap_or_default(), now_ms);
        task.validate()?;

        self.tasks.create_task(&task)?;
        info!(
            "event=task_create module=service status=ok task_id={} profile_id={}",
            task.id, task.profile_id
        );

        self.run_due_rules(&task);
        self.run_rule("recurring", &task, |task| {
            self.notifications.create_recurring_task_notification(task)
        });
        Ok(task)
    }

    /// Applies a partial update; a present `status` goes through the
    /// lifecycle rules.
    pub fn update_task(&self, patch: TaskPatch) -> ServiceResult<Task> {
        let now_ms = self.clock.now_ms();
        let mut task = self.get_task(patch.id)?;

        patch.apply_fields(&mut task);
        match patch.status {
            Some(status) => apply_status(&mut task, status, now_ms),
            None => task.updated_at = now_ms,
        }
        task.validate()?;

        self.tasks.update_task(&task)?;
        self.run_due_rules(&task);
        Ok(task)
    }

    /// Sets status only. Fails with `NotFound` for unknown ids.
    pub fn set_status(&self, id: TaskId, status: TaskStatus) -> ServiceResult<Task> {
        let mut task = self.get_task(id)?;
        apply_status(&mut task, status, self.clock.now_ms());
        self.tasks.update_task(&task)?;
        info!(
            "event=task_status module=service status=ok task_id={} task_status={}",
            task.id,
            task.status.as_str()
        );
        self.run_due_rules(&task);
        Ok(task)
    }

    /// Deletes a task; its notifications go with it.
    pub fn delete_task(&self, id: TaskId) -> ServiceResult<()> {
        self.tasks.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    pub fn create_reminder(
        &self,
        task_id: TaskId,
        scheduled_for: i64,
        message: Option<&str>,
    ) -> ServiceResult<Notification> {
        let task = self.get_task(task_id)?;
        self.notifications
            .create_custom_reminder(&task, scheduled_for, message)
    }

    /// Completed tasks get neither rule: due-soon is skipped here and the
    /// overdue rule checks completion itself.
    fn run_due_rules(&self, task: &Task) {
        if !task.is_completed() {
            self.run_rule("due_soon", task, |task| {
                self.notifications.create_due_soon_notification(task)
            });
        }
        self.run_rule("overdue", task, |task| {
            self.notifications.create_overdue_notification(task)
        });
    }

    fn run_rule(
        &self,
        rule: &'static str,
        task: &Task,
        evaluate: impl FnOnce(&Task) -> ServiceResult<Option<Notification>>,
    ) {
        if let Err(err) = evaluate(task) {
            warn!(
                "event=notification_rule module=service status=error rule={rule} task_id={} error={}",
                task.id, err
            );
        }
    }
}
