use std::sync::Arc;
use taskdeck_core::repo::Entity;
use taskdeck_core::{
    AppConfig, AppContext, FixedClock, NewProfile, NewTask, NotificationKind, Profile,
    ProfilePatch, RecurrencePattern, ServiceError, TaskPatch, TaskStatus, Theme, ValidationError,
};
use uuid::Uuid;

const NOW: i64 = 1_715_767_200_000;
const HOUR: i64 = 3_600_000;

fn context() -> (AppContext, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(NOW));
    let config = AppConfig::for_data_dir(std::env::temp_dir().join("taskdeck-lifecycle")).unwrap();
    let ctx = AppContext::in_memory(config, clock.clone()).unwrap();
    (ctx, clock)
}

fn create_profile(ctx: &AppContext, name: &str) -> Profile {
    ctx.profiles()
        .unwrap()
        .create_profile(NewProfile {
            name: name.to_string(),
            password: "hunter2hunter2".to_string(),
            avatar: None,
            theme: None,
        })
        .unwrap()
}

#[test]
fn profile_password_is_hashed_and_verifiable() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "  Ada  ");
    assert_eq!(profile.name, "Ada");
    assert!(profile.has_credential());
    assert_ne!(profile.password_hash.as_deref(), Some("hunter2hunter2"));

    let service = ctx.profiles().unwrap();
    assert!(service.verify_password(profile.id, "hunter2hunter2").unwrap());
    assert!(!service.verify_password(profile.id, "wrong-password").unwrap());
    assert!(matches!(
        service.verify_password(Uuid::new_v4(), "hunter2hunter2"),
        Err(ServiceError::NotFound {
            entity: Entity::Profile,
            ..
        })
    ));
}

#[test]
fn short_password_is_rejected() {
    let (ctx, _) = context();
    let err = ctx
        .profiles()
        .unwrap()
        .create_profile(NewProfile {
            name: "Bob".to_string(),
            password: "short".to_string(),
            avatar: None,
            theme: Some(Theme::Dark),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::PasswordTooShort { .. })
    ));
}

#[test]
fn profile_update_changes_password_and_clears_avatar() {
    let (ctx, clock) = context();
    let profile = create_profile(&ctx, "Ada");
    let service = ctx.profiles().unwrap();
    service
        .update_profile(
            profile.id,
            ProfilePatch {
                avatar: Some(Some("ada.png".to_string())),
                ..ProfilePatch::default()
            },
        )
        .unwrap();

    clock.advance_ms(1_000);
    let updated = service
        .update_profile(
            profile.id,
            ProfilePatch {
                avatar: Some(None),
                password: Some("a-new-passphrase".to_string()),
                ..ProfilePatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.avatar, None);
    assert_eq!(updated.updated_at, NOW + 1_000);
    assert!(service.verify_password(profile.id, "a-new-passphrase").unwrap());
    assert!(!service.verify_password(profile.id, "hunter2hunter2").unwrap());
}

#[test]
fn completing_sets_completed_at_and_reopening_clears_it() {
    let (ctx, clock) = context();
    let profile = create_profile(&ctx, "Ada");
    let tasks = ctx.tasks().unwrap();

    let task = tasks
        .create_task(NewTask::new(profile.id, "Ship release"))
        .unwrap();
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.completed_at, None);

    clock.advance_ms(HOUR);
    let done = tasks.set_status(task.id, TaskStatus::Completed).unwrap();
    assert_eq!(done.completed_at, Some(NOW + HOUR));

    clock.advance_ms(HOUR);
    let again = tasks.set_status(task.id, TaskStatus::Completed).unwrap();
    assert_eq!(again.completed_at, Some(NOW + HOUR));
    assert_eq!(again.updated_at, NOW + 2 * HOUR);

    let reopened = tasks.set_status(task.id, TaskStatus::InProgress).unwrap();
    assert_eq!(reopened.completed_at, None);
    assert_eq!(tasks.get_task(task.id).unwrap(), reopened);
}

#[test]
fn task_created_completed_carries_completed_at() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "Ada");
    let mut input = NewTask::new(profile.id, "Already done");
    input.status = Some(TaskStatus::Completed);

    let task = ctx.tasks().unwrap().create_task(input).unwrap();
    assert_eq!(task.completed_at, Some(NOW));
}

#[test]
fn update_without_status_keeps_completion_and_refreshes_updated_at() {
    let (ctx, clock) = context();
    let profile = create_profile(&ctx, "Ada");
    let tasks = ctx.tasks().unwrap();
    let task = tasks.create_task(NewTask::new(profile.id, "Draft")).unwrap();
    tasks.set_status(task.id, TaskStatus::Completed).unwrap();

    clock.advance_ms(5_000);
    let mut patch = TaskPatch::for_task(task.id);
    patch.title = Some("Final".to_string());
    patch.notes = Some(Some("signed off".to_string()));
    let updated = tasks.update_task(patch).unwrap();

    assert_eq!(updated.title, "Final");
    assert_eq!(updated.notes.as_deref(), Some("signed off"));
    assert_eq!(updated.completed_at, Some(NOW));
    assert_eq!(updated.updated_at, NOW + 5_000);
}

#[test]
fn due_before_start_is_rejected() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "Ada");
    let mut input = NewTask::new(profile.id, "Backwards");
    input.start_date = Some(NOW + 2 * HOUR);
    input.due_date = Some(NOW + HOUR);

    let err = ctx.tasks().unwrap().create_task(input).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::DueBeforeStart { .. })
    ));
}

#[test]
fn set_status_of_unknown_task_is_not_found() {
    let (ctx, _) = context();
    let err = ctx
        .tasks()
        .unwrap()
        .set_status(Uuid::new_v4(), TaskStatus::Completed)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: Entity::Task,
            ..
        }
    ));
}

#[test]
fn task_due_within_a_day_raises_due_soon_each_time() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "Ada");
    let tasks = ctx.tasks().unwrap();

    let mut input = NewTask::new(profile.id, "Report");
    input.due_date = Some(NOW + 20 * HOUR);
    let task = tasks.create_task(input).unwrap();

    let notifications = ctx.notifications().unwrap();
    let all = notifications.list_all(profile.id).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].kind, NotificationKind::TaskDueSoon);
    assert_eq!(all[0].title, "Task Due Soon");
    assert_eq!(all[0].message, "\"Report\" is due in 20 hours");
    assert_eq!(all[0].task_id, task.id);

    tasks.update_task(TaskPatch::for_task(task.id)).unwrap();
    let due_soon = notifications
        .list_all(profile.id)
        .unwrap()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::TaskDueSoon)
        .count();
    assert_eq!(due_soon, 2);
}

#[test]
fn completing_a_task_due_soon_raises_no_new_alert() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "Ada");
    let tasks = ctx.tasks().unwrap();

    let mut input = NewTask::new(profile.id, "Report");
    input.due_date = Some(NOW + 20 * HOUR);
    let task = tasks.create_task(input).unwrap();
    tasks.set_status(task.id, TaskStatus::Completed).unwrap();
    tasks.update_task(TaskPatch::for_task(task.id)).unwrap();

    let mut already_done = NewTask::new(profile.id, "Filed");
    already_done.due_date = Some(NOW + 2 * HOUR);
    already_done.status = Some(TaskStatus::Completed);
    tasks.create_task(already_done).unwrap();

    let all = ctx.notifications().unwrap().list_all(profile.id).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].kind, NotificationKind::TaskDueSoon);
    assert_eq!(all[0].task_id, task.id);

    tasks.set_status(task.id, TaskStatus::Todo).unwrap();
    assert_eq!(
        ctx.notifications().unwrap().list_all(profile.id).unwrap().len(),
        2
    );
}

#[test]
fn overdue_rule_skips_completed_tasks() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "Ada");
    let tasks = ctx.tasks().unwrap();

    let mut late = NewTask::new(profile.id, "Late");
    late.due_date = Some(NOW - HOUR);
    late.status = Some(TaskStatus::InProgress);
    tasks.create_task(late).unwrap();

    let mut finished = NewTask::new(profile.id, "Finished");
    finished.due_date = Some(NOW - HOUR);
    finished.status = Some(TaskStatus::Completed);
    tasks.create_task(finished).unwrap();

    let all = ctx.notifications().unwrap().list_all(profile.id).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].kind, NotificationKind::TaskOverdue);
    assert!(all[0].message.starts_with("\"Late\" was due on "));
}

#[test]
fn recurring_task_announces_its_pattern() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "Ada");
    let mut input = NewTask::new(profile.id, "Standup");
    input.recurrence = Some(RecurrencePattern::Daily);
    ctx.tasks().unwrap().create_task(input).unwrap();

    let all = ctx.notifications().unwrap().list_all(profile.id).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].kind, NotificationKind::RecurringTask);
    assert_eq!(all[0].message, "\"Standup\" repeats daily");
}

#[test]
fn reminders_and_read_state() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "Ada");
    let task = ctx
        .tasks()
        .unwrap()
        .create_task(NewTask::new(profile.id, "Call bank"))
        .unwrap();

    let tasks = ctx.tasks().unwrap();
    let default_text = tasks.create_reminder(task.id, NOW + HOUR, None).unwrap();
    assert_eq!(default_text.message, "Reminder: Call bank");
    assert_eq!(default_text.scheduled_for, NOW + HOUR);
    let custom = tasks
        .create_reminder(task.id, NOW + 2 * HOUR, Some("bring passport"))
        .unwrap();
    assert_eq!(custom.message, "bring passport");

    let notifications = ctx.notifications().unwrap();
    let all = notifications.list_all(profile.id).unwrap();
    assert_eq!(all[0].id, custom.id);
    assert_eq!(all[1].id, default_text.id);

    notifications.mark_read(custom.id).unwrap();
    let unread = notifications.list_unread(profile.id).unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].id, default_text.id);

    assert_eq!(notifications.mark_all_read(profile.id).unwrap(), 1);
    assert!(notifications.list_unread(profile.id).unwrap().is_empty());
    assert!(matches!(
        notifications.mark_read(Uuid::new_v4()),
        Err(ServiceError::NotFound {
            entity: Entity::Notification,
            ..
        })
    ));
}

#[test]
fn deleting_profile_cascades_to_tasks_and_notifications() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "Ada");
    let keeper = create_profile(&ctx, "Keeper");
    let tasks = ctx.tasks().unwrap();

    for index in 0..3 {
        let task = tasks
            .create_task(NewTask::new(profile.id, format!("Task {index}")))
            .unwrap();
        tasks.create_reminder(task.id, NOW, None).unwrap();
        if index < 2 {
            tasks.create_reminder(task.id, NOW + HOUR, None).unwrap();
        }
    }
    let kept = tasks
        .create_task(NewTask::new(keeper.id, "Unrelated"))
        .unwrap();
    tasks.create_reminder(kept.id, NOW, None).unwrap();
    assert_eq!(ctx.notifications().unwrap().list_all(profile.id).unwrap().len(), 5);

    assert!(ctx.profiles().unwrap().delete_profile(profile.id).unwrap());

    assert!(tasks.list_tasks(profile.id).unwrap().is_empty());
    assert!(ctx.notifications().unwrap().list_all(profile.id).unwrap().is_empty());
    assert_eq!(tasks.list_tasks(keeper.id).unwrap().len(), 1);
    assert_eq!(ctx.notifications().unwrap().list_all(keeper.id).unwrap().len(), 1);
    assert!(matches!(
        ctx.profiles().unwrap().delete_profile(profile.id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn deleting_task_removes_its_notifications() {
    let (ctx, _) = context();
    let profile = create_profile(&ctx, "Ada");
    let tasks = ctx.tasks().unwrap();
    let task = tasks.create_task(NewTask::new(profile.id, "Temp")).unwrap();
    tasks.create_reminder(task.id, NOW, None).unwrap();

    tasks.delete_task(task.id).unwrap();
    assert!(ctx.notifications().unwrap().list_all(profile.id).unwrap().is_empty());
}
