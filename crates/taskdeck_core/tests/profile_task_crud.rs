use taskdeck_core::db::open_db_in_memory;
use taskdeck_core::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use taskdeck_core::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use taskdeck_core::repo::Entity;
use taskdeck_core::{
    Profile, RepoError, Task, TaskCategory, TaskPriority, TaskStatus, Theme, ValidationError,
};
use uuid::Uuid;

const NOW: i64 = 1_715_767_200_000;
const HOUR: i64 = 3_600_000;

#[test]
fn profile_create_get_update_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();

    let mut profile = Profile::new("Ada", NOW);
    profile.password_hash = Some("$argon2id$stub".to_string());
    repo.create_profile(&profile).unwrap();

    let loaded = repo.get_profile(profile.id).unwrap().unwrap();
    assert_eq!(loaded, profile);
    assert_eq!(loaded.theme, Theme::System);

    profile.name = "Ada L.".to_string();
    profile.theme = Theme::Dark;
    profile.avatar = Some("ada.png".to_string());
    profile.updated_at = NOW + 1;
    repo.update_profile(&profile).unwrap();

    let loaded = repo.get_profile(profile.id).unwrap().unwrap();
    assert_eq!(loaded.name, "Ada L.");
    assert_eq!(loaded.theme, Theme::Dark);
    assert_eq!(loaded.avatar.as_deref(), Some("ada.png"));
}

#[test]
fn profiles_list_in_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();

    let later = Profile::new("Later", NOW + 10);
    let earlier = Profile::new("Earlier", NOW);
    repo.create_profile(&later).unwrap();
    repo.create_profile(&earlier).unwrap();

    let names: Vec<String> = repo
        .list_profiles()
        .unwrap()
        .into_iter()
        .map(|profile| profile.name)
        .collect();
    assert_eq!(names, vec!["Earlier", "Later"]);
}

#[test]
fn blank_profile_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();

    let err = repo.create_profile(&Profile::new("   ", NOW)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::BlankProfileName)
    ));
}

#[test]
fn deleting_missing_profile_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    let err = repo.delete_profile(missing).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: Entity::Profile,
            id,
        } if id == missing
    ));
}

#[test]
fn task_create_get_update_delete() {
    let conn = open_db_in_memory().unwrap();
    let profile = seed_profile(&conn);
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut task = Task::new(profile.id, "Write report", NOW);
    task.priority = TaskPriority::Urgent;
    task.category = Some(TaskCategory::Work);
    task.due_date = Some(NOW + 5 * HOUR);
    repo.create_task(&task).unwrap();

    assert_eq!(repo.get_task(task.id).unwrap().unwrap(), task);

    task.status = TaskStatus::Completed;
    task.completed_at = Some(NOW + HOUR);
    task.updated_at = NOW + HOUR;
    repo.update_task(&task).unwrap();
    let loaded = repo.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded.status, TaskStatus::Completed);
    assert_eq!(loaded.completed_at, Some(NOW + HOUR));

    repo.delete_task(task.id).unwrap();
    assert!(repo.get_task(task.id).unwrap().is_none());
    assert!(matches!(
        repo.delete_task(task.id).unwrap_err(),
        RepoError::NotFound {
            entity: Entity::Task,
            ..
        }
    ));
}

#[test]
fn task_for_unknown_profile_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let orphan = Task::new(Uuid::new_v4(), "Orphan", NOW);
    let err = repo.create_task(&orphan).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: Entity::Profile,
            id,
        } if id == orphan.profile_id
    ));
}

#[test]
fn update_of_missing_task_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let profile = seed_profile(&conn);
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let never_saved = Task::new(profile.id, "Ghost", NOW);
    assert!(matches!(
        repo.update_task(&never_saved).unwrap_err(),
        RepoError::NotFound {
            entity: Entity::Task,
            ..
        }
    ));
}

#[test]
fn tasks_list_by_due_date_with_undated_last() {
    let conn = open_db_in_memory().unwrap();
    let profile = seed_profile(&conn);
    let other = seed_profile(&conn);
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let undated = Task::new(profile.id, "Someday", NOW);
    let mut late = Task::new(profile.id, "Late", NOW);
    late.due_date = Some(NOW + 48 * HOUR);
    let mut soon = Task::new(profile.id, "Soon", NOW);
    soon.due_date = Some(NOW + HOUR);
    let foreign = Task::new(other.id, "Not mine", NOW);
    for task in [&undated, &late, &soon, &foreign] {
        repo.create_task(task).unwrap();
    }

    let titles: Vec<String> = repo
        .list_tasks(profile.id)
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, vec!["Soon", "Late", "Someday"]);
}

#[test]
fn range_query_matches_start_or_due_date() {
    let conn = open_db_in_memory().unwrap();
    let profile = seed_profile(&conn);
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut starts_inside = Task::new(profile.id, "Starts inside", NOW);
    starts_inside.start_date = Some(NOW + HOUR);
    starts_inside.due_date = Some(NOW + 100 * HOUR);
    let mut due_inside = Task::new(profile.id, "Due inside", NOW);
    due_inside.due_date = Some(NOW + 2 * HOUR);
    let mut outside = Task::new(profile.id, "Outside", NOW);
    outside.due_date = Some(NOW + 50 * HOUR);
    let undated = Task::new(profile.id, "Undated", NOW);
    for task in [&starts_inside, &due_inside, &outside, &undated] {
        repo.create_task(task).unwrap();
    }

    let titles: Vec<String> = repo
        .list_tasks_in_range(profile.id, NOW, NOW + 3 * HOUR)
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, vec!["Starts inside", "Due inside"]);
}

#[test]
fn unknown_category_in_storage_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let profile = seed_profile(&conn);
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = Task::new(profile.id, "Garden", NOW);
    repo.create_task(&task).unwrap();
    conn.execute(
        "UPDATE tasks SET category = 'GARDENING' WHERE id = ?1;",
        [task.id.to_string()],
    )
    .unwrap();

    let err = repo.get_task(task.id).unwrap_err();
    match err {
        RepoError::InvalidData(message) => assert!(message.contains("GARDENING")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_require_migrated_tables() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteTaskRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("tasks"))
    ));
}

fn seed_profile(conn: &rusqlite::Connection) -> Profile {
    let repo = SqliteProfileRepository::try_new(conn).unwrap();
    let profile = Profile::new("Owner", NOW);
    repo.create_profile(&profile).unwrap();
    profile
}
