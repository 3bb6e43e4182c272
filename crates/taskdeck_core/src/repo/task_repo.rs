//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD plus profile-scoped and date-range listing over `tasks`.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Profile lists are ordered by due date (undated last), then newest first.
//! - Deleting a task cascades to its notifications.

use super::{
    ensure_tables, parse_optional_enum, parse_required_enum, parse_uuid, Entity, RepoError,
    RepoResult,
};
use crate::model::profile::ProfileId;
use crate::model::task::{
    RecurrencePattern, Task, TaskCategory, TaskId, TaskPriority, TaskStatus,
};
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    start_date,
    due_date,
    priority,
    status,
    profile_id,
    category,
    recurrence,
    notes,
    completed_at,
    created_at,
    updated_at
FROM tasks";

pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, profile_id: ProfileId) -> RepoResult<Vec<Task>>;
    /// Lists tasks whose start or due date lies within `[from_ms, to_ms]`.
    fn list_tasks_in_range(
        &self,
        profile_id: ProfileId,
        from_ms: i64,
        to_ms: i64,
    ) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["tasks"])?;
        Ok(Self { conn })
    }

    fn query_tasks(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO tasks (
                id,
                title,
                description,
                start_date,
                due_date,
                priority,
                status,
                profile_id,
                category,
                recurrence,
                notes,
                completed_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.start_date,
                task.due_date,
                task.priority.as_str(),
                task.status.as_str(),
                task.profile_id.to_string(),
                task.category.map(TaskCategory::as_str),
                task.recurrence.map(RecurrencePattern::as_str),
                task.notes.as_deref(),
                task.completed_at,
                task.created_at,
                task.updated_at,
            ],
        );

        match inserted {
            Ok(_) => Ok(task.id),
            Err(err) if is_foreign_key_violation(&err) => Err(RepoError::NotFound {
                entity: Entity::Profile,
                id: task.profile_id,
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                start_date = ?3,
                due_date = ?4,
                priority = ?5,
                status = ?6,
                category = ?7,
                recurrence = ?8,
                notes = ?9,
                completed_at = ?10,
                updated_at = ?11
             WHERE id = ?12;",
            params![
                task.title.as_str(),
                task.description.as_deref(),
                task.start_date,
                task.due_date,
                task.priority.as_str(),
                task.status.as_str(),
                task.category.map(TaskCategory::as_str),
                task.recurrence.map(RecurrencePattern::as_str),
                task.notes.as_deref(),
                task.completed_at,
                task.updated_at,
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Task,
                id: task.id,
            });
        }
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut tasks =
            self.query_tasks(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"), [id.to_string()])?;
        Ok(tasks.pop())
    }

    fn list_tasks(&self, profile_id: ProfileId) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE profile_id = ?1
                 ORDER BY due_date IS NULL, due_date ASC, created_at DESC, id ASC;"
            ),
            [profile_id.to_string()],
        )
    }

    fn list_tasks_in_range(
        &self,
        profile_id: ProfileId,
        from_ms: i64,
        to_ms: i64,
    ) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE profile_id = ?1
                   AND (
                        (start_date IS NOT NULL AND start_date BETWEEN ?2 AND ?3)
                     OR (due_date IS NOT NULL AND due_date BETWEEN ?2 AND ?3)
                   )
                 ORDER BY min(coalesce(start_date, due_date), coalesce(due_date, start_date)) ASC,
                          id ASC;"
            ),
            params![profile_id.to_string(), from_ms, to_ms],
        )
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Task,
                id,
            });
        }
        Ok(())
    }
}

/// Owning profile is missing when the insert trips `tasks.profile_id`.
fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let profile_text: String = row.get("profile_id")?;

    let task = Task {
        id: parse_uuid(&id_text, "tasks.id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        start_date: row.get("start_date")?,
        due_date: row.get("due_date")?,
        priority: parse_required_enum(row.get("priority")?, "tasks.priority", TaskPriority::parse)?,
        status: parse_required_enum(row.get("status")?, "tasks.status", TaskStatus::parse)?,
        profile_id: parse_uuid(&profile_text, "tasks.profile_id")?,
        category: parse_optional_enum(row.get("category")?, "tasks.category", TaskCategory::parse)?,
        recurrence: parse_optional_enum(
            row.get("recurrence")?,
            "tasks.recurrence",
            RecurrencePattern::parse,
        )?,
        notes: row.get("notes")?,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    task.validate()?;
    Ok(task)
}
