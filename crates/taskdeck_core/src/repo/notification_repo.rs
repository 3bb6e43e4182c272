//! Notification repository contract and SQLite implementation.
//!
//! # Invariants
//! - No deduplication: every `create_notification` call inserts a new row.
//! - `read` is stored as `0|1`; any other value is rejected on read.
//! - `list_due` skips rows it cannot decode and logs them, so one bad row
//!   never stalls delivery of the rest.

use super::{ensure_tables, parse_required_enum, parse_uuid, Entity, RepoError, RepoResult};
use crate::model::notification::{Notification, NotificationId, NotificationKind};
use crate::model::profile::ProfileId;
use log::warn;
use rusqlite::{params, Connection, Row};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    type,
    title,
    message,
    read,
    task_id,
    profile_id,
    scheduled_for,
    created_at
FROM notifications";

pub trait NotificationRepository {
    fn create_notification(&self, notification: &Notification) -> RepoResult<NotificationId>;
    /// Lists a profile's notifications, newest `scheduled_for` first.
    fn list_notifications(
        &self,
        profile_id: ProfileId,
        unread_only: bool,
    ) -> RepoResult<Vec<Notification>>;
    /// Lists unread notifications with `scheduled_for <= now_ms`, oldest first.
    ///
    /// Rows that fail to decode are logged and left out of the result.
    fn list_due(&self, now_ms: i64) -> RepoResult<Vec<Notification>>;
    fn mark_read(&self, id: NotificationId) -> RepoResult<()>;
    /// Marks every unread notification of a profile read; returns rows changed.
    fn mark_all_read(&self, profile_id: ProfileId) -> RepoResult<usize>;
}

pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notifications"])?;
        Ok(Self { conn })
    }

    fn query_notifications(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn create_notification(&self, notification: &Notification) -> RepoResult<NotificationId> {
        self.conn.execute(
            "INSERT INTO notifications (
                id,
                type,
                title,
                message,
                read,
                task_id,
                profile_id,
                scheduled_for,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                notification.id.to_string(),
                notification.kind.as_str(),
                notification.title.as_str(),
                notification.message.as_str(),
                bool_to_int(notification.read),
                notification.task_id.to_string(),
                notification.profile_id.to_string(),
                notification.scheduled_for,
                notification.created_at,
            ],
        )?;
        Ok(notification.id)
    }

    fn list_notifications(
        &self,
        profile_id: ProfileId,
        unread_only: bool,
    ) -> RepoResult<Vec<Notification>> {
        self.query_notifications(
            &format!(
                "{NOTIFICATION_SELECT_SQL}
                 WHERE profile_id = ?1
                   AND (?2 = 0 OR read = 0)
                 ORDER BY scheduled_for DESC, created_at DESC, id ASC;"
            ),
            params![profile_id.to_string(), bool_to_int(unread_only)],
        )
    }

    fn list_due(&self, now_ms: i64) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE read = 0
               AND scheduled_for <= ?1
             ORDER BY scheduled_for ASC, created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([now_ms])?;
        let mut due = Vec::new();
        let mut skipped = 0usize;
        while let Some(row) = rows.next()? {
            match parse_notification_row(row) {
                Ok(notification) => due.push(notification),
                Err(RepoError::InvalidData(reason)) => {
                    skipped += 1;
                    warn!(
                        "event=notification_list_due module=repo status=skipped reason={}",
                        reason
                    );
                }
                Err(err) => return Err(err),
            }
        }
        if skipped > 0 {
            warn!(
                "event=notification_list_due module=repo status=partial delivered={} skipped={}",
                due.len(),
                skipped
            );
        }
        Ok(due)
    }

    fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET read = 1 WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Notification,
                id,
            });
        }
        Ok(())
    }

    fn mark_all_read(&self, profile_id: ProfileId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notifications SET read = 1 WHERE profile_id = ?1 AND read = 0;",
            [profile_id.to_string()],
        )?;
        Ok(changed)
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let id_text: String = row.get("id")?;
    let task_text: String = row.get("task_id")?;
    let profile_text: String = row.get("profile_id")?;

    let read = match row.get::<_, i64>("read")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid read value `{other}` in notifications.read"
            )));
        }
    };

    Ok(Notification {
        id: parse_uuid(&id_text, "notifications.id")?,
        kind: parse_required_enum(row.get("type")?, "notifications.type", NotificationKind::parse)?,
        title: row.get("title")?,
        message: row.get("message")?,
        read,
        task_id: parse_uuid(&task_text, "notifications.task_id")?,
        profile_id: parse_uuid(&profile_text, "notifications.profile_id")?,
        scheduled_for: row.get("scheduled_for")?,
        created_at: row.get("created_at")?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
