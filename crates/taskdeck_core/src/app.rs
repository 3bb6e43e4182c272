//! Application context: the single owner of process-wide dependencies.
//!
//! # Responsibility
//! - Open the database once and hold the connection, clock and config.
//! - Hand out short-lived service views that borrow those dependencies.
//!
//! # Invariants
//! - One context per process; callers pass it by reference.
//! - Service views never outlive the context.

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::repo::notification_repo::SqliteNotificationRepository;
use crate::repo::profile_repo::SqliteProfileRepository;
use crate::repo::task_repo::SqliteTaskRepository;
use crate::repo::RepoResult;
use crate::scheduler::{NotificationScheduler, NotificationSink};
use crate::service::export_service::ExportService;
use crate::service::notification_service::NotificationService;
use crate::service::profile_service::ProfileService;
use crate::service::task_service::TaskService;
use rusqlite::Connection;
use std::sync::Arc;

pub type SqliteProfileService<'a> = ProfileService<'a, SqliteProfileRepository<'a>>;
pub type SqliteNotificationService<'a> = NotificationService<'a, SqliteNotificationRepository<'a>>;
pub type SqliteTaskService<'a> =
    TaskService<'a, SqliteTaskRepository<'a>, SqliteNotificationRepository<'a>>;
pub type SqliteExportService<'a> =
    ExportService<'a, SqliteProfileRepository<'a>, SqliteTaskRepository<'a>>;

pub struct AppContext {
    config: AppConfig,
    conn: Connection,
    clock: Arc<dyn Clock>,
}

impl AppContext {
    /// Opens the configured database file with the system clock.
    pub fn open(config: AppConfig) -> DbResult<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> DbResult<Self> {
        let conn = open_db(&config.db_path)?;
        Ok(Self {
            config,
            conn,
            clock,
        })
    }

    /// In-memory database; `config` still supplies export and week settings.
    pub fn in_memory(config: AppConfig, clock: Arc<dyn Clock>) -> DbResult<Self> {
        Ok(Self {
            config,
            conn: open_db_in_memory()?,
            clock,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn profiles(&self) -> RepoResult<SqliteProfileService<'_>> {
        Ok(ProfileService::new(
            SqliteProfileRepository::try_new(&self.conn)?,
            self.clock(),
        ))
    }

    pub fn notifications(&self) -> RepoResult<SqliteNotificationService<'_>> {
        Ok(NotificationService::new(
            SqliteNotificationRepository::try_new(&self.conn)?,
            self.clock(),
        ))
    }

    pub fn tasks(&self) -> RepoResult<SqliteTaskService<'_>> {
        Ok(TaskService::new(
            SqliteTaskRepository::try_new(&self.conn)?,
            self.notifications()?,
            self.clock(),
        ))
    }

    pub fn exports(&self) -> RepoResult<SqliteExportService<'_>> {
        Ok(ExportService::new(
            SqliteProfileRepository::try_new(&self.conn)?,
            SqliteTaskRepository::try_new(&self.conn)?,
            self.clock(),
        ))
    }

    /// Builds a scheduler over the configured database file sharing this
    /// context's clock. The scheduler is returned stopped.
    pub fn scheduler(&self, sink: Arc<dyn NotificationSink>) -> NotificationScheduler {
        NotificationScheduler::new(
            self.config.db_path.clone(),
            self.config.scan_interval,
            Arc::clone(&self.clock),
            sink,
        )
    }
}
