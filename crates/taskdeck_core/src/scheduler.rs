//! Periodic delivery of due notifications.
//!
//! # Responsibility
//! - Scan for unread notifications with `scheduled_for <= now`, hand each to
//!   a [`NotificationSink`] and mark it read.
//! - Run that scan on a dedicated worker thread with explicit start/stop.
//!
//! # Invariants
//! - The worker owns its own SQLite connection; the caller's connection is
//!   never shared across threads.
//! - A failed scan is logged and skipped; the next interval runs normally.
//! - `stop()` joins the worker before returning.

use crate::clock::Clock;
use crate::db::open_db;
use crate::model::notification::Notification;
use crate::repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
use crate::repo::RepoResult;
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Receiver of user-visible notifications (system tray, UI bridge, log).
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification);
}

/// Sink that records deliveries in the log only.
#[derive(Debug, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn deliver(&self, notification: &Notification) {
        info!(
            "event=notification_deliver module=scheduler status=ok kind={} notification_id={} task_id={}",
            notification.kind.as_str(),
            notification.id,
            notification.task_id
        );
    }
}

/// Delivers every due notification once and marks it read.
///
/// Returns the number of notifications delivered. Rows the repository cannot
/// decode are skipped there. Stops at the first storage error; notifications
/// already marked stay marked.
pub fn run_tick<R: NotificationRepository>(
    repo: &R,
    now_ms: i64,
    sink: &dyn NotificationSink,
) -> RepoResult<usize> {
    let due = repo.list_due(now_ms)?;
    for notification in &due {
        sink.deliver(notification);
        repo.mark_read(notification.id)?;
    }
    Ok(due.len())
}

#[derive(Debug)]
pub enum SchedulerError {
    AlreadyRunning,
    Spawn(std::io::Error),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "notification scheduler is already running"),
            Self::Spawn(err) => write!(f, "failed to spawn scheduler thread: {err}"),
        }
    }
}

impl Error for SchedulerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AlreadyRunning => None,
            Self::Spawn(err) => Some(err),
        }
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Fixed-interval scanner over one database file.
pub struct NotificationScheduler {
    db_path: PathBuf,
    interval: Duration,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    worker: Option<Worker>,
}

impl NotificationScheduler {
    pub fn new(
        db_path: impl Into<PathBuf>,
        interval: Duration,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            db_path: db_path.into(),
            interval,
            clock,
            sink,
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawns the worker. The first scan runs immediately, then once per
    /// interval until [`Self::stop`].
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.worker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let db_path = self.db_path.clone();
        let interval = self.interval;
        let clock = Arc::clone(&self.clock);
        let sink = Arc::clone(&self.sink);

        let handle = thread::Builder::new()
            .name("taskdeck-notification-scheduler".to_string())
            .spawn(move || {
                let mut conn: Option<Connection> = None;
                loop {
                    scan_once(&db_path, &mut conn, clock.as_ref(), sink.as_ref());
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(SchedulerError::Spawn)?;

        info!(
            "event=scheduler_start module=scheduler status=ok interval_ms={}",
            interval.as_millis()
        );
        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    /// Signals the worker and waits for it. No-op when not running.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.stop_tx.send(());
        if worker.handle.join().is_err() {
            error!("event=scheduler_stop module=scheduler status=error error_code=worker_panicked");
            return;
        }
        info!("event=scheduler_stop module=scheduler status=ok");
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn scan_once(
    db_path: &Path,
    conn: &mut Option<Connection>,
    clock: &dyn Clock,
    sink: &dyn NotificationSink,
) {
    let started_at = Instant::now();
    if conn.is_none() {
        match open_db(db_path) {
            Ok(opened) => *conn = Some(opened),
            Err(err) => {
                error!(
                    "event=scheduler_tick module=scheduler status=error error_code=db_open_failed error={}",
                    err
                );
                return;
            }
        }
    }
    let Some(conn) = conn.as_ref() else {
        return;
    };

    let result = SqliteNotificationRepository::try_new(conn)
        .and_then(|repo| run_tick(&repo, clock.now_ms(), sink));
    match result {
        Ok(0) => debug!(
            "event=scheduler_tick module=scheduler status=ok delivered=0 duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Ok(delivered) => info!(
            "event=scheduler_tick module=scheduler status=ok delivered={} duration_ms={}",
            delivered,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=scheduler_tick module=scheduler status=error error_code=tick_failed duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
