//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the request channel, app bootstrap and scheduler control to Dart
//!   via FRB.
//! - Buffer scheduler deliveries until the UI drains them.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One runtime per process; `app_init` is idempotent for the same data dir.
//! - Return values are UTF-8 strings with stable meaning.

use log::{info, warn};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use taskdeck_core::config::ENV_DATA_DIR;
use taskdeck_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    invoke_json as invoke_json_inner, ping as ping_inner, AppConfig, AppContext, IpcError,
    IpcErrorCode, IpcResponse, LogNotificationSink, Notification, NotificationScheduler,
    NotificationSink,
};

const MAX_QUEUED_NOTIFICATIONS: usize = 256;

static RUNTIME: Mutex<Option<Runtime>> = Mutex::new(None);

struct Runtime {
    data_dir: PathBuf,
    ctx: AppContext,
    scheduler: NotificationScheduler,
    sink: Arc<QueuedNotificationSink>,
}

/// Sink that logs each delivery and keeps it for the next UI drain.
///
/// When the queue is full the oldest entry is dropped.
#[derive(Debug, Default)]
pub struct QueuedNotificationSink {
    queue: Mutex<VecDeque<Notification>>,
}

impl QueuedNotificationSink {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.lock().drain(..).collect()
    }
}

impl NotificationSink for QueuedNotificationSink {
    fn deliver(&self, notification: &Notification) {
        LogNotificationSink.deliver(notification);
        let mut queue = self.lock();
        if queue.len() >= MAX_QUEUED_NOTIFICATIONS {
            queue.pop_front();
            warn!("event=notification_queue module=ffi status=dropped reason=queue_full");
        }
        queue.push_back(notification.clone());
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens the database under `data_dir` and prepares the scheduler.
///
/// An empty `data_dir` falls back to `TASKDECK_DATA_DIR` and the other
/// `TASKDECK_*` environment overrides.
///
/// # FFI contract
/// - Sync call; runs migrations on first open.
/// - Idempotent for the same data directory; a different one is rejected.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn app_init(data_dir: String) -> String {
    match app_init_inner(data_dir.trim()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Calls one request-channel method.
///
/// `args_json` is a JSON array of positional arguments (empty string for
/// none). Returns `{"ok":true,"data":...}` or
/// `{"ok":false,"error":{"code":...,"message":...}}`.
#[flutter_rust_bridge::frb(sync)]
pub fn invoke(method: String, args_json: String) -> String {
    let guard = lock_runtime();
    match guard.as_ref() {
        Some(runtime) => invoke_json_inner(&runtime.ctx, &method, &args_json),
        None => not_ready_envelope(),
    }
}

/// Starts periodic notification delivery. Empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn scheduler_start() -> String {
    let mut guard = lock_runtime();
    let Some(runtime) = guard.as_mut() else {
        return "app_init must be called first".to_string();
    };
    if runtime.scheduler.is_running() {
        return String::new();
    }
    match runtime.scheduler.start() {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Stops the scheduler and waits for its worker. No-op when stopped.
#[flutter_rust_bridge::frb(sync)]
pub fn scheduler_stop() -> String {
    let mut guard = lock_runtime();
    if let Some(runtime) = guard.as_mut() {
        runtime.scheduler.stop();
    }
    String::new()
}

/// Returns notifications delivered since the last drain as a JSON array.
#[flutter_rust_bridge::frb(sync)]
pub fn drain_delivered_notifications() -> String {
    let guard = lock_runtime();
    let delivered = guard
        .as_ref()
        .map(|runtime| runtime.sink.drain())
        .unwrap_or_default();
    serde_json::to_string(&delivered).unwrap_or_else(|_| "[]".to_string())
}

fn app_init_inner(data_dir: &str) -> Result<(), String> {
    let config = if data_dir.is_empty() {
        AppConfig::from_env()
    } else {
        let data_dir = data_dir.to_string();
        AppConfig::from_lookup(move |key| {
            if key == ENV_DATA_DIR {
                Some(data_dir.clone())
            } else {
                std::env::var(key).ok()
            }
        })
    }
    .map_err(|err| format!("invalid configuration: {err}"))?;

    let mut guard = lock_runtime();
    if let Some(runtime) = guard.as_ref() {
        if runtime.data_dir == config.data_dir {
            return Ok(());
        }
        return Err(format!(
            "app already initialized at `{}`; refusing to switch to `{}`",
            runtime.data_dir.display(),
            config.data_dir.display()
        ));
    }

    let data_dir = config.data_dir.clone();
    let ctx = AppContext::open(config).map_err(|err| format!("database open failed: {err}"))?;
    let sink = Arc::new(QueuedNotificationSink::default());
    let scheduler = ctx.scheduler(Arc::clone(&sink) as Arc<dyn NotificationSink>);
    info!(
        "event=app_init module=ffi status=ok data_dir={}",
        data_dir.display()
    );
    *guard = Some(Runtime {
        data_dir,
        ctx,
        scheduler,
        sink,
    });
    Ok(())
}

fn lock_runtime() -> MutexGuard<'static, Option<Runtime>> {
    RUNTIME
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn not_ready_envelope() -> String {
    let response = IpcResponse::from(Err(IpcError::new(
        IpcErrorCode::Internal,
        "app_init must be called first",
    )));
    serde_json::to_string(&response).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        app_init, core_version, drain_delivered_notifications, init_logging, invoke,
        not_ready_envelope, ping, scheduler_start, scheduler_stop, QueuedNotificationSink,
        MAX_QUEUED_NOTIFICATIONS,
    };
    use serde_json::Value;
    use taskdeck_core::{Notification, NotificationKind, NotificationSink};
    use uuid::Uuid;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn not_ready_envelope_is_an_error_response() {
        let value: Value = serde_json::from_str(&not_ready_envelope()).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"]["code"], "internal");
    }

    #[test]
    fn queued_sink_drops_oldest_when_full() {
        let sink = QueuedNotificationSink::default();
        let first = sample_notification();
        sink.deliver(&first);
        for _ in 0..MAX_QUEUED_NOTIFICATIONS {
            sink.deliver(&sample_notification());
        }
        let drained = sink.drain();
        assert_eq!(drained.len(), MAX_QUEUED_NOTIFICATIONS);
        assert!(drained.iter().all(|item| item.id != first.id));
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn runtime_round_trip_through_invoke_and_scheduler() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap().to_string();

        assert_eq!(app_init(data_dir.clone()), "");
        assert_eq!(app_init(data_dir), "");
        let other = tempfile::tempdir().unwrap();
        assert!(app_init(other.path().to_str().unwrap().to_string()).contains("refusing"));

        let created: Value = serde_json::from_str(&invoke(
            "create-profile".to_string(),
            r#"[{"name":"Ada","password":"correct horse"}]"#.to_string(),
        ))
        .unwrap();
        assert_eq!(created["ok"], true, "{created}");
        assert!(created["data"].get("passwordHash").is_none());
        let profile_id = created["data"]["id"].as_str().unwrap().to_string();

        let task: Value = serde_json::from_str(&invoke(
            "create-task".to_string(),
            format!(r#"[{{"profileId":"{profile_id}","title":"Late report","dueDate":1000}}]"#),
        ))
        .unwrap();
        assert_eq!(task["ok"], true, "{task}");

        let unknown: Value =
            serde_json::from_str(&invoke("drop-tables".to_string(), String::new())).unwrap();
        assert_eq!(unknown["error"]["code"], "unknown_method");

        assert_eq!(scheduler_start(), "");
        assert_eq!(scheduler_start(), "");
        let mut delivered = Vec::new();
        for _ in 0..50 {
            let batch: Vec<Value> =
                serde_json::from_str(&drain_delivered_notifications()).unwrap();
            delivered.extend(batch);
            if !delivered.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert_eq!(scheduler_stop(), "");
        assert!(delivered
            .iter()
            .any(|item| item["type"] == "TASK_OVERDUE"));
    }

    fn sample_notification() -> Notification {
        Notification::new(
            NotificationKind::TaskReminder,
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Task Reminder",
            "Reminder: sample",
            0,
            0,
        )
    }
}
