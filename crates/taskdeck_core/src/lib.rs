//! Core domain logic for TaskDeck.
//! Profiles, tasks, notifications and dashboard statistics live here; UI
//! shells talk to this crate through [`ipc::dispatch`].

pub mod app;
pub mod clock;
pub mod config;
pub mod db;
pub mod ipc;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod service;

pub use app::AppContext;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use ipc::{dispatch, invoke_json, IpcError, IpcErrorCode, IpcMethod, IpcResponse};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::notification::{Notification, NotificationId, NotificationKind};
pub use model::profile::{NewProfile, Profile, ProfileId, ProfilePatch, Theme};
pub use model::task::{
    NewTask, RecurrencePattern, Task, TaskCategory, TaskId, TaskPatch, TaskPriority, TaskStatus,
};
pub use model::ValidationError;
pub use repo::{RepoError, RepoResult};
pub use scheduler::{
    run_tick, LogNotificationSink, NotificationScheduler, NotificationSink, SchedulerError,
};
pub use service::dashboard::{compute_dashboard, Dashboard, DashboardError, DashboardRequest};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
