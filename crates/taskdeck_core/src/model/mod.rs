//! Domain model for profiles, tasks and notifications.
//!
//! # Responsibility
//! - Define canonical records used by repositories, services and the
//!   request channel.
//! - Own field-level validation that must pass before persistence.
//!
//! # Invariants
//! - Every record is identified by a stable UUID v4.
//! - Timestamps are Unix epoch milliseconds.
//! - Enum values serialize as SCREAMING_SNAKE_CASE strings.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod notification;
pub mod profile;
pub mod task;

/// Minimum accepted password length for profile credentials.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Earliest accepted task date: 0001-01-01T00:00:00Z.
pub const MIN_TASK_DATE_MS: i64 = -62_135_596_800_000;
/// Latest accepted task date: 9999-12-31T23:59:59.999Z.
pub const MAX_TASK_DATE_MS: i64 = 253_402_300_799_999;

/// Field-level validation failures raised before any SQL mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title is blank after trim.
    BlankTitle,
    /// Profile display name is blank after trim.
    BlankProfileName,
    /// Password shorter than [`MIN_PASSWORD_CHARS`].
    PasswordTooShort { min_chars: usize },
    /// `due_date` is earlier than `start_date`.
    DueBeforeStart { start_date: i64, due_date: i64 },
    /// A task date lies outside `MIN_TASK_DATE_MS..=MAX_TASK_DATE_MS`.
    DateOutOfRange { field: &'static str, value: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::BlankProfileName => write!(f, "profile name must not be blank"),
            Self::PasswordTooShort { min_chars } => {
                write!(f, "password must be at least {min_chars} characters")
            }
            Self::DueBeforeStart {
                start_date,
                due_date,
            } => write!(
                f,
                "due_date ({due_date}) must not be earlier than start_date ({start_date})"
            ),
            Self::DateOutOfRange { field, value } => write!(
                f,
                "{field} ({value}) is outside the supported range of years 1..=9999"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Deserializes a present JSON field (including `null`) as `Some(value)`.
///
/// Paired with `#[serde(default)]` on `Option<Option<T>>` patch fields so an
/// omitted key stays `None` while an explicit `null` becomes `Some(None)`.
pub(crate) fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
