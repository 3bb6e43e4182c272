//! Profile domain model.
//!
//! # Invariants
//! - `name` is non-blank.
//! - `password_hash` never leaves the core through serialization.

use super::{deserialize_present, ValidationError, MIN_PASSWORD_CHARS};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProfileId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::System];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "LIGHT",
            Self::Dark => "DARK",
            Self::System => "SYSTEM",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.as_str() == value)
    }
}

/// User identity scoping tasks and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub avatar: Option<String>,
    pub theme: Theme,
    /// Argon2 PHC string.
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Profile {
    pub fn new(name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar: None,
            theme: Theme::default(),
            password_hash: None,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankProfileName);
        }
        Ok(())
    }

    pub fn has_credential(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input for `create-profile`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub theme: Option<Theme>,
}

/// Partial update for `update-profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub avatar: Option<Option<String>>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Rejects passwords shorter than [`MIN_PASSWORD_CHARS`] characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::PasswordTooShort {
            min_chars: MIN_PASSWORD_CHARS,
        });
    }
    Ok(())
}
