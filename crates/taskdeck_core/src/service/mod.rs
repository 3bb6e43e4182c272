//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply task lifecycle and notification rules at mutation call sites.
//! - Keep UI/bridge layers decoupled from storage details.
//!
//! # Invariants
//! - Services read time only through an injected [`crate::clock::Clock`].
//! - Service APIs never bypass repository validation.

use crate::model::ValidationError;
use crate::repo::{Entity, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod credentials;
pub mod dashboard;
pub mod export_service;
pub mod lifecycle;
pub mod notification_service;
pub mod profile_service;
pub mod task_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level error shared by all use-case services.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before persistence.
    Validation(ValidationError),
    /// Target record does not exist.
    NotFound { entity: Entity, id: Uuid },
    /// Password hashing or hash parsing failed.
    Credential(String),
    /// Export file could not be written.
    Io(std::io::Error),
    /// Export payload could not be serialized.
    Serialization(serde_json::Error),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Credential(message) => write!(f, "credential error: {message}"),
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Serialization(err) => write!(f, "serialization error: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound { .. } | Self::Credential(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
