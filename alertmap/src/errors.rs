use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by the alert service and its stores.
///
/// Every variant is scoped to a single request; none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation for one or more fields.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The operation needs an authenticated user but the request was anonymous.
    #[error("authentication required")]
    Unauthenticated,

    /// The requester is authenticated but may not perform the operation.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Referenced entity does not exist.
    #[error("{entity} not found")]
    NotFound {
        entity: &'static str,
        entity_id: Option<String>,
    },

    /// The entity exists but its current state forbids the transition.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// A uniqueness guard rejected a concurrent or duplicate write.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl ServiceError {
    pub fn not_found(entity: &'static str, entity_id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Machine-readable error kind surfaced to HTTP clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::PermissionDenied { .. } => "permission_denied",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::InvalidState { .. } => "invalid_state",
            ServiceError::Conflict { .. } => "conflict",
            ServiceError::Redis(_) => "storage_error",
            ServiceError::Other { .. } => "internal_error",
        }
    }

    /// `true` for failures caused by the request itself rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Redis(_) | ServiceError::Other { .. })
    }
}

/// Collection of validation issues encountered while checking an input.
#[derive(Debug, Error)]
#[error("{}", describe_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

fn describe_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub type ServiceResult<T> = Result<T, ServiceError>;
