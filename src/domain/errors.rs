use std::fmt::Display;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a repository call.
///
/// Storage drivers convert into this type inside `infrastructure`; nothing
/// above the repositories ever sees a driver error directly.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("no rows returned")]
    NotFound,
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error(transparent)]
    Backend(BoxError),
}

/// Outcome of a failed service operation.
///
/// Exactly one kind is reported per call. The transport layer inspects the
/// kind once to choose a response status.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed on field '{field}': {message}")]
    Validation { field: &'static str, message: String },

    #[error("{resource} with ID '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} with ID '{id}' already exists")]
    AlreadyExists { resource: &'static str, id: String },

    #[error("database error on operation '{operation}': {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: RepoError,
    },

    /// Begin or commit failed; nothing was made durable.
    #[error("transaction failed: {0}")]
    Transaction(#[source] RepoError),

    #[error("request cancelled before {stage}")]
    Cancelled { stage: &'static str },
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl Display) -> Self {
        DomainError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn already_exists(resource: &'static str, id: impl Display) -> Self {
        DomainError::AlreadyExists {
            resource,
            id: id.to_string(),
        }
    }

    /// Wraps a repository failure with the name of the operation that failed,
    /// for use with `map_err`.
    pub fn database(operation: &'static str) -> impl FnOnce(RepoError) -> DomainError {
        move |source| DomainError::Database { operation, source }
    }

    /// Like [`DomainError::database`], but a missing row becomes `NotFound`
    /// for the given resource.
    pub fn lookup(
        operation: &'static str,
        resource: &'static str,
        id: impl Display,
    ) -> impl FnOnce(RepoError) -> DomainError {
        move |source| match source {
            RepoError::NotFound => DomainError::not_found(resource, id),
            source => DomainError::Database { operation, source },
        }
    }
}
