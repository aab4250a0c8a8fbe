//! Core error taxonomy and its outward status mapping.
//!
//! # Invariants
//! - Store failures propagate unchanged inside `CoreError::Store`.
//! - Every other kind is raised where it is detected.
//! - Only article edits are retried before a `Conflict` surfaces.

use crate::db::DbError;
use crate::model::identity::RegistrationValidationError;
use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

/// Stable classification of [`CoreError`] for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Store,
}

impl ErrorKind {
    /// HTTP status an outer layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict | Self::Store => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Store => "store",
        }
    }
}

/// Error returned by every core service operation.
#[derive(Debug)]
pub enum CoreError {
    /// Malformed or missing input.
    Validation(String),
    /// No verified identity was attached to the request.
    Unauthenticated,
    /// Authenticated, but not allowed to touch the target.
    Forbidden(String),
    /// Target entity does not exist.
    NotFound(String),
    /// Edit retries exhausted on a contended article.
    Conflict(String),
    /// Persistence unavailable or inconsistent.
    Store(RepoError),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::Unauthenticated => write!(f, "request is not authenticated"),
            Self::Forbidden(message) => write!(f, "forbidden: {message}"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateDisplayName(_) => {
                Self::Validation("username already exists".to_string())
            }
            RepoError::DuplicateEmail(_) => Self::Validation("email already registered".to_string()),
            RepoError::WriteConflict(sequence) => {
                Self::Conflict(format!("article {sequence} was modified concurrently"))
            }
            other => Self::Store(other),
        }
    }
}

impl From<DbError> for CoreError {
    fn from(value: DbError) -> Self {
        Self::Store(RepoError::Db(value))
    }
}

impl From<RegistrationValidationError> for CoreError {
    fn from(value: RegistrationValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}
