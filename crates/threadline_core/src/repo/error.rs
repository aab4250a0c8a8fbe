//! Repository error shared by all SQLite repositories.

use crate::db::DbError;
use crate::model::article::ArticleSequence;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error with the semantic cases callers branch on.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Display name is already taken by another identity.
    DuplicateDisplayName(String),
    /// Email is already bound to another profile.
    DuplicateEmail(String),
    /// Article changed (or was locked) between read and write.
    WriteConflict(ArticleSequence),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl RepoError {
    /// Whether a retry of the whole unit of work may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::WriteConflict(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::DuplicateDisplayName(name) => write!(f, "display name already taken: `{name}`"),
            Self::DuplicateEmail(email) => write!(f, "email already registered: `{email}`"),
            Self::WriteConflict(sequence) => {
                write!(f, "concurrent write conflict on article {sequence}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
