//! Store contracts shared by the SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Define the repository error taxonomy.
//! - Define the transactional scope primitive spanning both record kinds.
//!
//! # Invariants
//! - `with_transaction` commits only when the scope returns `Ok`; any `Err`
//!   leaves both project and task data exactly as before the scope.
//! - Nested scopes join the outermost transaction.

use crate::db::DbError;
use crate::model::project::ProjectId;
use crate::model::task::TaskId;
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use super::project_repo::ProjectRepository;
pub use super::task_repo::{TaskListQuery, TaskRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for project/task persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed field validation before the write.
    Validation(ValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Non-SQLite backend failure (e.g. in-memory store fault).
    Backend(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Returns whether the error reports a missing project or task.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound(_) | Self::TaskNotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Backend(message) => write!(f, "store backend failure: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "store requires table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "store requires column `{column}` in table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
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

/// Combined project/task store with an atomic scope spanning both.
pub trait TrackerStore: ProjectRepository + TaskRepository {
    /// Runs `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`.
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>;
}

/// Lets several services share one store by reference.
impl<S: TrackerStore> TrackerStore for &S {
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        (**self).with_transaction(|_| f(self))
    }
}
