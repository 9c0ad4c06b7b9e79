//! Service-level error taxonomy.

use super::project_locks::LockTimeout;
use crate::model::project::ProjectId;
use crate::model::task::{Task, TaskId};
use crate::model::validation::ValidationError;
use crate::repo::store::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse error class used by callers to decide between correcting input,
/// retrying, or reporting an internal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    /// Lock wait timed out; safe to retry.
    Busy,
    Internal,
}

/// Errors from project/task service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Input failed validation; nothing was written.
    Validation(ValidationError),
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Per-project lock could not be acquired in time; nothing was written.
    Busy {
        project_ids: Vec<ProjectId>,
        waited_ms: u128,
    },
    /// The task write committed but recomputing `project_id` failed.
    ///
    /// The project's derived fields stay stale until the next successful
    /// recompute.
    AggregationFailed {
        task: Box<Task>,
        project_id: ProjectId,
        source: Box<ServiceError>,
    },
    /// Persistence-layer failure; transactional writes were rolled back.
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ProjectNotFound(_) | Self::TaskNotFound(_) => ErrorKind::NotFound,
            Self::Busy { .. } => ErrorKind::Busy,
            Self::AggregationFailed { .. } | Self::Repo(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::ProjectNotFound(_) => "project_not_found",
            Self::TaskNotFound(_) => "task_not_found",
            Self::Busy { .. } => "busy",
            Self::AggregationFailed { .. } => "aggregation_failed",
            Self::Repo(_) => "store_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Busy {
                project_ids,
                waited_ms,
            } => {
                let ids = project_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "project lock busy after {waited_ms}ms: {ids}")
            }
            Self::AggregationFailed {
                task,
                project_id,
                source,
            } => write!(
                f,
                "task {} saved but recompute of project {project_id} failed: {source}",
                task.id
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::AggregationFailed { source, .. } => Some(source.as_ref()),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<LockTimeout> for ServiceError {
    fn from(value: LockTimeout) -> Self {
        Self::Busy {
            project_ids: value.project_ids,
            waited_ms: value.waited.as_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ServiceError};
    use crate::model::validation::ValidationError;
    use crate::repo::store::RepoError;
    use uuid::Uuid;

    #[test]
    fn repo_not_found_maps_to_not_found_kind() {
        let id = Uuid::new_v4();
        let err = ServiceError::from(RepoError::ProjectNotFound(id));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.code(), "project_not_found");
    }

    #[test]
    fn repo_validation_maps_to_validation_kind() {
        let err = ServiceError::from(RepoError::Validation(ValidationError::EmptyName));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn backend_failure_is_internal() {
        let err = ServiceError::from(RepoError::Backend("disk".to_string()));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
