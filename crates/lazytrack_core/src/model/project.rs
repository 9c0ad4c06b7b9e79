//! Project domain model.
//!
//! # Responsibility
//! - Define the project record and its writable-field validation.
//!
//! # Invariants
//! - `status` and `completion_progress` are recomputed from the project's
//!   tasks; direct writes are kept only until the next recompute.
//! - A project with zero tasks is `Draft` at `0` progress after recompute.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::progress::CompletionProgress;
use super::status::WorkStatus;
use super::task::Task;
use super::validation::{normalize_name, ValidationError};

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Project record as persisted by the project store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub status: WorkStatus,
    pub completion_progress: CompletionProgress,
    /// Unix epoch milliseconds, assigned by the store.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every store write.
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl Project {
    /// Creates an unsaved draft project with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: WorkStatus::Draft,
            completion_progress: CompletionProgress::ZERO,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Checks writable fields before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        normalize_name(&self.name)?;
        Ok(())
    }
}

/// Project together with the tasks currently referencing it.
///
/// Read model assembled at query time; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}

/// Partial update for a project.
///
/// `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub status: Option<WorkStatus>,
    pub completion_progress: Option<CompletionProgress>,
}

impl ProjectPatch {
    /// Applies this patch onto `project`, normalizing the name.
    pub fn apply_to(&self, project: &mut Project) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            project.name = normalize_name(name)?;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(progress) = self.completion_progress {
            project.completion_progress = progress;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none() && self.completion_progress.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Project, ProjectPatch};
    use crate::model::progress::CompletionProgress;
    use crate::model::status::WorkStatus;
    use crate::model::validation::ValidationError;

    #[test]
    fn new_project_starts_as_empty_draft() {
        let project = Project::new("Apollo");
        assert_eq!(project.status, WorkStatus::Draft);
        assert_eq!(project.completion_progress, CompletionProgress::ZERO);
        assert!(project.validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let project = Project::new("   ");
        assert_eq!(project.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut project = Project::new("Apollo");
        let patch = ProjectPatch {
            name: Some("  Gemini ".to_string()),
            status: Some(WorkStatus::Done),
            ..ProjectPatch::default()
        };
        patch.apply_to(&mut project).unwrap();
        assert_eq!(project.name, "Gemini");
        assert_eq!(project.status, WorkStatus::Done);
        assert_eq!(project.completion_progress, CompletionProgress::ZERO);
    }

    #[test]
    fn serializes_with_external_field_names() {
        let mut project = Project::new("Apollo");
        project.status = WorkStatus::InProgress;
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["status"], "In Progress");
        assert_eq!(value["completion_progress"], 0.0);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}
