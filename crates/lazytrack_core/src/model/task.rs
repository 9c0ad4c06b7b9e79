//! Task domain model.
//!
//! # Invariants
//! - `weight` is finite and `>= 0`.
//! - A persisted task always references an existing project.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::ProjectId;
use super::status::WorkStatus;
use super::validation::{normalize_name, validate_weight, ValidationError};

/// Stable task identifier.
pub type TaskId = Uuid;

/// Task record as persisted by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub status: WorkStatus,
    /// Relative contribution to the owning project's completion.
    pub weight: f64,
    /// Owning project, serialized as `project`.
    #[serde(rename = "project")]
    pub project_id: ProjectId,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl Task {
    /// Creates an unsaved draft task with a generated id.
    pub fn new(project_id: ProjectId, name: impl Into<String>, weight: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: WorkStatus::Draft,
            weight,
            project_id,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn with_status(mut self, status: WorkStatus) -> Self {
        self.status = status;
        self
    }

    /// Checks writable fields before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        normalize_name(&self.name)?;
        validate_weight(self.weight)?;
        Ok(())
    }
}

/// Partial update for a task.
///
/// Changing `project_id` moves the task to another project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub status: Option<WorkStatus>,
    pub weight: Option<f64>,
    pub project_id: Option<ProjectId>,
}

impl TaskPatch {
    /// Applies this patch onto `task`, validating changed fields.
    pub fn apply_to(&self, task: &mut Task) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            task.name = normalize_name(name)?;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(weight) = self.weight {
            task.weight = validate_weight(weight)?;
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskPatch};
    use crate::model::status::WorkStatus;
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn negative_weight_is_rejected() {
        let task = Task::new(Uuid::new_v4(), "Design", -2.0);
        assert_eq!(task.validate(), Err(ValidationError::InvalidWeight(-2.0)));
    }

    #[test]
    fn patch_can_reassign_project() {
        let mut task = Task::new(Uuid::new_v4(), "Design", 1.0);
        let target = Uuid::new_v4();
        let patch = TaskPatch {
            project_id: Some(target),
            status: Some(WorkStatus::Done),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task).unwrap();
        assert_eq!(task.project_id, target);
        assert_eq!(task.status, WorkStatus::Done);
    }

    #[test]
    fn patch_rejects_invalid_weight_without_touching_task() {
        let mut task = Task::new(Uuid::new_v4(), "Design", 1.0);
        let patch = TaskPatch {
            weight: Some(f64::NAN),
            ..TaskPatch::default()
        };
        assert!(patch.apply_to(&mut task).is_err());
        assert_eq!(task.weight, 1.0);
    }

    #[test]
    fn serializes_project_reference_as_project() {
        let project_id = Uuid::new_v4();
        let task = Task::new(project_id, "Design", 3.0).with_status(WorkStatus::InProgress);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["project"], project_id.to_string());
        assert_eq!(value["status"], "In Progress");
        assert_eq!(value["weight"], 3.0);
    }
}
