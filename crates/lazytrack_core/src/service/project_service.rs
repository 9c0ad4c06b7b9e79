//! Project use-case service.
//!
//! # Responsibility
//! - Provide project create/get/list/update entry points.
//! - Expose on-demand recompute of derived project fields.
//! - Own cascading deletion of a project and all its tasks.
//!
//! # Invariants
//! - A project is only ever removed through `delete_project_cascade`.
//! - Cascading deletion is all-or-nothing: either the project and every task
//!   referencing it are gone, or nothing changed.
//! - Direct status/progress writes through `update_project` are kept only
//!   until the next recompute.

use super::aggregation::recompute_project;
use super::error::{ErrorKind, ServiceError};
use super::project_locks::{ProjectLockGuard, ProjectLocks};
use super::ServiceOptions;
use crate::model::project::{Project, ProjectId, ProjectPatch, ProjectWithTasks};
use crate::model::validation::ValidationError;
use crate::repo::store::TrackerStore;
use log::{error, info, warn};
use std::time::Instant;

/// Result of a successful cascading deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeDeletion {
    /// Project record as it was right before deletion.
    pub project: Project,
    /// Number of tasks removed together with the project.
    pub deleted_tasks: usize,
}

/// Project service facade over a store implementation.
pub struct ProjectService<S: TrackerStore> {
    store: S,
    locks: ProjectLocks,
    options: ServiceOptions,
}

impl<S: TrackerStore> ProjectService<S> {
    /// Creates a service with a private lock table and default options.
    pub fn new(store: S) -> Self {
        Self::with_coordination(store, ProjectLocks::new(), ServiceOptions::default())
    }

    /// Creates a service sharing `locks` with other services.
    ///
    /// Task and project services operating on the same data must share one
    /// lock table.
    pub fn with_coordination(store: S, locks: ProjectLocks, options: ServiceOptions) -> Self {
        Self {
            store,
            locks,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates one project.
    ///
    /// Status and progress may be preset; both are re-derived on the first
    /// task mutation.
    pub fn create_project(&self, project: &Project) -> Result<Project, ServiceError> {
        project.validate()?;
        let created = self.store.create_project(project)?;
        info!(
            "event=project_create module=project_service status=ok project_id={}",
            created.id
        );
        Ok(created)
    }

    /// Gets one project by id.
    pub fn get_project(&self, project_id: ProjectId) -> Result<Project, ServiceError> {
        self.store
            .get_project(project_id)?
            .ok_or(ServiceError::ProjectNotFound(project_id))
    }

    /// Gets one project together with its current tasks.
    pub fn get_project_with_tasks(
        &self,
        project_id: ProjectId,
    ) -> Result<ProjectWithTasks, ServiceError> {
        let project = self.get_project(project_id)?;
        let tasks = self.store.tasks_by_project(project_id)?;
        Ok(ProjectWithTasks { project, tasks })
    }

    /// Lists all projects in creation order.
    pub fn list_projects(&self) -> Result<Vec<Project>, ServiceError> {
        Ok(self.store.list_projects()?)
    }

    /// Lists all projects with their tasks resolved at query time.
    pub fn list_projects_with_tasks(&self) -> Result<Vec<ProjectWithTasks>, ServiceError> {
        let projects = self.store.list_projects()?;
        let mut items = Vec::with_capacity(projects.len());
        for project in projects {
            let tasks = self.store.tasks_by_project(project.id)?;
            items.push(ProjectWithTasks { project, tasks });
        }
        Ok(items)
    }

    /// Applies a partial update to one project.
    ///
    /// # Errors
    /// - `Validation` when the patch changes nothing.
    pub fn update_project(
        &self,
        project_id: ProjectId,
        patch: &ProjectPatch,
    ) -> Result<Project, ServiceError> {
        if patch.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "body",
                message: "expected at least one of name, status, completion_progress".to_string(),
            }
            .into());
        }
        let _guard = self.lock(project_id)?;
        let updated = self
            .store
            .with_transaction(|store| -> Result<Project, ServiceError> {
                let mut project = store
                    .get_project(project_id)?
                    .ok_or(ServiceError::ProjectNotFound(project_id))?;
                patch.apply_to(&mut project)?;
                Ok(store.save_project(&project)?)
            })?;
        info!(
            "event=project_update module=project_service status=ok project_id={}",
            project_id
        );
        Ok(updated)
    }

    /// Re-derives status and progress of one project from its tasks.
    pub fn recompute(&self, project_id: ProjectId) -> Result<Project, ServiceError> {
        let _guard = self.lock(project_id)?;
        recompute_project(&self.store, project_id, self.options.mixed_status)
    }

    /// Deletes a project and every task referencing it as one unit.
    ///
    /// # Errors
    /// - `ProjectNotFound` when the project does not exist; no task is
    ///   deleted in that case, even ones referencing the missing id.
    /// - `Repo` when either delete step fails; everything is rolled back.
    pub fn delete_project_cascade(
        &self,
        project_id: ProjectId,
    ) -> Result<CascadeDeletion, ServiceError> {
        let started_at = Instant::now();
        let _guard = self.lock(project_id)?;
        info!(
            "event=project_delete_cascade module=project_service status=start project_id={}",
            project_id
        );

        let result = self
            .store
            .with_transaction(|store| -> Result<CascadeDeletion, ServiceError> {
                let project = store
                    .get_project(project_id)?
                    .ok_or(ServiceError::ProjectNotFound(project_id))?;
                let deleted_tasks = store.delete_tasks_by_project(project_id)?;
                store.delete_project(project_id)?;
                Ok(CascadeDeletion {
                    project,
                    deleted_tasks,
                })
            });

        match &result {
            Ok(deletion) => info!(
                "event=project_delete_cascade module=project_service status=ok project_id={} deleted_tasks={} duration_ms={}",
                project_id,
                deletion.deleted_tasks,
                started_at.elapsed().as_millis()
            ),
            Err(err) if err.kind() == ErrorKind::Internal => error!(
                "event=project_delete_cascade module=project_service status=error project_id={} duration_ms={} error_code={} error={}",
                project_id,
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
            Err(err) => warn!(
                "event=project_delete_cascade module=project_service status=rejected project_id={} error_code={}",
                project_id,
                err.code()
            ),
        }
        result
    }

    fn lock(&self, project_id: ProjectId) -> Result<ProjectLockGuard, ServiceError> {
        Ok(self
            .locks
            .acquire(&[project_id], self.options.lock_timeout)?)
    }
}
