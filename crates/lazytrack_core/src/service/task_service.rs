//! Task use-case service with the post-mutation aggregation hook.
//!
//! # Responsibility
//! - Provide task create/get/list/update/delete entry points.
//! - Recompute every affected project after a task write commits.
//!
//! # Invariants
//! - The task write and the following recompute run under the affected
//!   projects' locks, so concurrent mutations of one project apply in some
//!   total order.
//! - Moving a task from project A to B recomputes both A and B.
//! - A task write is never rolled back because its recompute failed; the
//!   failure is reported as `AggregationFailed` with the committed task.
//! - Tasks can only be created in, or moved to, an existing project.

use super::aggregation::recompute_project;
use super::error::ServiceError;
use super::project_locks::{ProjectLockGuard, ProjectLocks};
use super::ServiceOptions;
use crate::model::project::{Project, ProjectId};
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::repo::store::{TaskListQuery, TrackerStore};
use log::{debug, error, info};
use std::time::Instant;

const MAX_LOCK_ATTEMPTS: usize = 3;

/// Task service facade over a store implementation.
pub struct TaskService<S: TrackerStore> {
    store: S,
    locks: ProjectLocks,
    options: ServiceOptions,
}

impl<S: TrackerStore> TaskService<S> {
    /// Creates a service with a private lock table and default options.
    pub fn new(store: S) -> Self {
        Self::with_coordination(store, ProjectLocks::new(), ServiceOptions::default())
    }

    /// Creates a service sharing `locks` with other services.
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

    /// Creates one task and recomputes its project.
    ///
    /// # Errors
    /// - `Validation` for blank name or invalid weight.
    /// - `ProjectNotFound` when `task.project_id` does not exist.
    /// - `AggregationFailed` when the task was saved but recompute failed.
    pub fn create_task(&self, task: &Task) -> Result<Task, ServiceError> {
        task.validate()?;
        let _guard = self.lock(&[task.project_id])?;

        let created = self
            .store
            .with_transaction(|store| -> Result<Task, ServiceError> {
                if store.get_project(task.project_id)?.is_none() {
                    return Err(ServiceError::ProjectNotFound(task.project_id));
                }
                Ok(store.create_task(task)?)
            })?;
        info!(
            "event=task_create module=task_service status=ok task_id={} project_id={}",
            created.id, created.project_id
        );

        self.after_task_mutation(&created, &[created.project_id])?;
        Ok(created)
    }

    /// Gets one task by id.
    pub fn get_task(&self, task_id: TaskId) -> Result<Task, ServiceError> {
        self.store
            .get_task(task_id)?
            .ok_or(ServiceError::TaskNotFound(task_id))
    }

    /// Lists tasks using filter and pagination options.
    pub fn list_tasks(&self, query: &TaskListQuery) -> Result<Vec<Task>, ServiceError> {
        Ok(self.store.list_tasks(query)?)
    }

    /// Applies a partial update and recomputes the affected project(s).
    ///
    /// When the patch moves the task to another project, both the previous
    /// and the new project are recomputed.
    pub fn update_task(&self, task_id: TaskId, patch: &TaskPatch) -> Result<Task, ServiceError> {
        let (_guard, current) = self.lock_task(task_id, patch.project_id)?;
        let mut updated = current.clone();
        patch.apply_to(&mut updated)?;

        let saved = self
            .store
            .with_transaction(|store| -> Result<Task, ServiceError> {
                if updated.project_id != current.project_id
                    && store.get_project(updated.project_id)?.is_none()
                {
                    return Err(ServiceError::ProjectNotFound(updated.project_id));
                }
                Ok(store.update_task(&updated)?)
            })?;
        info!(
            "event=task_update module=task_service status=ok task_id={} project_id={} moved={}",
            saved.id,
            saved.project_id,
            saved.project_id != current.project_id
        );

        let mut affected = vec![current.project_id];
        if saved.project_id != current.project_id {
            affected.push(saved.project_id);
        }
        self.after_task_mutation(&saved, &affected)?;
        Ok(saved)
    }

    /// Deletes one task and recomputes the project it belonged to.
    ///
    /// Returns the task as it was before deletion.
    pub fn delete_task(&self, task_id: TaskId) -> Result<Task, ServiceError> {
        let (_guard, current) = self.lock_task(task_id, None)?;

        self.store
            .with_transaction(|store| -> Result<(), ServiceError> {
                Ok(store.delete_task(task_id)?)
            })?;
        info!(
            "event=task_delete module=task_service status=ok task_id={} project_id={}",
            task_id, current.project_id
        );

        self.after_task_mutation(&current, &[current.project_id])?;
        Ok(current)
    }

    /// Mutation hook: recomputes each affected project after a committed
    /// task write. Every project is attempted; the first failure is
    /// reported.
    fn after_task_mutation(
        &self,
        task: &Task,
        project_ids: &[ProjectId],
    ) -> Result<Vec<Project>, ServiceError> {
        let mut projects = Vec::with_capacity(project_ids.len());
        let mut first_failure = None;

        for &project_id in project_ids {
            match recompute_project(&self.store, project_id, self.options.mixed_status) {
                Ok(project) => projects.push(project),
                Err(err) => {
                    error!(
                        "event=task_aggregation module=task_service status=error task_id={} project_id={} error_code={} error={}",
                        task.id,
                        project_id,
                        err.code(),
                        err
                    );
                    if first_failure.is_none() {
                        first_failure = Some((project_id, err));
                    }
                }
            }
        }

        match first_failure {
            None => Ok(projects),
            Some((project_id, source)) => Err(ServiceError::AggregationFailed {
                task: Box::new(task.clone()),
                project_id,
                source: Box::new(source),
            }),
        }
    }

    /// Locks the task's current project (and `target`, if any) and returns
    /// the task as read under that lock.
    ///
    /// Retries when a concurrent move changed the task's project between
    /// the unlocked read and lock acquisition.
    fn lock_task(
        &self,
        task_id: TaskId,
        target: Option<ProjectId>,
    ) -> Result<(ProjectLockGuard, Task), ServiceError> {
        let started_at = Instant::now();
        let mut project_ids = Vec::new();

        for attempt in 1..=MAX_LOCK_ATTEMPTS {
            let seen = self.get_task(task_id)?;
            project_ids = vec![seen.project_id];
            project_ids.extend(target);

            let guard = self.lock(&project_ids)?;
            let current = self.get_task(task_id)?;
            if current.project_id == seen.project_id {
                return Ok((guard, current));
            }
            debug!(
                "event=task_lock module=task_service status=retry task_id={} attempt={}",
                task_id, attempt
            );
        }

        Err(ServiceError::Busy {
            project_ids,
            waited_ms: started_at.elapsed().as_millis(),
        })
    }

    fn lock(&self, project_ids: &[ProjectId]) -> Result<ProjectLockGuard, ServiceError> {
        Ok(self.locks.acquire(project_ids, self.options.lock_timeout)?)
    }
}
