//! Use-case endpoints over one SQLite connection.
//!
//! # Responsibility
//! - Expose create/list/get/update for projects and create/list/get/update/
//!   delete for tasks, plus cascading project deletion.
//! - Keep transport concerns (method, path, headers) out of the core.
//!
//! # Invariants
//! - Every endpoint returns an `ApiResponse`; none panics or propagates.
//! - Path ids that are not record ids resolve to not-found.
//! - All services built by one `TrackerApi` share one project lock table.

use crate::payload;
use crate::response::ApiResponse;
use lazytrack_core::db::{open_db, open_db_in_memory, DbError};
use lazytrack_core::{
    ErrorKind, ProjectLocks, ProjectService, ServiceError, ServiceOptions, SqliteStore,
    TaskListQuery, TaskService, TrackerConfig, ValidationError,
};
use log::{error, warn};
use rusqlite::Connection;
use serde_json::{json, Value};

const PROJECT_DELETED_MESSAGE: &str = "Project and all associated tasks deleted successfully";
const TASK_DELETED_MESSAGE: &str = "Task deleted successfully";

/// Endpoint facade bound to one database connection.
pub struct TrackerApi {
    conn: Connection,
    locks: ProjectLocks,
    options: ServiceOptions,
}

impl TrackerApi {
    /// Opens (and migrates) the database named by `config`.
    pub fn open(config: &TrackerConfig) -> Result<Self, DbError> {
        let conn = open_db(&config.db_path)?;
        Ok(Self::from_connection(
            conn,
            ProjectLocks::new(),
            config.service_options(),
        ))
    }

    /// Opens a private in-memory database with default options.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = open_db_in_memory()?;
        Ok(Self::from_connection(
            conn,
            ProjectLocks::new(),
            ServiceOptions::default(),
        ))
    }

    /// Wraps an already migrated connection.
    ///
    /// Several `TrackerApi` values over the same database file must be given
    /// clones of one `ProjectLocks`.
    pub fn from_connection(conn: Connection, locks: ProjectLocks, options: ServiceOptions) -> Self {
        Self {
            conn,
            locks,
            options,
        }
    }

    pub fn create_project(&self, body: &Value) -> ApiResponse {
        respond("project_create", "Failed to create project", || {
            let draft = payload::project_draft(body)?;
            let project = self.projects()?.create_project(&draft)?;
            Ok(ApiResponse::created(project))
        })
    }

    /// Lists every project with its tasks resolved.
    pub fn list_projects(&self) -> ApiResponse {
        respond("project_list", "Internal server error", || {
            Ok(ApiResponse::ok(self.projects()?.list_projects_with_tasks()?))
        })
    }

    pub fn get_project(&self, id: &str) -> ApiResponse {
        let Some(project_id) = payload::record_id(id) else {
            return ApiResponse::project_not_found();
        };
        respond("project_get", "Internal server error", || {
            Ok(ApiResponse::ok(self.projects()?.get_project(project_id)?))
        })
    }

    /// Partially updates name, status or progress of one project.
    ///
    /// Status and progress written here hold until the next task mutation
    /// re-derives them.
    pub fn update_project(&self, id: &str, body: &Value) -> ApiResponse {
        let Some(project_id) = payload::record_id(id) else {
            return ApiResponse::project_not_found();
        };
        respond("project_update", "Failed to update project", || {
            let patch = payload::project_patch(body)?;
            let project = self.projects()?.update_project(project_id, &patch)?;
            Ok(ApiResponse::ok(project))
        })
    }

    /// Deletes a project together with all of its tasks.
    pub fn delete_project(&self, id: &str) -> ApiResponse {
        let Some(project_id) = payload::record_id(id) else {
            return ApiResponse::project_not_found();
        };
        respond("project_delete", "Failed to delete project", || {
            let deletion = self.projects()?.delete_project_cascade(project_id)?;
            Ok(ApiResponse::ok(json!({
                "message": PROJECT_DELETED_MESSAGE,
                "project": deletion.project,
                "deletedTasks": deletion.deleted_tasks,
            })))
        })
    }

    pub fn create_task(&self, body: &Value) -> ApiResponse {
        respond("task_create", "Failed to create task", || {
            let draft = payload::task_draft(body)?;
            let task = self.tasks()?.create_task(&draft)?;
            Ok(ApiResponse::created(task))
        })
    }

    /// Lists tasks, optionally only those of `project`.
    pub fn list_tasks(&self, project: Option<&str>) -> ApiResponse {
        respond("task_list", "Internal server error", || {
            let query = match project {
                None => TaskListQuery::default(),
                Some(raw) => {
                    let project_id =
                        payload::record_id(raw).ok_or_else(|| ValidationError::InvalidField {
                            field: "project",
                            message: format!("`{raw}` is not a project id"),
                        })?;
                    TaskListQuery::for_project(project_id)
                }
            };
            Ok(ApiResponse::ok(self.tasks()?.list_tasks(&query)?))
        })
    }

    pub fn get_task(&self, id: &str) -> ApiResponse {
        let Some(task_id) = payload::record_id(id) else {
            return ApiResponse::task_not_found();
        };
        respond("task_get", "Internal server error", || {
            Ok(ApiResponse::ok(self.tasks()?.get_task(task_id)?))
        })
    }

    /// Partially updates one task; `project` moves it to another project.
    pub fn update_task(&self, id: &str, body: &Value) -> ApiResponse {
        let Some(task_id) = payload::record_id(id) else {
            return ApiResponse::task_not_found();
        };
        respond("task_update", "Failed to update task", || {
            let patch = payload::task_patch(body)?;
            let task = self.tasks()?.update_task(task_id, &patch)?;
            Ok(ApiResponse::ok(task))
        })
    }

    pub fn delete_task(&self, id: &str) -> ApiResponse {
        let Some(task_id) = payload::record_id(id) else {
            return ApiResponse::task_not_found();
        };
        respond("task_delete", "Failed to delete task", || {
            let task = self.tasks()?.delete_task(task_id)?;
            Ok(ApiResponse::ok(json!({
                "message": TASK_DELETED_MESSAGE,
                "task": task,
            })))
        })
    }

    fn projects(&self) -> Result<ProjectService<SqliteStore<'_>>, ServiceError> {
        let store = SqliteStore::try_new(&self.conn)?;
        Ok(ProjectService::with_coordination(
            store,
            self.locks.clone(),
            self.options,
        ))
    }

    fn tasks(&self) -> Result<TaskService<SqliteStore<'_>>, ServiceError> {
        let store = SqliteStore::try_new(&self.conn)?;
        Ok(TaskService::with_coordination(
            store,
            self.locks.clone(),
            self.options,
        ))
    }
}

fn respond(
    endpoint: &'static str,
    failure: &'static str,
    f: impl FnOnce() -> Result<ApiResponse, ServiceError>,
) -> ApiResponse {
    match f() {
        Ok(response) => response,
        Err(err) => {
            if err.kind() == ErrorKind::Internal {
                error!(
                    "event=api_call module=api status=error endpoint={} error_code={} error={}",
                    endpoint,
                    err.code(),
                    err
                );
            } else {
                warn!(
                    "event=api_call module=api status=rejected endpoint={} error_code={}",
                    endpoint,
                    err.code()
                );
            }
            ApiResponse::from_service_error(&err, failure)
        }
    }
}
