//! Project repository contract and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `Project::validate()` before SQL mutations.
//! - `save_project` refreshes `updated_at` and returns the persisted row.

use super::sqlite_store::{parse_status, parse_uuid, status_to_db, SqliteStore};
use super::store::{RepoError, RepoResult};
use crate::model::progress::CompletionProgress;
use crate::model::project::{Project, ProjectId};
use rusqlite::{params, Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    status,
    completion_progress_bp,
    created_at,
    updated_at
FROM projects";

/// Repository interface for project records.
pub trait ProjectRepository {
    /// Inserts a new project and returns the persisted record.
    fn create_project(&self, project: &Project) -> RepoResult<Project>;
    /// Loads one project by id.
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists projects in creation order.
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    /// Writes name, status and progress of an existing project.
    fn save_project(&self, project: &Project) -> RepoResult<Project>;
    /// Deletes one project row. Does not touch tasks.
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
}

impl<R: ProjectRepository + ?Sized> ProjectRepository for &R {
    fn create_project(&self, project: &Project) -> RepoResult<Project> {
        (**self).create_project(project)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        (**self).get_project(id)
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        (**self).list_projects()
    }

    fn save_project(&self, project: &Project) -> RepoResult<Project> {
        (**self).save_project(project)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        (**self).delete_project(id)
    }
}

impl ProjectRepository for SqliteStore<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<Project> {
        project.validate()?;

        self.conn().execute(
            "INSERT INTO projects (
                uuid,
                name,
                status,
                completion_progress_bp
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                project.id.to_string(),
                project.name.trim(),
                status_to_db(project.status),
                project.completion_progress.basis_points(),
            ],
        )?;

        load_required_project(self.conn(), project.id)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{PROJECT_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn save_project(&self, project: &Project) -> RepoResult<Project> {
        project.validate()?;

        let changed = self.conn().execute(
            "UPDATE projects
             SET
                name = ?1,
                status = ?2,
                completion_progress_bp = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                project.name.trim(),
                status_to_db(project.status),
                project.completion_progress.basis_points(),
                project.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::ProjectNotFound(project.id));
        }

        load_required_project(self.conn(), project.id)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM projects WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id));
        }
        Ok(())
    }
}

fn load_required_project(conn: &Connection, id: ProjectId) -> RepoResult<Project> {
    let mut stmt = conn.prepare(&format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_project_row(row);
    }
    Err(RepoError::ProjectNotFound(id))
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let uuid_text: String = row.get("uuid")?;
    let status_text: String = row.get("status")?;
    let progress_value: i64 = row.get("completion_progress_bp")?;
    let completion_progress = u16::try_from(progress_value)
        .ok()
        .and_then(|value| CompletionProgress::from_basis_points(value).ok())
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid progress `{progress_value}` in projects.completion_progress_bp"
            ))
        })?;

    Ok(Project {
        id: parse_uuid(&uuid_text, "projects.uuid")?,
        name: row.get("name")?,
        status: parse_status(&status_text, "projects.status")?,
        completion_progress,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
