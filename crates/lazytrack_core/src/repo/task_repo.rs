//! Task repository contract and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Task lists are ordered by `created_at ASC`, then insertion order.
//! - Lookup by project uses the `tasks(project_uuid)` index; the project row
//!   itself never lists its tasks.

use super::sqlite_store::{parse_status, parse_uuid, status_to_db, SqliteStore};
use super::store::{RepoError, RepoResult};
use crate::model::project::ProjectId;
use crate::model::task::{Task, TaskId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    status,
    weight,
    project_uuid,
    created_at,
    updated_at
FROM tasks";

/// Query options for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    /// Restricts results to one project.
    pub project_id: Option<ProjectId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl TaskListQuery {
    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }
}

/// Repository interface for task records.
pub trait TaskRepository {
    /// Inserts a new task and returns the persisted record.
    fn create_task(&self, task: &Task) -> RepoResult<Task>;
    /// Loads one task by id.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists tasks using filter and pagination options.
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Writes all mutable fields of an existing task.
    fn update_task(&self, task: &Task) -> RepoResult<Task>;
    /// Deletes one task.
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Deletes every task referencing `project_id`, returning the count.
    fn delete_tasks_by_project(&self, project_id: ProjectId) -> RepoResult<usize>;

    /// Returns every task currently referencing `project_id`.
    fn tasks_by_project(&self, project_id: ProjectId) -> RepoResult<Vec<Task>> {
        self.list_tasks(&TaskListQuery::for_project(project_id))
    }
}

impl<R: TaskRepository + ?Sized> TaskRepository for &R {
    fn create_task(&self, task: &Task) -> RepoResult<Task> {
        (**self).create_task(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        (**self).get_task(id)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        (**self).list_tasks(query)
    }

    fn update_task(&self, task: &Task) -> RepoResult<Task> {
        (**self).update_task(task)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        (**self).delete_task(id)
    }

    fn delete_tasks_by_project(&self, project_id: ProjectId) -> RepoResult<usize> {
        (**self).delete_tasks_by_project(project_id)
    }

    fn tasks_by_project(&self, project_id: ProjectId) -> RepoResult<Vec<Task>> {
        (**self).tasks_by_project(project_id)
    }
}

impl TaskRepository for SqliteStore<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<Task> {
        task.validate()?;

        self.conn().execute(
            "INSERT INTO tasks (
                uuid,
                name,
                status,
                weight,
                project_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                task.id.to_string(),
                task.name.trim(),
                status_to_db(task.status),
                task.weight,
                task.project_id.to_string(),
            ],
        )?;

        load_required_task(self.conn(), task.id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(project_id) = query.project_id {
            sql.push_str(" AND project_uuid = ?");
            bind_values.push(Value::Text(project_id.to_string()));
        }

        sql.push_str(" ORDER BY created_at ASC, rowid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn update_task(&self, task: &Task) -> RepoResult<Task> {
        task.validate()?;

        let changed = self.conn().execute(
            "UPDATE tasks
             SET
                name = ?1,
                status = ?2,
                weight = ?3,
                project_uuid = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?5;",
            params![
                task.name.trim(),
                status_to_db(task.status),
                task.weight,
                task.project_id.to_string(),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(task.id));
        }

        load_required_task(self.conn(), task.id)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn delete_tasks_by_project(&self, project_id: ProjectId) -> RepoResult<usize> {
        let deleted = self.conn().execute(
            "DELETE FROM tasks WHERE project_uuid = ?1;",
            [project_id.to_string()],
        )?;
        Ok(deleted)
    }
}

fn load_required_task(conn: &Connection, id: TaskId) -> RepoResult<Task> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_task_row(row);
    }
    Err(RepoError::TaskNotFound(id))
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let status_text: String = row.get("status")?;
    let project_text: String = row.get("project_uuid")?;

    let task = Task {
        id: parse_uuid(&uuid_text, "tasks.uuid")?,
        name: row.get("name")?,
        status: parse_status(&status_text, "tasks.status")?,
        weight: row.get("weight")?,
        project_id: parse_uuid(&project_text, "tasks.project_uuid")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    task.validate().map_err(|err| {
        RepoError::InvalidData(format!("task {} failed validation: {err}", task.id))
    })?;
    Ok(task)
}
