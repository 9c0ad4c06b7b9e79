//! In-memory project/task store.
//!
//! # Responsibility
//! - Implement the store contracts without SQLite for tests and embedding.
//! - Offer one-shot fault injection per store operation.
//!
//! # Invariants
//! - Enforces the same referential rules as the SQLite schema: tasks must
//!   reference an existing project, and a project with tasks cannot be
//!   deleted directly.
//! - A failed transactional scope restores the pre-scope snapshot.
//! - Single-threaded: share across threads by opening separate stores.

use super::project_repo::ProjectRepository;
use super::store::{RepoError, RepoResult, TrackerStore};
use super::task_repo::{TaskListQuery, TaskRepository};
use crate::model::project::{Project, ProjectId};
use crate::model::task::{Task, TaskId};
use std::cell::{Cell, RefCell};
use std::time::{SystemTime, UNIX_EPOCH};

/// Store operation that can be armed to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    CreateProject,
    GetProject,
    ListProjects,
    SaveProject,
    DeleteProject,
    CreateTask,
    GetTask,
    ListTasks,
    UpdateTask,
    DeleteTask,
    DeleteTasksByProject,
    /// Final commit of an outermost transactional scope.
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

/// Project/task store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<MemoryState>,
    faults: RefCell<Vec<StoreOp>>,
    tx_depth: Cell<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot failure for the next call of `op`.
    pub fn fail_on(&self, op: StoreOp) {
        self.faults.borrow_mut().push(op);
    }

    /// Number of stored projects.
    pub fn project_count(&self) -> usize {
        self.state.borrow().projects.len()
    }

    /// Number of stored tasks.
    pub fn task_count(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    fn check(&self, op: StoreOp) -> RepoResult<()> {
        let mut faults = self.faults.borrow_mut();
        if let Some(index) = faults.iter().position(|armed| *armed == op) {
            faults.remove(index);
            return Err(RepoError::Backend(format!("injected fault at {op:?}")));
        }
        Ok(())
    }

    fn project_exists(&self, id: ProjectId) -> bool {
        self.state
            .borrow()
            .projects
            .iter()
            .any(|project| project.id == id)
    }
}

impl ProjectRepository for MemoryStore {
    fn create_project(&self, project: &Project) -> RepoResult<Project> {
        self.check(StoreOp::CreateProject)?;
        project.validate()?;

        let mut state = self.state.borrow_mut();
        if state.projects.iter().any(|existing| existing.id == project.id) {
            return Err(RepoError::Backend(format!(
                "duplicate project id {}",
                project.id
            )));
        }
        let now = now_epoch_ms();
        let mut stored = project.clone();
        stored.name = stored.name.trim().to_string();
        stored.created_at = now;
        stored.updated_at = now;
        state.projects.push(stored.clone());
        Ok(stored)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.check(StoreOp::GetProject)?;
        Ok(self
            .state
            .borrow()
            .projects
            .iter()
            .find(|project| project.id == id)
            .cloned())
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        self.check(StoreOp::ListProjects)?;
        Ok(self.state.borrow().projects.clone())
    }

    fn save_project(&self, project: &Project) -> RepoResult<Project> {
        self.check(StoreOp::SaveProject)?;
        project.validate()?;

        let mut state = self.state.borrow_mut();
        let stored = state
            .projects
            .iter_mut()
            .find(|existing| existing.id == project.id)
            .ok_or(RepoError::ProjectNotFound(project.id))?;
        stored.name = project.name.trim().to_string();
        stored.status = project.status;
        stored.completion_progress = project.completion_progress;
        stored.updated_at = now_epoch_ms();
        Ok(stored.clone())
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        self.check(StoreOp::DeleteProject)?;

        let mut state = self.state.borrow_mut();
        if state.tasks.iter().any(|task| task.project_id == id) {
            return Err(RepoError::Backend(format!(
                "project {id} is still referenced by tasks"
            )));
        }
        let before = state.projects.len();
        state.projects.retain(|project| project.id != id);
        if state.projects.len() == before {
            return Err(RepoError::ProjectNotFound(id));
        }
        Ok(())
    }
}

impl TaskRepository for MemoryStore {
    fn create_task(&self, task: &Task) -> RepoResult<Task> {
        self.check(StoreOp::CreateTask)?;
        task.validate()?;
        if !self.project_exists(task.project_id) {
            return Err(RepoError::ProjectNotFound(task.project_id));
        }

        let mut state = self.state.borrow_mut();
        if state.tasks.iter().any(|existing| existing.id == task.id) {
            return Err(RepoError::Backend(format!("duplicate task id {}", task.id)));
        }
        let now = now_epoch_ms();
        let mut stored = task.clone();
        stored.name = stored.name.trim().to_string();
        stored.created_at = now;
        stored.updated_at = now;
        state.tasks.push(stored.clone());
        Ok(stored)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.check(StoreOp::GetTask)?;
        Ok(self
            .state
            .borrow()
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned())
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        self.check(StoreOp::ListTasks)?;
        let state = self.state.borrow();
        let matching = state
            .tasks
            .iter()
            .filter(|task| query.project_id.map_or(true, |id| task.project_id == id))
            .skip(query.offset as usize);
        let tasks = match query.limit {
            Some(limit) => matching.take(limit as usize).cloned().collect(),
            None => matching.cloned().collect(),
        };
        Ok(tasks)
    }

    fn update_task(&self, task: &Task) -> RepoResult<Task> {
        self.check(StoreOp::UpdateTask)?;
        task.validate()?;
        if !self.project_exists(task.project_id) {
            return Err(RepoError::ProjectNotFound(task.project_id));
        }

        let mut state = self.state.borrow_mut();
        let stored = state
            .tasks
            .iter_mut()
            .find(|existing| existing.id == task.id)
            .ok_or(RepoError::TaskNotFound(task.id))?;
        stored.name = task.name.trim().to_string();
        stored.status = task.status;
        stored.weight = task.weight;
        stored.project_id = task.project_id;
        stored.updated_at = now_epoch_ms();
        Ok(stored.clone())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        self.check(StoreOp::DeleteTask)?;
        let mut state = self.state.borrow_mut();
        let before = state.tasks.len();
        state.tasks.retain(|task| task.id != id);
        if state.tasks.len() == before {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn delete_tasks_by_project(&self, project_id: ProjectId) -> RepoResult<usize> {
        self.check(StoreOp::DeleteTasksByProject)?;
        let mut state = self.state.borrow_mut();
        let before = state.tasks.len();
        state.tasks.retain(|task| task.project_id != project_id);
        Ok(before - state.tasks.len())
    }
}

impl TrackerStore for MemoryStore {
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        if self.tx_depth.get() > 0 {
            return f(self);
        }

        let snapshot = self.state.borrow().clone();
        self.tx_depth.set(1);
        let result = f(self).and_then(|value| {
            self.check(StoreOp::Commit).map_err(E::from)?;
            Ok(value)
        });
        self.tx_depth.set(0);

        if result.is_err() {
            *self.state.borrow_mut() = snapshot;
        }
        result
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{MemoryStore, StoreOp};
    use crate::model::project::Project;
    use crate::model::task::Task;
    use crate::repo::project_repo::ProjectRepository;
    use crate::repo::store::{RepoError, TrackerStore};
    use crate::repo::task_repo::TaskRepository;
    use uuid::Uuid;

    #[test]
    fn failed_scope_restores_snapshot() {
        let store = MemoryStore::new();
        let project = store.create_project(&Project::new("Apollo")).unwrap();
        store
            .create_task(&Task::new(project.id, "Design", 1.0))
            .unwrap();

        let result: Result<(), RepoError> = store.with_transaction(|store| {
            store.delete_tasks_by_project(project.id)?;
            Err(RepoError::Backend("boom".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.task_count(), 1);
    }

    #[test]
    fn commit_fault_rolls_back_scope() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::Commit);

        let result: Result<Project, RepoError> =
            store.with_transaction(|store| store.create_project(&Project::new("Apollo")));

        assert!(matches!(result, Err(RepoError::Backend(_))));
        assert_eq!(store.project_count(), 0);
    }

    #[test]
    fn fault_fires_once() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::ListProjects);
        assert!(store.list_projects().is_err());
        assert!(store.list_projects().is_ok());
    }

    #[test]
    fn task_requires_existing_project() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();
        let err = store
            .create_task(&Task::new(missing, "Orphan", 1.0))
            .unwrap_err();
        assert!(matches!(err, RepoError::ProjectNotFound(id) if id == missing));
    }

    #[test]
    fn project_with_tasks_cannot_be_deleted_directly() {
        let store = MemoryStore::new();
        let project = store.create_project(&Project::new("Apollo")).unwrap();
        store
            .create_task(&Task::new(project.id, "Design", 1.0))
            .unwrap();
        assert!(store.delete_project(project.id).is_err());
        assert_eq!(store.project_count(), 1);
    }
}
