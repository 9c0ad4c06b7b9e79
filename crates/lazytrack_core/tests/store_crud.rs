use lazytrack_core::db::open_db_in_memory;
use lazytrack_core::{
    CompletionProgress, MemoryStore, Project, ProjectRepository, RepoError, SqliteStore, Task,
    TaskListQuery, TaskRepository, TrackerStore, ValidationError, WorkStatus,
};
use uuid::Uuid;

fn exercise_project_crud<S: TrackerStore>(store: &S) {
    let created = store.create_project(&Project::new("  Apollo ")).unwrap();
    assert_eq!(created.name, "Apollo");
    assert_eq!(created.status, WorkStatus::Draft);
    assert!(created.created_at > 0);

    let mut changed = created.clone();
    changed.status = WorkStatus::Done;
    changed.completion_progress = CompletionProgress::from_percent(55.5).unwrap();
    let saved = store.save_project(&changed).unwrap();
    assert_eq!(saved.status, WorkStatus::Done);
    assert_eq!(saved.completion_progress.basis_points(), 5_550);

    let loaded = store.get_project(created.id).unwrap().unwrap();
    assert_eq!(loaded, saved);

    store.delete_project(created.id).unwrap();
    assert!(store.get_project(created.id).unwrap().is_none());
    let err = store.delete_project(created.id).unwrap_err();
    assert!(matches!(err, RepoError::ProjectNotFound(id) if id == created.id));
}

fn exercise_task_crud<S: TrackerStore>(store: &S) {
    let alpha = store.create_project(&Project::new("Alpha")).unwrap();
    let beta = store.create_project(&Project::new("Beta")).unwrap();

    let first = store
        .create_task(&Task::new(alpha.id, "Design", 2.0))
        .unwrap();
    let second = store
        .create_task(&Task::new(alpha.id, "Build", 3.0).with_status(WorkStatus::Done))
        .unwrap();
    let other = store.create_task(&Task::new(beta.id, "Ship", 1.0)).unwrap();

    let alpha_tasks = store.tasks_by_project(alpha.id).unwrap();
    let ids: Vec<Uuid> = alpha_tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let all = store.list_tasks(&TaskListQuery::default()).unwrap();
    assert_eq!(all.len(), 3);
    let paged = store
        .list_tasks(&TaskListQuery {
            project_id: None,
            limit: Some(1),
            offset: 1,
        })
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].id, second.id);

    let mut moved = other.clone();
    moved.project_id = alpha.id;
    moved.weight = 5.0;
    let moved = store.update_task(&moved).unwrap();
    assert_eq!(moved.project_id, alpha.id);
    assert_eq!(store.tasks_by_project(beta.id).unwrap().len(), 0);

    store.delete_task(first.id).unwrap();
    assert!(store.get_task(first.id).unwrap().is_none());
    assert!(matches!(
        store.delete_task(first.id).unwrap_err(),
        RepoError::TaskNotFound(_)
    ));

    assert_eq!(store.delete_tasks_by_project(alpha.id).unwrap(), 2);
    assert_eq!(store.delete_tasks_by_project(alpha.id).unwrap(), 0);
}

#[test]
fn sqlite_project_crud() {
    let conn = open_db_in_memory().unwrap();
    exercise_project_crud(&SqliteStore::try_new(&conn).unwrap());
}

#[test]
fn memory_project_crud() {
    exercise_project_crud(&MemoryStore::new());
}

#[test]
fn sqlite_task_crud() {
    let conn = open_db_in_memory().unwrap();
    exercise_task_crud(&SqliteStore::try_new(&conn).unwrap());
}

#[test]
fn memory_task_crud() {
    exercise_task_crud(&MemoryStore::new());
}

#[test]
fn writes_validate_before_persisting() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let err = store.create_project(&Project::new("  ")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::EmptyName)));

    let project = store.create_project(&Project::new("Apollo")).unwrap();
    let err = store
        .create_task(&Task::new(project.id, "Design", -1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidWeight(_))
    ));
    assert!(store.tasks_by_project(project.id).unwrap().is_empty());
}

#[test]
fn sqlite_rejects_task_for_missing_project() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let err = store
        .create_task(&Task::new(Uuid::new_v4(), "Orphan", 1.0))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn sqlite_rejects_plain_delete_of_project_with_tasks() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let project = store.create_project(&Project::new("Apollo")).unwrap();
    store
        .create_task(&Task::new(project.id, "Design", 1.0))
        .unwrap();

    assert!(store.delete_project(project.id).is_err());
    assert!(store.get_project(project.id).unwrap().is_some());
}

#[test]
fn sqlite_transaction_rolls_back_on_error() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let project = store.create_project(&Project::new("Apollo")).unwrap();
    store
        .create_task(&Task::new(project.id, "Design", 1.0))
        .unwrap();

    let result: Result<(), RepoError> = store.with_transaction(|store| {
        store.delete_tasks_by_project(project.id)?;
        assert!(store.in_transaction());
        Err(RepoError::Backend("abort".to_string()))
    });

    assert!(result.is_err());
    assert!(!store.in_transaction());
    assert_eq!(store.tasks_by_project(project.id).unwrap().len(), 1);
}

#[test]
fn sqlite_nested_transaction_joins_outer_scope() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let result: Result<(), RepoError> = store.with_transaction(|store| {
        store.with_transaction(|store| store.create_project(&Project::new("Inner")))?;
        Err(RepoError::Backend("abort outer".to_string()))
    });

    assert!(result.is_err());
    assert!(store.list_projects().unwrap().is_empty());
}
