use lazytrack_core::db::open_db_in_memory;
use lazytrack_core::{
    CompletionProgress, MemoryStore, MixedStatusPolicy, Project, ProjectLocks, ProjectPatch,
    ProjectService, ServiceError, ServiceOptions, SqliteStore, StoreOp, Task, TaskPatch,
    TaskService, TrackerStore, WorkStatus,
};
use uuid::Uuid;

fn services<S: TrackerStore + Copy>(
    store: S,
    mixed_status: MixedStatusPolicy,
) -> (ProjectService<S>, TaskService<S>) {
    let locks = ProjectLocks::new();
    let options = ServiceOptions {
        mixed_status,
        ..ServiceOptions::default()
    };
    (
        ProjectService::with_coordination(store, locks.clone(), options),
        TaskService::with_coordination(store, locks, options),
    )
}

fn bp(project: &Project) -> u16 {
    project.completion_progress.basis_points()
}

#[test]
fn weighted_progress_tracks_task_status_changes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());

    let project = projects.create_project(&Project::new("Apollo")).unwrap();
    let heavy = tasks
        .create_task(&Task::new(project.id, "Design", 2.0).with_status(WorkStatus::Done))
        .unwrap();
    let light = tasks
        .create_task(&Task::new(project.id, "Build", 1.0).with_status(WorkStatus::InProgress))
        .unwrap();

    let current = projects.get_project(project.id).unwrap();
    assert_eq!(current.status, WorkStatus::InProgress);
    assert_eq!(bp(&current), 6_667);

    tasks
        .update_task(
            light.id,
            &TaskPatch {
                status: Some(WorkStatus::Done),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    let current = projects.get_project(project.id).unwrap();
    assert_eq!(current.status, WorkStatus::Done);
    assert_eq!(current.completion_progress, CompletionProgress::COMPLETE);

    tasks.delete_task(heavy.id).unwrap();
    let current = projects.get_project(project.id).unwrap();
    assert_eq!(current.status, WorkStatus::Done);
    assert_eq!(bp(&current), 10_000);
}

#[test]
fn all_draft_tasks_keep_project_draft() {
    let store = MemoryStore::new();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());

    let project = projects.create_project(&Project::new("Apollo")).unwrap();
    for weight in [1.0, 1.0, 1.0] {
        tasks
            .create_task(&Task::new(project.id, "Step", weight))
            .unwrap();
    }

    let current = projects.get_project(project.id).unwrap();
    assert_eq!(current.status, WorkStatus::Draft);
    assert_eq!(bp(&current), 0);
}

#[test]
fn mixed_draft_and_done_retains_previous_status() {
    let store = MemoryStore::new();
    let (projects, tasks) = services(&store, MixedStatusPolicy::RetainPrevious);

    let project = projects.create_project(&Project::new("Apollo")).unwrap();
    tasks
        .create_task(&Task::new(project.id, "Plan", 1.0).with_status(WorkStatus::Done))
        .unwrap();
    assert_eq!(
        projects.get_project(project.id).unwrap().status,
        WorkStatus::Done
    );

    tasks
        .create_task(&Task::new(project.id, "Build", 1.0))
        .unwrap();
    let current = projects.get_project(project.id).unwrap();
    assert_eq!(current.status, WorkStatus::Done);
    assert_eq!(bp(&current), 5_000);
}

#[test]
fn mixed_draft_and_done_can_report_in_progress() {
    let store = MemoryStore::new();
    let (projects, tasks) = services(&store, MixedStatusPolicy::InProgress);

    let project = projects.create_project(&Project::new("Apollo")).unwrap();
    tasks
        .create_task(&Task::new(project.id, "Plan", 1.0).with_status(WorkStatus::Done))
        .unwrap();
    tasks
        .create_task(&Task::new(project.id, "Build", 1.0))
        .unwrap();

    assert_eq!(
        projects.get_project(project.id).unwrap().status,
        WorkStatus::InProgress
    );
}

#[test]
fn zero_total_weight_reports_zero_progress() {
    let store = MemoryStore::new();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());

    let project = projects.create_project(&Project::new("Apollo")).unwrap();
    tasks
        .create_task(&Task::new(project.id, "Free", 0.0).with_status(WorkStatus::Done))
        .unwrap();

    let current = projects.get_project(project.id).unwrap();
    assert_eq!(current.status, WorkStatus::Done);
    assert_eq!(bp(&current), 0);
}

#[test]
fn deleting_last_task_resets_project_to_draft() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());

    let project = projects.create_project(&Project::new("Apollo")).unwrap();
    let task = tasks
        .create_task(&Task::new(project.id, "Only", 4.0).with_status(WorkStatus::Done))
        .unwrap();
    assert_eq!(
        projects.get_project(project.id).unwrap().status,
        WorkStatus::Done
    );

    let deleted = tasks.delete_task(task.id).unwrap();
    assert_eq!(deleted.id, task.id);

    let current = projects.get_project(project.id).unwrap();
    assert_eq!(current.status, WorkStatus::Draft);
    assert_eq!(bp(&current), 0);
}

#[test]
fn moving_task_recomputes_both_projects() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());

    let source = projects.create_project(&Project::new("Source")).unwrap();
    let target = projects.create_project(&Project::new("Target")).unwrap();
    tasks
        .create_task(&Task::new(source.id, "Stay", 1.0))
        .unwrap();
    let mover = tasks
        .create_task(&Task::new(source.id, "Move", 3.0).with_status(WorkStatus::Done))
        .unwrap();
    assert_eq!(bp(&projects.get_project(source.id).unwrap()), 7_500);

    let moved = tasks
        .update_task(
            mover.id,
            &TaskPatch {
                project_id: Some(target.id),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(moved.project_id, target.id);

    let source_now = projects.get_project(source.id).unwrap();
    assert_eq!(source_now.status, WorkStatus::Draft);
    assert_eq!(bp(&source_now), 0);

    let target_now = projects.get_project(target.id).unwrap();
    assert_eq!(target_now.status, WorkStatus::Done);
    assert_eq!(bp(&target_now), 10_000);
}

#[test]
fn task_for_missing_project_is_rejected_without_write() {
    let store = MemoryStore::new();
    let (_, tasks) = services(&store, MixedStatusPolicy::default());

    let missing = Uuid::new_v4();
    let err = tasks
        .create_task(&Task::new(missing, "Orphan", 1.0))
        .unwrap_err();
    assert!(matches!(err, ServiceError::ProjectNotFound(id) if id == missing));
    assert_eq!(store.task_count(), 0);
}

#[test]
fn moving_task_to_missing_project_keeps_it_in_place() {
    let store = MemoryStore::new();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());
    let project = projects.create_project(&Project::new("Apollo")).unwrap();
    let task = tasks
        .create_task(&Task::new(project.id, "Design", 1.0))
        .unwrap();

    let err = tasks
        .update_task(
            task.id,
            &TaskPatch {
                project_id: Some(Uuid::new_v4()),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();

    assert!(matches!(err, ServiceError::ProjectNotFound(_)));
    assert_eq!(tasks.get_task(task.id).unwrap().project_id, project.id);
}

#[test]
fn failed_recompute_keeps_committed_task() {
    let store = MemoryStore::new();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());
    let project = projects.create_project(&Project::new("Apollo")).unwrap();

    store.fail_on(StoreOp::SaveProject);
    let err = tasks
        .create_task(&Task::new(project.id, "Design", 1.0).with_status(WorkStatus::Done))
        .unwrap_err();

    let (task, project_id) = match err {
        ServiceError::AggregationFailed {
            task, project_id, ..
        } => (task, project_id),
        other => panic!("expected aggregation failure, got {other}"),
    };
    assert_eq!(project_id, project.id);
    assert_eq!(store.task_count(), 1);
    assert_eq!(tasks.get_task(task.id).unwrap().status, WorkStatus::Done);

    let stale = projects.get_project(project.id).unwrap();
    assert_eq!(stale.status, WorkStatus::Draft);

    let repaired = projects.recompute(project.id).unwrap();
    assert_eq!(repaired.status, WorkStatus::Done);
    assert_eq!(bp(&repaired), 10_000);
}

#[test]
fn recompute_without_changes_leaves_project_untouched() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());

    let project = projects.create_project(&Project::new("Apollo")).unwrap();
    tasks
        .create_task(&Task::new(project.id, "Design", 1.0).with_status(WorkStatus::InProgress))
        .unwrap();

    let first = projects.recompute(project.id).unwrap();
    let second = projects.recompute(project.id).unwrap();
    assert_eq!(first, second);
}

#[test]
fn manual_project_status_is_overwritten_by_next_task_mutation() {
    let store = MemoryStore::new();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());

    let project = projects.create_project(&Project::new("Apollo")).unwrap();
    let task = tasks
        .create_task(&Task::new(project.id, "Design", 1.0))
        .unwrap();

    let manual = projects
        .update_project(
            project.id,
            &ProjectPatch {
                status: Some(WorkStatus::Done),
                ..ProjectPatch::default()
            },
        )
        .unwrap();
    assert_eq!(manual.status, WorkStatus::Done);

    tasks
        .update_task(
            task.id,
            &TaskPatch {
                weight: Some(2.0),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(
        projects.get_project(project.id).unwrap().status,
        WorkStatus::Draft
    );
}

#[test]
fn empty_project_patch_is_rejected() {
    let store = MemoryStore::new();
    let (projects, _) = services(&store, MixedStatusPolicy::default());
    let project = projects.create_project(&Project::new("Apollo")).unwrap();

    let err = projects
        .update_project(project.id, &ProjectPatch::default())
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(projects.get_project(project.id).unwrap(), project);
}

#[test]
fn project_with_tasks_lists_current_members() {
    let store = MemoryStore::new();
    let (projects, tasks) = services(&store, MixedStatusPolicy::default());

    let alpha = projects.create_project(&Project::new("Alpha")).unwrap();
    let beta = projects.create_project(&Project::new("Beta")).unwrap();
    let task = tasks.create_task(&Task::new(alpha.id, "One", 1.0)).unwrap();

    let listed = projects.list_projects_with_tasks().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].project.id, alpha.id);
    assert_eq!(listed[0].tasks, vec![task.clone()]);
    assert_eq!(listed[1].project.id, beta.id);
    assert!(listed[1].tasks.is_empty());

    let single = projects.get_project_with_tasks(alpha.id).unwrap();
    assert_eq!(single.tasks.len(), 1);
}
