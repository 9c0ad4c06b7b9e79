//! Aggregation engine: derives project status and weighted completion.
//!
//! # Responsibility
//! - Tally a project's task set into weights and status flags.
//! - Derive the project's status/progress and persist it.
//!
//! # Invariants
//! - Output depends only on the current task set and, for mixed
//!   Draft/Done sets, the project's previous status.
//! - Empty task set => `Draft` at `0` progress.
//! - Status priority: all Done => Done; any In Progress => In Progress;
//!   all Draft => Draft; otherwise `MixedStatusPolicy`.
//! - Recompute is idempotent; no-op writes are skipped.

use super::error::ServiceError;
use crate::model::progress::CompletionProgress;
use crate::model::project::{Project, ProjectId};
use crate::model::status::WorkStatus;
use crate::model::task::Task;
use crate::repo::store::TrackerStore;
use log::{debug, info};
use std::str::FromStr;
use std::time::Instant;

/// Status rule for task sets containing only Draft and Done tasks (at least
/// one of each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixedStatusPolicy {
    /// Keep whatever status the project had before the recompute.
    #[default]
    RetainPrevious,
    /// Treat partially finished work as in progress.
    InProgress,
}

impl FromStr for MixedStatusPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "retain" | "retain_previous" => Ok(Self::RetainPrevious),
            "in_progress" => Ok(Self::InProgress),
            other => Err(format!(
                "unsupported mixed status policy `{other}`; expected retain|in_progress"
            )),
        }
    }
}

/// Weight sums and status flags over one task set.
///
/// Weights are summed relative to the largest weight in the set, so the
/// sums stay finite for any set of finite weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskTally {
    pub task_count: usize,
    pub total_weight: f64,
    pub completed_weight: f64,
    pub all_draft: bool,
    pub any_in_progress: bool,
    pub all_done: bool,
}

impl TaskTally {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut tally = Self {
            task_count: tasks.len(),
            total_weight: 0.0,
            completed_weight: 0.0,
            all_draft: true,
            any_in_progress: false,
            all_done: true,
        };

        let max_weight = tasks.iter().map(|task| task.weight).fold(0.0, f64::max);
        let scale = if max_weight > 0.0 { max_weight } else { 1.0 };

        for task in tasks {
            let weight = task.weight / scale;
            tally.total_weight += weight;
            match task.status {
                WorkStatus::Draft => tally.all_done = false,
                WorkStatus::InProgress => {
                    tally.any_in_progress = true;
                    tally.all_draft = false;
                    tally.all_done = false;
                }
                WorkStatus::Done => {
                    tally.completed_weight += weight;
                    tally.all_draft = false;
                }
            }
        }

        tally
    }

    pub fn progress(&self) -> CompletionProgress {
        CompletionProgress::from_weights(self.completed_weight, self.total_weight)
    }
}

/// Derived project fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedState {
    pub status: WorkStatus,
    pub completion_progress: CompletionProgress,
}

/// Derives project status and progress from its task set.
pub fn derive_project_state(
    previous: WorkStatus,
    tasks: &[Task],
    policy: MixedStatusPolicy,
) -> DerivedState {
    if tasks.is_empty() {
        return DerivedState {
            status: WorkStatus::Draft,
            completion_progress: CompletionProgress::ZERO,
        };
    }

    let tally = TaskTally::from_tasks(tasks);
    let status = if tally.all_done {
        WorkStatus::Done
    } else if tally.any_in_progress {
        WorkStatus::InProgress
    } else if tally.all_draft {
        WorkStatus::Draft
    } else {
        match policy {
            MixedStatusPolicy::RetainPrevious => previous,
            MixedStatusPolicy::InProgress => WorkStatus::InProgress,
        }
    };

    DerivedState {
        status,
        completion_progress: tally.progress(),
    }
}

/// Re-derives and persists status/progress for `project_id`.
///
/// Runs as one transactional scope: task read, derivation and project write
/// see one consistent snapshot. Callers serialize per project through
/// `ProjectLocks`.
///
/// # Errors
/// - `ProjectNotFound` when the project does not exist.
/// - `Repo` on store failure; the project is left unchanged.
pub fn recompute_project<S: TrackerStore>(
    store: &S,
    project_id: ProjectId,
    policy: MixedStatusPolicy,
) -> Result<Project, ServiceError> {
    let started_at = Instant::now();
    store.with_transaction(|store| -> Result<Project, ServiceError> {
        let project = store
            .get_project(project_id)?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;
        let tasks = store.tasks_by_project(project_id)?;
        let derived = derive_project_state(project.status, &tasks, policy);

        if project.status == derived.status
            && project.completion_progress == derived.completion_progress
        {
            debug!(
                "event=project_recompute module=aggregation status=unchanged project_id={} task_count={} duration_ms={}",
                project_id,
                tasks.len(),
                started_at.elapsed().as_millis()
            );
            return Ok(project);
        }

        let mut updated = project;
        updated.status = derived.status;
        updated.completion_progress = derived.completion_progress;
        let saved = store.save_project(&updated)?;
        info!(
            "event=project_recompute module=aggregation status=ok project_id={} task_count={} project_status={} progress={} duration_ms={}",
            project_id,
            tasks.len(),
            saved.status,
            saved.completion_progress,
            started_at.elapsed().as_millis()
        );
        Ok(saved)
    })
}
