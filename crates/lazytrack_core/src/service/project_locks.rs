//! Per-project mutual exclusion with bounded waits.
//!
//! # Responsibility
//! - Serialize [task write, recompute, project write] per project id.
//! - Serialize cascading deletion against task mutations of the same project.
//!
//! # Invariants
//! - A multi-project acquire takes every id or none, so lock order never
//!   matters and A->B / B->A reassignments cannot deadlock.
//! - Locks are released on guard drop, including during unwinding.
//! - Not reentrant: a thread must not re-acquire an id it already holds.

use crate::model::project::ProjectId;
use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Lock wait exceeded its timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTimeout {
    pub project_ids: Vec<ProjectId>,
    pub waited: Duration,
}

#[derive(Debug, Default)]
struct LockTable {
    held: Mutex<HashSet<ProjectId>>,
    released: Condvar,
}

impl LockTable {
    fn held(&self) -> MutexGuard<'_, HashSet<ProjectId>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared lock table; clones refer to the same table.
#[derive(Debug, Clone, Default)]
pub struct ProjectLocks {
    table: Arc<LockTable>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires every id in `project_ids`, waiting at most `timeout`.
    pub fn acquire(
        &self,
        project_ids: &[ProjectId],
        timeout: Duration,
    ) -> Result<ProjectLockGuard, LockTimeout> {
        let mut wanted = project_ids.to_vec();
        wanted.sort_unstable();
        wanted.dedup();

        let started_at = Instant::now();
        let mut held = self.table.held();
        loop {
            if wanted.iter().all(|id| !held.contains(id)) {
                held.extend(wanted.iter().copied());
                return Ok(ProjectLockGuard {
                    table: Arc::clone(&self.table),
                    project_ids: wanted,
                });
            }

            let waited = started_at.elapsed();
            let remaining = match timeout.checked_sub(waited) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => {
                    return Err(LockTimeout {
                        project_ids: wanted,
                        waited,
                    })
                }
            };
            held = self
                .table
                .released
                .wait_timeout(held, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Returns whether `project_id` is currently held by any guard.
    pub fn is_locked(&self, project_id: ProjectId) -> bool {
        self.table.held().contains(&project_id)
    }
}

/// Releases its project ids on drop.
#[derive(Debug)]
pub struct ProjectLockGuard {
    table: Arc<LockTable>,
    project_ids: Vec<ProjectId>,
}

impl ProjectLockGuard {
    pub fn project_ids(&self) -> &[ProjectId] {
        &self.project_ids
    }
}

impl Drop for ProjectLockGuard {
    fn drop(&mut self) {
        let mut held = self.table.held();
        for id in &self.project_ids {
            held.remove(id);
        }
        drop(held);
        self.table.released.notify_all();
    }
}
