//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into project/task use cases.
//! - Run the aggregation engine after every task mutation.
//! - Own the cascading deletion transaction.
//!
//! # Invariants
//! - Every task mutation and project deletion runs under the affected
//!   projects' locks from one shared `ProjectLocks` table.
//! - Service layer remains storage-agnostic (`TrackerStore`).

pub mod aggregation;
pub mod error;
pub mod project_locks;
pub mod project_service;
pub mod task_service;

use aggregation::MixedStatusPolicy;
use std::time::Duration;

/// Default upper bound for waiting on a project lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Coordination knobs shared by project and task services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    pub lock_timeout: Duration,
    pub mixed_status: MixedStatusPolicy,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            mixed_status: MixedStatusPolicy::default(),
        }
    }
}
