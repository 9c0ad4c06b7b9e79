//! Core domain logic for LazyTrack.
//! This crate is the single source of truth for project/task invariants:
//! derived project status and progress, and cascading project deletion.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, TrackerConfig};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::progress::CompletionProgress;
pub use model::project::{Project, ProjectId, ProjectPatch, ProjectWithTasks};
pub use model::status::WorkStatus;
pub use model::task::{Task, TaskId, TaskPatch};
pub use model::validation::ValidationError;
pub use repo::memory_store::{MemoryStore, StoreOp};
pub use repo::sqlite_store::SqliteStore;
pub use repo::store::{
    ProjectRepository, RepoError, RepoResult, TaskListQuery, TaskRepository, TrackerStore,
};
pub use service::aggregation::{derive_project_state, DerivedState, MixedStatusPolicy, TaskTally};
pub use service::error::{ErrorKind, ServiceError};
pub use service::project_locks::{LockTimeout, ProjectLockGuard, ProjectLocks};
pub use service::project_service::{CascadeDeletion, ProjectService};
pub use service::task_service::TaskService;
pub use service::ServiceOptions;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
