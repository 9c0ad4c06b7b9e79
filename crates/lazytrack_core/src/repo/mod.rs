//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the project/task store contracts consumed by services.
//! - Isolate SQLite query details from aggregation and cascade logic.
//! - Provide an in-memory store for tests and embedding.
//!
//! # Invariants
//! - Repository writes must validate records before persistence.
//! - Repository APIs return semantic errors (`ProjectNotFound`,
//!   `TaskNotFound`) in addition to DB transport errors.
//! - A project's tasks are always looked up by `project_id`; no task list is
//!   stored on the project.

pub mod memory_store;
pub mod project_repo;
pub mod sqlite_store;
pub mod store;
pub mod task_repo;
