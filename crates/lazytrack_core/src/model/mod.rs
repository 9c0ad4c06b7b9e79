//! Domain model for projects and their weighted tasks.
//!
//! # Responsibility
//! - Define canonical records shared by repositories, services and the API.
//! - Own field-level validation rules for writable data.
//!
//! # Invariants
//! - Every record is identified by a stable UUID assigned at construction.
//! - A project never embeds its task list; ownership is the task's
//!   `project_id` back-reference.
//! - Project `status` and `completion_progress` are derived data.

pub mod progress;
pub mod project;
pub mod status;
pub mod task;
pub mod validation;
