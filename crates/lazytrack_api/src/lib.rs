//! JSON endpoint surface for LazyTrack.
//!
//! # Responsibility
//! - Map project/task use cases onto JSON-in / JSON-out endpoint calls.
//! - Translate service errors into stable status codes and error bodies.
//!
//! # Invariants
//! - Endpoints never panic; every failure becomes an `ApiResponse`.
//! - Bodies never carry partially applied state: a failed mutation either
//!   changed nothing or reports exactly what was committed.

mod api;
mod payload;
mod response;

pub use api::TrackerApi;
pub use response::ApiResponse;
