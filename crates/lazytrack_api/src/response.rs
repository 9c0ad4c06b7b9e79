//! Response envelope and error-to-status mapping.

use lazytrack_core::{ErrorKind, ServiceError};
use serde::Serialize;
use serde_json::{json, Value};

/// Status code plus JSON body, ready to be written by any transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: impl Serialize) -> Self {
        Self::with_status(200, body)
    }

    pub fn created(body: impl Serialize) -> Self {
        Self::with_status(201, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn with_status(status: u16, body: impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status, body },
            Err(err) => Self {
                status: 500,
                body: json!({
                    "error": "Failed to encode response",
                    "details": err.to_string(),
                }),
            },
        }
    }

    /// Maps a service error onto a client-visible response.
    ///
    /// `failure` is the summary used for internal errors, e.g.
    /// `"Failed to delete project"`.
    pub(crate) fn from_service_error(err: &ServiceError, failure: &str) -> Self {
        match err.kind() {
            ErrorKind::Validation => Self {
                status: 400,
                body: json!({ "error": err.to_string() }),
            },
            ErrorKind::NotFound => Self {
                status: 404,
                body: json!({ "error": not_found_message(err) }),
            },
            ErrorKind::Busy => Self {
                status: 503,
                body: json!({
                    "error": "Project is busy, retry later",
                    "details": err.to_string(),
                    "retryable": true,
                }),
            },
            ErrorKind::Internal => {
                let mut body = json!({
                    "error": failure,
                    "details": err.to_string(),
                });
                if let ServiceError::AggregationFailed { task, .. } = err {
                    if let Ok(task) = serde_json::to_value(task.as_ref()) {
                        body["task"] = task;
                    }
                }
                Self { status: 500, body }
            }
        }
    }

    pub(crate) fn project_not_found() -> Self {
        Self {
            status: 404,
            body: json!({ "error": "Project not found" }),
        }
    }

    pub(crate) fn task_not_found() -> Self {
        Self {
            status: 404,
            body: json!({ "error": "Task not found" }),
        }
    }
}

fn not_found_message(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::TaskNotFound(_) => "Task not found",
        _ => "Project not found",
    }
}
