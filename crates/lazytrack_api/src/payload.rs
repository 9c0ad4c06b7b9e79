//! Request body parsing.
//!
//! # Invariants
//! - Field names follow the resource shape: `name`, `status`, `weight`,
//!   `project`, `completion_progress`.
//! - `null` is treated as an absent field; unknown fields are ignored.
//! - Every rejection names the offending field.

use lazytrack_core::{
    CompletionProgress, Project, ProjectPatch, Task, TaskPatch, ValidationError, WorkStatus,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// Project create/update body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectBody {
    name: Option<String>,
    status: Option<String>,
    completion_progress: Option<f64>,
}

impl ProjectBody {
    const SHAPE: &'static [(&'static str, Shape)] = &[
        ("name", Shape::Text),
        ("status", Shape::Text),
        ("completion_progress", Shape::Number),
    ];
}

/// Task create/update body. `project` holds the owning project id.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskBody {
    name: Option<String>,
    status: Option<String>,
    weight: Option<f64>,
    project: Option<String>,
}

impl TaskBody {
    const SHAPE: &'static [(&'static str, Shape)] = &[
        ("name", Shape::Text),
        ("status", Shape::Text),
        ("weight", Shape::Number),
        ("project", Shape::Text),
    ];
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Text,
    Number,
}

impl Shape {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Number => value.is_number(),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Text => "expected a string",
            Self::Number => "expected a number",
        }
    }
}

pub(crate) fn project_draft(body: &Value) -> Result<Project, ValidationError> {
    let body: ProjectBody = decode(body, ProjectBody::SHAPE)?;
    let name = body.name.ok_or(ValidationError::MissingField("name"))?;
    let mut project = Project::new(name);
    if let Some(status) = parse_status(body.status)? {
        project.status = status;
    }
    if let Some(progress) = parse_progress(body.completion_progress)? {
        project.completion_progress = progress;
    }
    project.validate()?;
    Ok(project)
}

pub(crate) fn project_patch(body: &Value) -> Result<ProjectPatch, ValidationError> {
    let body: ProjectBody = decode(body, ProjectBody::SHAPE)?;
    Ok(ProjectPatch {
        name: body.name,
        status: parse_status(body.status)?,
        completion_progress: parse_progress(body.completion_progress)?,
    })
}

pub(crate) fn task_draft(body: &Value) -> Result<Task, ValidationError> {
    let body: TaskBody = decode(body, TaskBody::SHAPE)?;
    let name = body.name.ok_or(ValidationError::MissingField("name"))?;
    let weight = body.weight.ok_or(ValidationError::MissingField("weight"))?;
    let project_id = parse_project(body.project)?.ok_or(ValidationError::MissingField("project"))?;

    let mut task = Task::new(project_id, name, weight);
    if let Some(status) = parse_status(body.status)? {
        task.status = status;
    }
    task.validate()?;
    Ok(task)
}

pub(crate) fn task_patch(body: &Value) -> Result<TaskPatch, ValidationError> {
    let body: TaskBody = decode(body, TaskBody::SHAPE)?;
    Ok(TaskPatch {
        name: body.name,
        status: parse_status(body.status)?,
        weight: body.weight,
        project_id: parse_project(body.project)?,
    })
}

/// Parses a path id. `None` for text that cannot be a record id.
pub(crate) fn record_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Deserializes `body`, naming the first field whose value has the wrong
/// JSON type when serde rejects it.
fn decode<T: DeserializeOwned>(
    body: &Value,
    shape: &[(&'static str, Shape)],
) -> Result<T, ValidationError> {
    let Some(fields) = body.as_object() else {
        return Err(ValidationError::InvalidField {
            field: "body",
            message: "expected a JSON object".to_string(),
        });
    };

    T::deserialize(body).map_err(|err| {
        let mismatch = shape.iter().find_map(|&(field, expected)| {
            fields
                .get(field)
                .filter(|value| !value.is_null() && !expected.accepts(value))
                .map(|value| (field, expected, value))
        });
        match mismatch {
            Some(("status", _, value)) => ValidationError::InvalidStatus(value.to_string()),
            Some((field, expected, _)) => ValidationError::InvalidField {
                field,
                message: expected.expected().to_string(),
            },
            None => ValidationError::InvalidField {
                field: "body",
                message: err.to_string(),
            },
        }
    })
}

fn parse_status(label: Option<String>) -> Result<Option<WorkStatus>, ValidationError> {
    label
        .map(|label| {
            label
                .parse::<WorkStatus>()
                .map_err(ValidationError::InvalidStatus)
        })
        .transpose()
}

fn parse_progress(value: Option<f64>) -> Result<Option<CompletionProgress>, ValidationError> {
    value.map(CompletionProgress::from_percent).transpose()
}

fn parse_project(raw: Option<String>) -> Result<Option<Uuid>, ValidationError> {
    raw.map(|raw| {
        record_id(&raw).ok_or_else(|| ValidationError::InvalidField {
            field: "project",
            message: format!("`{raw}` is not a project id"),
        })
    })
    .transpose()
}
