//! Field-level validation errors for writable model data.

use std::error::Error;
use std::fmt::{Display, Formatter};

use super::status::WorkStatus;

/// Validation failure naming the offending field.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field is absent from the input.
    MissingField(&'static str),
    /// `name` is blank after trim.
    EmptyName,
    /// `status` is not one of the accepted labels.
    InvalidStatus(String),
    /// `weight` is negative, NaN or infinite.
    InvalidWeight(f64),
    /// `completion_progress` is outside `0..=100` or not finite.
    ProgressOutOfRange(f64),
    /// Field value has the wrong shape (e.g. malformed id).
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    /// Returns the name of the field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) => field,
            Self::EmptyName => "name",
            Self::InvalidStatus(_) => "status",
            Self::InvalidWeight(_) => "weight",
            Self::ProgressOutOfRange(_) => "completion_progress",
            Self::InvalidField { field, .. } => field,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "`{field}` is required"),
            Self::EmptyName => write!(f, "`name` must not be blank"),
            Self::InvalidStatus(value) => write!(
                f,
                "Status must be one of: {} (got `{value}`)",
                WorkStatus::allowed_labels()
            ),
            Self::InvalidWeight(value) => {
                write!(f, "`weight` must be a finite number >= 0 (got {value})")
            }
            Self::ProgressOutOfRange(value) => write!(
                f,
                "`completion_progress` must be between 0 and 100 (got {value})"
            ),
            Self::InvalidField { field, message } => write!(f, "`{field}` is invalid: {message}"),
        }
    }
}

impl Error for ValidationError {}

/// Trims and validates a display name.
pub fn normalize_name(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Validates a task weight.
pub fn validate_weight(value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidWeight(value));
    }
    Ok(value)
}
