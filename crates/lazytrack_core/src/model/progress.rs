//! Weighted completion percentage with fixed 2-decimal precision.
//!
//! # Invariants
//! - Stored as hundredths of a percent (basis points), `0..=10_000`.
//! - Conversions from floating-point input round half away from zero.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::validation::ValidationError;

const MAX_BASIS_POINTS: u16 = 10_000;

/// Completion percentage in `[0, 100]` with two decimals of precision.
///
/// Serialized as a JSON float (`40.0`, `33.33`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CompletionProgress(u16);

impl CompletionProgress {
    pub const ZERO: Self = Self(0);
    pub const COMPLETE: Self = Self(MAX_BASIS_POINTS);

    /// Builds a value from hundredths of a percent.
    pub fn from_basis_points(value: u16) -> Result<Self, ValidationError> {
        if value > MAX_BASIS_POINTS {
            return Err(ValidationError::ProgressOutOfRange(
                f64::from(value) / 100.0,
            ));
        }
        Ok(Self(value))
    }

    /// Builds a value from a percentage, rounding to two decimals.
    pub fn from_percent(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::ProgressOutOfRange(value));
        }
        Ok(Self((value * 100.0).round() as u16))
    }

    /// Computes `completed / total * 100` rounded to two decimals.
    ///
    /// Returns zero when `total` is not positive.
    pub fn from_weights(completed: f64, total: f64) -> Self {
        if !total.is_finite() || total <= 0.0 || !completed.is_finite() {
            return Self::ZERO;
        }
        let scaled = (completed / total * f64::from(MAX_BASIS_POINTS)).round();
        Self(scaled.clamp(0.0, f64::from(MAX_BASIS_POINTS)) as u16)
    }

    pub fn basis_points(self) -> u16 {
        self.0
    }

    pub fn as_percent(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl TryFrom<f64> for CompletionProgress {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_percent(value)
    }
}

impl From<CompletionProgress> for f64 {
    fn from(value: CompletionProgress) -> Self {
        value.as_percent()
    }
}

impl Display for CompletionProgress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::CompletionProgress;

    #[test]
    fn from_weights_rounds_to_two_decimals() {
        assert_eq!(CompletionProgress::from_weights(2.0, 5.0).basis_points(), 4_000);
        assert_eq!(CompletionProgress::from_weights(1.0, 3.0).basis_points(), 3_333);
        assert_eq!(CompletionProgress::from_weights(2.0, 3.0).basis_points(), 6_667);
    }

    #[test]
    fn from_weights_handles_zero_total() {
        assert_eq!(CompletionProgress::from_weights(0.0, 0.0), CompletionProgress::ZERO);
    }

    #[test]
    fn from_percent_rejects_out_of_range() {
        assert!(CompletionProgress::from_percent(-0.01).is_err());
        assert!(CompletionProgress::from_percent(100.01).is_err());
        assert!(CompletionProgress::from_percent(f64::NAN).is_err());
        assert_eq!(
            CompletionProgress::from_percent(12.346).unwrap().basis_points(),
            1_235
        );
    }

    #[test]
    fn display_keeps_two_decimals() {
        assert_eq!(CompletionProgress::from_weights(1.0, 3.0).to_string(), "33.33");
        assert_eq!(CompletionProgress::COMPLETE.to_string(), "100.00");
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&CompletionProgress::from_weights(2.0, 5.0)).unwrap();
        assert_eq!(json, "40.0");
        let parsed: CompletionProgress = serde_json::from_str("33.33").unwrap();
        assert_eq!(parsed.basis_points(), 3_333);
        assert!(serde_json::from_str::<CompletionProgress>("101").is_err());
    }
}
