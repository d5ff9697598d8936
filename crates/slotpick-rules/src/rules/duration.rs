//! Duration thresholds for time-based media.

use slotpick_core::{Asset, FailureCode, ValidationFailure};

use crate::rules::SelectionRule;

#[derive(Debug, Clone, Copy)]
enum DurationConstraint {
    /// duration > min
    GreaterThan(f64),
    /// duration < max
    LessThan(f64),
    /// min <= duration <= max
    Within(f64, f64),
}

/// Validates an asset's duration; passes for non-time-based media.
#[derive(Debug, Clone)]
pub struct DurationRule {
    constraint: DurationConstraint,
}

impl DurationRule {
    /// Requires `duration > min_secs`.
    pub fn greater_than(min_secs: f64) -> Self {
        Self {
            constraint: DurationConstraint::GreaterThan(min_secs),
        }
    }

    /// Requires `duration < max_secs`.
    pub fn less_than(max_secs: f64) -> Self {
        Self {
            constraint: DurationConstraint::LessThan(max_secs),
        }
    }

    /// Requires `min_secs <= duration <= max_secs`.
    pub fn within(min_secs: f64, max_secs: f64) -> Self {
        assert!(
            min_secs <= max_secs,
            "minimum duration must not exceed maximum duration"
        );
        Self {
            constraint: DurationConstraint::Within(min_secs, max_secs),
        }
    }
}

impl SelectionRule for DurationRule {
    fn id(&self) -> &'static str {
        match self.constraint {
            DurationConstraint::GreaterThan(_) => "duration/greater-than",
            DurationConstraint::LessThan(_) => "duration/less-than",
            DurationConstraint::Within(..) => "duration/within",
        }
    }

    fn description(&self) -> String {
        match self.constraint {
            DurationConstraint::GreaterThan(min) => format!("requires duration > {min}s"),
            DurationConstraint::LessThan(max) => format!("requires duration < {max}s"),
            DurationConstraint::Within(min, max) => {
                format!("requires duration within {min}s..={max}s")
            }
        }
    }

    fn validate(&self, asset: &dyn Asset) -> Option<ValidationFailure> {
        if !asset.media_kind().is_time_based() {
            return None;
        }
        let actual = asset.duration_secs();
        let failure = match self.constraint {
            DurationConstraint::GreaterThan(min) if actual <= min => ValidationFailure::new(
                FailureCode::DurationTooShort,
                format!("medium too short: requires > {min}s, got {actual}s"),
            ),
            DurationConstraint::LessThan(max) if actual >= max => ValidationFailure::new(
                FailureCode::DurationTooLong,
                format!("medium too long: requires < {max}s, got {actual}s"),
            ),
            DurationConstraint::Within(min, max) if actual < min || actual > max => {
                ValidationFailure::new(
                    FailureCode::DurationOutOfRange,
                    format!("medium duration out of range: requires {min}s..={max}s, got {actual}s"),
                )
            }
            _ => return None,
        };
        Some(failure.with_extra("duration", actual))
    }
}
