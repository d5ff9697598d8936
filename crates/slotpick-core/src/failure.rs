//! Failure values with stable codes.
//!
//! Expected rejection conditions (capacity, rule failures) are always
//! delivered as data, never as `Err` or panics. Each failure carries a
//! stable short code a presentation layer can map to localized text.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable failure codes for rejected selection mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCode {
    // Engine-level failures
    /// The selection already holds `maximum_selection` assets.
    CapacityExceeded,
    /// The engine is in `SelectionMode::None`.
    SelectionDisabled,
    /// An explicit slot index falls outside `[1, maximum_selection]`.
    SlotOutOfRange,

    // Duration rule failures
    DurationTooShort,
    DurationTooLong,
    DurationOutOfRange,

    // Resolution rule failures
    /// Pixel width or height is 0 (unknown), distinct from any threshold.
    ResolutionInvalid,
    ResolutionTooSmall,
    ResolutionTooLarge,
    ResolutionOutOfRange,
    WidthTooSmall,
    WidthTooLarge,
    WidthOutOfRange,
    HeightTooSmall,
    HeightTooLarge,
    HeightOutOfRange,

    // Content rule failures
    /// No representative image could be obtained for the probe.
    ContentProbeUnavailable,
    ContentNotDetected,
    ContentDetectionFailed,

    // Pipeline failures
    /// A rule panicked or was torn down mid-run.
    RuleAborted,
}

impl FailureCode {
    /// Returns the stable code string (e.g., "capacity-exceeded").
    pub fn code(&self) -> &'static str {
        match self {
            FailureCode::CapacityExceeded => "capacity-exceeded",
            FailureCode::SelectionDisabled => "selection-disabled",
            FailureCode::SlotOutOfRange => "slot-out-of-range",
            FailureCode::DurationTooShort => "duration-too-short",
            FailureCode::DurationTooLong => "duration-too-long",
            FailureCode::DurationOutOfRange => "duration-out-of-range",
            FailureCode::ResolutionInvalid => "resolution-invalid",
            FailureCode::ResolutionTooSmall => "resolution-too-small",
            FailureCode::ResolutionTooLarge => "resolution-too-large",
            FailureCode::ResolutionOutOfRange => "resolution-out-of-range",
            FailureCode::WidthTooSmall => "width-too-small",
            FailureCode::WidthTooLarge => "width-too-large",
            FailureCode::WidthOutOfRange => "width-out-of-range",
            FailureCode::HeightTooSmall => "height-too-small",
            FailureCode::HeightTooLarge => "height-too-large",
            FailureCode::HeightOutOfRange => "height-out-of-range",
            FailureCode::ContentProbeUnavailable => "content-probe-unavailable",
            FailureCode::ContentNotDetected => "content-not-detected",
            FailureCode::ContentDetectionFailed => "content-detection-failed",
            FailureCode::RuleAborted => "rule-aborted",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Why a selection mutation was rejected.
///
/// Immutable value created per failed attempt and discarded after delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Stable failure code.
    pub code: FailureCode,
    /// Human-readable message (not localized; hosts map `code` instead).
    pub message: String,
    /// Optional structured data (e.g., the measured duration).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ValidationFailure {
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Builder method to attach a structured extra value.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Engine-level failure: the selection is at capacity.
    pub fn capacity_exceeded(maximum: u32) -> Self {
        Self::new(
            FailureCode::CapacityExceeded,
            format!("selection is full: maximum {maximum} assets"),
        )
        .with_extra("maximum", maximum)
    }

    /// Engine-level failure: selection mode is `None`.
    pub fn selection_disabled() -> Self {
        Self::new(FailureCode::SelectionDisabled, "selection is disabled")
    }

    /// Engine-level failure: an explicit slot index is outside the domain.
    pub fn slot_out_of_range(slot: u32, maximum: u32) -> Self {
        Self::new(
            FailureCode::SlotOutOfRange,
            format!("slot index {slot} outside 1..={maximum}"),
        )
        .with_extra("slot", slot)
        .with_extra("maximum", maximum)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}
