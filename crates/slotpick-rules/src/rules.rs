//! Selection rule trait and concrete rule modules.

use std::sync::Arc;

use slotpick_core::{Asset, ValidationFailure};

pub mod content;
pub mod duration;
pub mod resolution;

/// An acceptance rule that can veto an asset before it enters the selection.
pub trait SelectionRule: Send + Sync {
    /// Unique identifier (e.g., "duration/less-than", "content/face-presence").
    fn id(&self) -> &'static str;

    /// Human-readable description including the configured thresholds.
    fn description(&self) -> String;

    /// Checks the asset; `None` means pass.
    ///
    /// Must be side-effect-free with respect to the selection state. A rule
    /// that does not apply to the asset's media kind passes. May block the
    /// calling thread (content rules wait on an image fetch with a bounded
    /// timeout), so callers keep rule evaluation off the coordination
    /// context.
    fn validate(&self, asset: &dyn Asset) -> Option<ValidationFailure>;
}

/// Shared reference to a rule; rule lists are immutable for the lifetime of
/// a validation run.
pub type RuleRef = Arc<dyn SelectionRule>;
