//! Selection modes.

use serde::{Deserialize, Serialize};

/// Governs mutation policy and cursor semantics of a selection engine.
///
/// The mode is mutated by the host application only; the engine never
/// changes it implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// No selection allowed.
    None,
    /// At most one asset, always in slot 1.
    Single,
    /// Multi-selection; occupied slots stay contiguous from 1, removals
    /// shift higher slots down.
    MultipleCompact,
    /// Multi-selection; removals leave gaps, an explicit cursor picks the
    /// next insertion slot.
    MultipleSparse,
}

impl SelectionMode {
    pub fn allows_selection(self) -> bool {
        self != SelectionMode::None
    }

    pub fn is_multiple(self) -> bool {
        matches!(
            self,
            SelectionMode::MultipleCompact | SelectionMode::MultipleSparse
        )
    }
}
