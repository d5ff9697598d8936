//! Per-slot routing of validator managers.

use std::collections::HashMap;
use std::sync::Arc;

use slotpick_core::{Asset, ValidationFailure};

use crate::manager::ValidatorManager;

/// Maps selection slots to validator managers, with a default fallback.
///
/// Useful when one engine serves several concurrently open picking
/// surfaces with different rule sets. A slot with no manager and no
/// default has no rules and always passes.
#[derive(Default)]
pub struct SlotValidationRouter {
    managers: HashMap<u32, Arc<ValidatorManager>>,
    default: Option<Arc<ValidatorManager>>,
}

impl SlotValidationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(default: Arc<ValidatorManager>) -> Self {
        Self {
            managers: HashMap::new(),
            default: Some(default),
        }
    }

    /// Sets (or with `None`, removes) the manager for a slot.
    pub fn set_manager(&mut self, slot: u32, manager: Option<Arc<ValidatorManager>>) {
        match manager {
            Some(manager) => {
                self.managers.insert(slot, manager);
            }
            None => {
                self.managers.remove(&slot);
            }
        }
    }

    pub fn set_default(&mut self, manager: Option<Arc<ValidatorManager>>) {
        self.default = manager;
    }

    /// Manager responsible for `slot`, falling back to the default.
    pub fn manager_for(&self, slot: u32) -> Option<&Arc<ValidatorManager>> {
        self.managers.get(&slot).or(self.default.as_ref())
    }

    /// Validates `asset` for `slot`; no configured manager means pass.
    pub fn validate_for_slot(&self, asset: &dyn Asset, slot: u32) -> Option<ValidationFailure> {
        self.manager_for(slot)
            .and_then(|manager| manager.validate(asset))
    }

    /// Collects every failure for `slot`; empty when no rules or all pass.
    pub fn failures_for_slot(&self, asset: &dyn Asset, slot: u32) -> Vec<ValidationFailure> {
        self.manager_for(slot)
            .map(|manager| manager.failures(asset))
            .unwrap_or_default()
    }
}
