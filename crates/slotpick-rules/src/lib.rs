//! slotpick validation pipeline
//!
//! Composable acceptance rules that gate every selection mutation, plus the
//! manager that evaluates them synchronously (short-circuiting) or
//! progressively (async, cancelable, per-rule progress) and the router that
//! assigns rule sets to selection slots.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use slotpick_rules::{ValidatorManager, rules::duration::DurationRule};
//!
//! let manager = ValidatorManager::new(vec![
//!     Arc::new(DurationRule::less_than(60.0)),
//! ]);
//! assert_eq!(manager.len(), 1);
//! ```

pub mod manager;
pub mod router;
pub mod rules;

pub use manager::{ValidationOutcome, ValidatorManager};
pub use router::SlotValidationRouter;
pub use rules::{RuleRef, SelectionRule};
