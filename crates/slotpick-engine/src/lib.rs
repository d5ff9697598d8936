//! Selection engine: slot-indexed multi-selection with validated adds and
//! a multicast lifecycle event stream.
//!
//! [`SelectionEngine`] holds the slot map, cursor, and mode, and gates every
//! add through the rules configured in [`EngineConfig`] (an engine-wide
//! manager or a per-slot router). Mutations publish [`SelectionEvent`]s on a
//! broadcast bus; any number of surfaces may subscribe, and each mutation
//! carries the [`SourceId`] of the surface that initiated it.
//!
//! ```
//! use std::sync::Arc;
//! use slotpick_core::SelectionMode;
//! use slotpick_engine::{EngineConfig, SelectionEngine, SourceId};
//! use slotpick_rules::ValidatorManager;
//!
//! let config = EngineConfig::new(SelectionMode::MultipleCompact, 9)
//!     .with_validator(Arc::new(ValidatorManager::new(Vec::new())));
//! let engine = SelectionEngine::new(config);
//! assert!(engine.is_empty());
//! let _events = engine.subscribe();
//! let _page = SourceId::next();
//! ```

mod engine;
mod events;

pub use engine::{EngineConfig, SelectionEngine};
pub use events::{EventBus, SelectionEvent, SourceId};
