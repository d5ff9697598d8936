//! slotpick core types
//!
//! This crate provides the asset capability surface, failure values, and the
//! slot-indexed selection map shared by the rule pipeline and the selection
//! engine.
//!
//! # Overview
//!
//! A *selection* is an ordered mapping from positive slot indices to media
//! assets. Assets are supplied by external sources and consumed through the
//! [`Asset`] trait; the core never copies or mutates them, it only holds
//! [`AssetRef`] references. Every rejected mutation is described by exactly
//! one [`ValidationFailure`] carrying a stable [`FailureCode`], suitable for
//! mapping to user-facing text by a presentation layer.
//!
//! # Modules
//!
//! - [`asset`]: the asset capability trait and the cancelable image fetch
//! - [`failure`]: failure codes and the failure value
//! - [`map`]: the slot-indexed selection map
//! - [`mode`]: selection modes

pub mod asset;
pub mod failure;
pub mod map;
pub mod mode;

// Re-export commonly used types at the crate root
pub use asset::{Asset, AssetRef, FetchTimedOut, ImageDelivery, ImageFetch, ImageTarget, MediaKind};
pub use failure::{FailureCode, ValidationFailure};
pub use map::{SelectionMap, FIRST_SLOT};
pub use mode::SelectionMode;
