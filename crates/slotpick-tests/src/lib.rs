//! slotpick end-to-end test infrastructure.
//!
//! Shared fixtures for the integration tests:
//!
//! - [`fixtures::MemoryAsset`]: an in-memory [`slotpick_core::Asset`] with
//!   configurable metadata and an optional representative image
//! - [`fixtures::FlagDetector`]: a content detector returning a fixed
//!   verdict while counting invocations

pub mod fixtures;

pub use fixtures::{FlagDetector, MemoryAsset};
