//! Typed event stream for selection lifecycle notifications.
//!
//! A single emission mechanism replaces both the delegate fan-out and the
//! process-wide notification side-channel of older pickers: every listener
//! subscribes to the same broadcast channel. Dropping a receiver
//! unsubscribes it; the bus silently skips closed receivers, so a listener's
//! lifetime stays independent of the engine's.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use slotpick_core::AssetRef;
use slotpick_rules::ValidationOutcome;
use tokio::sync::broadcast;
use tracing::trace;

/// Identifies the surface (page, tab, picker instance) that initiated a
/// mutation, so listeners can tell self-triggered changes from external
/// ones. Process-unique, cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SourceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source-{}", self.0)
    }
}

/// Lifecycle events published by the selection engine.
///
/// For a single add attempt the required order is `ValidationStarted`, zero
/// or more `ValidationProgress`, then exactly one `ValidationEnded`;
/// `SelectionChanged` fires additionally, and only, when the map mutated.
/// Events about different assets may interleave by sequence, never
/// mid-event.
#[derive(Debug, Clone)]
pub enum SelectionEvent {
    SelectionChanged {
        source: SourceId,
        /// Full snapshot of the current slot map.
        selection: BTreeMap<u32, AssetRef>,
    },
    ValidationStarted {
        source: SourceId,
        asset: AssetRef,
    },
    ValidationProgress {
        source: SourceId,
        asset: AssetRef,
        current: usize,
        total: usize,
    },
    ValidationEnded {
        source: SourceId,
        asset: AssetRef,
        outcome: ValidationOutcome,
    },
}

const DEFAULT_CAPACITY: usize = 256;

/// Multicast broadcast of [`SelectionEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SelectionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publishes an event; a bus with no live subscribers drops it.
    pub fn emit(&self, event: SelectionEvent) {
        if self.tx.send(event).is_err() {
            trace!("selection event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
