//! Slot-indexed selection map.

use std::collections::BTreeMap;
use std::fmt;

use crate::asset::{Asset, AssetRef};

/// Slot indices start at 1.
pub const FIRST_SLOT: u32 = 1;

/// Ordered mapping from positive slot index to asset.
///
/// Invariants maintained by callers (the selection engine):
/// - an asset appears in at most one slot (identity comparison);
/// - `len() <= maximum_selection` at all times;
/// - compact mode keeps occupied slots contiguous from [`FIRST_SLOT`].
///
/// The map itself guarantees slot indices are positive and that the
/// ascending ordered projection is always derivable (gaps are skipped,
/// never represented).
#[derive(Default, Clone)]
pub struct SelectionMap {
    slots: BTreeMap<u32, AssetRef>,
}

impl SelectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: u32) -> Option<&AssetRef> {
        self.slots.get(&slot)
    }

    pub fn contains_slot(&self, slot: u32) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Places `asset` at `slot`, returning the previous occupant if any.
    ///
    /// Panics if `slot` is 0; slot indices are positive by construction
    /// everywhere in this workspace, so a 0 is a programmer error.
    pub fn insert(&mut self, slot: u32, asset: AssetRef) -> Option<AssetRef> {
        assert!(slot >= FIRST_SLOT, "slot indices start at {FIRST_SLOT}");
        self.slots.insert(slot, asset)
    }

    pub fn remove(&mut self, slot: u32) -> Option<AssetRef> {
        self.slots.remove(&slot)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Occupied slot of `asset` by identity, or `None` (the not-found
    /// sentinel). O(n) with n bounded by the maximum selection.
    pub fn slot_of(&self, asset: &dyn Asset) -> Option<u32> {
        self.slots
            .iter()
            .find(|(_, held)| held.same_identity(asset))
            .map(|(slot, _)| *slot)
    }

    pub fn max_slot(&self) -> Option<u32> {
        self.slots.keys().next_back().copied()
    }

    /// Slots in ascending order.
    pub fn ordered_slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.keys().copied()
    }

    /// Assets in ascending slot order (the implicit rendering order).
    pub fn ordered_assets(&self) -> impl Iterator<Item = &AssetRef> + '_ {
        self.slots.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &AssetRef)> + '_ {
        self.slots.iter().map(|(slot, asset)| (*slot, asset))
    }

    /// Cloned snapshot for event payloads.
    pub fn snapshot(&self) -> BTreeMap<u32, AssetRef> {
        self.slots.clone()
    }

    /// Lowest unoccupied slot in `[FIRST_SLOT, maximum]`, if any.
    pub fn first_free_slot(&self, maximum: u32) -> Option<u32> {
        (FIRST_SLOT..=maximum).find(|slot| !self.slots.contains_key(slot))
    }

    /// Lowest unoccupied slot strictly after `slot`, up to `maximum`.
    pub fn next_free_after(&self, slot: u32, maximum: u32) -> Option<u32> {
        (slot.saturating_add(1)..=maximum).find(|candidate| !self.slots.contains_key(candidate))
    }

    /// Shifts every slot above `removed_slot` down by one, closing the gap
    /// left by a compact-mode removal.
    pub fn compact_down(&mut self, removed_slot: u32) {
        let higher: Vec<u32> = self
            .slots
            .range(removed_slot + 1..)
            .map(|(slot, _)| *slot)
            .collect();
        for slot in higher {
            if let Some(asset) = self.slots.remove(&slot) {
                self.slots.insert(slot - 1, asset);
            }
        }
    }
}

impl fmt::Debug for SelectionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(slot, asset)| (slot, asset.id())))
            .finish()
    }
}
