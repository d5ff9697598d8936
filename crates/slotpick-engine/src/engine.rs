//! Slot-indexed selection state machine.
//!
//! The engine owns the slot map, cursor, and mode, and gates every add
//! through the validation pipeline. All methods take `&mut self` and must be
//! called from the single coordination context that owns the engine; rule
//! evaluation itself runs on the blocking pool (see
//! [`ValidatorManager::validate_progressive`]), and only progress ticks and
//! the final outcome cross back through the awaited future.

use std::sync::Arc;

use slotpick_core::{
    Asset, AssetRef, SelectionMap, SelectionMode, ValidationFailure, FIRST_SLOT,
};
use slotpick_rules::{SlotValidationRouter, ValidationOutcome, ValidatorManager};
use tokio::sync::broadcast;
use tracing::debug;

use crate::events::{EventBus, SelectionEvent, SourceId};

/// Configuration for a [`SelectionEngine`].
///
/// When both a manager and a router are set, the manager takes precedence
/// and the router is never consulted.
pub struct EngineConfig {
    pub mode: SelectionMode,
    pub maximum_selection: u32,
    pub validator: Option<Arc<ValidatorManager>>,
    pub router: Option<SlotValidationRouter>,
}

impl EngineConfig {
    pub fn new(mode: SelectionMode, maximum_selection: u32) -> Self {
        Self {
            mode,
            maximum_selection,
            validator: None,
            router: None,
        }
    }

    pub fn with_validator(mut self, validator: Arc<ValidatorManager>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_router(mut self, router: SlotValidationRouter) -> Self {
        self.router = Some(router);
        self
    }
}

/// Slot-indexed multi-selection state machine.
///
/// State is `(mode, map, cursor, maximum_selection)`. Expected rejections
/// (capacity, rule failures) are returned as values and published as
/// events, never as panics; the only fatal condition is constructing an
/// engine with `maximum_selection == 0`.
pub struct SelectionEngine {
    mode: SelectionMode,
    maximum_selection: u32,
    map: SelectionMap,
    cursor: u32,
    validator: Option<Arc<ValidatorManager>>,
    router: Option<SlotValidationRouter>,
    events: EventBus,
}

impl SelectionEngine {
    pub fn new(config: EngineConfig) -> Self {
        assert!(
            config.maximum_selection > 0,
            "maximum_selection must be greater than 0"
        );
        Self {
            mode: config.mode,
            maximum_selection: config.maximum_selection,
            map: SelectionMap::new(),
            cursor: FIRST_SLOT,
            validator: config.validator,
            router: config.router,
            events: EventBus::default(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Changes the selection mode. Host-driven only; the engine never
    /// switches modes itself, and the map is left as-is.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    pub fn maximum_selection(&self) -> u32 {
        self.maximum_selection
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn selection(&self) -> &SelectionMap {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Occupied slot of `asset`, or `None` if not selected.
    pub fn index_of(&self, asset: &dyn Asset) -> Option<u32> {
        self.map.slot_of(asset)
    }

    /// Subscribes to the engine's lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Toggles the selection state of `asset` (the badge interaction).
    ///
    /// Adds validate synchronously; removals never validate. Successful
    /// mutations publish `SelectionChanged`, rejected adds publish
    /// `ValidationEnded` with the failure.
    pub fn toggle(&mut self, source: SourceId, asset: &AssetRef) -> Result<(), ValidationFailure> {
        match self.mode {
            SelectionMode::None => {
                debug!(asset = asset.id(), "selection disabled, tap ignored");
                Ok(())
            }
            SelectionMode::Single => {
                if let Some(slot) = self.map.slot_of(asset.as_ref()) {
                    self.map.remove(slot);
                } else {
                    if let Err(failure) = self.check_rules(asset.as_ref(), FIRST_SLOT) {
                        self.emit_rejected(source, asset, failure.clone());
                        return Err(failure);
                    }
                    // Replaces any current occupant; single mode never
                    // rejects on capacity.
                    self.map.insert(FIRST_SLOT, Arc::clone(asset));
                }
                self.emit_changed(source);
                Ok(())
            }
            SelectionMode::MultipleCompact => {
                if let Some(slot) = self.map.slot_of(asset.as_ref()) {
                    self.map.remove(slot);
                    self.map.compact_down(slot);
                    self.cursor = self.append_slot();
                    self.emit_changed(source);
                    return Ok(());
                }
                if self.map.len() as u32 >= self.maximum_selection {
                    let failure = ValidationFailure::capacity_exceeded(self.maximum_selection);
                    self.emit_rejected(source, asset, failure.clone());
                    return Err(failure);
                }
                let target = self.append_slot();
                if let Err(failure) = self.check_rules(asset.as_ref(), target) {
                    self.emit_rejected(source, asset, failure.clone());
                    return Err(failure);
                }
                self.map.insert(target, Arc::clone(asset));
                self.cursor = self.append_slot();
                self.emit_changed(source);
                Ok(())
            }
            SelectionMode::MultipleSparse => {
                if let Some(slot) = self.map.slot_of(asset.as_ref()) {
                    // Gap stays; only the cursor relocates.
                    self.map.remove(slot);
                    self.relocate_cursor_to_lowest_free();
                    self.emit_changed(source);
                    return Ok(());
                }
                if self.map.len() as u32 >= self.maximum_selection {
                    let failure = ValidationFailure::capacity_exceeded(self.maximum_selection);
                    self.emit_rejected(source, asset, failure.clone());
                    return Err(failure);
                }
                self.relocate_cursor_if_unusable();
                let target = self.cursor;
                if let Err(failure) = self.check_rules(asset.as_ref(), target) {
                    self.emit_rejected(source, asset, failure.clone());
                    return Err(failure);
                }
                self.map.insert(target, Arc::clone(asset));
                self.advance_cursor_sparse(target);
                self.emit_changed(source);
                Ok(())
            }
        }
    }

    /// Adds `asset` with synchronous validation; capacity precedes rules.
    ///
    /// Inserts at `at` when given (an `at` outside `[1, maximum_selection]`
    /// is a coded rejection), else appends after the highest occupied slot,
    /// filling the lowest gap when the append position would leave the slot
    /// domain. Adding an already-selected asset is a no-op returning its
    /// slot. Blocks the caller for the duration of rule evaluation; prefer
    /// [`Self::add_asset_validated`] when rules can be slow.
    pub fn add_asset(
        &mut self,
        source: SourceId,
        asset: &AssetRef,
        at: Option<u32>,
    ) -> Result<u32, ValidationFailure> {
        if self.mode == SelectionMode::None {
            debug!(asset = asset.id(), "selection disabled, add ignored");
            let failure = ValidationFailure::selection_disabled();
            self.emit_rejected(source, asset, failure.clone());
            return Err(failure);
        }
        if let Some(existing) = self.map.slot_of(asset.as_ref()) {
            return Ok(existing);
        }
        let target = match self.resolve_target(at) {
            Ok(target) => target,
            Err(failure) => {
                self.emit_rejected(source, asset, failure.clone());
                return Err(failure);
            }
        };
        if let Err(failure) = self.check_add(asset.as_ref(), target) {
            self.emit_rejected(source, asset, failure.clone());
            return Err(failure);
        }
        self.map.insert(target, Arc::clone(asset));
        self.advance_cursor_after_add(target);
        self.emit_changed(source);
        Ok(target)
    }

    /// Adds `asset` through progressive validation.
    ///
    /// Publishes `ValidationStarted`, a `ValidationProgress` tick per rule,
    /// and exactly one `ValidationEnded`; on a pass the map mutates before
    /// the ended event and `SelectionChanged` follows it. A cancelled run
    /// never mutates and is reported as [`ValidationOutcome::Cancelled`],
    /// distinct from a pass.
    pub async fn add_asset_validated<C>(
        &mut self,
        source: SourceId,
        asset: &AssetRef,
        at: Option<u32>,
        cancel: C,
    ) -> ValidationOutcome
    where
        C: Fn() -> bool,
    {
        self.events.emit(SelectionEvent::ValidationStarted {
            source,
            asset: Arc::clone(asset),
        });

        if self.mode == SelectionMode::None {
            debug!(asset = asset.id(), "selection disabled, add ignored");
            return self.end_rejected(source, asset, ValidationFailure::selection_disabled());
        }
        if self.map.slot_of(asset.as_ref()).is_some() {
            // Already selected: nothing to validate, nothing changed.
            let outcome = ValidationOutcome::Passed;
            self.emit_ended(source, asset, outcome.clone());
            return outcome;
        }

        let target = match self.resolve_target(at) {
            Ok(target) => target,
            Err(failure) => return self.end_rejected(source, asset, failure),
        };
        if let Err(failure) = self.check_capacity(target) {
            return self.end_rejected(source, asset, failure);
        }

        let outcome = match self.validator_for(target) {
            None => ValidationOutcome::Passed,
            Some(manager) => {
                let bus = self.events.clone();
                let progress_asset = Arc::clone(asset);
                manager
                    .validate_progressive(Arc::clone(asset), cancel, move |current, total| {
                        bus.emit(SelectionEvent::ValidationProgress {
                            source,
                            asset: Arc::clone(&progress_asset),
                            current,
                            total,
                        });
                    })
                    .await
            }
        };

        match outcome {
            ValidationOutcome::Passed => {
                self.map.insert(target, Arc::clone(asset));
                self.advance_cursor_after_add(target);
                self.emit_ended(source, asset, ValidationOutcome::Passed);
                self.emit_changed(source);
                ValidationOutcome::Passed
            }
            other => {
                self.emit_ended(source, asset, other.clone());
                other
            }
        }
    }

    /// Removes the asset at `slot`. Empty slots are a no-op: no mutation,
    /// no events. Removal never validates.
    pub fn remove_at(&mut self, source: SourceId, slot: u32) -> Option<AssetRef> {
        let removed = self.map.remove(slot)?;
        match self.mode {
            SelectionMode::MultipleCompact => {
                self.map.compact_down(slot);
                self.cursor = self.append_slot();
            }
            SelectionMode::MultipleSparse => {
                self.relocate_cursor_to_lowest_free();
            }
            SelectionMode::None | SelectionMode::Single => {
                self.cursor = self.append_slot();
            }
        }
        self.emit_changed(source);
        Some(removed)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Slot an explicit add targets: `at` when given, else one past the
    /// highest occupied slot, falling back to the lowest free slot when the
    /// append position lies past the slot domain (possible in sparse mode
    /// after an explicit add near the maximum). An out-of-domain `at` is a
    /// coded failure, not a panic.
    fn resolve_target(&self, at: Option<u32>) -> Result<u32, ValidationFailure> {
        match at {
            Some(slot) => {
                if !(FIRST_SLOT..=self.maximum_selection).contains(&slot) {
                    return Err(ValidationFailure::slot_out_of_range(
                        slot,
                        self.maximum_selection,
                    ));
                }
                Ok(slot)
            }
            None => {
                let append = self.append_slot();
                if append > self.maximum_selection {
                    // A full map has no free slot; the out-of-domain append
                    // value then trips the capacity check before any insert.
                    Ok(self
                        .map
                        .first_free_slot(self.maximum_selection)
                        .unwrap_or(append))
                } else {
                    Ok(append)
                }
            }
        }
    }

    fn append_slot(&self) -> u32 {
        self.map.max_slot().map_or(FIRST_SLOT, |max| max + 1)
    }

    fn check_add(&self, asset: &dyn Asset, slot: u32) -> Result<(), ValidationFailure> {
        self.check_capacity(slot)?;
        self.check_rules(asset, slot)
    }

    fn check_capacity(&self, target: u32) -> Result<(), ValidationFailure> {
        // Replacing an occupant does not grow the map.
        if self.map.len() as u32 >= self.maximum_selection && !self.map.contains_slot(target) {
            return Err(ValidationFailure::capacity_exceeded(self.maximum_selection));
        }
        Ok(())
    }

    fn check_rules(&self, asset: &dyn Asset, slot: u32) -> Result<(), ValidationFailure> {
        match self.validator_for(slot) {
            Some(manager) => match manager.validate(asset) {
                Some(failure) => Err(failure),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    /// Manager gating `slot`: the engine-wide manager when set, else the
    /// router's choice for the slot.
    fn validator_for(&self, slot: u32) -> Option<Arc<ValidatorManager>> {
        if let Some(manager) = &self.validator {
            return Some(Arc::clone(manager));
        }
        self.router
            .as_ref()
            .and_then(|router| router.manager_for(slot).cloned())
    }

    fn advance_cursor_after_add(&mut self, placed: u32) {
        match self.mode {
            SelectionMode::MultipleSparse => self.advance_cursor_sparse(placed),
            _ => self.cursor = self.append_slot(),
        }
    }

    /// Sparse advance: next free slot strictly after `placed`, wrapping to
    /// the lowest free slot, unchanged when the map is full.
    fn advance_cursor_sparse(&mut self, placed: u32) {
        if let Some(next) = self.map.next_free_after(placed, self.maximum_selection) {
            self.cursor = next;
        } else if let Some(first) = self.map.first_free_slot(self.maximum_selection) {
            self.cursor = first;
        }
    }

    /// Sparse removal leaves a gap; the cursor moves to the lowest free
    /// slot so the next add fills gaps in ascending order.
    fn relocate_cursor_to_lowest_free(&mut self) {
        if let Some(first) = self.map.first_free_slot(self.maximum_selection) {
            self.cursor = first;
        }
    }

    /// Repairs a cursor that is out of `[1, maximum_selection]` or parked
    /// on an occupied slot (possible after a wraparound on a once-full
    /// map). Left unchanged when no slot is free; capacity checks run
    /// before any cursor use, so that state is never inserted into.
    fn relocate_cursor_if_unusable(&mut self) {
        let unusable = !(FIRST_SLOT..=self.maximum_selection).contains(&self.cursor)
            || self.map.contains_slot(self.cursor);
        if unusable {
            if let Some(first) = self.map.first_free_slot(self.maximum_selection) {
                self.cursor = first;
            }
        }
    }

    fn emit_changed(&self, source: SourceId) {
        self.events.emit(SelectionEvent::SelectionChanged {
            source,
            selection: self.map.snapshot(),
        });
    }

    fn emit_ended(&self, source: SourceId, asset: &AssetRef, outcome: ValidationOutcome) {
        self.events.emit(SelectionEvent::ValidationEnded {
            source,
            asset: Arc::clone(asset),
            outcome,
        });
    }

    /// Rejection on a synchronous path: a lone ended-with-failure event.
    fn emit_rejected(&self, source: SourceId, asset: &AssetRef, failure: ValidationFailure) {
        self.emit_ended(source, asset, ValidationOutcome::Failed(failure));
    }

    fn end_rejected(
        &self,
        source: SourceId,
        asset: &AssetRef,
        failure: ValidationFailure,
    ) -> ValidationOutcome {
        let outcome = ValidationOutcome::Failed(failure);
        self.emit_ended(source, asset, outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use slotpick_core::{FailureCode, ImageFetch, ImageTarget, MediaKind};
    use slotpick_rules::{RuleRef, SelectionRule};
    use tokio::sync::broadcast::error::TryRecvError;

    #[derive(Debug)]
    struct Photo {
        id: String,
    }

    impl Asset for Photo {
        fn id(&self) -> &str {
            &self.id
        }
        fn media_kind(&self) -> MediaKind {
            MediaKind::Image
        }
        fn pixel_width(&self) -> u32 {
            1024
        }
        fn pixel_height(&self) -> u32 {
            768
        }
        fn duration_secs(&self) -> f64 {
            0.0
        }
        fn fetch_image(&self, _target: ImageTarget) -> ImageFetch {
            ImageFetch::ready(None)
        }
    }

    fn photo(id: &str) -> AssetRef {
        Arc::new(Photo { id: id.to_string() })
    }

    struct AlwaysFail;

    impl SelectionRule for AlwaysFail {
        fn id(&self) -> &'static str {
            "test/always-fail"
        }
        fn description(&self) -> String {
            "always fails".to_string()
        }
        fn validate(&self, _asset: &dyn Asset) -> Option<ValidationFailure> {
            Some(ValidationFailure::new(
                FailureCode::ResolutionTooSmall,
                "rejected",
            ))
        }
    }

    struct AlwaysPass;

    impl SelectionRule for AlwaysPass {
        fn id(&self) -> &'static str {
            "test/always-pass"
        }
        fn description(&self) -> String {
            "always passes".to_string()
        }
        fn validate(&self, _asset: &dyn Asset) -> Option<ValidationFailure> {
            None
        }
    }

    fn manager_of(rules: Vec<RuleRef>) -> Arc<ValidatorManager> {
        Arc::new(ValidatorManager::new(rules))
    }

    fn engine(mode: SelectionMode, maximum: u32) -> SelectionEngine {
        SelectionEngine::new(EngineConfig::new(mode, maximum))
    }

    fn selected_ids(engine: &SelectionEngine) -> Vec<(u32, String)> {
        engine
            .selection()
            .iter()
            .map(|(slot, asset)| (slot, asset.id().to_string()))
            .collect()
    }

    #[test]
    #[should_panic(expected = "maximum_selection must be greater than 0")]
    fn test_zero_maximum_is_rejected_at_construction() {
        engine(SelectionMode::MultipleCompact, 0);
    }

    #[test]
    fn test_compact_toggle_appends_and_compacts() {
        let mut eng = engine(SelectionMode::MultipleCompact, 5);
        let source = SourceId::next();
        let (a, b, c) = (photo("a"), photo("b"), photo("c"));

        eng.toggle(source, &a).unwrap();
        eng.toggle(source, &b).unwrap();
        eng.toggle(source, &c).unwrap();
        assert_eq!(eng.cursor(), 4);

        // Removing from the middle shifts later slots down.
        eng.toggle(source, &b).unwrap();
        assert_eq!(
            selected_ids(&eng),
            vec![(1, "a".to_string()), (2, "c".to_string())]
        );
        assert_eq!(eng.cursor(), 3);
    }

    #[test]
    fn test_sparse_toggle_fills_lowest_gap_first() {
        let mut eng = engine(SelectionMode::MultipleSparse, 3);
        let source = SourceId::next();
        let (a, b, c) = (photo("a"), photo("b"), photo("c"));

        eng.toggle(source, &a).unwrap();
        assert_eq!(eng.cursor(), 2);
        eng.toggle(source, &b).unwrap();
        assert_eq!(eng.cursor(), 3);

        // Removing A leaves B at slot 2 and points the cursor at the gap.
        eng.toggle(source, &a).unwrap();
        assert_eq!(selected_ids(&eng), vec![(2, "b".to_string())]);
        assert_eq!(eng.cursor(), 1);

        eng.toggle(source, &c).unwrap();
        assert_eq!(
            selected_ids(&eng),
            vec![(1, "c".to_string()), (2, "b".to_string())]
        );
        assert_eq!(eng.cursor(), 3);
    }

    #[test]
    fn test_single_mode_replaces_selection() {
        let mut eng = engine(SelectionMode::Single, 1);
        let source = SourceId::next();
        let (a, b) = (photo("a"), photo("b"));

        eng.toggle(source, &a).unwrap();
        assert_eq!(eng.index_of(a.as_ref()), Some(1));

        eng.toggle(source, &b).unwrap();
        assert_eq!(eng.index_of(b.as_ref()), Some(1));
        assert_eq!(eng.index_of(a.as_ref()), None);
        assert_eq!(eng.len(), 1);

        eng.toggle(source, &b).unwrap();
        assert!(eng.is_empty());
    }

    #[test]
    fn test_disabled_mode_ignores_toggle_and_rejects_add() {
        let mut eng = engine(SelectionMode::None, 3);
        let source = SourceId::next();
        let mut rx = eng.subscribe();
        let a = photo("a");

        eng.toggle(source, &a).unwrap();
        assert!(eng.is_empty());
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);

        let failure = eng.add_asset(source, &a, None).unwrap_err();
        assert_eq!(failure.code, FailureCode::SelectionDisabled);
        assert!(eng.is_empty());
    }

    #[test]
    fn test_capacity_rejection_keeps_map_unchanged() {
        let mut eng = engine(SelectionMode::MultipleCompact, 2);
        let source = SourceId::next();
        eng.toggle(source, &photo("a")).unwrap();
        eng.toggle(source, &photo("b")).unwrap();

        let failure = eng.toggle(source, &photo("c")).unwrap_err();
        assert_eq!(failure.code, FailureCode::CapacityExceeded);
        assert_eq!(eng.len(), 2);
    }

    #[test]
    fn test_add_already_selected_is_idempotent() {
        let mut eng = engine(SelectionMode::MultipleCompact, 3);
        let source = SourceId::next();
        let a = photo("a");
        let slot = eng.add_asset(source, &a, None).unwrap();

        let mut rx = eng.subscribe();
        assert_eq!(eng.add_asset(source, &a, None).unwrap(), slot);
        assert_eq!(eng.len(), 1);
        // No mutation, no event.
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_add_at_occupied_slot_replaces_occupant() {
        let mut eng = engine(SelectionMode::MultipleCompact, 2);
        let source = SourceId::next();
        eng.add_asset(source, &photo("a"), Some(1)).unwrap();
        eng.add_asset(source, &photo("b"), Some(2)).unwrap();

        // At capacity, but replacement does not grow the map.
        let slot = eng.add_asset(source, &photo("c"), Some(1)).unwrap();
        assert_eq!(slot, 1);
        assert_eq!(
            selected_ids(&eng),
            vec![(1, "c".to_string()), (2, "b".to_string())]
        );
    }

    #[test]
    fn test_sparse_append_stays_inside_the_slot_domain() {
        let mut eng = engine(SelectionMode::MultipleSparse, 3);
        let source = SourceId::next();
        eng.add_asset(source, &photo("a"), Some(3)).unwrap();

        // Appending past the highest slot would leave the domain; the add
        // lands on the lowest free slot instead.
        assert_eq!(eng.add_asset(source, &photo("b"), None).unwrap(), 1);
        assert_eq!(eng.add_asset(source, &photo("c"), None).unwrap(), 2);
        assert_eq!(
            selected_ids(&eng),
            vec![
                (1, "b".to_string()),
                (2, "c".to_string()),
                (3, "a".to_string()),
            ]
        );

        // Full map: a further append is a capacity rejection, never a
        // replacement.
        let failure = eng.add_asset(source, &photo("d"), None).unwrap_err();
        assert_eq!(failure.code, FailureCode::CapacityExceeded);
        assert_eq!(eng.len(), 3);
    }

    #[test]
    fn test_add_at_out_of_domain_slot_is_a_coded_failure() {
        let mut eng = engine(SelectionMode::MultipleSparse, 3);
        let source = SourceId::next();
        let mut rx = eng.subscribe();

        for slot in [0, 4] {
            let failure = eng
                .add_asset(source, &photo("a"), Some(slot))
                .unwrap_err();
            assert_eq!(failure.code, FailureCode::SlotOutOfRange);
            match rx.try_recv().unwrap() {
                SelectionEvent::ValidationEnded { outcome, .. } => {
                    assert_eq!(
                        outcome.failure().unwrap().code,
                        FailureCode::SlotOutOfRange
                    );
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(eng.is_empty());
    }

    #[tokio::test]
    async fn test_progressive_add_rejects_out_of_domain_slot() {
        let config = EngineConfig::new(SelectionMode::MultipleSparse, 3)
            .with_validator(manager_of(vec![Arc::new(AlwaysPass)]));
        let mut eng = SelectionEngine::new(config);
        let source = SourceId::next();
        let mut rx = eng.subscribe();

        let outcome = eng
            .add_asset_validated(source, &photo("a"), Some(9), || false)
            .await;
        assert_eq!(
            outcome.failure().unwrap().code,
            FailureCode::SlotOutOfRange
        );
        assert!(eng.is_empty());

        // Started then ended; no rule ever ran.
        assert!(matches!(
            rx.try_recv().unwrap(),
            SelectionEvent::ValidationStarted { .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            SelectionEvent::ValidationEnded { .. }
        ));
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_remove_empty_slot_emits_nothing() {
        let mut eng = engine(SelectionMode::MultipleCompact, 3);
        let source = SourceId::next();
        let mut rx = eng.subscribe();

        assert!(eng.remove_at(source, 2).is_none());
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_failing_rule_rejects_toggle_and_reports_it() {
        let config = EngineConfig::new(SelectionMode::MultipleCompact, 3)
            .with_validator(manager_of(vec![Arc::new(AlwaysFail)]));
        let mut eng = SelectionEngine::new(config);
        let source = SourceId::next();
        let mut rx = eng.subscribe();

        let failure = eng.toggle(source, &photo("a")).unwrap_err();
        assert_eq!(failure.code, FailureCode::ResolutionTooSmall);
        assert!(eng.is_empty());

        match rx.try_recv().unwrap() {
            SelectionEvent::ValidationEnded { outcome, .. } => {
                assert_eq!(outcome.failure().unwrap().code, FailureCode::ResolutionTooSmall);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_router_gates_per_slot() {
        let mut router = SlotValidationRouter::new();
        router.set_manager(2, Some(manager_of(vec![Arc::new(AlwaysFail)])));
        let config =
            EngineConfig::new(SelectionMode::MultipleCompact, 3).with_router(router);
        let mut eng = SelectionEngine::new(config);
        let source = SourceId::next();

        assert_eq!(eng.add_asset(source, &photo("a"), Some(1)).unwrap(), 1);
        let failure = eng.add_asset(source, &photo("b"), Some(2)).unwrap_err();
        assert_eq!(failure.code, FailureCode::ResolutionTooSmall);
    }

    #[tokio::test]
    async fn test_progressive_add_publishes_full_event_sequence() {
        let config = EngineConfig::new(SelectionMode::MultipleCompact, 3)
            .with_validator(manager_of(vec![Arc::new(AlwaysPass)]));
        let mut eng = SelectionEngine::new(config);
        let source = SourceId::next();
        let mut rx = eng.subscribe();
        let a = photo("a");

        let outcome = eng.add_asset_validated(source, &a, None, || false).await;
        assert!(outcome.is_passed());
        assert_eq!(eng.index_of(a.as_ref()), Some(1));

        assert!(matches!(
            rx.try_recv().unwrap(),
            SelectionEvent::ValidationStarted { .. }
        ));
        match rx.try_recv().unwrap() {
            SelectionEvent::ValidationProgress { current, total, .. } => {
                assert_eq!((current, total), (1, 1));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.try_recv().unwrap() {
            SelectionEvent::ValidationEnded { outcome, .. } => assert!(outcome.is_passed()),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.try_recv().unwrap() {
            SelectionEvent::SelectionChanged { selection, .. } => {
                assert_eq!(selection.len(), 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn test_progressive_failure_leaves_map_unchanged() {
        let config = EngineConfig::new(SelectionMode::MultipleCompact, 3)
            .with_validator(manager_of(vec![Arc::new(AlwaysFail)]));
        let mut eng = SelectionEngine::new(config);
        let source = SourceId::next();
        let mut rx = eng.subscribe();

        let outcome = eng
            .add_asset_validated(source, &photo("a"), None, || false)
            .await;
        assert_eq!(
            outcome.failure().unwrap().code,
            FailureCode::ResolutionTooSmall
        );
        assert!(eng.is_empty());

        // Started, one progress tick, ended with the failure. No change.
        assert!(matches!(
            rx.try_recv().unwrap(),
            SelectionEvent::ValidationStarted { .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            SelectionEvent::ValidationProgress { .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            SelectionEvent::ValidationEnded { .. }
        ));
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn test_progressive_cancellation_never_mutates() {
        let config = EngineConfig::new(SelectionMode::MultipleCompact, 3)
            .with_validator(manager_of(vec![Arc::new(AlwaysPass)]));
        let mut eng = SelectionEngine::new(config);
        let source = SourceId::next();

        let outcome = eng
            .add_asset_validated(source, &photo("a"), None, || true)
            .await;
        assert_eq!(outcome, ValidationOutcome::Cancelled);
        assert!(eng.is_empty());
    }

    #[tokio::test]
    async fn test_progressive_capacity_check_precedes_rules() {
        let config = EngineConfig::new(SelectionMode::MultipleCompact, 1)
            .with_validator(manager_of(vec![Arc::new(AlwaysPass)]));
        let mut eng = SelectionEngine::new(config);
        let source = SourceId::next();
        eng.add_asset_validated(source, &photo("a"), None, || false)
            .await;
        assert_eq!(eng.len(), 1);

        let mut rx = eng.subscribe();
        let outcome = eng
            .add_asset_validated(source, &photo("b"), None, || false)
            .await;
        assert_eq!(
            outcome.failure().unwrap().code,
            FailureCode::CapacityExceeded
        );
        // Started then ended; no progress ticks for a capacity rejection.
        assert!(matches!(
            rx.try_recv().unwrap(),
            SelectionEvent::ValidationStarted { .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            SelectionEvent::ValidationEnded { .. }
        ));
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }
}
