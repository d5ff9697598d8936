//! Ordered rule evaluation: synchronous, diagnostic, and progressive.

use std::sync::Arc;

use slotpick_core::{Asset, AssetRef, FailureCode, ValidationFailure};

use crate::rules::RuleRef;

/// Outcome of a progressive validation run.
///
/// Cancellation is deliberately distinct from a pass: a cancelled run made
/// no decision, and callers must not finalize a selection on it.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Passed,
    Failed(ValidationFailure),
    /// The caller's cancellation predicate fired before all rules ran.
    Cancelled,
}

impl ValidationOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ValidationOutcome::Passed)
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            ValidationOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Aggregates an ordered list of rules and validates assets against them.
///
/// The rule list is supplied at construction and immutable thereafter; a
/// validation run never observes a rule being added or removed.
pub struct ValidatorManager {
    rules: Vec<RuleRef>,
}

impl ValidatorManager {
    pub fn new(rules: Vec<RuleRef>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RuleRef] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Synchronous, short-circuiting evaluation in list order.
    ///
    /// Returns the first failure, or `None` if all rules pass. Blocks the
    /// caller for as long as the slowest failing prefix of the rule list;
    /// use [`Self::validate_progressive`] when that is not tolerable.
    pub fn validate(&self, asset: &dyn Asset) -> Option<ValidationFailure> {
        self.rules.iter().find_map(|rule| rule.validate(asset))
    }

    /// Collects the failures from every rule, without short-circuiting.
    /// Diagnostic use only; the gating paths use [`Self::validate`] or
    /// [`Self::validate_progressive`].
    pub fn failures(&self, asset: &dyn Asset) -> Vec<ValidationFailure> {
        self.rules
            .iter()
            .filter_map(|rule| rule.validate(asset))
            .collect()
    }

    /// Progressive evaluation with per-rule progress and cancellation.
    ///
    /// Rules run sequentially on the blocking pool; after each rule the
    /// `(current, total)` progress callback fires on the awaiting context,
    /// and `cancel` is consulted before the next rule starts. A failing
    /// rule reports its progress tick first, then the run yields
    /// [`ValidationOutcome::Failed`] without evaluating later rules.
    pub async fn validate_progressive<C, P>(
        &self,
        asset: AssetRef,
        cancel: C,
        mut progress: P,
    ) -> ValidationOutcome
    where
        C: Fn() -> bool,
        P: FnMut(usize, usize),
    {
        let total = self.rules.len();
        for (index, rule) in self.rules.iter().enumerate() {
            if cancel() {
                return ValidationOutcome::Cancelled;
            }

            let rule_id = rule.id();
            let rule = Arc::clone(rule);
            let asset = Arc::clone(&asset);
            let failure = match tokio::task::spawn_blocking(move || rule.validate(asset.as_ref()))
                .await
            {
                Ok(failure) => failure,
                Err(join_error) => Some(
                    ValidationFailure::new(
                        FailureCode::RuleAborted,
                        format!("rule {rule_id} aborted: {join_error}"),
                    )
                    .with_extra("rule", rule_id),
                ),
            };

            progress(index + 1, total);

            if let Some(failure) = failure {
                return ValidationOutcome::Failed(failure);
            }
        }
        ValidationOutcome::Passed
    }
}
