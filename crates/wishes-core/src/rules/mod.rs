//! Rule variants.
//!
//! - [`TierCounterRule`], [`CategoryCounterRule`]: pulls since last occurrence
//! - [`TierProbabilityRule`], [`CategoryProbabilityRule`]: weighted draws
//! - [`TierGuaranteeRule`], [`CategoryGuaranteeRule`]: pity thresholds
//! - [`RateUpRule`], [`RateUpCategoryRule`]: featured-group selection
//! - [`TierEscalationRule`], [`FestivalRule`], [`TargetedRule`]: escalations
//! - [`InertRule`]: stands in for an unrecognized identifier
//!
//! Rules hold only their immutable configuration. Everything that changes
//! between pulls lives in the [`ParameterTable`](crate::context::ParameterTable)
//! so an engine can snapshot, restore and reset it in one place.

mod counter;
mod escalation;
mod guarantee;
mod probability;
mod rate_up;

pub use counter::{CategoryCounterRule, TierCounterRule};
pub use escalation::{FestivalRule, TargetedRule, TierEscalationRule};
pub use guarantee::{CategoryGuaranteeRule, TierGuaranteeRule};
pub use probability::{CategoryProbabilityRule, TierProbabilityRule};
pub use rate_up::{RateUpCategoryRule, RateUpRule};

use indexmap::IndexMap;

use crate::context::RuleContext;
use crate::random::RandomSource;
use crate::rule::Rule;

/// A rule that does nothing.
///
/// Created for identifiers the registry does not recognize when running
/// under [`UnknownRulePolicy::Ignore`](crate::registry::UnknownRulePolicy::Ignore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InertRule {
    identifier: String,
}

impl InertRule {
    /// Creates an inert rule for `identifier`.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

impl Rule for InertRule {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn decide(&self, _ctx: &mut RuleContext, _rng: &mut dyn RandomSource) {}
}

/// Weighted draw over the keys of `options`.
pub(crate) fn pick<'a, K>(
    options: &'a IndexMap<K, u32>,
    rng: &mut dyn RandomSource,
) -> Option<&'a K> {
    let weights: Vec<u32> = options.values().copied().collect();
    let index = rng.choose(&weights)?;
    options.get_index(index).map(|(key, _)| key)
}

/// Draws "hit" with probability `weight / capacity`.
pub(crate) fn roll(weight: u32, capacity: u32, rng: &mut dyn RandomSource) -> bool {
    rng.choose(&[weight, capacity.saturating_sub(weight)]) == Some(0)
}
