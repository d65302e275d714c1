//! Pity guarantees.
//!
//! A guarantee forces a tier or category once the matching counter reaches
//! its threshold. Thresholds are checked in declaration order and the first
//! match wins, so earlier-declared tiers pre-empt later ones.
//!
//! Both guarantees zero the counter they consult when they fire. That is the
//! one place a rule writes into another rule's published state besides
//! escalation.

use crate::config::{CategoryMap, LogicConfig, TierMap};
use crate::context::RuleContext;
use crate::error::ConfigError;
use crate::random::RandomSource;
use crate::rule::{Rule, RuleKind};
use crate::state::{CategoryCounts, TierCounts};

/// Forces a tier once pulls since its last occurrence reach the threshold.
///
/// The counter read is the tier counter's value plus one, the count the
/// current pull would have. Requires [`TierCounterRule`](super::TierCounterRule).
///
/// # Example
///
/// ```
/// use wishes_core::rules::{TierCounterRule, TierGuaranteeRule};
/// use wishes_core::{Rule, RuleContext, ScriptedSource, Tier};
///
/// let counter = TierCounterRule::new(vec![Tier::new(5)]);
/// let guarantee = TierGuaranteeRule::new([(Tier::new(5), 1)].into_iter().collect());
///
/// let mut ctx = RuleContext::new();
/// counter.declare(&mut ctx).unwrap();
/// guarantee.decide(&mut ctx, &mut ScriptedSource::default());
///
/// assert_eq!(ctx.outcome.tier(), Some(Tier::new(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierGuaranteeRule {
    thresholds: TierMap<u32>,
}

impl TierGuaranteeRule {
    /// Creates the rule with per-tier `thresholds`.
    #[must_use]
    pub fn new(thresholds: TierMap<u32>) -> Self {
        Self { thresholds }
    }

    /// Builds the rule from `tier_thresholds`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `tier_thresholds` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let thresholds = LogicConfig::require(
            RuleKind::TierGuarantee,
            "tier_thresholds",
            config.tier_thresholds.as_ref(),
        )?;
        Ok(Self::new(thresholds.clone()))
    }
}

impl Rule for TierGuaranteeRule {
    fn identifier(&self) -> &str {
        RuleKind::TierGuarantee.identifier()
    }

    fn decide(&self, ctx: &mut RuleContext, _rng: &mut dyn RandomSource) {
        if ctx.outcome.tier().is_some() {
            return;
        }
        let Some(counts) = ctx.params.get_mut::<TierCounts>(RuleKind::TierCounter) else {
            return;
        };

        for (tier, threshold) in self.thresholds.iter() {
            let pulls = counts.get(*tier).saturating_add(1);
            if pulls >= *threshold {
                tracing::debug!(tier = %tier, pulls, "tier guarantee fired");
                ctx.outcome.decide_tier(*tier);
                counts.zero(*tier);
                return;
            }
        }
    }
}

/// Forces a category of the decided tier once its counter reaches the threshold.
///
/// If a category was already decided by an earlier rule, the guarantee
/// does not fire but still zeroes that category's counter. Requires
/// [`CategoryCounterRule`](super::CategoryCounterRule).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGuaranteeRule {
    thresholds: CategoryMap<u32>,
}

impl CategoryGuaranteeRule {
    /// Creates the rule with per-tier category `thresholds`.
    #[must_use]
    pub fn new(thresholds: CategoryMap<u32>) -> Self {
        Self { thresholds }
    }

    /// Builds the rule from `category_thresholds`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `category_thresholds` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let thresholds = LogicConfig::require(
            RuleKind::CategoryGuarantee,
            "category_thresholds",
            config.category_thresholds.as_ref(),
        )?;
        Ok(Self::new(thresholds.clone()))
    }
}

impl Rule for CategoryGuaranteeRule {
    fn identifier(&self) -> &str {
        RuleKind::CategoryGuarantee.identifier()
    }

    fn decide(&self, ctx: &mut RuleContext, _rng: &mut dyn RandomSource) {
        let Some(tier) = ctx.outcome.tier() else {
            return;
        };
        let Some(counts) = ctx
            .params
            .get_mut::<CategoryCounts>(RuleKind::CategoryCounter)
        else {
            return;
        };

        if let Some(category) = ctx.outcome.category() {
            counts.zero(tier, category);
            return;
        }

        let Some(thresholds) = self.thresholds.get(&tier) else {
            return;
        };
        for (category, threshold) in thresholds.iter() {
            let pulls = counts.get(tier, category);
            if pulls >= *threshold {
                tracing::debug!(tier = %tier, category = %category, pulls, "category guarantee fired");
                ctx.outcome.decide_category(category.as_str());
                counts.zero(tier, category);
                return;
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
