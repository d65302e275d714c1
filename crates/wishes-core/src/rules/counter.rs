//! Pull counters.
//!
//! Counters measure pulls since the last occurrence of a tier (or of a
//! category within a tier). They never influence the outcome themselves;
//! guarantee and escalation rules read them through the parameter table.

use crate::config::LogicConfig;
use crate::context::RuleContext;
use crate::error::ConfigError;
use crate::outcome::Tier;
use crate::random::RandomSource;
use crate::rule::{Rule, RuleKind};
use crate::state::{CategoryCounts, TierCounts};

/// Counts pulls since each configured tier last appeared.
///
/// Tracks the tiers of `tier_weights`. After every pull all counters
/// increment and the counter of the finalized tier drops to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierCounterRule {
    tiers: Vec<Tier>,
}

impl TierCounterRule {
    /// Creates a counter over `tiers`.
    #[must_use]
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    /// Builds the rule from `tier_weights`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `tier_weights` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let weights = LogicConfig::require(
            RuleKind::TierCounter,
            "tier_weights",
            config.tier_weights.as_ref(),
        )?;
        Ok(Self::new(weights.keys().copied().collect()))
    }
}

impl Rule for TierCounterRule {
    fn identifier(&self) -> &str {
        RuleKind::TierCounter.identifier()
    }

    fn declare(&self, ctx: &mut RuleContext) -> Result<(), ConfigError> {
        let counts = TierCounts::zeroed(self.tiers.iter().copied());
        ctx.register(RuleKind::TierCounter, counts.into())
    }

    fn decide(&self, _ctx: &mut RuleContext, _rng: &mut dyn RandomSource) {}

    fn advance(&self, ctx: &mut RuleContext) {
        let Some(tier) = ctx.outcome.tier() else {
            return;
        };
        let Some(counts) = ctx.params.get_mut::<TierCounts>(RuleKind::TierCounter) else {
            return;
        };
        counts.increment_all();
        if counts.contains(tier) {
            counts.zero(tier);
        }
    }
}

/// Counts pulls since each category of a tier last appeared.
///
/// Tracks the categories of `category_weights`. Only pulls of a tracked
/// tier move that tier's counters: the finalized category resets and its
/// siblings increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCounterRule {
    layout: Vec<(Tier, Vec<String>)>,
}

impl CategoryCounterRule {
    /// Creates a counter over `layout` (tier with its categories).
    #[must_use]
    pub fn new(layout: Vec<(Tier, Vec<String>)>) -> Self {
        Self { layout }
    }

    /// Builds the rule from `category_weights`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `category_weights` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let weights = LogicConfig::require(
            RuleKind::CategoryCounter,
            "category_weights",
            config.category_weights.as_ref(),
        )?;
        let layout = weights
            .iter()
            .map(|(tier, cats)| (*tier, cats.keys().cloned().collect()))
            .collect();
        Ok(Self::new(layout))
    }
}

impl Rule for CategoryCounterRule {
    fn identifier(&self) -> &str {
        RuleKind::CategoryCounter.identifier()
    }

    fn declare(&self, ctx: &mut RuleContext) -> Result<(), ConfigError> {
        let counts = CategoryCounts::zeroed(self.layout.iter().map(|(t, cats)| (*t, cats.iter())));
        ctx.register(RuleKind::CategoryCounter, counts.into())
    }

    fn decide(&self, _ctx: &mut RuleContext, _rng: &mut dyn RandomSource) {}

    fn advance(&self, ctx: &mut RuleContext) {
        let Some(tier) = ctx.outcome.tier() else {
            return;
        };
        let category = ctx.outcome.category().unwrap_or_default();
        if let Some(counts) = ctx.params.get_mut::<CategoryCounts>(RuleKind::CategoryCounter) {
            counts.record(tier, category);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
