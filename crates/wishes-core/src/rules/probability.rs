//! Weighted tier and category draws.

use crate::config::{CategoryMap, LogicConfig, TierMap};
use crate::context::RuleContext;
use crate::error::ConfigError;
use crate::random::RandomSource;
use crate::rule::{Rule, RuleKind};
use crate::rules::pick;
use crate::state::TierWeights;

/// Draws the tier from the live tier weights.
///
/// Publishes a [`TierWeights`] table that escalation may raise during a
/// pull; after the pull the live weights are restored to the configured
/// ones. Does nothing if a tier was already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierProbabilityRule {
    weights: TierMap<u32>,
}

impl TierProbabilityRule {
    /// Creates the rule with base `weights`.
    #[must_use]
    pub fn new(weights: TierMap<u32>) -> Self {
        Self { weights }
    }

    /// Builds the rule from `tier_weights`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `tier_weights` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let weights = LogicConfig::require(
            RuleKind::TierProbability,
            "tier_weights",
            config.tier_weights.as_ref(),
        )?;
        Ok(Self::new(weights.clone()))
    }
}

impl Rule for TierProbabilityRule {
    fn identifier(&self) -> &str {
        RuleKind::TierProbability.identifier()
    }

    fn declare(&self, ctx: &mut RuleContext) -> Result<(), ConfigError> {
        let live = TierWeights::new(self.weights.clone());
        ctx.register(RuleKind::TierProbability, live.into())
    }

    fn decide(&self, ctx: &mut RuleContext, rng: &mut dyn RandomSource) {
        if ctx.outcome.tier().is_some() {
            return;
        }
        let Some(live) = ctx.params.get::<TierWeights>(RuleKind::TierProbability) else {
            return;
        };
        let live: TierMap<u32> = live.iter().collect();
        if let Some(tier) = pick(&live, rng) {
            ctx.outcome.decide_tier(*tier);
        }
    }

    fn advance(&self, ctx: &mut RuleContext) {
        if let Some(live) = ctx.params.get_mut::<TierWeights>(RuleKind::TierProbability) {
            live.restore();
        }
    }
}

/// Draws the category of the decided tier.
///
/// Does nothing if no tier is decided, a category already is, or the tier
/// has no configured categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryProbabilityRule {
    weights: CategoryMap<u32>,
}

impl CategoryProbabilityRule {
    /// Creates the rule with per-tier category `weights`.
    #[must_use]
    pub fn new(weights: CategoryMap<u32>) -> Self {
        Self { weights }
    }

    /// Builds the rule from `category_weights`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `category_weights` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let weights = LogicConfig::require(
            RuleKind::CategoryProbability,
            "category_weights",
            config.category_weights.as_ref(),
        )?;
        Ok(Self::new(weights.clone()))
    }
}

impl Rule for CategoryProbabilityRule {
    fn identifier(&self) -> &str {
        RuleKind::CategoryProbability.identifier()
    }

    fn decide(&self, ctx: &mut RuleContext, rng: &mut dyn RandomSource) {
        if ctx.outcome.category().is_some() {
            return;
        }
        let Some(tier) = ctx.outcome.tier() else {
            return;
        };
        let Some(options) = self.weights.get(&tier) else {
            return;
        };
        if let Some(category) = pick(options, rng) {
            ctx.outcome.decide_category(category.as_str());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Tier;
    use crate::random::ScriptedSource;

    fn config() -> LogicConfig {
        LogicConfig::from_json(
            r#"{
                "rules": ["tier_probability", "category_probability"],
                "tier_weights": { "5": 60, "4": 510, "3": 9430 },
                "category_weights": {
                    "5": { "Role": 10000 },
                    "4": { "Role": 5000, "Weapon": 5000 }
                }
            }"#,
        )
        .unwrap()
    }

    fn declared(rule: &impl Rule) -> RuleContext {
        let mut ctx = RuleContext::new();
        rule.declare(&mut ctx).unwrap();
        ctx
    }

    mod tier_probability_tests {
        use super::*;

        #[test]
        fn draws_from_weights() {
            let rule = TierProbabilityRule::from_config(&config()).unwrap();
            let mut ctx = declared(&rule);

            rule.decide(&mut ctx, &mut ScriptedSource::always(1));
            assert_eq!(ctx.outcome.tier(), Some(Tier::new(4)));
        }

        #[test]
        fn respects_an_earlier_decision() {
            let rule = TierProbabilityRule::from_config(&config()).unwrap();
            let mut ctx = declared(&rule);
            ctx.outcome.decide_tier(Tier::new(5));

            let mut rng = ScriptedSource::always(2);
            rule.decide(&mut ctx, &mut rng);
            assert_eq!(ctx.outcome.tier(), Some(Tier::new(5)));
            assert_eq!(rng.calls(), 0);
        }

        #[test]
        fn advance_restores_escalated_weights() {
            let rule = TierProbabilityRule::from_config(&config()).unwrap();
            let mut ctx = declared(&rule);
            ctx.params
                .get_mut::<TierWeights>(RuleKind::TierProbability)
                .unwrap()
                .add(Tier::new(5), 600);

            rule.advance(&mut ctx);

            let live = ctx.params.get::<TierWeights>(RuleKind::TierProbability).unwrap();
            assert_eq!(live.live(Tier::new(5)), 60);
        }

        #[test]
        fn all_zero_weights_leave_tier_undecided() {
            let weights = [(Tier::new(5), 0), (Tier::new(4), 0)].into_iter().collect();
            let rule = TierProbabilityRule::new(weights);
            let mut ctx = declared(&rule);

            rule.decide(&mut ctx, &mut ScriptedSource::always(0));
            assert_eq!(ctx.outcome.tier(), None);
        }
    }

    mod category_probability_tests {
        use super::*;

        #[test]
        fn draws_within_decided_tier() {
            let rule = CategoryProbabilityRule::from_config(&config()).unwrap();
            let mut ctx = declared(&rule);
            ctx.outcome.decide_tier(Tier::new(4));

            rule.decide(&mut ctx, &mut ScriptedSource::always(1));
            assert_eq!(ctx.outcome.category(), Some("Weapon"));
        }

        #[test]
        fn skips_without_tier_or_configured_categories() {
            let rule = CategoryProbabilityRule::from_config(&config()).unwrap();
            let mut ctx = declared(&rule);

            rule.decide(&mut ctx, &mut ScriptedSource::always(0));
            assert_eq!(ctx.outcome.category(), None);

            ctx.outcome.decide_tier(Tier::new(3));
            rule.decide(&mut ctx, &mut ScriptedSource::always(0));
            assert_eq!(ctx.outcome.category(), None);
        }

        #[test]
        fn keeps_an_earlier_category() {
            let rule = CategoryProbabilityRule::from_config(&config()).unwrap();
            let mut ctx = declared(&rule);
            ctx.outcome.decide_tier(Tier::new(4));
            ctx.outcome.decide_category("Role");

            rule.decide(&mut ctx, &mut ScriptedSource::always(1));
            assert_eq!(ctx.outcome.category(), Some("Role"));
        }
    }
}
