//! Rate-up (featured group) selection.

use crate::config::{CategoryMap, LogicConfig, TierMap};
use crate::context::RuleContext;
use crate::error::ConfigError;
use crate::outcome::{Tag, Tier};
use crate::random::RandomSource;
use crate::rule::{Rule, RuleKind};
use crate::rules::{pick, roll};
use crate::state::{CategoryCounts, TierCounts};

/// Tags a pull of a configured tier as rate-up.
///
/// Each configured tier has a rate-up weight out of the capacity and an
/// optional pity threshold. The counter tracks pulls of that tier since the
/// last forced rate-up: once the incoming count reaches the threshold the
/// tag is forced and the counter zeroes. Otherwise the counter increments
/// and the tag is drawn; a drawn rate-up leaves the counter running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateUpRule {
    weights: TierMap<u32>,
    thresholds: TierMap<u32>,
    capacity: u32,
}

impl RateUpRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(weights: TierMap<u32>, thresholds: TierMap<u32>, capacity: u32) -> Self {
        Self {
            weights,
            thresholds,
            capacity,
        }
    }

    /// Builds the rule from `rate_up_weights` and the optional `rate_up_thresholds`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `rate_up_weights` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let weights = LogicConfig::require(
            RuleKind::RateUp,
            "rate_up_weights",
            config.rate_up_weights.as_ref(),
        )?;
        Ok(Self::new(
            weights.clone(),
            config.rate_up_thresholds.clone().unwrap_or_default(),
            config.capacity,
        ))
    }
}

impl Rule for RateUpRule {
    fn identifier(&self) -> &str {
        RuleKind::RateUp.identifier()
    }

    fn declare(&self, ctx: &mut RuleContext) -> Result<(), ConfigError> {
        let counts = TierCounts::zeroed(self.weights.keys().copied());
        ctx.register(RuleKind::RateUp, counts.into())
    }

    fn decide(&self, ctx: &mut RuleContext, rng: &mut dyn RandomSource) {
        let Some(tier) = ctx.outcome.tier() else {
            return;
        };
        let Some(weight) = self.weights.get(&tier).copied() else {
            return;
        };
        let Some(counts) = ctx.params.get_mut::<TierCounts>(RuleKind::RateUp) else {
            return;
        };

        let pulls = counts.get(tier).saturating_add(1);
        let forced = self.thresholds.get(&tier).is_some_and(|t| pulls >= *t);
        if forced {
            tracing::debug!(tier = %tier, pulls, "rate-up guarantee fired");
            ctx.outcome.escalate_tag(Tag::RateUp);
            counts.zero(tier);
            return;
        }

        counts.increment(tier);
        if roll(weight, self.capacity, rng) {
            ctx.outcome.escalate_tag(Tag::RateUp);
        }
    }
}

/// Picks the category of a rate-up pull.
///
/// Every rate-up pull of a configured tier increments all of that tier's
/// category counters. The first category (in declaration order) whose
/// counter reaches its threshold is forced; otherwise the category is
/// drawn from the rate-up category weights. The chosen category's counter
/// is zeroed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateUpCategoryRule {
    weights: CategoryMap<u32>,
    thresholds: CategoryMap<u32>,
}

impl RateUpCategoryRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(weights: CategoryMap<u32>, thresholds: CategoryMap<u32>) -> Self {
        Self {
            weights,
            thresholds,
        }
    }

    /// Builds the rule from `rate_up_category_weights` and the optional
    /// `rate_up_category_thresholds`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `rate_up_category_weights` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let weights = LogicConfig::require(
            RuleKind::RateUpCategory,
            "rate_up_category_weights",
            config.rate_up_category_weights.as_ref(),
        )?;
        Ok(Self::new(
            weights.clone(),
            config.rate_up_category_thresholds.clone().unwrap_or_default(),
        ))
    }

    fn threshold(&self, tier: Tier, category: &str) -> Option<u32> {
        self.thresholds.get(&tier)?.get(category).copied()
    }
}

impl Rule for RateUpCategoryRule {
    fn identifier(&self) -> &str {
        RuleKind::RateUpCategory.identifier()
    }

    fn declare(&self, ctx: &mut RuleContext) -> Result<(), ConfigError> {
        let counts =
            CategoryCounts::zeroed(self.weights.iter().map(|(tier, cats)| (*tier, cats.keys())));
        ctx.register(RuleKind::RateUpCategory, counts.into())
    }

    fn decide(&self, ctx: &mut RuleContext, rng: &mut dyn RandomSource) {
        if !ctx.outcome.tag().is_rate_up() {
            return;
        }
        let Some(tier) = ctx.outcome.tier() else {
            return;
        };
        let Some(options) = self.weights.get(&tier) else {
            return;
        };
        let Some(counts) = ctx
            .params
            .get_mut::<CategoryCounts>(RuleKind::RateUpCategory)
        else {
            return;
        };

        counts.increment_tier(tier);
        let forced = options.keys().find(|category| {
            self.threshold(tier, category)
                .is_some_and(|t| counts.get(tier, category) >= t)
        });
        if let Some(category) = forced {
            tracing::debug!(tier = %tier, category = %category, "rate-up category guarantee fired");
        }

        let Some(category) = forced.or_else(|| pick(options, rng)) else {
            return;
        };
        ctx.outcome.decide_category(category.as_str());
        counts.zero(tier, category);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;

    fn config() -> LogicConfig {
        LogicConfig::from_json(
            r#"{
                "rules": ["rate_up", "rate_up_category"],
                "rate_up_weights": { "5": 5000, "4": 5000 },
                "rate_up_thresholds": { "5": 2 },
                "rate_up_category_weights": { "4": { "Role": 5000, "Weapon": 5000 } },
                "rate_up_category_thresholds": { "4": { "Weapon": 3 } }
            }"#,
        )
        .unwrap()
    }

    fn declared(rules: &[&dyn Rule]) -> RuleContext {
        let mut ctx = RuleContext::new();
        for rule in rules {
            rule.declare(&mut ctx).unwrap();
        }
        ctx
    }

    fn rate_up_count(ctx: &RuleContext, tier: u32) -> u32 {
        ctx.params
            .get::<TierCounts>(RuleKind::RateUp)
            .unwrap()
            .get(Tier::new(tier))
    }

    mod rate_up_tests {
        use super::*;

        #[test]
        fn standard_draw_increments_then_pity_forces() {
            let rule = RateUpRule::from_config(&config()).unwrap();
            let mut ctx = declared(&[&rule]);
            // Index 1 is the "standard" side of the roll.
            let mut rng = ScriptedSource::always(1);

            ctx.outcome.decide_tier(Tier::new(5));
            rule.decide(&mut ctx, &mut rng);
            assert_eq!(ctx.outcome.tag(), Tag::Standard);
            assert_eq!(rate_up_count(&ctx, 5), 1);

            ctx.reset_outcome();
            ctx.outcome.decide_tier(Tier::new(5));
            rule.decide(&mut ctx, &mut rng);
            assert_eq!(ctx.outcome.tag(), Tag::RateUp);
            assert_eq!(rate_up_count(&ctx, 5), 0);
        }

        #[test]
        fn drawn_rate_up_keeps_counting() {
            let rule = RateUpRule::from_config(&config()).unwrap();
            let mut ctx = declared(&[&rule]);
            ctx.params
                .get_mut::<TierCounts>(RuleKind::RateUp)
                .unwrap()
                .set(Tier::new(4), 6);

            ctx.outcome.decide_tier(Tier::new(4));
            rule.decide(&mut ctx, &mut ScriptedSource::always(0));

            assert_eq!(ctx.outcome.tag(), Tag::RateUp);
            assert_eq!(rate_up_count(&ctx, 4), 7);
        }

        #[test]
        fn pity_fires_on_schedule_despite_won_draws() {
            let weights = [(Tier::new(5), 5000)].into_iter().collect();
            let thresholds = [(Tier::new(5), 3)].into_iter().collect();
            let rule = RateUpRule::new(weights, thresholds, 10_000);
            let mut ctx = declared(&[&rule]);
            // Index 0 wins every draw.
            let mut rng = ScriptedSource::always(0);

            let mut forced = Vec::new();
            for pull in 0..6 {
                let calls = rng.calls();
                ctx.reset_outcome();
                ctx.outcome.decide_tier(Tier::new(5));
                rule.decide(&mut ctx, &mut rng);

                assert_eq!(ctx.outcome.tag(), Tag::RateUp);
                if rng.calls() == calls {
                    forced.push(pull);
                }
            }

            assert_eq!(forced, vec![2, 5]);
            assert_eq!(rate_up_count(&ctx, 5), 0);
        }

        #[test]
        fn threshold_one_always_fires() {
            let weights = [(Tier::new(5), 0)].into_iter().collect();
            let thresholds = [(Tier::new(5), 1)].into_iter().collect();
            let rule = RateUpRule::new(weights, thresholds, 10_000);
            let mut ctx = declared(&[&rule]);

            for _ in 0..5 {
                ctx.reset_outcome();
                ctx.outcome.decide_tier(Tier::new(5));
                rule.decide(&mut ctx, &mut ScriptedSource::always(1));
                assert_eq!(ctx.outcome.tag(), Tag::RateUp);
            }
        }

        #[test]
        fn unconfigured_tier_is_ignored() {
            let rule = RateUpRule::from_config(&config()).unwrap();
            let mut ctx = declared(&[&rule]);
            let mut rng = ScriptedSource::always(0);

            ctx.outcome.decide_tier(Tier::new(3));
            rule.decide(&mut ctx, &mut rng);

            assert_eq!(ctx.outcome.tag(), Tag::Standard);
            assert_eq!(rng.calls(), 0);
        }
    }

    mod rate_up_category_tests {
        use super::*;

        fn counts(ctx: &RuleContext) -> &CategoryCounts {
            ctx.params
                .get::<CategoryCounts>(RuleKind::RateUpCategory)
                .unwrap()
        }

        #[test]
        fn only_applies_to_rate_up_pulls() {
            let rule = RateUpCategoryRule::from_config(&config()).unwrap();
            let mut ctx = declared(&[&rule]);

            ctx.outcome.decide_tier(Tier::new(4));
            rule.decide(&mut ctx, &mut ScriptedSource::always(0));

            assert_eq!(ctx.outcome.category(), None);
            assert_eq!(counts(&ctx).get(Tier::new(4), "Role"), 0);
        }

        #[test]
        fn draws_and_resets_chosen_category() {
            let rule = RateUpCategoryRule::from_config(&config()).unwrap();
            let mut ctx = declared(&[&rule]);

            ctx.outcome.decide_tier(Tier::new(4));
            ctx.outcome.escalate_tag(Tag::RateUp);
            rule.decide(&mut ctx, &mut ScriptedSource::always(0));

            assert_eq!(ctx.outcome.category(), Some("Role"));
            assert_eq!(counts(&ctx).get(Tier::new(4), "Role"), 0);
            assert_eq!(counts(&ctx).get(Tier::new(4), "Weapon"), 1);
        }

        #[test]
        fn threshold_forces_category() {
            let rule = RateUpCategoryRule::from_config(&config()).unwrap();
            let mut ctx = declared(&[&rule]);
            let mut rng = ScriptedSource::always(0);

            for _ in 0..2 {
                ctx.reset_outcome();
                ctx.outcome.decide_tier(Tier::new(4));
                ctx.outcome.escalate_tag(Tag::RateUp);
                rule.decide(&mut ctx, &mut rng);
                assert_eq!(ctx.outcome.category(), Some("Role"));
            }

            // Weapon's counter reaches 3 on this pull.
            ctx.reset_outcome();
            ctx.outcome.decide_tier(Tier::new(4));
            ctx.outcome.escalate_tag(Tag::RateUp);
            rule.decide(&mut ctx, &mut rng);

            assert_eq!(ctx.outcome.category(), Some("Weapon"));
            assert_eq!(counts(&ctx).get(Tier::new(4), "Weapon"), 0);
        }
    }
}
