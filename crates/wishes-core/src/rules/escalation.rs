//! Escalations: probability growth, festival and targeted upgrades.

use crate::config::{Escalation, LogicConfig, TierMap};
use crate::context::RuleContext;
use crate::error::ConfigError;
use crate::outcome::{Tag, Tier};
use crate::random::RandomSource;
use crate::rule::{Rule, RuleKind};
use crate::rules::roll;
use crate::state::{TierCounts, TierWeights};

/// Raises tier weights linearly once a tier's pull count passes its start.
///
/// For every scheduled tier the incoming count (tier counter plus one) is
/// compared with the schedule; past the start, the bonus is added to the
/// live weight published by [`TierProbabilityRule`](super::TierProbabilityRule).
/// The live weights are then truncated so their running sum stays within
/// the capacity, earlier-declared tiers consuming it first.
///
/// Must run before the probability rule, which restores the weights after
/// every pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierEscalationRule {
    schedule: TierMap<Escalation>,
    capacity: u32,
}

impl TierEscalationRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(schedule: TierMap<Escalation>, capacity: u32) -> Self {
        Self { schedule, capacity }
    }

    /// Builds the rule from `tier_escalation`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `tier_escalation` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let schedule = LogicConfig::require(
            RuleKind::TierEscalation,
            "tier_escalation",
            config.tier_escalation.as_ref(),
        )?;
        Ok(Self::new(schedule.clone(), config.capacity))
    }
}

impl Rule for TierEscalationRule {
    fn identifier(&self) -> &str {
        RuleKind::TierEscalation.identifier()
    }

    fn decide(&self, ctx: &mut RuleContext, _rng: &mut dyn RandomSource) {
        let Some(counts) = ctx.params.get::<TierCounts>(RuleKind::TierCounter) else {
            return;
        };
        let bonuses: Vec<(Tier, u32)> = self
            .schedule
            .iter()
            .map(|(tier, schedule)| (*tier, schedule.bonus(counts.get(*tier).saturating_add(1))))
            .filter(|(_, bonus)| *bonus > 0)
            .collect();

        let Some(live) = ctx.params.get_mut::<TierWeights>(RuleKind::TierProbability) else {
            return;
        };
        for (tier, bonus) in bonuses {
            tracing::debug!(tier = %tier, bonus, "tier weight escalated");
            live.add(tier, bonus);
        }
        live.normalize(self.capacity);
    }
}

/// Upgrades a rate-up pull to festival.
///
/// Applies only to pulls tagged exactly rate-up, for tiers with a festival
/// weight; the upgrade succeeds with probability `weight / capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FestivalRule {
    weights: TierMap<u32>,
    capacity: u32,
}

impl FestivalRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(weights: TierMap<u32>, capacity: u32) -> Self {
        Self { weights, capacity }
    }

    /// Builds the rule from `festival_weights`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `festival_weights` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let weights = LogicConfig::require(
            RuleKind::Festival,
            "festival_weights",
            config.festival_weights.as_ref(),
        )?;
        Ok(Self::new(weights.clone(), config.capacity))
    }
}

impl Rule for FestivalRule {
    fn identifier(&self) -> &str {
        RuleKind::Festival.identifier()
    }

    fn decide(&self, ctx: &mut RuleContext, rng: &mut dyn RandomSource) {
        if ctx.outcome.tag() != Tag::RateUp {
            return;
        }
        let Some(tier) = ctx.outcome.tier() else {
            return;
        };
        let Some(weight) = self.weights.get(&tier).copied() else {
            return;
        };
        if roll(weight, self.capacity, rng) {
            ctx.outcome.escalate_tag(Tag::Festival);
        }
    }
}

/// Forces the targeted item after enough rate-up pulls missed it.
///
/// Counts rate-up and festival pulls of each configured tier. Once the
/// counter reaches the threshold the pull is tagged targeted and the
/// counter resets; otherwise the counter increments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedRule {
    thresholds: TierMap<u32>,
}

impl TargetedRule {
    /// Creates the rule.
    #[must_use]
    pub fn new(thresholds: TierMap<u32>) -> Self {
        Self { thresholds }
    }

    /// Builds the rule from `targeted_thresholds`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if `targeted_thresholds` is absent.
    pub fn from_config(config: &LogicConfig) -> Result<Self, ConfigError> {
        let thresholds = LogicConfig::require(
            RuleKind::Targeted,
            "targeted_thresholds",
            config.targeted_thresholds.as_ref(),
        )?;
        Ok(Self::new(thresholds.clone()))
    }
}

impl Rule for TargetedRule {
    fn identifier(&self) -> &str {
        RuleKind::Targeted.identifier()
    }

    fn declare(&self, ctx: &mut RuleContext) -> Result<(), ConfigError> {
        let counts = TierCounts::zeroed(self.thresholds.keys().copied());
        ctx.register(RuleKind::Targeted, counts.into())
    }

    fn decide(&self, ctx: &mut RuleContext, _rng: &mut dyn RandomSource) {
        let tag = ctx.outcome.tag();
        if !tag.is_rate_up() || tag.is_targeted() {
            return;
        }
        let Some(tier) = ctx.outcome.tier() else {
            return;
        };
        let Some(threshold) = self.thresholds.get(&tier).copied() else {
            return;
        };
        let Some(counts) = ctx.params.get_mut::<TierCounts>(RuleKind::Targeted) else {
            return;
        };

        let missed = counts.get(tier);
        if missed >= threshold {
            tracing::debug!(tier = %tier, missed, "targeted guarantee fired");
            ctx.outcome.escalate_tag(Tag::Targeted);
            counts.zero(tier);
        } else {
            counts.increment(tier);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;
    use crate::rules::{TierCounterRule, TierProbabilityRule};

    fn base_weights() -> TierMap<u32> {
        [(Tier::new(5), 60), (Tier::new(4), 510), (Tier::new(3), 9430)]
            .into_iter()
            .collect()
    }

    mod tier_escalation_tests {
        use super::*;

        fn setup(count5: u32, count4: u32) -> RuleContext {
            let mut ctx = RuleContext::new();
            TierCounterRule::new(base_weights().keys().copied().collect())
                .declare(&mut ctx)
                .unwrap();
            TierProbabilityRule::new(base_weights()).declare(&mut ctx).unwrap();
            let counts = ctx.params.get_mut::<TierCounts>(RuleKind::TierCounter).unwrap();
            counts.set(Tier::new(5), count5);
            counts.set(Tier::new(4), count4);
            ctx
        }

        fn rule() -> TierEscalationRule {
            let schedule = [
                (Tier::new(5), Escalation::new(74, 600)),
                (Tier::new(4), Escalation::new(9, 5100)),
            ]
            .into_iter()
            .collect();
            TierEscalationRule::new(schedule, 10_000)
        }

        fn live(ctx: &RuleContext, tier: u32) -> u32 {
            ctx.params
                .get::<TierWeights>(RuleKind::TierProbability)
                .unwrap()
                .live(Tier::new(tier))
        }

        #[test]
        fn before_start_weights_are_unchanged() {
            let mut ctx = setup(72, 7);
            rule().decide(&mut ctx, &mut ScriptedSource::default());
            assert_eq!(live(&ctx, 5), 60);
            assert_eq!(live(&ctx, 4), 510);
            assert_eq!(live(&ctx, 3), 9430);
        }

        #[test]
        fn bonus_grows_per_pull_past_start() {
            // Incoming count 75: two pulls at or past 74.
            let mut ctx = setup(74, 0);
            rule().decide(&mut ctx, &mut ScriptedSource::default());
            assert_eq!(live(&ctx, 5), 60 + 2 * 600);
            assert_eq!(live(&ctx, 4), 510);
            assert_eq!(live(&ctx, 3), 10_000 - 1260 - 510);
        }

        #[test]
        fn earlier_tiers_crowd_out_later_ones() {
            let mut ctx = setup(80, 9);
            rule().decide(&mut ctx, &mut ScriptedSource::default());

            let five = 60 + 8 * 600;
            assert_eq!(live(&ctx, 5), five);
            assert_eq!(live(&ctx, 4), 10_000 - five);
            assert_eq!(live(&ctx, 3), 0);
        }
    }

    mod festival_tests {
        use super::*;

        fn rule() -> FestivalRule {
            FestivalRule::new([(Tier::new(5), 5000)].into_iter().collect(), 10_000)
        }

        #[test]
        fn upgrades_rate_up_pull() {
            let mut ctx = RuleContext::new();
            ctx.outcome.decide_tier(Tier::new(5));
            ctx.outcome.escalate_tag(Tag::RateUp);

            rule().decide(&mut ctx, &mut ScriptedSource::always(0));
            assert_eq!(ctx.outcome.tag(), Tag::Festival);
        }

        #[test]
        fn ignores_standard_pull() {
            let mut ctx = RuleContext::new();
            ctx.outcome.decide_tier(Tier::new(5));

            let mut rng = ScriptedSource::always(0);
            rule().decide(&mut ctx, &mut rng);
            assert_eq!(ctx.outcome.tag(), Tag::Standard);
            assert_eq!(rng.calls(), 0);
        }

        #[test]
        fn miss_keeps_rate_up() {
            let mut ctx = RuleContext::new();
            ctx.outcome.decide_tier(Tier::new(5));
            ctx.outcome.escalate_tag(Tag::RateUp);

            rule().decide(&mut ctx, &mut ScriptedSource::always(1));
            assert_eq!(ctx.outcome.tag(), Tag::RateUp);
        }
    }

    mod targeted_tests {
        use super::*;

        fn rate_up_pull(ctx: &mut RuleContext, rule: &TargetedRule, tag: Tag) -> Tag {
            ctx.reset_outcome();
            ctx.outcome.decide_tier(Tier::new(5));
            ctx.outcome.escalate_tag(tag);
            rule.decide(ctx, &mut ScriptedSource::default());
            ctx.outcome.tag()
        }

        #[test]
        fn fires_after_threshold_misses() {
            let rule = TargetedRule::new([(Tier::new(5), 2)].into_iter().collect());
            let mut ctx = RuleContext::new();
            rule.declare(&mut ctx).unwrap();

            assert_eq!(rate_up_pull(&mut ctx, &rule, Tag::RateUp), Tag::RateUp);
            assert_eq!(rate_up_pull(&mut ctx, &rule, Tag::Festival), Tag::Festival);
            assert_eq!(rate_up_pull(&mut ctx, &rule, Tag::RateUp), Tag::Targeted);

            let counts = ctx.params.get::<TierCounts>(RuleKind::Targeted).unwrap();
            assert_eq!(counts.get(Tier::new(5)), 0);
        }

        #[test]
        fn standard_pulls_do_not_count() {
            let rule = TargetedRule::new([(Tier::new(5), 1)].into_iter().collect());
            let mut ctx = RuleContext::new();
            rule.declare(&mut ctx).unwrap();

            assert_eq!(rate_up_pull(&mut ctx, &rule, Tag::Standard), Tag::Standard);
            let counts = ctx.params.get::<TierCounts>(RuleKind::Targeted).unwrap();
            assert_eq!(counts.get(Tier::new(5)), 0);
        }
    }
}
