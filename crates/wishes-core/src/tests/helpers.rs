//! Shared configuration builders and state accessors.

use crate::config::LogicConfig;
use crate::engine::Engine;
use crate::outcome::{PullResult, Tier};
use crate::random::RandomSource;
use crate::rule::RuleKind;
use crate::state::{CategoryCounts, TierCounts};

// =============================================================================
// Configurations
// =============================================================================

/// Tier guarantee only: tier 5 forced on the tenth pull without a tier 5.
pub fn guarantee_config() -> LogicConfig {
    LogicConfig::from_json(
        r#"{
            "name": "guarantee only",
            "rules": ["tier_guarantee", "tier_probability", "tier_counter"],
            "tier_weights": { "5": 60, "4": 510, "3": 9430 },
            "tier_thresholds": { "5": 10 }
        }"#,
    )
    .expect("guarantee config parses")
}

/// A character-event style logic exercising every rule.
pub fn campaign_config() -> LogicConfig {
    LogicConfig::from_json(
        r#"{
            "name": "character event",
            "rules": [
                "tier_guarantee", "tier_escalation", "tier_probability",
                "rate_up", "rate_up_category", "festival", "targeted",
                "category_guarantee", "category_probability",
                "tier_counter", "category_counter"
            ],
            "tier_weights": { "5": 60, "4": 510, "3": 9430 },
            "tier_thresholds": { "5": 90, "4": 10 },
            "tier_escalation": { "5": [74, 600], "4": [9, 5100] },
            "category_weights": {
                "5": { "Role": 10000 },
                "4": { "Role": 5000, "Weapon": 5000 },
                "3": { "Weapon": 10000 }
            },
            "category_thresholds": { "4": { "Role": 18, "Weapon": 18 } },
            "rate_up_weights": { "5": 5000, "4": 5000 },
            "rate_up_thresholds": { "5": 2, "4": 2 },
            "rate_up_category_weights": { "5": { "Role": 10000 }, "4": { "Role": 10000 } },
            "festival_weights": { "5": 2500 },
            "targeted_thresholds": { "5": 2 }
        }"#,
    )
    .expect("campaign config parses")
}

// =============================================================================
// State Accessors
// =============================================================================

/// Counter value of `tier` published under `kind`.
pub fn counter(engine: &Engine<impl RandomSource>, kind: RuleKind, tier: u32) -> u32 {
    engine
        .context()
        .params
        .get::<TierCounts>(kind)
        .map_or(0, |counts| counts.get(Tier::new(tier)))
}

/// Category counter value published under `kind`.
pub fn category_counter(
    engine: &Engine<impl RandomSource>,
    kind: RuleKind,
    tier: u32,
    category: &str,
) -> u32 {
    engine
        .context()
        .params
        .get::<CategoryCounts>(kind)
        .map_or(0, |counts| counts.get(Tier::new(tier), category))
}

/// Tier levels of `results`.
pub fn tiers(results: &[PullResult]) -> Vec<u32> {
    results.iter().map(|r| r.tier.as_u32()).collect()
}
