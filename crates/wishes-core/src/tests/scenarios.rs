//! End-to-end pull scenarios with scripted and seeded sources.

use super::*;
use crate::config::LogicConfig;
use crate::engine::Engine;
use crate::outcome::{Tag, Tier};
use crate::random::{ScriptedSource, SeededSource};
use crate::rule::{PullRule, RuleKind};

fn featured_only(rate_up_threshold: u32, rate_up_weight: u32) -> LogicConfig {
    LogicConfig::from_json(&format!(
        r#"{{
            "name": "featured",
            "rules": ["tier_probability", "rate_up"],
            "tier_weights": {{ "5": 10000 }},
            "rate_up_weights": {{ "5": {rate_up_weight} }},
            "rate_up_thresholds": {{ "5": {rate_up_threshold} }}
        }}"#
    ))
    .expect("featured config parses")
}

// =============================================================================
// Tier Guarantee
// =============================================================================

#[test]
fn tenth_pull_is_guaranteed() {
    let mut engine = Engine::with_source(&guarantee_config(), ScriptedSource::always(2)).unwrap();

    let results = engine.pull_many(10);
    assert_eq!(tiers(&results[..9]), vec![3; 9]);
    assert_eq!(results[9].tier, Tier::new(5));
    assert_eq!(counter(&engine, RuleKind::TierCounter, 5), 0);
}

#[test]
fn guarantee_repeats_every_threshold() {
    let mut engine = Engine::with_source(&guarantee_config(), ScriptedSource::always(2)).unwrap();

    let results = engine.pull_many(30);
    let hits: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.tier == Tier::new(5))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(hits, vec![9, 19, 29]);
}

#[test]
fn natural_hit_resets_the_countdown() {
    // Tier 3 four times, then the script lands on tier 5.
    let source = ScriptedSource::new([2, 2, 2, 2, 0, 2]);
    let mut engine = Engine::with_source(&guarantee_config(), source).unwrap();

    let results = engine.pull_many(5);
    assert_eq!(results[4].tier, Tier::new(5));
    assert_eq!(counter(&engine, RuleKind::TierCounter, 5), 0);
    assert_eq!(counter(&engine, RuleKind::TierCounter, 3), 1);
}

// =============================================================================
// Rate-Up
// =============================================================================

#[test]
fn threshold_one_makes_every_pull_rate_up() {
    let mut engine = Engine::with_source(&featured_only(1, 0), SeededSource::new(3)).unwrap();
    assert!(engine.pull_many(50).iter().all(|r| r.tag == Tag::RateUp));
}

#[test]
fn lost_coin_flip_guarantees_the_next() {
    // Index 1 loses every rate-up draw.
    let mut engine = Engine::with_source(&featured_only(2, 5000), ScriptedSource::always(1)).unwrap();

    let mut tags = Vec::new();
    let mut counters = Vec::new();
    for _ in 0..6 {
        tags.push(engine.pull().tag);
        counters.push(counter(&engine, RuleKind::RateUp, 5));
    }
    assert_eq!(
        tags,
        vec![Tag::Standard, Tag::RateUp, Tag::Standard, Tag::RateUp, Tag::Standard, Tag::RateUp]
    );
    assert_eq!(counters, vec![1, 0, 1, 0, 1, 0]);
}

#[test]
fn won_coin_flips_do_not_delay_pity() {
    // Index 0 wins every rate-up draw; pity still fires every third pull.
    let mut engine = Engine::with_source(&featured_only(3, 5000), ScriptedSource::always(0)).unwrap();

    let mut counters = Vec::new();
    let mut forced = Vec::new();
    for pull in 0..6 {
        let calls = engine.source().calls();
        assert_eq!(engine.pull().tag, Tag::RateUp);
        // A forced pull only draws the tier.
        if engine.source().calls() - calls == 1 {
            forced.push(pull);
        }
        counters.push(counter(&engine, RuleKind::RateUp, 5));
    }
    assert_eq!(counters, vec![1, 2, 0, 1, 2, 0]);
    assert_eq!(forced, vec![2, 5]);
}

// =============================================================================
// Category Guarantee
// =============================================================================

#[test]
fn starved_category_is_forced_on_schedule() {
    let config = LogicConfig::from_json(
        r#"{
            "name": "categories",
            "rules": ["tier_probability", "category_guarantee", "category_probability", "category_counter"],
            "tier_weights": { "4": 10000 },
            "category_weights": { "4": { "Role": 10000, "Weapon": 0 } },
            "category_thresholds": { "4": { "Weapon": 3 } }
        }"#,
    )
    .unwrap();
    let mut engine = Engine::from_config(&config, 11).unwrap();

    let categories: Vec<String> = engine.pull_many(8).into_iter().map(|r| r.category).collect();
    assert_eq!(
        categories,
        vec!["Role", "Role", "Role", "Weapon", "Role", "Role", "Role", "Weapon"]
    );
    assert_eq!(category_counter(&engine, RuleKind::CategoryCounter, 4, "Weapon"), 0);
    assert_eq!(category_counter(&engine, RuleKind::CategoryCounter, 4, "Role"), 1);
}

// =============================================================================
// Full Campaign
// =============================================================================

#[test]
fn campaign_respects_every_guarantee() {
    let mut engine = Engine::from_config(&campaign_config(), 2024).unwrap();
    let results = engine.pull_many(5_000);

    let mut since_top = 0;
    let mut last_top_standard = false;
    let mut rate_up_misses = 0;
    for result in &results {
        since_top += 1;
        if result.tier != Tier::new(5) {
            continue;
        }
        assert!(since_top <= 90, "tier 5 took {since_top} pulls");
        since_top = 0;

        assert_eq!(result.category, "Role");
        if result.tag == Tag::Standard {
            assert!(!last_top_standard, "two standard tier 5 pulls in a row");
            last_top_standard = true;
            continue;
        }
        last_top_standard = false;

        if result.tag == Tag::Targeted {
            rate_up_misses = 0;
        } else {
            rate_up_misses += 1;
            assert!(rate_up_misses <= 2, "targeted guarantee overdue");
        }
    }
}

#[test]
fn campaign_tags_only_configured_tiers() {
    let mut engine = Engine::from_config(&campaign_config(), 77).unwrap();
    for result in engine.pull_many(2_000) {
        if result.tier == Tier::new(3) {
            assert_eq!(result.tag, Tag::Standard);
            assert_eq!(result.category, "Weapon");
        }
        if result.tier == Tier::new(4) {
            assert!(matches!(result.tag, Tag::Standard | Tag::RateUp));
        }
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn reset_and_reseed_replay_a_fresh_engine() {
    let mut engine = Engine::from_config(&campaign_config(), 42).unwrap();
    let first = engine.pull_many(500);

    engine.reset();
    engine.source_mut().reseed();
    let second = engine.pull_many(500);

    assert_eq!(first, second);
}

#[test]
fn unknown_rule_is_carried_inert() {
    let mut config = guarantee_config();
    config.rules.insert(1, "lucky_charm".to_string());

    let mut engine = Engine::with_source(&config, ScriptedSource::always(2)).unwrap();
    assert_eq!(engine.rules().len(), 4);
    assert!(matches!(engine.rules()[1], PullRule::Inert(_)));
    assert_eq!(engine.rules()[1].kind(), None);

    let results = engine.pull_many(10);
    assert_eq!(results[9].tier, Tier::new(5));
}
