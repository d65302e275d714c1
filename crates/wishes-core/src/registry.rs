//! Rule construction and load-time validation.
//!
//! The [`RuleRegistry`] turns the identifier list of a [`LogicConfig`] into
//! an ordered chain of [`PullRule`]s. Before building anything it checks
//! that the chain can work at all:
//!
//! - no rule is listed twice
//! - every rule whose state it reads is present
//! - rules that depend on each other's decisions run in a usable order
//! - no weight distribution exceeds the capacity
//!
//! # Example
//!
//! ```
//! use wishes_core::{ConfigError, LogicConfig, RuleKind, RuleRegistry};
//!
//! let config = LogicConfig::from_json(r#"{
//!     "rules": ["tier_guarantee", "tier_probability"],
//!     "tier_weights": { "5": 60, "3": 9940 },
//!     "tier_thresholds": { "5": 90 }
//! }"#).unwrap();
//!
//! let err = RuleRegistry::new().build(&config).unwrap_err();
//! assert!(matches!(
//!     err,
//!     ConfigError::MissingDependency { rule: RuleKind::TierGuarantee, requires: RuleKind::TierCounter }
//! ));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{CategoryMap, LogicConfig, TierMap};
use crate::error::ConfigError;
use crate::rule::{PullRule, RuleKind};
use crate::rules::{
    CategoryCounterRule, CategoryGuaranteeRule, CategoryProbabilityRule, FestivalRule, InertRule,
    RateUpCategoryRule, RateUpRule, TargetedRule, TierCounterRule, TierEscalationRule,
    TierGuaranteeRule, TierProbabilityRule,
};

/// `(rule, requires)`: `rule` reads state published by `requires`.
const DEPENDENCIES: [(RuleKind, RuleKind); 7] = [
    (RuleKind::TierGuarantee, RuleKind::TierCounter),
    (RuleKind::TierEscalation, RuleKind::TierCounter),
    (RuleKind::TierEscalation, RuleKind::TierProbability),
    (RuleKind::CategoryGuarantee, RuleKind::CategoryCounter),
    (RuleKind::RateUpCategory, RuleKind::RateUp),
    (RuleKind::Festival, RuleKind::RateUp),
    (RuleKind::Targeted, RuleKind::RateUp),
];

/// `(earlier, later)`: when both are present, `earlier` must run first.
const ORDERING: [(RuleKind, RuleKind); 9] = [
    (RuleKind::TierEscalation, RuleKind::TierProbability),
    (RuleKind::RateUp, RuleKind::RateUpCategory),
    (RuleKind::RateUp, RuleKind::Festival),
    (RuleKind::RateUp, RuleKind::Targeted),
    (RuleKind::RateUpCategory, RuleKind::Festival),
    (RuleKind::RateUpCategory, RuleKind::Targeted),
    (RuleKind::RateUpCategory, RuleKind::CategoryGuarantee),
    (RuleKind::RateUpCategory, RuleKind::CategoryProbability),
    (RuleKind::Festival, RuleKind::Targeted),
];

/// What to do with a rule identifier the registry does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownRulePolicy {
    /// Build an inert rule and log a warning
    #[default]
    Ignore,
    /// Fail the load with [`ConfigError::UnknownRule`]
    Reject,
}

/// Builds and validates rule chains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleRegistry {
    policy: UnknownRulePolicy,
}

impl RuleRegistry {
    /// Creates a registry that ignores unknown identifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that rejects unknown identifiers.
    #[must_use]
    pub fn strict() -> Self {
        Self::with_policy(UnknownRulePolicy::Reject)
    }

    /// Creates a registry with an explicit unknown-identifier policy.
    #[must_use]
    pub fn with_policy(policy: UnknownRulePolicy) -> Self {
        Self { policy }
    }

    /// The unknown-identifier policy.
    #[must_use]
    pub fn policy(&self) -> UnknownRulePolicy {
        self.policy
    }

    /// Validates `config` and builds its rule chain in configured order.
    ///
    /// # Errors
    ///
    /// Returns the first validation or construction error.
    pub fn build(&self, config: &LogicConfig) -> Result<Vec<PullRule>, ConfigError> {
        self.validate(config)?;
        config
            .rules
            .iter()
            .map(|identifier| self.construct(identifier, config))
            .collect()
    }

    /// Builds one rule from its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if the rule's configuration is
    /// incomplete, or [`ConfigError::UnknownRule`] under the reject policy.
    pub fn construct(&self, identifier: &str, config: &LogicConfig) -> Result<PullRule, ConfigError> {
        let Some(kind) = RuleKind::from_identifier(identifier) else {
            return match self.policy {
                UnknownRulePolicy::Ignore => {
                    tracing::warn!(identifier, logic = %config.name, "unknown rule ignored");
                    Ok(PullRule::Inert(InertRule::new(identifier)))
                }
                UnknownRulePolicy::Reject => Err(ConfigError::UnknownRule(identifier.to_string())),
            };
        };

        let rule = match kind {
            RuleKind::TierCounter => PullRule::TierCounter(TierCounterRule::from_config(config)?),
            RuleKind::CategoryCounter => {
                PullRule::CategoryCounter(CategoryCounterRule::from_config(config)?)
            }
            RuleKind::TierProbability => {
                PullRule::TierProbability(TierProbabilityRule::from_config(config)?)
            }
            RuleKind::CategoryProbability => {
                PullRule::CategoryProbability(CategoryProbabilityRule::from_config(config)?)
            }
            RuleKind::TierGuarantee => {
                PullRule::TierGuarantee(TierGuaranteeRule::from_config(config)?)
            }
            RuleKind::CategoryGuarantee => {
                PullRule::CategoryGuarantee(CategoryGuaranteeRule::from_config(config)?)
            }
            RuleKind::RateUp => PullRule::RateUp(RateUpRule::from_config(config)?),
            RuleKind::RateUpCategory => {
                PullRule::RateUpCategory(RateUpCategoryRule::from_config(config)?)
            }
            RuleKind::TierEscalation => {
                PullRule::TierEscalation(TierEscalationRule::from_config(config)?)
            }
            RuleKind::Festival => PullRule::Festival(FestivalRule::from_config(config)?),
            RuleKind::Targeted => PullRule::Targeted(TargetedRule::from_config(config)?),
        };
        Ok(rule)
    }

    /// Checks the rule chain of `config` without building it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRule`] (reject policy only),
    /// [`ConfigError::DuplicateRule`], [`ConfigError::MissingDependency`],
    /// [`ConfigError::OrderViolation`] or [`ConfigError::WeightOverflow`].
    pub fn validate(&self, config: &LogicConfig) -> Result<(), ConfigError> {
        let mut order = Vec::with_capacity(config.rules.len());
        let mut seen = HashSet::new();
        for identifier in &config.rules {
            match RuleKind::from_identifier(identifier) {
                Some(kind) => {
                    if !seen.insert(kind) {
                        return Err(ConfigError::DuplicateRule(kind));
                    }
                    order.push(kind);
                }
                None if self.policy == UnknownRulePolicy::Reject => {
                    return Err(ConfigError::UnknownRule(identifier.clone()));
                }
                None => {}
            }
        }

        let position = |kind: RuleKind| order.iter().position(|k| *k == kind);

        for (rule, requires) in DEPENDENCIES {
            if seen.contains(&rule) && !seen.contains(&requires) {
                return Err(ConfigError::MissingDependency { rule, requires });
            }
        }

        for (earlier, later) in ORDERING {
            if let (Some(first), Some(second)) = (position(earlier), position(later)) {
                if first > second {
                    return Err(ConfigError::OrderViolation { earlier, later });
                }
            }
        }

        for kind in &order {
            check_capacity(*kind, config)?;
        }
        Ok(())
    }
}

/// Checks the weight distributions `kind` draws from against the capacity.
fn check_capacity(kind: RuleKind, config: &LogicConfig) -> Result<(), ConfigError> {
    let capacity = config.capacity;
    let overflow = |total: u64| {
        if total > u64::from(capacity) {
            Err(ConfigError::WeightOverflow {
                rule: kind,
                total,
                capacity,
            })
        } else {
            Ok(())
        }
    };

    match kind {
        RuleKind::TierProbability => {
            if let Some(weights) = &config.tier_weights {
                overflow(sum(weights.values()))?;
            }
        }
        RuleKind::CategoryProbability => {
            check_per_tier(config.category_weights.as_ref(), &overflow)?;
        }
        RuleKind::RateUpCategory => {
            check_per_tier(config.rate_up_category_weights.as_ref(), &overflow)?;
        }
        RuleKind::RateUp => check_each(config.rate_up_weights.as_ref(), &overflow)?,
        RuleKind::Festival => check_each(config.festival_weights.as_ref(), &overflow)?,
        _ => {}
    }
    Ok(())
}

fn sum<'a>(weights: impl Iterator<Item = &'a u32>) -> u64 {
    weights.map(|w| u64::from(*w)).sum()
}

fn check_per_tier(
    weights: Option<&CategoryMap<u32>>,
    overflow: &impl Fn(u64) -> Result<(), ConfigError>,
) -> Result<(), ConfigError> {
    for categories in weights.into_iter().flat_map(|w| w.values()) {
        overflow(sum(categories.values()))?;
    }
    Ok(())
}

fn check_each(
    weights: Option<&TierMap<u32>>,
    overflow: &impl Fn(u64) -> Result<(), ConfigError>,
) -> Result<(), ConfigError> {
    for weight in weights.into_iter().flat_map(|w| w.values()) {
        overflow(u64::from(*weight))?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
