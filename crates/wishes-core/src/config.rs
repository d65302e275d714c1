//! Logic configuration.
//!
//! A [`LogicConfig`] is one named rule chain plus the parameter maps its
//! rules read at construction. It is usually loaded from a JSON document:
//!
//! ```json
//! {
//!     "name": "character event",
//!     "rules": ["tier_guarantee", "tier_escalation", "tier_probability",
//!               "rate_up", "category_probability", "tier_counter"],
//!     "tier_weights": { "5": 60, "4": 510, "3": 9430 },
//!     "tier_thresholds": { "5": 90, "4": 10 },
//!     "tier_escalation": { "5": [74, 600] },
//!     "rate_up_weights": { "5": 5000 },
//!     "rate_up_thresholds": { "5": 2 },
//!     "category_weights": { "5": { "Role": 10000 } }
//! }
//! ```
//!
//! Tier keys are JSON strings holding integers. Map order is significant:
//! guarantees fire for the earliest declared tier or category first, and
//! weight normalization lets earlier tiers consume capacity first.

use std::collections::BTreeMap;
use std::io::Read;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::ConfigError;
use crate::outcome::Tier;
use crate::rule::RuleKind;

/// Default weight capacity ("parts per ten thousand").
pub const DEFAULT_CAPACITY: u32 = 10_000;

fn default_capacity() -> u32 {
    DEFAULT_CAPACITY
}

/// `tier → value` map in declaration order.
pub type TierMap<V> = IndexMap<Tier, V>;

/// `tier → category → value` map in declaration order.
pub type CategoryMap<V> = IndexMap<Tier, IndexMap<String, V>>;

/// Linear probability growth for one tier.
///
/// Once the incoming pull count reaches `start`, the tier's weight grows by
/// `increment` for every pull at or past `start`. Accepts `[start, increment]`
/// or `{"start": .., "increment": ..}` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EscalationRepr")]
pub struct Escalation {
    /// First pull (incoming count) that receives a bonus
    pub start: u32,
    /// Weight added per pull at or past `start`
    pub increment: u32,
}

impl Escalation {
    /// Creates a schedule.
    #[must_use]
    pub const fn new(start: u32, increment: u32) -> Self {
        Self { start, increment }
    }

    /// Weight bonus for a pull whose incoming count is `pulls`.
    #[must_use]
    pub fn bonus(&self, pulls: u32) -> u32 {
        if pulls < self.start {
            return 0;
        }
        (pulls - self.start + 1).saturating_mul(self.increment)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EscalationRepr {
    Pair(u32, u32),
    Named { start: u32, increment: u32 },
}

impl From<EscalationRepr> for Escalation {
    fn from(repr: EscalationRepr) -> Self {
        match repr {
            EscalationRepr::Pair(start, increment)
            | EscalationRepr::Named { start, increment } => Self { start, increment },
        }
    }
}

/// One named pull logic: a rule chain and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicConfig {
    /// Display name of the logic
    #[serde(default)]
    pub name: String,
    /// Rule identifiers in execution order
    pub rules: Vec<String>,
    /// Total every weight distribution is measured against
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Base tier weights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_weights: Option<TierMap<u32>>,
    /// Category weights per tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_weights: Option<CategoryMap<u32>>,
    /// Tier guarantee thresholds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_thresholds: Option<TierMap<u32>>,
    /// Category guarantee thresholds per tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_thresholds: Option<CategoryMap<u32>>,
    /// Rate-up weight per tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_up_weights: Option<TierMap<u32>>,
    /// Rate-up guarantee threshold per tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_up_thresholds: Option<TierMap<u32>>,
    /// Category weights within rate-up pulls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_up_category_weights: Option<CategoryMap<u32>>,
    /// Category guarantee thresholds within rate-up pulls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_up_category_thresholds: Option<CategoryMap<u32>>,
    /// Tier weight escalation schedules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_escalation: Option<TierMap<Escalation>>,
    /// Festival weight per tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub festival_weights: Option<TierMap<u32>>,
    /// Targeted guarantee threshold per tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeted_thresholds: Option<TierMap<u32>>,
}

impl LogicConfig {
    /// Creates an empty configuration running `rules`.
    pub fn new(name: impl Into<String>, rules: &[RuleKind]) -> Self {
        Self {
            name: name.into(),
            rules: rules.iter().map(|k| k.identifier().to_string()).collect(),
            capacity: DEFAULT_CAPACITY,
            tier_weights: None,
            category_weights: None,
            tier_thresholds: None,
            category_thresholds: None,
            rate_up_weights: None,
            rate_up_thresholds: None,
            rate_up_category_weights: None,
            rate_up_category_thresholds: None,
            tier_escalation: None,
            festival_weights: None,
            targeted_thresholds: None,
        }
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, a missing `rules`
    /// list or non-integer tier keys.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a JSON document from a reader.
    ///
    /// # Errors
    ///
    /// See [`LogicConfig::from_json`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The highest tier with a configured base weight, if any.
    #[must_use]
    pub fn highest_tier(&self) -> Option<Tier> {
        self.tier_weights.as_ref()?.keys().copied().max()
    }

    /// Returns `value` or a [`ConfigError::MissingKey`] naming `key`.
    pub(crate) fn require<'a, T>(
        rule: RuleKind,
        key: &'static str,
        value: Option<&'a T>,
    ) -> Result<&'a T, ConfigError> {
        value.ok_or(ConfigError::MissingKey { rule, key })
    }
}

/// A set of named logics, one per card pool.
#[derive(Debug, Clone, Default)]
pub struct LogicCatalog {
    logics: BTreeMap<String, LogicConfig>,
}

impl LogicCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a logic under its name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateLogic`] if the name is taken.
    pub fn insert(&mut self, config: LogicConfig) -> Result<(), ConfigError> {
        if self.logics.contains_key(&config.name) {
            return Err(ConfigError::DuplicateLogic(config.name));
        }
        self.logics.insert(config.name.clone(), config);
        Ok(())
    }

    /// Parses and adds one JSON document.
    ///
    /// # Errors
    ///
    /// Returns parse errors or [`ConfigError::DuplicateLogic`].
    pub fn insert_json(&mut self, json: &str) -> Result<(), ConfigError> {
        self.insert(LogicConfig::from_json(json)?)
    }

    /// Returns the logic named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LogicConfig> {
        self.logics.get(name)
    }

    /// Names of all logics, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.logics.keys().map(String::as_str)
    }

    /// Number of logics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.logics.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logics.is_empty()
    }

    /// Builds a seeded engine for the logic named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLogic`] or any construction error.
    pub fn build(&self, name: &str, seed: u64) -> Result<Engine, ConfigError> {
        let config = self
            .get(name)
            .ok_or_else(|| ConfigError::UnknownLogic(name.to_string()))?;
        Engine::from_config(config, seed)
    }
}
