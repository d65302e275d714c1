//! Error types.
//!
//! Configuration problems are detected when a logic is loaded and abort the
//! whole load. A pull itself cannot fail: unselectable weighted choices
//! resolve to "no selection" and the outcome falls back to its defaults.

use crate::rule::RuleKind;

/// Errors raised while loading or validating a logic configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON or has the wrong shape.
    #[error("malformed logic configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A rule needs a configuration key that is absent.
    #[error("rule `{rule}` requires configuration key `{key}`")]
    MissingKey {
        /// Rule being constructed
        rule: RuleKind,
        /// Missing key
        key: &'static str,
    },

    /// A rule identifier is not recognized (only under the reject policy).
    #[error("unknown rule identifier `{0}`")]
    UnknownRule(String),

    /// The same rule appears twice in one logic.
    #[error("rule `{0}` is listed more than once")]
    DuplicateRule(RuleKind),

    /// A rule reads state published by a rule that is not configured.
    #[error("rule `{rule}` requires rule `{requires}` in the same logic")]
    MissingDependency {
        /// Dependent rule
        rule: RuleKind,
        /// Rule it depends on
        requires: RuleKind,
    },

    /// Two rules are configured in an order that would make one of them ineffective.
    #[error("rule `{earlier}` must run before `{later}`")]
    OrderViolation {
        /// Rule that has to come first
        earlier: RuleKind,
        /// Rule that has to come later
        later: RuleKind,
    },

    /// A weight distribution exceeds the configured capacity.
    #[error("weights of rule `{rule}` sum to {total}, exceeding capacity {capacity}")]
    WeightOverflow {
        /// Rule owning the distribution
        rule: RuleKind,
        /// Sum of the offending distribution
        total: u64,
        /// Configured capacity
        capacity: u32,
    },

    /// A logic with this name is already in the catalog.
    #[error("logic `{0}` is already registered")]
    DuplicateLogic(String),

    /// No logic with this name is in the catalog.
    #[error("no logic named `{0}`")]
    UnknownLogic(String),
}

/// Errors raised while encoding or decoding a state snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot could not be (de)serialized.
    #[error("state snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
