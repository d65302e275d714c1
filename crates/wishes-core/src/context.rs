//! Evaluation context shared by the rules of one engine.
//!
//! The [`RuleContext`] is the blackboard a pull is evaluated on. It holds
//! the in-progress [`Outcome`] and the [`ParameterTable`], the only channel
//! through which a rule can observe another rule's counters or weights.
//!
//! # Ownership
//!
//! Each rule publishes its state once, at construction, under its own
//! [`RuleKind`]. Rules normally mutate only their own entry; the documented
//! exceptions are the tier guarantee (zeroes the tier counter it consults),
//! the category guarantee (zeroes the category counter it consults) and the
//! tier escalation (raises the live weights of the tier probability rule).
//!
//! # Example
//!
//! ```
//! use wishes_core::{RuleContext, RuleKind, RuleState, Tier, TierCounts};
//!
//! let mut ctx = RuleContext::new();
//! ctx.register(RuleKind::TierCounter, TierCounts::zeroed([Tier::new(5)]).into())
//!     .unwrap();
//!
//! let counts = ctx.params.get::<TierCounts>(RuleKind::TierCounter).unwrap();
//! assert_eq!(counts.get(Tier::new(5)), 0);
//!
//! // Registering the same identifier twice is a configuration error.
//! assert!(ctx.register(RuleKind::TierCounter, TierCounts::default().into()).is_err());
//! ```

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::outcome::Outcome;
use crate::rule::RuleKind;
use crate::state::{PublishedState, RuleState};

/// Published rule state, keyed by rule identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTable {
    entries: BTreeMap<RuleKind, RuleState>,
}

impl ParameterTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `state` under `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateRule`] if `kind` already published state.
    pub fn register(&mut self, kind: RuleKind, state: RuleState) -> Result<(), ConfigError> {
        if self.entries.contains_key(&kind) {
            return Err(ConfigError::DuplicateRule(kind));
        }
        self.entries.insert(kind, state);
        Ok(())
    }

    /// Returns the state published under `kind`.
    #[must_use]
    pub fn lookup(&self, kind: RuleKind) -> Option<&RuleState> {
        self.entries.get(&kind)
    }

    /// Returns the state published under `kind`, mutably.
    pub fn lookup_mut(&mut self, kind: RuleKind) -> Option<&mut RuleState> {
        self.entries.get_mut(&kind)
    }

    /// Returns the state under `kind` narrowed to `S`.
    #[must_use]
    pub fn get<S: PublishedState>(&self, kind: RuleKind) -> Option<&S> {
        self.lookup(kind).and_then(S::narrow)
    }

    /// Returns the state under `kind` narrowed to `S`, mutably.
    pub fn get_mut<S: PublishedState>(&mut self, kind: RuleKind) -> Option<&mut S> {
        self.lookup_mut(kind).and_then(S::narrow_mut)
    }

    /// Iterates over published entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleKind, &RuleState)> {
        self.entries.iter().map(|(k, s)| (*k, s))
    }

    /// Number of published entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared mutable state for one engine instance.
#[derive(Debug, Clone, Default)]
pub struct RuleContext {
    /// The pull being evaluated.
    pub outcome: Outcome,
    /// State published by the rules.
    pub params: ParameterTable,
}

impl RuleContext {
    /// Creates a context with an undecided outcome and an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the outcome before a pull.
    pub fn reset_outcome(&mut self) {
        self.outcome.reset();
    }

    /// Publishes rule state; see [`ParameterTable::register`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateRule`] if `kind` already published state.
    pub fn register(&mut self, kind: RuleKind, state: RuleState) -> Result<(), ConfigError> {
        self.params.register(kind, state)
    }

    /// Returns the state published under `kind`.
    #[must_use]
    pub fn lookup(&self, kind: RuleKind) -> Option<&RuleState> {
        self.params.lookup(kind)
    }
}
