//! Rule capability trait and the closed set of rule variants.
//!
//! Every rule implements three operations:
//!
//! 1. **declare**: publish its mutable state into the context, once, at
//!    engine construction
//! 2. **decide**: read published state and the in-progress outcome, and
//!    possibly set outcome fields
//! 3. **advance**: after the outcome is finalized, update its own counters
//!    or weights; never changes the outcome
//!
//! # Priority
//!
//! Tier and category are decide-once slots, so whichever rule sets a field
//! first wins. The configured rule order is therefore part of the logic:
//! guarantees come before probabilities, escalation comes before the
//! probability it raises, and festival/targeted escalation come after
//! rate-up selection. [`RuleRegistry`](crate::registry::RuleRegistry)
//! checks these constraints when a logic is loaded.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::RuleContext;
use crate::error::ConfigError;
use crate::random::RandomSource;
use crate::rules::{
    CategoryCounterRule, CategoryGuaranteeRule, CategoryProbabilityRule, FestivalRule, InertRule,
    RateUpCategoryRule, RateUpRule, TargetedRule, TierCounterRule, TierEscalationRule,
    TierGuaranteeRule, TierProbabilityRule,
};

// =============================================================================
// Rule Kind
// =============================================================================

/// Identifier of a rule variant, as used in configuration and snapshots.
///
/// # Example
///
/// ```
/// use wishes_core::RuleKind;
///
/// assert_eq!(RuleKind::from_identifier("tier_guarantee"), Some(RuleKind::TierGuarantee));
/// assert_eq!(RuleKind::TierGuarantee.identifier(), "tier_guarantee");
/// assert_eq!(RuleKind::from_identifier("TierGuarantee"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Counts pulls since each tier last appeared
    TierCounter,
    /// Counts pulls since each category of a tier last appeared
    CategoryCounter,
    /// Weighted random tier
    TierProbability,
    /// Weighted random category within the decided tier
    CategoryProbability,
    /// Forces a tier once its counter reaches a threshold
    TierGuarantee,
    /// Forces a category once its counter reaches a threshold
    CategoryGuarantee,
    /// Tags a pull as rate-up, with its own pity
    RateUp,
    /// Picks the category of a rate-up pull, with its own pity
    RateUpCategory,
    /// Raises tier weights linearly past a start pull
    TierEscalation,
    /// Upgrades rate-up pulls to festival
    Festival,
    /// Forces the targeted item after enough rate-up pulls
    Targeted,
}

impl RuleKind {
    /// Every rule kind, in identifier order.
    pub const ALL: [Self; 11] = [
        Self::TierCounter,
        Self::CategoryCounter,
        Self::TierProbability,
        Self::CategoryProbability,
        Self::TierGuarantee,
        Self::CategoryGuarantee,
        Self::RateUp,
        Self::RateUpCategory,
        Self::TierEscalation,
        Self::Festival,
        Self::Targeted,
    ];

    /// The configuration identifier of this kind.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::TierCounter => "tier_counter",
            Self::CategoryCounter => "category_counter",
            Self::TierProbability => "tier_probability",
            Self::CategoryProbability => "category_probability",
            Self::TierGuarantee => "tier_guarantee",
            Self::CategoryGuarantee => "category_guarantee",
            Self::RateUp => "rate_up",
            Self::RateUpCategory => "rate_up_category",
            Self::TierEscalation => "tier_escalation",
            Self::Festival => "festival",
            Self::Targeted => "targeted",
        }
    }

    /// Parses a configuration identifier.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.identifier() == identifier)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

// =============================================================================
// Rule Trait
// =============================================================================

/// Capability set shared by every rule.
pub trait Rule {
    /// Identifier this rule was configured under.
    fn identifier(&self) -> &str;

    /// Publishes this rule's state into the context.
    ///
    /// Rules without mutable state publish nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateRule`] if the state was already published.
    fn declare(&self, _ctx: &mut RuleContext) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Applies the rule's decision logic to the in-progress outcome.
    fn decide(&self, ctx: &mut RuleContext, rng: &mut dyn RandomSource);

    /// Updates this rule's state from the finalized outcome.
    fn advance(&self, _ctx: &mut RuleContext) {}
}

// =============================================================================
// Pull Rule
// =============================================================================

/// Closed set of rule variants an engine can run.
#[derive(Debug, Clone)]
pub enum PullRule {
    /// See [`TierCounterRule`]
    TierCounter(TierCounterRule),
    /// See [`CategoryCounterRule`]
    CategoryCounter(CategoryCounterRule),
    /// See [`TierProbabilityRule`]
    TierProbability(TierProbabilityRule),
    /// See [`CategoryProbabilityRule`]
    CategoryProbability(CategoryProbabilityRule),
    /// See [`TierGuaranteeRule`]
    TierGuarantee(TierGuaranteeRule),
    /// See [`CategoryGuaranteeRule`]
    CategoryGuarantee(CategoryGuaranteeRule),
    /// See [`RateUpRule`]
    RateUp(RateUpRule),
    /// See [`RateUpCategoryRule`]
    RateUpCategory(RateUpCategoryRule),
    /// See [`TierEscalationRule`]
    TierEscalation(TierEscalationRule),
    /// See [`FestivalRule`]
    Festival(FestivalRule),
    /// See [`TargetedRule`]
    Targeted(TargetedRule),
    /// Placeholder for an unrecognized identifier
    Inert(InertRule),
}

macro_rules! dispatch {
    ($self:ident, $rule:ident => $body:expr) => {
        match $self {
            PullRule::TierCounter($rule) => $body,
            PullRule::CategoryCounter($rule) => $body,
            PullRule::TierProbability($rule) => $body,
            PullRule::CategoryProbability($rule) => $body,
            PullRule::TierGuarantee($rule) => $body,
            PullRule::CategoryGuarantee($rule) => $body,
            PullRule::RateUp($rule) => $body,
            PullRule::RateUpCategory($rule) => $body,
            PullRule::TierEscalation($rule) => $body,
            PullRule::Festival($rule) => $body,
            PullRule::Targeted($rule) => $body,
            PullRule::Inert($rule) => $body,
        }
    };
}

impl PullRule {
    /// The kind of this rule, or `None` for an inert placeholder.
    #[must_use]
    pub fn kind(&self) -> Option<RuleKind> {
        match self {
            Self::TierCounter(_) => Some(RuleKind::TierCounter),
            Self::CategoryCounter(_) => Some(RuleKind::CategoryCounter),
            Self::TierProbability(_) => Some(RuleKind::TierProbability),
            Self::CategoryProbability(_) => Some(RuleKind::CategoryProbability),
            Self::TierGuarantee(_) => Some(RuleKind::TierGuarantee),
            Self::CategoryGuarantee(_) => Some(RuleKind::CategoryGuarantee),
            Self::RateUp(_) => Some(RuleKind::RateUp),
            Self::RateUpCategory(_) => Some(RuleKind::RateUpCategory),
            Self::TierEscalation(_) => Some(RuleKind::TierEscalation),
            Self::Festival(_) => Some(RuleKind::Festival),
            Self::Targeted(_) => Some(RuleKind::Targeted),
            Self::Inert(_) => None,
        }
    }
}

impl Rule for PullRule {
    fn identifier(&self) -> &str {
        dispatch!(self, rule => rule.identifier())
    }

    fn declare(&self, ctx: &mut RuleContext) -> Result<(), ConfigError> {
        dispatch!(self, rule => rule.declare(ctx))
    }

    fn decide(&self, ctx: &mut RuleContext, rng: &mut dyn RandomSource) {
        dispatch!(self, rule => rule.decide(ctx, rng));
    }

    fn advance(&self, ctx: &mut RuleContext) {
        dispatch!(self, rule => rule.advance(ctx));
    }
}
