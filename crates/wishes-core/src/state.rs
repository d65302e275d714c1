//! Rule state published into the parameter table.
//!
//! Rules that own mutable state (counters, live weights) publish it as a
//! [`RuleState`] under their [`RuleKind`](crate::rule::RuleKind). Other
//! rules read or adjust it through the typed accessors of
//! [`ParameterTable`](crate::context::ParameterTable), narrowing the
//! variant with [`PublishedState`].
//!
//! All state types serialize with tier keys as JSON strings, which is also
//! the format of a [`StateSnapshot`](crate::snapshot::StateSnapshot).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::outcome::Tier;

/// Per-tier pull counters.
///
/// Used for the tier counter, the rate-up counter and the targeted counter.
/// A missing tier reads as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierCounts {
    counts: IndexMap<Tier, u32>,
}

impl TierCounts {
    /// Creates zeroed counters for `tiers`.
    pub fn zeroed(tiers: impl IntoIterator<Item = Tier>) -> Self {
        Self {
            counts: tiers.into_iter().map(|t| (t, 0)).collect(),
        }
    }

    /// Current count for `tier` (0 when absent).
    #[must_use]
    pub fn get(&self, tier: Tier) -> u32 {
        self.counts.get(&tier).copied().unwrap_or(0)
    }

    /// Returns true if `tier` has a counter.
    #[must_use]
    pub fn contains(&self, tier: Tier) -> bool {
        self.counts.contains_key(&tier)
    }

    /// Sets the count for `tier`, adding the tier if needed.
    pub fn set(&mut self, tier: Tier, count: u32) {
        self.counts.insert(tier, count);
    }

    /// Resets the count for `tier` to zero.
    pub fn zero(&mut self, tier: Tier) {
        self.set(tier, 0);
    }

    /// Adds one to the count for `tier`.
    pub fn increment(&mut self, tier: Tier) {
        let next = self.get(tier).saturating_add(1);
        self.set(tier, next);
    }

    /// Adds one to every tracked tier.
    pub fn increment_all(&mut self) {
        for count in self.counts.values_mut() {
            *count = count.saturating_add(1);
        }
    }

    /// Iterates over `(tier, count)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, u32)> + '_ {
        self.counts.iter().map(|(t, c)| (*t, *c))
    }

    /// Copies counts for the tracked tiers from `other`; tiers it lacks become 0.
    pub fn overlay(&mut self, other: &Self) {
        for (tier, count) in self.counts.iter_mut() {
            *count = other.get(*tier);
        }
    }
}

/// Per-tier, per-category pull counters.
///
/// Used for the category counter and the rate-up category counter. Only
/// categories declared at construction are tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCounts {
    counts: IndexMap<Tier, IndexMap<String, u32>>,
}

impl CategoryCounts {
    /// Creates zeroed counters for every `(tier, categories)` entry.
    pub fn zeroed<'a, I, C>(layout: I) -> Self
    where
        I: IntoIterator<Item = (Tier, C)>,
        C: IntoIterator<Item = &'a String>,
    {
        Self {
            counts: layout
                .into_iter()
                .map(|(tier, cats)| (tier, cats.into_iter().map(|c| (c.clone(), 0)).collect()))
                .collect(),
        }
    }

    /// Current count for `category` within `tier` (0 when absent).
    #[must_use]
    pub fn get(&self, tier: Tier, category: &str) -> u32 {
        self.counts
            .get(&tier)
            .and_then(|cats| cats.get(category))
            .copied()
            .unwrap_or(0)
    }

    /// Returns true if `category` is tracked within `tier`.
    #[must_use]
    pub fn tracks(&self, tier: Tier, category: &str) -> bool {
        self.counts
            .get(&tier)
            .is_some_and(|cats| cats.contains_key(category))
    }

    /// Sets a tracked counter; untracked categories are ignored.
    pub fn set(&mut self, tier: Tier, category: &str, count: u32) {
        if let Some(slot) = self
            .counts
            .get_mut(&tier)
            .and_then(|cats| cats.get_mut(category))
        {
            *slot = count;
        }
    }

    /// Resets a tracked counter to zero; untracked categories are ignored.
    pub fn zero(&mut self, tier: Tier, category: &str) {
        if let Some(count) = self
            .counts
            .get_mut(&tier)
            .and_then(|cats| cats.get_mut(category))
        {
            *count = 0;
        }
    }

    /// Adds one to every category of `tier`.
    pub fn increment_tier(&mut self, tier: Tier) {
        if let Some(cats) = self.counts.get_mut(&tier) {
            for count in cats.values_mut() {
                *count = count.saturating_add(1);
            }
        }
    }

    /// Zeroes `category` within `tier` and increments its siblings.
    pub fn record(&mut self, tier: Tier, category: &str) {
        if let Some(cats) = self.counts.get_mut(&tier) {
            for (name, count) in cats.iter_mut() {
                if name == category {
                    *count = 0;
                } else {
                    *count = count.saturating_add(1);
                }
            }
        }
    }

    /// Iterates over the categories tracked for `tier`, in declaration order.
    pub fn categories(&self, tier: Tier) -> impl Iterator<Item = (&str, u32)> {
        self.counts
            .get(&tier)
            .into_iter()
            .flat_map(|cats| cats.iter().map(|(c, n)| (c.as_str(), *n)))
    }

    /// Copies tracked counters from `other`; entries it lacks become 0.
    pub fn overlay(&mut self, other: &Self) {
        for (tier, cats) in self.counts.iter_mut() {
            for (category, count) in cats.iter_mut() {
                *count = other.get(*tier, category);
            }
        }
    }
}

/// Live tier weights of the tier probability rule.
///
/// Escalation adds to the live weights during a pull; the probability rule
/// restores them to the configured base weights after every pull. Only the
/// live table is serialized, as a plain `tier → weight` map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierWeights {
    live: IndexMap<Tier, u32>,
    #[serde(skip)]
    base: IndexMap<Tier, u32>,
}

impl TierWeights {
    /// Creates live weights equal to the configured `base` weights.
    #[must_use]
    pub fn new(base: IndexMap<Tier, u32>) -> Self {
        Self {
            live: base.clone(),
            base,
        }
    }

    /// Live weight of `tier` (0 when absent).
    #[must_use]
    pub fn live(&self, tier: Tier) -> u32 {
        self.live.get(&tier).copied().unwrap_or(0)
    }

    /// Configured weight of `tier` (0 when absent).
    #[must_use]
    pub fn base(&self, tier: Tier) -> u32 {
        self.base.get(&tier).copied().unwrap_or(0)
    }

    /// Adds `amount` to the live weight of a configured tier.
    ///
    /// Tiers without a configured weight are left alone.
    pub fn add(&mut self, tier: Tier, amount: u32) {
        if let Some(weight) = self.live.get_mut(&tier) {
            *weight = weight.saturating_add(amount);
        }
    }

    /// Truncates live weights so their running sum stays within `capacity`.
    ///
    /// Tiers are visited in declaration order; each keeps at most what the
    /// earlier tiers left of the capacity, so later tiers absorb the loss.
    pub fn normalize(&mut self, capacity: u32) {
        let mut total: u32 = 0;
        for weight in self.live.values_mut() {
            let kept = (*weight).min(capacity - total);
            total += kept;
            *weight = kept;
        }
    }

    /// Restores the live weights to the configured base weights.
    pub fn restore(&mut self) {
        self.live.clone_from(&self.base);
    }

    /// Sum of the live weights.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.live.values().map(|w| u64::from(*w)).sum()
    }

    /// Iterates over `(tier, live weight)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, u32)> + '_ {
        self.live.iter().map(|(t, w)| (*t, *w))
    }

    /// Copies live weights from `other`; tiers it lacks fall back to base.
    pub fn overlay(&mut self, other: &Self) {
        for (tier, weight) in self.live.iter_mut() {
            *weight = other
                .live
                .get(tier)
                .copied()
                .or_else(|| self.base.get(tier).copied())
                .unwrap_or(0);
        }
    }
}

/// State a rule publishes into the parameter table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuleState {
    /// Per-tier counters
    TierCounts(TierCounts),
    /// Per-tier, per-category counters
    CategoryCounts(CategoryCounts),
    /// Live tier weights
    TierWeights(TierWeights),
}

impl RuleState {
    /// Copies the values of `other` into this state, keeping this state's
    /// key set.
    ///
    /// Returns false if `other` holds a different kind of state.
    pub fn overlay(&mut self, other: &Self) -> bool {
        match (self, other) {
            (Self::TierCounts(mine), Self::TierCounts(theirs)) => mine.overlay(theirs),
            (Self::CategoryCounts(mine), Self::CategoryCounts(theirs)) => mine.overlay(theirs),
            (Self::TierWeights(mine), Self::TierWeights(theirs)) => mine.overlay(theirs),
            _ => return false,
        }
        true
    }
}

/// Typed narrowing from a [`RuleState`] variant.
pub trait PublishedState: Sized {
    /// Returns the state if `state` holds this type.
    fn narrow(state: &RuleState) -> Option<&Self>;

    /// Returns the state mutably if `state` holds this type.
    fn narrow_mut(state: &mut RuleState) -> Option<&mut Self>;
}

macro_rules! published_state {
    ($ty:ident) => {
        impl PublishedState for $ty {
            fn narrow(state: &RuleState) -> Option<&Self> {
                match state {
                    RuleState::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn narrow_mut(state: &mut RuleState) -> Option<&mut Self> {
                match state {
                    RuleState::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for RuleState {
            fn from(inner: $ty) -> Self {
                RuleState::$ty(inner)
            }
        }
    };
}

published_state!(TierCounts);
published_state!(CategoryCounts);
published_state!(TierWeights);
