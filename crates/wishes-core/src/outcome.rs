//! Pull outcome types.
//!
//! An [`Outcome`] is the in-progress result of one pull. Its tier and
//! category are decide-once [`Slot`]s: the first rule to write a slot wins
//! and every later write is refused, which is how guarantee rules take
//! priority over probability rules placed after them. The campaign [`Tag`]
//! may only be escalated within a pull.
//!
//! Once every rule has run, the engine finalizes the outcome into a
//! [`PullResult`] that is handed to the caller by value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rarity level of a pull.
///
/// Higher values are scarcer. [`Tier::NONE`] (0) stands for "no tier was
/// decided" in a finalized result.
///
/// Tiers serialize as plain integers; as JSON object keys they appear as
/// strings (`"5"`).
///
/// # Example
///
/// ```
/// use wishes_core::Tier;
///
/// assert!(Tier::new(5) > Tier::new(4));
/// assert!(Tier::NONE.is_none());
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier(u32);

impl Tier {
    /// The "undecided" tier used when no rule set one.
    pub const NONE: Self = Self(0);

    /// Creates a tier from its numeric level.
    #[must_use]
    pub const fn new(level: u32) -> Self {
        Self(level)
    }

    /// Returns the numeric level.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns true for [`Tier::NONE`].
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tier({})", self.0)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Tier {
    fn from(level: u32) -> Self {
        Self::new(level)
    }
}

impl From<Tier> for u32 {
    fn from(tier: Tier) -> Self {
        tier.0
    }
}

/// Campaign classification of a pull.
///
/// Tags are ordered by escalation: `Standard < RateUp < Festival < Targeted`.
/// Festival and targeted items are rate-up items as well.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// Standard (permanent) pool
    #[default]
    Standard,
    /// Featured rate-up group
    RateUp,
    /// Festival group, nested inside rate-up
    Festival,
    /// Targeted (epitomized) item, nested inside rate-up
    Targeted,
}

impl Tag {
    /// Returns true if the pull belongs to the rate-up group or any group nested in it.
    #[must_use]
    pub fn is_rate_up(self) -> bool {
        self >= Self::RateUp
    }

    /// Returns true for festival pulls.
    #[must_use]
    pub fn is_festival(self) -> bool {
        self == Self::Festival
    }

    /// Returns true for targeted pulls.
    #[must_use]
    pub fn is_targeted(self) -> bool {
        self == Self::Targeted
    }

    /// Stable identifier used in logs and bindings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::RateUp => "rate_up",
            Self::Festival => "festival",
            Self::Targeted => "targeted",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decide-once value.
///
/// [`Slot::decide`] is a compare-and-set against "empty": it stores the
/// value only if the slot has not been decided yet.
///
/// # Example
///
/// ```
/// use wishes_core::Slot;
///
/// let mut slot = Slot::empty();
/// assert!(slot.decide(5));
/// assert!(!slot.decide(4));
/// assert_eq!(slot.get(), Some(&5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot<T> {
    value: Option<T>,
}

impl<T> Slot<T> {
    /// Creates an undecided slot.
    #[must_use]
    pub const fn empty() -> Self {
        Self { value: None }
    }

    /// Returns the decided value, if any.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns true once a value has been decided.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        self.value.is_some()
    }

    /// Stores `value` if the slot is still empty.
    ///
    /// Returns whether the write happened.
    pub fn decide(&mut self, value: T) -> bool {
        if self.value.is_some() {
            return false;
        }
        self.value = Some(value);
        true
    }

    /// Empties the slot.
    pub fn clear(&mut self) {
        self.value = None;
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// The in-progress outcome of one pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    tier: Slot<Tier>,
    category: Slot<String>,
    tag: Tag,
}

impl Outcome {
    /// Creates an undecided outcome.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The decided tier, if any.
    #[must_use]
    pub fn tier(&self) -> Option<Tier> {
        self.tier.get().copied()
    }

    /// The decided category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.get().map(String::as_str)
    }

    /// The current campaign tag.
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Decides the tier unless one was already decided.
    pub fn decide_tier(&mut self, tier: Tier) -> bool {
        self.tier.decide(tier)
    }

    /// Decides the category unless one was already decided.
    pub fn decide_category(&mut self, category: impl Into<String>) -> bool {
        self.category.decide(category.into())
    }

    /// Raises the tag to `tag` if that is an escalation.
    ///
    /// Returns false (and leaves the tag alone) for equal or lower tags.
    pub fn escalate_tag(&mut self, tag: Tag) -> bool {
        if tag <= self.tag {
            return false;
        }
        self.tag = tag;
        true
    }

    /// Clears every field back to "undecided".
    pub fn reset(&mut self) {
        self.tier.clear();
        self.category.clear();
        self.tag = Tag::Standard;
    }

    /// Fills unset fields with their defaults and returns the result.
    ///
    /// An undecided tier becomes [`Tier::NONE`] and an undecided category the
    /// empty string. The slots stay decided afterwards, so post-pull
    /// callbacks observe the same values the caller receives.
    pub fn finalize(&mut self) -> PullResult {
        self.tier.decide(Tier::NONE);
        self.category.decide(String::new());
        PullResult {
            tier: self.tier().unwrap_or(Tier::NONE),
            category: self.category().unwrap_or_default().to_string(),
            tag: self.tag,
        }
    }
}

/// The finalized, abstract result of one pull.
///
/// A collaborator resolves this into a concrete item from the pool
/// matching `tag`, `category` and `tier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullResult {
    /// Rarity tier ([`Tier::NONE`] if no rule decided one)
    pub tier: Tier,
    /// Item category (empty if no rule decided one)
    pub category: String,
    /// Campaign tag
    pub tag: Tag,
}

impl fmt::Display for PullResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {} `{}` ({})", self.tier, self.category, self.tag)
    }
}
