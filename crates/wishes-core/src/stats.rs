//! In-memory pull statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::outcome::{PullResult, Tag, Tier};

/// Aggregate of a sequence of pulls.
///
/// Besides plain counts, tracks the gaps between occurrences of one tier
/// (usually the highest configured tier): the gap of an occurrence is the
/// number of pulls it took, including itself, since the previous one.
///
/// # Example
///
/// ```
/// use wishes_core::{PullResult, PullStats, Tag, Tier};
///
/// let pull = |tier| PullResult { tier: Tier::new(tier), category: String::new(), tag: Tag::Standard };
///
/// let mut stats = PullStats::tracking(Some(Tier::new(5)));
/// for tier in [3, 3, 5, 3, 5] {
///     stats.record(&pull(tier));
/// }
///
/// assert_eq!(stats.total(), 5);
/// assert_eq!(stats.tier_count(Tier::new(5)), 2);
/// assert_eq!(stats.max_gap(), Some(3));
/// assert_eq!(stats.mean_gap(), Some(2.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullStats {
    total: u64,
    tiers: BTreeMap<Tier, u64>,
    tags: BTreeMap<Tag, u64>,
    categories: BTreeMap<Tier, BTreeMap<String, u64>>,
    tracked: Option<Tier>,
    since_tracked: u64,
    gap_count: u64,
    gap_sum: u64,
    gap_max: u64,
}

impl PullStats {
    /// Creates empty statistics that record gaps of `tracked`.
    #[must_use]
    pub fn tracking(tracked: Option<Tier>) -> Self {
        Self {
            tracked,
            ..Self::default()
        }
    }

    /// Adds one pull.
    pub fn record(&mut self, result: &PullResult) {
        self.total += 1;
        *self.tiers.entry(result.tier).or_default() += 1;
        *self.tags.entry(result.tag).or_default() += 1;
        *self
            .categories
            .entry(result.tier)
            .or_default()
            .entry(result.category.clone())
            .or_default() += 1;

        self.since_tracked += 1;
        if self.tracked == Some(result.tier) {
            self.gap_count += 1;
            self.gap_sum += self.since_tracked;
            self.gap_max = self.gap_max.max(self.since_tracked);
            self.since_tracked = 0;
        }
    }

    /// Adds every pull of `results`.
    pub fn extend<'a>(&mut self, results: impl IntoIterator<Item = &'a PullResult>) {
        for result in results {
            self.record(result);
        }
    }

    /// Combines two aggregates.
    ///
    /// Pulls of `other` after its last tracked occurrence are counted but
    /// do not contribute a gap.
    pub fn merge(&mut self, other: Self) {
        self.total += other.total;
        for (tier, n) in other.tiers {
            *self.tiers.entry(tier).or_default() += n;
        }
        for (tag, n) in other.tags {
            *self.tags.entry(tag).or_default() += n;
        }
        for (tier, cats) in other.categories {
            let mine = self.categories.entry(tier).or_default();
            for (category, n) in cats {
                *mine.entry(category).or_default() += n;
            }
        }
        self.tracked = self.tracked.or(other.tracked);
        self.gap_count += other.gap_count;
        self.gap_sum += other.gap_sum;
        self.gap_max = self.gap_max.max(other.gap_max);
    }

    /// Number of pulls recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of pulls of `tier`.
    #[must_use]
    pub fn tier_count(&self, tier: Tier) -> u64 {
        self.tiers.get(&tier).copied().unwrap_or(0)
    }

    /// Number of pulls tagged `tag`.
    #[must_use]
    pub fn tag_count(&self, tag: Tag) -> u64 {
        self.tags.get(&tag).copied().unwrap_or(0)
    }

    /// Number of pulls of `category` within `tier`.
    #[must_use]
    pub fn category_count(&self, tier: Tier, category: &str) -> u64 {
        self.categories
            .get(&tier)
            .and_then(|cats| cats.get(category))
            .copied()
            .unwrap_or(0)
    }

    /// Fraction of pulls that were `tier`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rate(&self, tier: Tier) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.tier_count(tier) as f64 / self.total as f64
    }

    /// The tier whose gaps are recorded.
    #[must_use]
    pub fn tracked(&self) -> Option<Tier> {
        self.tracked
    }

    /// Number of completed gaps.
    #[must_use]
    pub fn gap_count(&self) -> u64 {
        self.gap_count
    }

    /// Mean gap between occurrences of the tracked tier.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_gap(&self) -> Option<f64> {
        (self.gap_count > 0).then(|| self.gap_sum as f64 / self.gap_count as f64)
    }

    /// Longest gap between occurrences of the tracked tier.
    #[must_use]
    pub fn max_gap(&self) -> Option<u64> {
        (self.gap_count > 0).then_some(self.gap_max)
    }
}
