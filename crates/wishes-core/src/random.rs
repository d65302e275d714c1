//! Randomness sources for weighted choices.
//!
//! Every random decision a rule makes is a weighted choice over
//! non-negative integer weights, so the engine depends on a single
//! operation, [`RandomSource::choose`]. Production engines use the seeded
//! [`SeededSource`]; tests and replays substitute a [`ScriptedSource`].

use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A source of weighted random choices.
pub trait RandomSource {
    /// Picks an index into `weights` with probability proportional to its weight.
    ///
    /// Zero-weight options are never selected. Returns `None` when no option
    /// is selectable (empty slice or all weights zero).
    fn choose(&mut self, weights: &[u32]) -> Option<usize>;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn choose(&mut self, weights: &[u32]) -> Option<usize> {
        (**self).choose(weights)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn choose(&mut self, weights: &[u32]) -> Option<usize> {
        (**self).choose(weights)
    }
}

/// Deterministic source backed by `ChaCha8`.
///
/// # Example
///
/// ```
/// use wishes_core::{RandomSource, SeededSource};
///
/// let mut a = SeededSource::new(7);
/// let mut b = SeededSource::new(7);
/// let weights = [60, 510, 9430];
/// for _ in 0..100 {
///     assert_eq!(a.choose(&weights), b.choose(&weights));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededSource {
    /// Creates a source seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this source was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewinds the stream to the original seed.
    pub fn reseed(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}

impl RandomSource for SeededSource {
    fn choose(&mut self, weights: &[u32]) -> Option<usize> {
        let dist = WeightedIndex::new(weights.iter().map(|w| u64::from(*w))).ok()?;
        Some(dist.sample(&mut self.rng))
    }
}

/// Replays a fixed sequence of choices.
///
/// Each call consumes the next scripted index, cycling when the script is
/// exhausted. If the scripted index is out of range or has zero weight,
/// the first selectable option is returned instead, so a script can never
/// pick an impossible outcome.
///
/// # Example
///
/// ```
/// use wishes_core::{RandomSource, ScriptedSource};
///
/// let mut source = ScriptedSource::new([2, 0]);
/// assert_eq!(source.choose(&[60, 510, 9430]), Some(2));
/// assert_eq!(source.choose(&[60, 510, 9430]), Some(0));
/// assert_eq!(source.choose(&[0, 510, 9430]), Some(2));
/// // Index 0 has no weight here, so the first selectable option wins.
/// assert_eq!(source.choose(&[0, 510, 9430]), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: Vec<usize>,
    cursor: usize,
}

impl ScriptedSource {
    /// Creates a source replaying `script`.
    pub fn new(script: impl IntoIterator<Item = usize>) -> Self {
        Self {
            script: script.into_iter().collect(),
            cursor: 0,
        }
    }

    /// Creates a source that always answers `index`.
    #[must_use]
    pub fn always(index: usize) -> Self {
        Self::new([index])
    }

    /// Number of choices made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.cursor
    }

    /// Restarts the script from the beginning.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl RandomSource for ScriptedSource {
    fn choose(&mut self, weights: &[u32]) -> Option<usize> {
        let scripted = if self.script.is_empty() {
            None
        } else {
            Some(self.script[self.cursor % self.script.len()])
        };
        self.cursor += 1;

        match scripted {
            Some(index) if weights.get(index).is_some_and(|w| *w > 0) => Some(index),
            _ => weights.iter().position(|w| *w > 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod seeded_tests {
        use super::*;

        #[test]
        fn empty_weights_select_nothing() {
            let mut source = SeededSource::new(1);
            assert_eq!(source.choose(&[]), None);
            assert_eq!(source.choose(&[0, 0]), None);
        }

        #[test]
        fn zero_weight_is_never_selected() {
            let mut source = SeededSource::new(99);
            for _ in 0..1_000 {
                let index = source.choose(&[0, 5, 0, 5]).unwrap();
                assert!(index == 1 || index == 3);
            }
        }

        #[test]
        fn single_option_always_selected() {
            let mut source = SeededSource::new(3);
            for _ in 0..100 {
                assert_eq!(source.choose(&[0, 10_000]), Some(1));
            }
        }

        #[test]
        fn huge_weights_do_not_overflow() {
            let mut source = SeededSource::new(8);
            for _ in 0..100 {
                let index = source.choose(&[u32::MAX, 0, u32::MAX]).unwrap();
                assert_ne!(index, 1);
            }
        }

        #[test]
        fn reseed_replays_the_stream() {
            let mut source = SeededSource::new(1234);
            let weights = [1, 1, 1, 1, 1, 1, 1, 1];
            let first: Vec<_> = (0..50).map(|_| source.choose(&weights)).collect();

            source.reseed();
            let second: Vec<_> = (0..50).map(|_| source.choose(&weights)).collect();

            assert_eq!(first, second);
            assert_eq!(source.seed(), 1234);
        }

        #[test]
        fn frequencies_follow_weights() {
            let mut source = SeededSource::new(2024);
            let mut hits = [0u32; 2];
            for _ in 0..20_000 {
                hits[source.choose(&[1_000, 9_000]).unwrap()] += 1;
            }
            // Expected ~2000 hits on the light option.
            assert!((1_600..2_400).contains(&hits[0]), "hits = {hits:?}");
        }
    }

    mod scripted_tests {
        use super::*;

        #[test]
        fn script_cycles() {
            let mut source = ScriptedSource::new([1, 0]);
            let picks: Vec<_> = (0..4).map(|_| source.choose(&[1, 1])).collect();
            assert_eq!(picks, vec![Some(1), Some(0), Some(1), Some(0)]);
            assert_eq!(source.calls(), 4);
        }

        #[test]
        fn out_of_range_falls_back_to_first_selectable() {
            let mut source = ScriptedSource::always(7);
            assert_eq!(source.choose(&[0, 3]), Some(1));
            assert_eq!(source.choose(&[0, 0]), None);
        }

        #[test]
        fn empty_script_picks_first_selectable() {
            let mut source = ScriptedSource::default();
            assert_eq!(source.choose(&[0, 0, 4]), Some(2));
        }

        #[test]
        fn rewind_restarts() {
            let mut source = ScriptedSource::new([1, 0]);
            source.choose(&[1, 1]);
            source.rewind();
            assert_eq!(source.choose(&[1, 1]), Some(1));
        }
    }
}
