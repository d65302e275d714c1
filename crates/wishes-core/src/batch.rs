//! Parallel batch simulation.
//!
//! Runs many independent pull sequences of one logic and aggregates them
//! into a single [`PullStats`]. Trials run on the rayon thread pool, but
//! every trial gets its own engine and a seed derived from the plan seed
//! and the trial index, so results do not depend on scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::config::LogicConfig;
use crate::engine::Engine;
use crate::error::ConfigError;
use crate::random::SeededSource;
use crate::stats::PullStats;

/// Shape of a batch simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    /// Number of independent engines
    pub trials: usize,
    /// Pulls performed by each engine
    pub pulls_per_trial: usize,
    /// Master seed
    pub seed: u64,
}

impl BatchPlan {
    /// Creates a plan.
    #[must_use]
    pub fn new(trials: usize, pulls_per_trial: usize, seed: u64) -> Self {
        Self {
            trials,
            pulls_per_trial,
            seed,
        }
    }

    /// Seed of the engine running trial `trial`.
    #[must_use]
    pub fn trial_seed(&self, trial: usize) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        trial.hash(&mut hasher);
        hasher.finish()
    }
}

/// Runs `plan` against `config` and merges the statistics of every trial.
///
/// Gaps are tracked for the highest tier with a configured weight.
///
/// # Errors
///
/// Returns any validation or construction error of the logic.
///
/// # Example
///
/// ```
/// use wishes_core::{simulate, BatchPlan, LogicConfig, Tier};
///
/// let config = LogicConfig::from_json(r#"{
///     "rules": ["tier_guarantee", "tier_probability", "tier_counter"],
///     "tier_weights": { "5": 60, "3": 9940 },
///     "tier_thresholds": { "5": 90 }
/// }"#).unwrap();
///
/// let stats = simulate(&config, &BatchPlan::new(8, 200, 7)).unwrap();
/// assert_eq!(stats.total(), 1_600);
/// assert!(stats.max_gap().unwrap() <= 90);
/// ```
pub fn simulate(config: &LogicConfig, plan: &BatchPlan) -> Result<PullStats, ConfigError> {
    let prototype = Engine::from_config(config, plan.seed)?;
    let tracked = config.highest_tier();
    tracing::debug!(logic = %config.name, trials = plan.trials, pulls = plan.pulls_per_trial, "batch simulation");

    let stats = (0..plan.trials)
        .into_par_iter()
        .map(|trial| {
            let mut engine = prototype.clone();
            *engine.source_mut() = SeededSource::new(plan.trial_seed(trial));

            let mut stats = PullStats::tracking(tracked);
            for _ in 0..plan.pulls_per_trial {
                stats.record(&engine.pull());
            }
            stats
        })
        .reduce(
            || PullStats::tracking(tracked),
            |mut merged, trial| {
                merged.merge(trial);
                merged
            },
        );
    Ok(stats)
}
